use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use pfunc_core::parser::{self, tokenizer::Tokenizer};
use pfunc_core::{emit, ArtifactOptions, PureFunc};

/// Exit code for input that does not parse or compile
const EXIT_INVALID: i32 = 1;
/// Exit code for I/O failures
const EXIT_IO: i32 = 2;

/// pfunc — compile S-expression contract definitions to Gobra pure functions
#[derive(Parser)]
#[command(name = "pfunc", version, about, long_about = None)]
struct Cli {
    /// Suppress informational output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log compiler decisions to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file into a Gobra artifact
    Compile {
        /// Source file (stdin when omitted or `-`)
        file: Option<PathBuf>,
        /// Artifact path
        #[arg(long, short, default_value = "res.gobra")]
        output: PathBuf,
        /// Write the artifact to stdout instead of a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
        /// Go package name in the artifact header
        #[arg(long, default_value = "main")]
        package: String,
        /// Print the compiled definitions as JSON instead of writing an artifact
        #[arg(long)]
        json: bool,
    },

    /// Parse and compile without writing anything
    Check {
        /// Source file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump the token stream with source spans
    Tokens {
        /// Source file
        file: PathBuf,
    },

    /// Pretty-print the parsed S-expression forest
    Tree {
        /// Source file
        file: PathBuf,
    },

    /// Compute the SHA-256 of the compiled artifact
    Hash {
        /// Source file
        file: PathBuf,
        /// Go package name in the artifact header
        #[arg(long, default_value = "main")]
        package: String,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compile { file, output, stdout, package, json } => {
            let target = if stdout { None } else { Some(output.as_path()) };
            cmd_compile(file.as_deref(), target, &ArtifactOptions { package }, json, cli.quiet)
        }
        Commands::Check { file, json } => cmd_check(&file, json, cli.quiet),
        Commands::Tokens { file } => cmd_tokens(&file),
        Commands::Tree { file } => cmd_tree(&file),
        Commands::Hash { file, package } => cmd_hash(&file, &ArtifactOptions { package }),
        Commands::Version => {
            println!(
                "pfunc {} (pfunc-core {})",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_VERSION")
            );
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(code) => code,
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "pfunc=debug,pfunc_core=debug"
    } else {
        "pfunc=warn,pfunc_core=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Helpers ───────────────────────────────────────────────

fn report(message: impl std::fmt::Display) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Read the source file, or stdin for `None` / `-`
fn read_source(file: Option<&Path>) -> Result<String, i32> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path).map_err(|e| {
            report(format!("cannot read {}: {}", path.display(), e));
            EXIT_IO
        }),
        _ => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input).map_err(|e| {
                report(format!("cannot read stdin: {}", e));
                EXIT_IO
            })?;
            Ok(input)
        }
    }
}

fn compile_file(file: Option<&Path>) -> Result<Vec<PureFunc>, i32> {
    let source = read_source(file)?;
    pfunc_core::compile_source(&source).map_err(|e| {
        report(e);
        EXIT_INVALID
    })
}

// ── Commands ──────────────────────────────────────────────

fn cmd_compile(
    file: Option<&Path>,
    target: Option<&Path>,
    options: &ArtifactOptions,
    json: bool,
    quiet: bool,
) -> Result<(), i32> {
    let funcs = compile_file(file)?;
    tracing::info!(definitions = funcs.len(), "compiled input");

    if json {
        let text = emit::definitions_json(&funcs).map_err(|e| {
            report(e);
            EXIT_INVALID
        })?;
        println!("{}", text);
        return Ok(());
    }

    let artifact = emit::render_artifact(&funcs, options);
    match target {
        None => print!("{}", artifact),
        Some(path) => {
            std::fs::write(path, &artifact).map_err(|e| {
                report(format!("cannot write {}: {}", path.display(), e));
                EXIT_IO
            })?;
            if !quiet {
                println!(
                    "{} {} definition(s) → {}",
                    "compiled".green().bold(),
                    funcs.len(),
                    path.display()
                );
            }
        }
    }
    Ok(())
}

fn cmd_check(file: &Path, json: bool, quiet: bool) -> Result<(), i32> {
    let source = read_source(Some(file))?;
    let result = pfunc_core::compile_source(&source);

    if json {
        let output = match &result {
            Ok(funcs) => serde_json::json!({
                "valid": true,
                "definitions": funcs.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
                "error": null,
            }),
            Err(e) => serde_json::json!({
                "valid": false,
                "definitions": [],
                "error": e.to_string(),
            }),
        };
        let text = serde_json::to_string_pretty(&output).map_err(|e| {
            report(e);
            EXIT_IO
        })?;
        println!("{}", text);
        return result.map(|_| ()).map_err(|_| EXIT_INVALID);
    }

    let funcs = result.map_err(|e| {
        report(e);
        EXIT_INVALID
    })?;
    if !quiet {
        println!("{} {}: {} definition(s)", "valid".green().bold(), file.display(), funcs.len());
        for func in &funcs {
            println!("  {}", func.name);
        }
    }
    Ok(())
}

fn cmd_tokens(file: &Path) -> Result<(), i32> {
    let source = read_source(Some(file))?;
    for token in Tokenizer::new(&source).tokenize() {
        println!("{}", token);
    }
    Ok(())
}

fn cmd_tree(file: &Path) -> Result<(), i32> {
    let source = read_source(Some(file))?;
    let forest = parser::parse(&source).map_err(|e| {
        report(e);
        EXIT_INVALID
    })?;
    for form in &forest {
        println!("{}", form.pretty());
        println!();
    }
    Ok(())
}

fn cmd_hash(file: &Path, options: &ArtifactOptions) -> Result<(), i32> {
    let funcs = compile_file(Some(file))?;
    println!("{}", emit::artifact_hash(&emit::render_artifact(&funcs, options)));
    Ok(())
}

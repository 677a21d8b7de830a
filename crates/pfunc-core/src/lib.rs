//! pfunc core - compiles S-expression contract definitions to Gobra pure functions
//!
//! Specifications are written as Lisp-style `define` forms carrying
//! `requires`/`preserves`/`ensures` clauses; the output is one Gobra
//! `pure func` per definition, each a single return expression.
//!
//! # Architecture
//!
//! ```text
//! Text → Tokenizer → Reader → SExpr forest → Compiler → PureFunc list
//!                                               ↓
//!                                    Display (serializer) → emit → artifact
//! ```
//!
//! # Example
//!
//! ```
//! let funcs = pfunc_core::compile_source(
//!     r#"(define (inc) (begin (args (x "int")) (returns "int") (+ x 1)))"#,
//! ).unwrap();
//! assert_eq!(
//!     funcs[0].to_string(),
//!     "decreases _\npure func inc(x int) int { return (x + 1) }",
//! );
//! ```

pub mod compiler;
pub mod emit;
pub mod error;
pub mod ir;
pub mod parser;

pub use compiler::{compile, Context};
pub use emit::{artifact_hash, render_artifact, ArtifactOptions};
pub use error::{Error, Result};
pub use ir::{Arg, Expr, PureFunc};
pub use parser::ast::SExpr;

/// Parse and compile source text in one step
pub fn compile_source(input: &str) -> Result<Vec<PureFunc>> {
    let forest = parser::parse(input)?;
    compile(&forest)
}

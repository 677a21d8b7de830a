//! Python bindings for pfunc
//!
//! Thin wrapper around `pfunc-core` — ZERO logic here.
//! All behavior comes from the Rust implementation.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use pfunc_core::{emit, parser, ArtifactOptions};

fn compile_text(text: &str) -> PyResult<Vec<pfunc_core::PureFunc>> {
    pfunc_core::compile_source(text).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Compile S-expression source into a Gobra artifact.
///
/// Args:
///     text: source containing `define` forms
///     package: Go package name for the artifact header
///
/// Returns:
///     Artifact text: package header, `//+gobra` marker, pure functions
///
/// Raises:
///     ValueError: On unbalanced parentheses, unsupported forms or missing clauses
#[pyfunction]
#[pyo3(signature = (text, package = "main"))]
fn compile(text: &str, package: &str) -> PyResult<String> {
    let funcs = compile_text(text)?;
    let options = ArtifactOptions {
        package: package.to_string(),
    };
    Ok(emit::render_artifact(&funcs, &options))
}

/// Compile source and return the definitions as a JSON array string.
///
/// Raises:
///     ValueError: If the source does not compile
#[pyfunction]
fn compile_json(text: &str) -> PyResult<String> {
    let funcs = compile_text(text)?;
    emit::definitions_json(&funcs).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Parse source and return every top-level form pretty-printed.
///
/// Forms are separated by a blank line.
///
/// Raises:
///     ValueError: On unbalanced parentheses
#[pyfunction]
fn parse_tree(text: &str) -> PyResult<String> {
    let forest = parser::parse(text).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(forest
        .iter()
        .map(|form| form.pretty())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// SHA-256 (hex) of the artifact compiled from `text`.
///
/// Raises:
///     ValueError: If the source does not compile
#[pyfunction]
#[pyo3(signature = (text, package = "main"))]
fn artifact_hash(text: &str, package: &str) -> PyResult<String> {
    let artifact = compile(text, package)?;
    Ok(emit::artifact_hash(&artifact))
}

/// pfunc Python module — S-expression contracts to Gobra pure functions
#[pymodule]
fn pfunc(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compile, m)?)?;
    m.add_function(wrap_pyfunction!(compile_json, m)?)?;
    m.add_function(wrap_pyfunction!(parse_tree, m)?)?;
    m.add_function(wrap_pyfunction!(artifact_hash, m)?)?;
    Ok(())
}

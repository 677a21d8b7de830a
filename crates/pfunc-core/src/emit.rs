//! Artifact emission — turns compiled definitions into a Gobra source file
//!
//! The artifact is the package header, the `//+gobra` marker that tells the
//! verifier to pick the file up, and every definition in compile order.
//!
//! # Guarantees
//!
//! - **Deterministic**: same definitions and options give byte-identical text
//! - The digest is SHA-256 over the exact artifact bytes

use sha2::{Digest, Sha256};

use crate::ir::PureFunc;
use crate::{Error, Result};

/// Marker comment the verifier looks for
pub const VERIFIER_MARKER: &str = "//+gobra";

/// Settings for [`render_artifact`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOptions {
    /// Go package the pure functions are declared in
    pub package: String,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        ArtifactOptions {
            package: "main".to_string(),
        }
    }
}

/// Render the complete artifact text
///
/// Layout: `package <name>`, blank line, marker, blank line, then each
/// definition followed by a newline, with a blank line between definitions.
pub fn render_artifact(funcs: &[PureFunc], options: &ArtifactOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!("package {}\n\n", options.package));
    out.push_str(VERIFIER_MARKER);
    out.push_str("\n\n");

    for (i, func) in funcs.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&func.to_string());
        out.push('\n');
    }

    out
}

/// Hex-encoded SHA-256 of an artifact
pub fn artifact_hash(artifact: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(artifact.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// JSON array of the compiled definitions
pub fn definitions_json(funcs: &[PureFunc]) -> Result<String> {
    serde_json::to_string_pretty(funcs).map_err(|e| Error::SerializationError(e.to_string()))
}

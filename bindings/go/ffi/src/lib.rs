//! C-FFI layer for pfunc — used by Go (cgo) and other FFI consumers.
//!
//! ZERO logic here. All calls delegate to `pfunc-core`.
//!
//! # Memory Contract
//!
//! All functions that return `*mut c_char` allocate via `CString`.
//! The caller MUST free the returned string by calling `pfunc_free_string()`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use pfunc_core::{emit, parser, ArtifactOptions};

/// Result from a pfunc FFI call.
/// If `error` is null, the call succeeded and `result` contains the output.
/// If `error` is non-null, the call failed and `error` contains the error message.
/// The caller MUST free both `result` and `error` with `pfunc_free_string()`.
#[repr(C)]
pub struct PfuncResult {
    pub result: *mut c_char,
    pub error: *mut c_char,
}

impl PfuncResult {
    fn ok(value: String) -> Self {
        PfuncResult {
            result: into_c_string(value, ""),
            error: std::ptr::null_mut(),
        }
    }

    fn err(msg: String) -> Self {
        PfuncResult {
            result: std::ptr::null_mut(),
            error: into_c_string(msg, "unknown error"),
        }
    }

    fn from_result(result: pfunc_core::Result<String>) -> Self {
        match result {
            Ok(value) => PfuncResult::ok(value),
            Err(e) => PfuncResult::err(e.to_string()),
        }
    }
}

/// Interior NUL bytes cannot cross the C boundary; fall back to `fallback`.
fn into_c_string(value: String, fallback: &str) -> *mut c_char {
    CString::new(value)
        .or_else(|_| CString::new(fallback))
        .unwrap_or_default()
        .into_raw()
}

/// Helper: convert a C string pointer to a Rust &str.
/// Returns None if the pointer is null or not valid UTF-8.
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

fn package_or_default(package: Option<&str>) -> ArtifactOptions {
    match package {
        Some(name) if !name.is_empty() => ArtifactOptions {
            package: name.to_string(),
        },
        _ => ArtifactOptions::default(),
    }
}

/// Compile source text into a Gobra artifact.
/// A null or empty `package` selects the default package `main`.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string; `package` must be
/// null or a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `pfunc_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn pfunc_compile(text: *const c_char, package: *const c_char) -> PfuncResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return PfuncResult::err("null or invalid UTF-8 input".into()),
    };
    let options = package_or_default(cstr_to_str(package));

    PfuncResult::from_result(
        pfunc_core::compile_source(text).map(|funcs| emit::render_artifact(&funcs, &options)),
    )
}

/// Compile source text and return the definitions as a JSON array.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `pfunc_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn pfunc_compile_json(text: *const c_char) -> PfuncResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return PfuncResult::err("null or invalid UTF-8 input".into()),
    };

    PfuncResult::from_result(
        pfunc_core::compile_source(text).and_then(|funcs| emit::definitions_json(&funcs)),
    )
}

/// Parse source text and return the pretty-printed forest.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `pfunc_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn pfunc_parse_tree(text: *const c_char) -> PfuncResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return PfuncResult::err("null or invalid UTF-8 input".into()),
    };

    PfuncResult::from_result(parser::parse(text).map(|forest| {
        forest
            .iter()
            .map(|form| form.pretty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }))
}

/// SHA-256 (hex) of the artifact compiled from source text.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `pfunc_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn pfunc_artifact_hash(text: *const c_char) -> PfuncResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return PfuncResult::err("null or invalid UTF-8 input".into()),
    };

    PfuncResult::from_result(pfunc_core::compile_source(text).map(|funcs| {
        emit::artifact_hash(&emit::render_artifact(&funcs, &ArtifactOptions::default()))
    }))
}

/// Free a string previously returned by a pfunc FFI function.
///
/// # Safety
/// `ptr` must be a pointer previously returned by a pfunc FFI function,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn pfunc_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

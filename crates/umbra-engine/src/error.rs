//! Engine error types.
//!
//! Every fallible engine operation returns [`Result<T>`]. Absence (a missing
//! data provider, a uniform the compiler optimized away) is never an error and
//! is reported through `Option` instead.

use std::fmt;

use thiserror::Error;

/// A single diagnostic extracted from a shader info log.
///
/// `line` is `-1` when the raw log line did not follow the
/// `ERROR: <source>:<line>: <message>` shape; `message` then holds the line verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: i32,
    pub message: String,
}

impl SourceLocation {
    pub const UNKNOWN_LINE: i32 = -1;

    pub fn new(line: i32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    #[inline]
    pub fn has_line(&self) -> bool {
        self.line != Self::UNKNOWN_LINE
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_line() {
            write!(f, "line {}: {}", self.line, self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

/// Structured shader compile/link failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderCompilationError {
    /// Short summary ("Shader compilation failed.").
    pub message: String,
    /// Raw diagnostic text as produced by the backend compiler.
    pub details: String,
    /// Parsed diagnostics, one per non-blank log line.
    pub locations: Vec<SourceLocation>,
}

impl fmt::Display for ShaderCompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for loc in &self.locations {
            write!(f, "\n  {loc}")?;
        }
        Ok(())
    }
}

/// The main error type for the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ── configuration ───────────────────────────────────────────────────
    /// No loader was registered for the requested asset type.
    #[error("no loader registered for type {asset_type}")]
    MissingLoader { asset_type: &'static str },

    /// A cached asset was requested under a different type than it was loaded as.
    #[error("asset '{identifier}' is cached with a type other than {expected}")]
    AssetTypeMismatch {
        identifier: String,
        expected: &'static str,
    },

    /// Opening or decoding an asset stream failed.
    #[error("failed to load asset '{identifier}': {message}")]
    AssetLoad { identifier: String, message: String },

    /// A scene descriptor violated its construction invariant.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    // ── shader ──────────────────────────────────────────────────────────
    #[error("{0}")]
    ShaderCompilation(ShaderCompilationError),

    // ── resources ───────────────────────────────────────────────────────
    /// A framebuffer could not be assembled from its attachments.
    #[error("framebuffer is not complete ({width}x{height}): {reason}")]
    IncompleteFramebuffer {
        width: u32,
        height: u32,
        reason: String,
    },

    /// A handle created under an older surface generation reached the backend.
    #[error("stale {kind} handle from a destroyed surface")]
    StaleHandle { kind: &'static str },

    /// The backend cannot express the requested operation.
    #[error("unsupported by backend: {0}")]
    Unsupported(String),

    /// Backend failure not covered by a more specific variant.
    #[error("backend error: {0}")]
    Backend(String),

    /// An operation was called in a lifecycle state that does not allow it.
    #[error("invalid engine state: {0}")]
    InvalidState(String),
}

impl EngineError {
    pub fn asset_load(identifier: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::AssetLoad {
            identifier: identifier.into(),
            message: message.to_string(),
        }
    }

    /// Returns the structured shader diagnostics, if this is a shader failure.
    pub fn shader_diagnostics(&self) -> Option<&ShaderCompilationError> {
        match self {
            Self::ShaderCompilation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderCompilationError> for EngineError {
    fn from(err: ShaderCompilationError) -> Self {
        Self::ShaderCompilation(err)
    }
}

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_error_display_lists_locations() {
        let err = EngineError::from(ShaderCompilationError {
            message: "Shader compilation failed.".to_string(),
            details: "ERROR: 0:3: bad\nnoise".to_string(),
            locations: vec![SourceLocation::new(3, "bad"), SourceLocation::new(-1, "noise")],
        });

        let text = err.to_string();
        assert!(text.starts_with("Shader compilation failed."));
        assert!(text.contains("line 3: bad"));
        assert!(text.contains("\n  noise"));
        assert!(err.shader_diagnostics().is_some());
    }

    #[test]
    fn missing_loader_message_names_type() {
        let err = EngineError::MissingLoader {
            asset_type: "ShaderAsset",
        };
        assert_eq!(err.to_string(), "no loader registered for type ShaderAsset");
        assert!(err.shader_diagnostics().is_none());
    }
}

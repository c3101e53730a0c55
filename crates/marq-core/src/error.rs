//! Error types for the marq compiler pipeline.

use thiserror::Error;

/// Per-unit compile error.
///
/// Every variant carries the identity of the markup unit it came from so a
/// batch embedder can report it in isolation without aborting sibling units.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed markup text.
    #[error("{unit}: line {line}: parse error: {message}")]
    Parse {
        unit: String,
        line: u32,
        message: String,
    },

    /// The target type named by the unit does not exist in the module.
    #[error("{unit}: unable to find type '{type_name}'")]
    UnknownType { unit: String, type_name: String },

    /// A property in the markup has no matching member on the target type.
    #[error("{unit}: line {line}: unknown member '{member}' on type '{type_name}'")]
    UnknownMember {
        unit: String,
        line: u32,
        member: String,
        type_name: String,
    },

    /// A literal value does not parse as the member's expected shape.
    #[error("{unit}: line {line}: unable to parse \"{text}\" as {expected}")]
    BadLiteral {
        unit: String,
        line: u32,
        text: String,
        expected: &'static str,
    },
}

/// Error loading or saving a binary module.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("module format error: {0}")]
    Format(#[from] serde_json::Error),
}

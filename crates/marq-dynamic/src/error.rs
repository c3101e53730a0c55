//! Error types for the JIT path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JitError {
    /// A compile failure, tagged with a short user-facing hint alongside the
    /// raw underlying fault.
    #[error("{}: {raw}", hint.as_deref().unwrap_or("jit compile failed"))]
    Compile { hint: Option<String>, raw: String },

    /// Internal-consistency fault: discovery runs before any populate call,
    /// so a lookup miss here should be unreachable.
    #[error("no jit implementation registered for type '{0}'")]
    MissingImplementation(String),

    /// A discovery tag whose content exists neither in the tagged module nor
    /// in the fallback catalog.
    #[error("markup resource '{0}' not found in module or fallback catalog")]
    MissingResource(String),
}

impl JitError {
    pub fn compile(hint: impl Into<String>, raw: impl ToString) -> Self {
        JitError::Compile {
            hint: Some(hint.into()),
            raw: raw.to_string(),
        }
    }
}

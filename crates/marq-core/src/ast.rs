//! Markup AST interface.
//!
//! The markup text parser is an external collaborator; this module only fixes
//! the AST shape the code generator consumes and the seam the host's parser
//! plugs into.

use thiserror::Error;

/// A parsed markup document.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: ObjectNode,
}

/// The root object node of a markup document.
#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    /// Explicit `class` directive naming the target type, if present.
    pub class: Option<String>,
    pub properties: Vec<Property>,
}

/// One property assignment on an object node.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub value: String,
    /// 1-based source line, carried into compile errors.
    pub line: u32,
}

/// Failure produced by the external markup parser.
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ParseFault {
    pub message: String,
    pub line: u32,
}

/// The host-supplied markup parser.
pub trait MarkupParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Document, ParseFault>;
}

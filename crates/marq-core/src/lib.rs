//! marq core - Core types and compiler pipeline for marq UI markup
//!
//! This crate provides the fundamental abstractions shared by the AOT
//! embedder and the JIT compiler:
//! - The binary module format (type table, decoded method bodies, resources)
//! - The markup catalog and the parser seam
//! - Literal converters for the specialized value shapes
//! - The backend-agnostic population code generator
//! - A method-body evaluator for embedded population code

pub mod ast;
pub mod codegen;
pub mod color;
pub mod convert;
pub mod error;
pub mod eval;
pub mod markup;
pub mod module;
pub mod value;

pub use ast::{Document, MarkupParser, ObjectNode, ParseFault, Property};
pub use codegen::{generate, CodeBuilder, PopOp};
pub use error::{CompileError, ModuleError};
pub use eval::{eval_method, EvalError, PopulateService};
pub use markup::{Catalog, FileSource, MarkupUnit, MARKUP_SUFFIXES};
pub use module::{
    names, Const, DiscoveryTag, Instr, MemberDef, MemberKind, MethodDef, Module, Resource, TypeDef,
};
pub use value::{Instance, NameScope, PopulateContext, Value};

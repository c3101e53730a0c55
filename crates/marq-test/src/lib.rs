//! Shared test fixtures for marq crates.
//!
//! Provides a toy line-based markup parser (the real parser is supplied by
//! the host and is out of scope) and module builders used by the embedder and
//! JIT test suites.
//!
//! Add as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! marq-test = { workspace = true }
//! ```

use marq_core::ast::{Document, MarkupParser, ObjectNode, ParseFault, Property};
use marq_core::markup::resource_uri;
use marq_core::module::{
    Instr, MemberDef, MemberKind, MethodDef, Module, Resource, TypeDef,
};

/// Install a trace subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
pub fn init_tracing() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Markup unit content matching [`widget_type`].
pub const WIDGET_MARKUP: &str = "\
class = demo.Widget
margin = 2,4
size = 1.5,2.5
tint = #ff0000
title = hello
";

/// Line-based markup parser: `key = value` per line, `class` naming the
/// target type, `#` comments. A line without `=` is a parse fault.
pub struct LineParser;

impl MarkupParser for LineParser {
    fn parse(&self, text: &str) -> Result<Document, ParseFault> {
        let mut root = ObjectNode::default();
        for (idx, raw) in text.lines().enumerate() {
            let line = (idx + 1) as u32;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (key, value) = trimmed.split_once('=').ok_or_else(|| ParseFault {
                message: format!("expected 'key = value', got '{trimmed}'"),
                line,
            })?;
            let key = key.trim();
            let value = value.trim();
            if key == "class" {
                root.class = Some(value.to_owned());
            } else {
                root.properties.push(Property {
                    name: key.to_owned(),
                    value: value.to_owned(),
                    line,
                });
            }
        }
        Ok(Document { root })
    }
}

/// Constructor body containing only the implicit base-constructor call.
pub fn trivial_ctor() -> Vec<Instr> {
    vec![Instr::LoadSelf, Instr::CallBase, Instr::Ret]
}

/// The standard test target type, with one member per literal shape.
pub fn widget_type() -> TypeDef {
    let mut ty = TypeDef::new("demo.Widget");
    ty.members.push(MemberDef::new("margin", MemberKind::Box4));
    ty.members.push(MemberDef::new("size", MemberKind::Vec2));
    ty.members.push(MemberDef::new("tint", MemberKind::Color));
    ty.members.push(MemberDef::new("title", MemberKind::Text));
    ty.members.push(MemberDef::new("opacity", MemberKind::Float));
    ty.methods.push(MethodDef::ctor(trivial_ctor()));
    ty
}

/// Embed a markup resource into `module`.
pub fn add_markup(module: &mut Module, name: &str, content: &str) {
    let uri = resource_uri(name, &module.name);
    module.resources.push(Resource {
        name: name.to_owned(),
        path: format!("{}/{name}", module.name),
        uri,
        contents: content.as_bytes().to_vec(),
    });
}

/// A module holding [`widget_type`] and its markup unit.
pub fn sample_module() -> Module {
    let mut module = Module::new("demo");
    module.types.push(widget_type());
    add_markup(&mut module, "demo.Widget.marq", WIDGET_MARKUP);
    module
}

//! The backend-agnostic population code generator.
//!
//! The generator turns a parsed markup document plus a target type into a
//! sequence of population operations, emitted through the [`CodeBuilder`]
//! capability. The AOT embedder and the JIT compiler supply their own
//! builders; the transform logic here never knows which backend it drives.

use crate::ast::Document;
use crate::convert;
use crate::error::CompileError;
use crate::module::{MemberKind, TypeDef};

/// One population operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PopOp {
    SetFloat { member: String, value: f32 },
    SetVec2 { member: String, value: [f32; 2] },
    SetBox4 { member: String, value: [f32; 4] },
    /// Deferred symbolic color; the literal is resolved at population time.
    SetColor { member: String, literal: String },
    SetText { member: String, value: String },
    /// Register the instance in the population context's name scope.
    RegisterName { name: String },
}

/// Emission target for generated population code.
pub trait CodeBuilder {
    fn emit(&mut self, op: PopOp) -> Result<(), CompileError>;
}

/// Generate population code for `doc` against `target`, emitting through
/// `builder`. An unresolvable member or literal aborts generation for this
/// unit only; the error carries the unit identity and source line.
pub fn generate(
    doc: &Document,
    target: &TypeDef,
    unit_path: &str,
    builder: &mut dyn CodeBuilder,
) -> Result<(), CompileError> {
    for prop in &doc.root.properties {
        // `name` registers the instance in the name scope whether or not the
        // target also declares a member for it.
        if prop.name == "name" {
            builder.emit(PopOp::RegisterName {
                name: prop.value.clone(),
            })?;
            if target.member("name").is_none() {
                continue;
            }
        }

        let member = target.member(&prop.name).ok_or_else(|| {
            CompileError::UnknownMember {
                unit: unit_path.to_owned(),
                line: prop.line,
                member: prop.name.clone(),
                type_name: target.name.clone(),
            }
        })?;

        let bad_literal = |expected: &'static str| CompileError::BadLiteral {
            unit: unit_path.to_owned(),
            line: prop.line,
            text: prop.value.clone(),
            expected,
        };

        let op = match member.kind {
            MemberKind::Float => PopOp::SetFloat {
                member: member.name.clone(),
                value: convert::parse_float(&prop.value).ok_or_else(|| bad_literal("a number"))?,
            },
            MemberKind::Vec2 => PopOp::SetVec2 {
                member: member.name.clone(),
                value: convert::parse_vec2(&prop.value).ok_or_else(|| bad_literal("a vector2"))?,
            },
            MemberKind::Box4 => PopOp::SetBox4 {
                member: member.name.clone(),
                value: convert::parse_box4(&prop.value).ok_or_else(|| bad_literal("a box"))?,
            },
            MemberKind::Color => PopOp::SetColor {
                member: member.name.clone(),
                literal: prop.value.clone(),
            },
            MemberKind::Text => PopOp::SetText {
                member: member.name.clone(),
                value: prop.value.clone(),
            },
        };
        builder.emit(op)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ObjectNode, Property};
    use crate::module::MemberDef;

    struct Collect(Vec<PopOp>);

    impl CodeBuilder for Collect {
        fn emit(&mut self, op: PopOp) -> Result<(), CompileError> {
            self.0.push(op);
            Ok(())
        }
    }

    fn widget() -> TypeDef {
        let mut ty = TypeDef::new("demo.Widget");
        ty.members.push(MemberDef::new("margin", MemberKind::Box4));
        ty.members.push(MemberDef::new("size", MemberKind::Vec2));
        ty.members.push(MemberDef::new("tint", MemberKind::Color));
        ty.members.push(MemberDef::new("title", MemberKind::Text));
        ty
    }

    fn doc(properties: Vec<Property>) -> Document {
        Document {
            root: ObjectNode {
                class: None,
                properties,
            },
        }
    }

    fn prop(name: &str, value: &str, line: u32) -> Property {
        Property {
            name: name.to_owned(),
            value: value.to_owned(),
            line,
        }
    }

    #[test]
    fn generates_shaped_ops() {
        let document = doc(vec![
            prop("margin", "2,4", 1),
            prop("size", "1.5,2.5", 2),
            prop("tint", "#ff0000", 3),
            prop("title", "hello", 4),
        ]);
        let mut builder = Collect(Vec::new());
        generate(&document, &widget(), "demo/Widget.marq", &mut builder).unwrap();
        assert_eq!(
            builder.0,
            vec![
                PopOp::SetBox4 {
                    member: "margin".to_owned(),
                    value: [2.0, 4.0, 2.0, 4.0]
                },
                PopOp::SetVec2 {
                    member: "size".to_owned(),
                    value: [1.5, 2.5]
                },
                PopOp::SetColor {
                    member: "tint".to_owned(),
                    literal: "#ff0000".to_owned()
                },
                PopOp::SetText {
                    member: "title".to_owned(),
                    value: "hello".to_owned()
                },
            ]
        );
    }

    #[test]
    fn unknown_member_carries_unit_and_line() {
        let document = doc(vec![prop("margin", "4", 1), prop("wobble", "yes", 7)]);
        let mut builder = Collect(Vec::new());
        let err = generate(&document, &widget(), "demo/Widget.marq", &mut builder).unwrap_err();
        match err {
            CompileError::UnknownMember { unit, line, member, .. } => {
                assert_eq!(unit, "demo/Widget.marq");
                assert_eq!(line, 7);
                assert_eq!(member, "wobble");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_literal_aborts_the_unit() {
        let document = doc(vec![prop("margin", "1,2,3", 2)]);
        let mut builder = Collect(Vec::new());
        let err = generate(&document, &widget(), "u", &mut builder).unwrap_err();
        assert!(matches!(err, CompileError::BadLiteral { line: 2, .. }));
    }

    #[test]
    fn name_property_registers_into_the_scope() {
        let document = doc(vec![prop("name", "root", 1)]);
        let mut builder = Collect(Vec::new());
        generate(&document, &widget(), "u", &mut builder).unwrap();
        assert_eq!(
            builder.0,
            vec![PopOp::RegisterName {
                name: "root".to_owned()
            }]
        );
    }

    #[test]
    fn color_literal_is_deferred_not_resolved() {
        let document = doc(vec![prop("tint", "not-a-color-yet", 1)]);
        let mut builder = Collect(Vec::new());
        // Compile succeeds; resolution happens at population time.
        generate(&document, &widget(), "u", &mut builder).unwrap();
        assert!(matches!(builder.0[0], PopOp::SetColor { .. }));
    }
}

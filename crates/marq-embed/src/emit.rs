//! The persistent-binary code-builder backend.
//!
//! Lowers population operations into decoded instructions stored in the
//! patched module, giving the host an AOT execution path that needs no JIT.

use marq_core::codegen::{CodeBuilder, PopOp};
use marq_core::error::CompileError;
use marq_core::module::{names, Const, Instr, MethodDef};

#[derive(Debug, Default)]
pub struct BinaryCodeBuilder {
    instrs: Vec<Instr>,
}

impl BinaryCodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish into the generated static population method.
    pub fn into_method(mut self) -> MethodDef {
        self.instrs.push(Instr::Ret);
        MethodDef::static_method(names::POPULATE_METHOD, self.instrs)
    }
}

impl CodeBuilder for BinaryCodeBuilder {
    fn emit(&mut self, op: PopOp) -> Result<(), CompileError> {
        let instr = match op {
            PopOp::SetFloat { member, value } => Instr::SetMember {
                member,
                value: Const::Float(value),
            },
            PopOp::SetVec2 { member, value } => Instr::SetMember {
                member,
                value: Const::Vec2(value),
            },
            PopOp::SetBox4 { member, value } => Instr::SetMember {
                member,
                value: Const::Box4(value),
            },
            PopOp::SetColor { member, literal } => Instr::SetMember {
                member,
                value: Const::Color(literal),
            },
            PopOp::SetText { member, value } => Instr::SetMember {
                member,
                value: Const::Text(value),
            },
            // Name scopes only exist during live population; the embedded
            // path has no context object to register into.
            PopOp::RegisterName { .. } => return Ok(()),
        };
        self.instrs.push(instr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_static_population_method() {
        let mut builder = BinaryCodeBuilder::new();
        builder
            .emit(PopOp::SetBox4 {
                member: "margin".to_owned(),
                value: [2.0, 4.0, 2.0, 4.0],
            })
            .unwrap();
        builder
            .emit(PopOp::RegisterName {
                name: "root".to_owned(),
            })
            .unwrap();

        let method = builder.into_method();
        assert!(method.is_static);
        assert_eq!(method.name, names::POPULATE_METHOD);
        assert_eq!(
            method.body,
            vec![
                Instr::SetMember {
                    member: "margin".to_owned(),
                    value: Const::Box4([2.0, 4.0, 2.0, 4.0]),
                },
                Instr::Ret,
            ]
        );
    }
}

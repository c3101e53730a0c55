//! Evaluator for decoded method bodies.
//!
//! This is the execution path for code the AOT embedder baked into a module:
//! generated population bodies, trampolines, and patched constructors. It is
//! a small stack machine over [`Instr`]; dynamic dispatch into the host is
//! limited to the [`PopulateService`] seam the trampolines call through.

use thiserror::Error;
use tracing::warn;

use crate::color;
use crate::module::{names, Const, Instr, MethodDef, Module};
use crate::value::{Instance, Value};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("unknown callee {owner}::{name}")]
    UnknownCallee { owner: String, name: String },

    #[error("malformed method body: {0}")]
    Malformed(String),

    #[error("population service error: {0}")]
    Service(String),
}

/// The injected service a generated trampoline resolves and calls.
pub trait PopulateService {
    fn populate_jit(&self, type_name: &str, instance: &mut Instance) -> Result<(), EvalError>;
}

enum Slot {
    SelfRef,
    Service,
    TypeName(String),
}

/// Execute `method` against `instance`, resolving nested calls in `module`.
pub fn eval_method(
    module: &Module,
    method: &MethodDef,
    instance: &mut Instance,
    services: &dyn PopulateService,
) -> Result<(), EvalError> {
    let mut stack: Vec<Slot> = Vec::new();

    for instr in &method.body {
        match instr {
            Instr::Nop => {}
            Instr::LoadSelf => stack.push(Slot::SelfRef),
            Instr::CallBase => {
                pop(&mut stack, 1)?;
            }
            Instr::ResolveService { .. } => stack.push(Slot::Service),
            Instr::TypeToken { type_name } => stack.push(Slot::TypeName(type_name.clone())),
            Instr::SetMember { member, value } => apply(instance, member, value),
            Instr::Ret => return Ok(()),
            Instr::Call { owner, name, argc } => {
                let args = pop(&mut stack, *argc as usize)?;
                if name == names::POPULATE_JIT {
                    let type_name = args
                        .iter()
                        .find_map(|slot| match slot {
                            Slot::TypeName(t) => Some(t.clone()),
                            _ => None,
                        })
                        .ok_or_else(|| {
                            EvalError::Malformed("populate_jit call without type token".to_owned())
                        })?;
                    services.populate_jit(&type_name, instance)?;
                } else {
                    let callee = module
                        .find_type(owner)
                        .and_then(|t| t.method(name))
                        .ok_or_else(|| EvalError::UnknownCallee {
                            owner: owner.clone(),
                            name: name.clone(),
                        })?;
                    eval_method(module, callee, instance, services)?;
                }
            }
        }
    }
    Ok(())
}

fn pop(stack: &mut Vec<Slot>, n: usize) -> Result<Vec<Slot>, EvalError> {
    if stack.len() < n {
        return Err(EvalError::Malformed(format!(
            "stack underflow: need {n}, have {}",
            stack.len()
        )));
    }
    Ok(stack.split_off(stack.len() - n))
}

fn apply(instance: &mut Instance, member: &str, value: &Const) {
    let value = match value {
        Const::Float(v) => Value::Float(*v),
        Const::Vec2(v) => Value::Vec2(*v),
        Const::Box4(v) => Value::Box4(*v),
        Const::Text(v) => Value::Text(v.clone()),
        Const::Color(literal) => match color::resolve(literal) {
            Some(rgba) => Value::Color(rgba),
            None => {
                warn!(member, literal, "unresolvable color literal; member left unset");
                return;
            }
        },
    };
    instance.set(member, value);
}

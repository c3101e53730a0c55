//! Call-site discovery and rewriting over decoded method bodies.
//!
//! Two passes, both returning tagged results instead of booleans:
//! a match/replace pass over every non-static method looking for the
//! well-known "load markup for self" call, and a constructor scan that
//! identifies the single trivial constructor a trampoline call can be
//! injected into.

use marq_core::module::{names, Instr, MethodDef, TypeDef};

/// Outcome of the loader-call replacement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSiteMatch {
    Found,
    NotFound,
}

/// Outcome of the constructor scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtorMatch {
    /// Index of the single injectable constructor in `methods`.
    Found(usize),
    /// No constructor, or the sole constructor has a custom body.
    NotFound,
    /// More than one non-static constructor.
    Ambiguous,
}

fn is_loader_call(instr: &Instr) -> bool {
    matches!(
        instr,
        Instr::Call { owner, name, argc: 1 }
            if owner == names::LOADER_TYPE && name == names::LOADER_METHOD
    )
}

fn is_trampoline_call(instr: &Instr) -> bool {
    matches!(instr, Instr::Call { name, .. } if name == names::TRAMPOLINE)
}

/// Preceding non-Nop instruction must load the receiver: the loader call is
/// only replaced when its single argument is the method's own `self`.
fn receiver_is_self(body: &[Instr], call_idx: usize) -> bool {
    body[..call_idx]
        .iter()
        .rev()
        .find(|i| !matches!(i, Instr::Nop))
        .is_some_and(|i| matches!(i, Instr::LoadSelf))
}

/// Scan every non-static method of `ty` for a self-referencing loader call
/// and retarget it to the type's trampoline. A call already targeting the
/// trampoline also counts as found.
pub fn replace_loader_calls(ty: &mut TypeDef) -> CallSiteMatch {
    let owner = ty.name.clone();
    let mut found = CallSiteMatch::NotFound;

    for method in ty.methods.iter_mut().filter(|m| !m.is_static) {
        for idx in 0..method.body.len() {
            if is_trampoline_call(&method.body[idx]) {
                found = CallSiteMatch::Found;
                continue;
            }
            if is_loader_call(&method.body[idx]) && receiver_is_self(&method.body, idx) {
                method.body[idx] = Instr::Call {
                    owner: owner.clone(),
                    name: names::TRAMPOLINE.to_owned(),
                    argc: 1,
                };
                found = CallSiteMatch::Found;
            }
        }
    }
    found
}

fn is_trivial_ctor(method: &MethodDef) -> bool {
    let body: Vec<&Instr> = method
        .body
        .iter()
        .filter(|i| !matches!(i, Instr::Nop))
        .collect();
    matches!(
        body.as_slice(),
        [Instr::LoadSelf, Instr::CallBase, Instr::Ret]
    )
}

/// Find the unambiguous injection point: exactly one non-static constructor
/// whose body contains only the implicit base-constructor call.
pub fn find_injectable_ctor(ty: &TypeDef) -> CtorMatch {
    let ctors: Vec<usize> = ty
        .methods
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_ctor && !m.is_static)
        .map(|(i, _)| i)
        .collect();

    match ctors.as_slice() {
        [] => CtorMatch::NotFound,
        [idx] if is_trivial_ctor(&ty.methods[*idx]) => CtorMatch::Found(*idx),
        [_] => CtorMatch::NotFound,
        _ => CtorMatch::Ambiguous,
    }
}

/// Inject `call trampoline(self)` immediately before the constructor's
/// return.
pub fn inject_trampoline_call(body: &mut Vec<Instr>, owner: &str) {
    let ret_idx = body
        .iter()
        .rposition(|i| matches!(i, Instr::Ret))
        .unwrap_or(body.len());
    body.insert(
        ret_idx,
        Instr::Call {
            owner: owner.to_owned(),
            name: names::TRAMPOLINE.to_owned(),
            argc: 1,
        },
    );
    body.insert(ret_idx, Instr::LoadSelf);
}

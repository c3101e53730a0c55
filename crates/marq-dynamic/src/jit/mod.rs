//! JIT compilation of markup units to native population functions.
//!
//! One Cranelift `JITModule` is constructed lazily on first use and shared by
//! every compile; each compile adds one fresh `populate_N` function plus its
//! own constant pool.
//!
//! Compiled functions have the signature
//! `fn(ctx: *mut PopulateContext, inst: *mut Instance)` and do their work by
//! calling the imported helpers in [`crate::runtime`].

#[cfg(test)]
mod tests;

mod compiler;

pub use compiler::{JitCompiler, PopulateFn};

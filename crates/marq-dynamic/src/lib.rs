//! In-memory JIT compilation and hot reload for marq markup.
//!
//! This crate generates population code at load/edit time without touching
//! persisted storage: the [`jit`] module lowers population operations to
//! native code through Cranelift, [`discover`] finds tagged types in loaded
//! modules, [`JitManager`] serves `populate_jit` calls from AOT-generated
//! trampolines, and [`HotReloadStore`] swaps implementations live when
//! markup sources change.

pub mod discover;
mod error;
pub mod jit;
mod manager;
mod reload;
pub mod runtime;

pub use discover::discover;
pub use error::JitError;
pub use jit::{JitCompiler, PopulateFn};
pub use manager::JitManager;
pub use reload::HotReloadStore;

//! AOT embedder for marq markup.
//!
//! Runs once per compiled module as a build step: compiles every embedded
//! markup unit, writes the generated population code and call-site patches
//! into the module permanently, and serializes the patched module back to
//! storage. Per-unit failures are isolated; the module is written only if the
//! whole batch succeeded.

mod config;
mod diagnostics;
mod embedder;
mod emit;
mod patch;

pub use config::{ConfigError, EmbedConfig};
pub use diagnostics::{BuildContext, Diagnostic, Severity};
pub use embedder::{EmbedError, EmbedOutcome, Embedder};
pub use patch::{find_injectable_ctor, inject_trampoline_call, replace_loader_calls, CallSiteMatch, CtorMatch};

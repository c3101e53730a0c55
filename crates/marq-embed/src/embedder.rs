//! The AOT embed pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use marq_core::ast::MarkupParser;
use marq_core::codegen::generate;
use marq_core::error::ModuleError;
use marq_core::markup::{Catalog, MarkupUnit};
use marq_core::module::{names, DiscoveryTag, Instr, MethodDef, Module, TypeDef};

use crate::diagnostics::BuildContext;
use crate::emit::BinaryCodeBuilder;
use crate::patch::{
    find_injectable_ctor, inject_trampoline_call, replace_loader_calls, CallSiteMatch, CtorMatch,
};

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("missing reference module: {0}")]
    MissingReference(PathBuf),
}

/// Result of an embed run: mirrors the host build task's
/// `(success, wrote_output)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOutcome {
    pub success: bool,
    pub wrote: bool,
}

pub struct Embedder {
    parser: Arc<dyn MarkupParser>,
}

impl Embedder {
    pub fn new(parser: Arc<dyn MarkupParser>) -> Self {
        Self { parser }
    }

    /// Run the embedder against a persisted module and write the patched
    /// module back to `output`. Faults surface through `ctx`; the output is
    /// written only if zero fatal errors occurred across the batch.
    pub fn embed(
        &self,
        ctx: &mut BuildContext,
        input: &Path,
        references: &[PathBuf],
        output: &Path,
        strong_name_key: Option<&Path>,
    ) -> Result<EmbedOutcome, EmbedError> {
        for reference in references {
            if !reference.exists() {
                return Err(EmbedError::MissingReference(reference.clone()));
            }
        }

        let mut module = Module::load(input)?;

        if module.is_embedded() {
            // Running again would corrupt the module. The build system's
            // input/output tracking should prevent this, but guard anyway.
            warn!(module = %module.name, "ran twice on same module; ignoring");
            ctx.warning(input.display().to_string(), "ran twice on same module; ignoring");
            return Ok(EmbedOutcome {
                success: true,
                wrote: false,
            });
        }

        let had_units = self.embed_into(ctx, &mut module);

        if !had_units {
            // Nothing to do.
            return Ok(EmbedOutcome {
                success: true,
                wrote: false,
            });
        }

        if ctx.has_errors() {
            return Ok(EmbedOutcome {
                success: false,
                wrote: false,
            });
        }

        if let Some(key_path) = strong_name_key {
            module.strong_name = Some(fs::read(key_path)?);
        }

        module.save(output)?;
        Ok(EmbedOutcome {
            success: true,
            wrote: true,
        })
    }

    /// The core pass: compile and patch every markup unit of `module` in
    /// place. Returns false if the module held no markup units at all.
    /// Per-unit failures are reported through `ctx` and do not abort the
    /// batch.
    pub fn embed_into(&self, ctx: &mut BuildContext, module: &mut Module) -> bool {
        let units = Catalog::new(module).units();
        if units.is_empty() {
            return false;
        }

        module.types.push(TypeDef::new(names::SENTINEL_TYPE));

        for unit in units {
            if let Err(message) = self.embed_unit(module, &unit) {
                ctx.error(unit.path.clone(), message);
            }
        }
        true
    }

    fn embed_unit(&self, module: &mut Module, unit: &MarkupUnit) -> Result<(), String> {
        info!("marq: {} -> {}", unit.path, unit.uri);

        let doc = self
            .parser
            .parse(&unit.text())
            .map_err(|f| format!("parse error: {f}"))?;

        let class_name = doc
            .root
            .class
            .clone()
            .unwrap_or_else(|| unit.class_stem().to_owned());

        let target = module
            .find_type(&class_name)
            .cloned()
            .ok_or_else(|| format!("unable to find type '{class_name}'"))?;

        let mut builder = BinaryCodeBuilder::new();
        generate(&doc, &target, &unit.path, &mut builder).map_err(|e| e.to_string())?;

        let mut holder = TypeDef::new(format!("{}{class_name}", names::COMPILED_PREFIX));
        holder.methods.push(builder.into_method());
        module.types.push(holder);

        let target = module
            .find_type_mut(&class_name)
            .ok_or_else(|| format!("unable to find type '{class_name}'"))?;

        if target.method(names::TRAMPOLINE).is_none() {
            target.methods.push(trampoline(&class_name));
        }

        if replace_loader_calls(target) == CallSiteMatch::NotFound {
            match find_injectable_ctor(target) {
                CtorMatch::Found(idx) => {
                    let owner = target.name.clone();
                    inject_trampoline_call(&mut target.methods[idx].body, &owner);
                }
                CtorMatch::NotFound | CtorMatch::Ambiguous => {
                    return Err(format!(
                        "no unambiguous injection point: no self loader call found in type \
                         '{class_name}' and the type seems to have custom constructors"
                    ));
                }
            }
        }

        module.tags.retain(|t| t.type_name != class_name);
        module.tags.push(DiscoveryTag {
            type_name: class_name,
            path: unit.path.clone(),
            uri: unit.uri.clone(),
        });
        Ok(())
    }
}

/// The static trampoline generated on each target type: resolve the injected
/// JIT hookup service, push the runtime type token and the instance, and
/// invoke the population entry point.
fn trampoline(class_name: &str) -> MethodDef {
    MethodDef::static_method(
        names::TRAMPOLINE,
        vec![
            Instr::ResolveService {
                service: names::JIT_HOOKUP_SERVICE.to_owned(),
            },
            Instr::TypeToken {
                type_name: class_name.to_owned(),
            },
            Instr::LoadSelf,
            Instr::Call {
                owner: names::JIT_HOOKUP_SERVICE.to_owned(),
                name: names::POPULATE_JIT.to_owned(),
                argc: 3,
            },
            Instr::Ret,
        ],
    )
}

//! The JIT manager serving `populate_jit` calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use marq_core::eval::{EvalError, PopulateService};
use marq_core::markup::FileSource;
use marq_core::module::{Module, TypeDef};
use marq_core::value::Instance;

use crate::discover::discover;
use crate::error::JitError;
use crate::jit::{JitCompiler, PopulateFn};

#[derive(Default)]
struct ManagerState {
    known_modules: Vec<String>,
    implementations: HashMap<String, Arc<PopulateFn>>,
}

/// Owns the type -> implementation registry fed by discovery sweeps.
///
/// All registry state lives behind one mutex so a discovery sweep on a
/// module-load thread never exposes a partially built mapping to a
/// concurrent populate call.
pub struct JitManager {
    compiler: Arc<JitCompiler>,
    state: Mutex<ManagerState>,
}

impl JitManager {
    pub fn new(compiler: Arc<JitCompiler>) -> Self {
        Self {
            compiler,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Discovery sweep over a newly loaded module: compile and register an
    /// implementation for every tagged type. A module already seen is
    /// skipped; per-type failures are logged and do not stop the sweep.
    pub fn add_module(&self, module: &Module, fallback: Option<&Module>) {
        {
            let mut state = self.state.lock().unwrap();
            if state.known_modules.contains(&module.name) {
                return;
            }
            state.known_modules.push(module.name.clone());
        }

        for item in discover(module, fallback) {
            match item {
                Ok((ty, source)) => {
                    if let Err(e) = self.set_implementation(&ty, &source) {
                        warn!(type_name = %ty.name, "jit sweep failed: {e}");
                    }
                }
                Err(e) => warn!(module = %module.name, "discovery failed: {e}"),
            }
        }
    }

    pub fn set_implementation(
        &self,
        target: &TypeDef,
        source: &FileSource,
    ) -> Result<(), JitError> {
        let compiled = self.compiler.compile(target, source)?;
        self.state
            .lock()
            .unwrap()
            .implementations
            .insert(target.name.clone(), Arc::new(compiled));
        Ok(())
    }

    /// Invoke the registered population entry point for `type_name`.
    ///
    /// Discovery runs before any populate call, so a missing entry is an
    /// internal-consistency fault, not a user-recoverable condition.
    pub fn populate_jit(&self, type_name: &str, instance: &mut Instance) -> Result<(), JitError> {
        let implementation = self
            .state
            .lock()
            .unwrap()
            .implementations
            .get(type_name)
            .cloned()
            .ok_or_else(|| JitError::MissingImplementation(type_name.to_owned()))?;
        implementation.populate(instance);
        Ok(())
    }

    pub fn implementation_count(&self) -> usize {
        self.state.lock().unwrap().implementations.len()
    }
}

/// AOT-generated trampolines resolve this service and call through it.
impl PopulateService for JitManager {
    fn populate_jit(&self, type_name: &str, instance: &mut Instance) -> Result<(), EvalError> {
        JitManager::populate_jit(self, type_name, instance)
            .map_err(|e| EvalError::Service(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marq_core::module::DiscoveryTag;
    use marq_core::value::Value;
    use marq_test::{sample_module, LineParser};

    fn tagged_module() -> Module {
        let mut module = sample_module();
        module.tags.push(DiscoveryTag {
            type_name: "demo.Widget".to_owned(),
            path: "demo/demo.Widget.marq".to_owned(),
            uri: "res:demo.Widget.marq?module=demo".to_owned(),
        });
        module
    }

    fn manager() -> JitManager {
        JitManager::new(Arc::new(JitCompiler::new(Arc::new(LineParser))))
    }

    #[test]
    fn sweep_registers_and_populates() {
        let manager = manager();
        manager.add_module(&tagged_module(), None);
        assert_eq!(manager.implementation_count(), 1);

        let mut instance = Instance::new("demo.Widget");
        manager.populate_jit("demo.Widget", &mut instance).unwrap();
        assert_eq!(
            instance.get("margin"),
            Some(&Value::Box4([2.0, 4.0, 2.0, 4.0]))
        );
    }

    #[test]
    fn lookup_miss_is_an_internal_fault() {
        let manager = manager();
        let mut instance = Instance::new("demo.Nothing");
        let err = manager
            .populate_jit("demo.Nothing", &mut instance)
            .unwrap_err();
        assert!(matches!(err, JitError::MissingImplementation(_)));
    }

    #[test]
    fn modules_are_swept_once() {
        let manager = manager();
        let module = tagged_module();
        manager.add_module(&module, None);
        manager.add_module(&module, None);
        assert_eq!(manager.implementation_count(), 1);
        assert_eq!(manager.compiler.modules_built(), 1);
    }
}

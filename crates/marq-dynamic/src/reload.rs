//! The hot-reload implementation store.
//!
//! Tracks the current population implementation per markup file and swaps it
//! live when the source changes. A broken edit must never regress a working
//! instance and must never crash the host: failed recompiles are logged and
//! dropped, leaving the prior implementation in place.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use marq_core::module::{Module, TypeDef};
use marq_core::value::Instance;

use crate::discover::discover;
use crate::jit::{JitCompiler, PopulateFn};

struct Entry {
    type_def: TypeDef,
    uri: String,
    content: Vec<u8>,
    implementation: Option<Arc<PopulateFn>>,
}

#[derive(Default)]
struct StoreState {
    /// file name -> entry; at most one live implementation per type.
    entries: HashMap<String, Entry>,
    /// reverse index: type name -> file name.
    by_type: HashMap<String, String>,
}

pub struct HotReloadStore {
    compiler: Arc<JitCompiler>,
    state: Mutex<StoreState>,
}

impl HotReloadStore {
    pub fn new(compiler: Arc<JitCompiler>) -> Self {
        Self {
            compiler,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Register every tagged type of `module` without compiling anything.
    pub fn add(&self, module: &Module, fallback: Option<&Module>) {
        for item in discover(module, fallback) {
            match item {
                Ok((ty, source)) => {
                    let mut state = self.state.lock().unwrap();
                    state.by_type.insert(ty.name.clone(), source.path.clone());
                    let entry = state.entries.entry(source.path).or_insert_with(|| Entry {
                        type_def: ty.clone(),
                        uri: source.uri.clone(),
                        content: Vec::new(),
                        implementation: None,
                    });
                    entry.type_def = ty;
                    entry.uri = source.uri;
                    entry.content = source.contents;
                }
                Err(e) => warn!(module = %module.name, "discovery failed: {e}"),
            }
        }
    }

    /// Recompile every registered entry from its current content. Entries
    /// whose recompile fails keep their previous implementation (or absence).
    pub fn force_reload_all(&self) {
        let snapshot: Vec<(String, TypeDef, Vec<u8>)> = {
            let state = self.state.lock().unwrap();
            state
                .entries
                .iter()
                .map(|(file, e)| (file.clone(), e.type_def.clone(), e.content.clone()))
                .collect()
        };

        for (file, type_def, content) in snapshot {
            let text = String::from_utf8_lossy(&content).into_owned();
            self.recompile_and_swap(&file, &type_def, &text, None);
        }
    }

    /// True iff setting the implementation of `file_name` would not be a
    /// no-op.
    pub fn can_set_implementation(&self, file_name: &str) -> bool {
        self.state.lock().unwrap().entries.contains_key(file_name)
    }

    /// Replace the implementation of `file_name` with a compile of
    /// `new_content`, failing silently (but logging) if it does not compile.
    ///
    /// The compile runs outside the store lock and the swap is one guarded
    /// map write, so concurrent populate calls never observe a half-updated
    /// entry. If two edits to the same file race, the compile that finishes
    /// last wins the swap.
    pub fn set_implementation(&self, file_name: &str, new_content: &str) {
        let type_def = {
            let state = self.state.lock().unwrap();
            match state.entries.get(file_name) {
                Some(entry) => entry.type_def.clone(),
                None => {
                    warn!(file_name, "set_implementation for unregistered file; ignored");
                    return;
                }
            }
        };
        self.recompile_and_swap(file_name, &type_def, new_content, Some(new_content));
    }

    /// Populate `instance` if a live implementation exists for its type.
    /// Returns false so the caller can fall back to any AOT-embedded path.
    pub fn populate(&self, type_name: &str, instance: &mut Instance) -> bool {
        let implementation = {
            let state = self.state.lock().unwrap();
            state
                .by_type
                .get(type_name)
                .and_then(|file| state.entries.get(file))
                .and_then(|entry| entry.implementation.clone())
        };
        match implementation {
            Some(implementation) => {
                implementation.populate(instance);
                true
            }
            None => false,
        }
    }

    fn recompile_and_swap(
        &self,
        file_name: &str,
        type_def: &TypeDef,
        text: &str,
        new_content: Option<&str>,
    ) {
        match self.compiler.compile_text(type_def, file_name, text) {
            Ok(compiled) => {
                let mut state = self.state.lock().unwrap();
                if let Some(entry) = state.entries.get_mut(file_name) {
                    entry.implementation = Some(Arc::new(compiled));
                    if let Some(content) = new_content {
                        entry.content = content.as_bytes().to_vec();
                    }
                    info!(file_name, uri = %entry.uri, type_name = %type_def.name, "hot reloaded");
                }
            }
            Err(e) => {
                // Prior state stays untouched; a broken edit never regresses
                // a working instance.
                warn!(
                    file_name,
                    type_name = %type_def.name,
                    "hot reloading failed: {e}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marq_core::module::DiscoveryTag;
    use marq_core::value::Value;
    use marq_test::{sample_module, LineParser};

    const FILE: &str = "demo/demo.Widget.marq";

    fn tagged_module() -> Module {
        let mut module = sample_module();
        module.tags.push(DiscoveryTag {
            type_name: "demo.Widget".to_owned(),
            path: FILE.to_owned(),
            uri: "res:demo.Widget.marq?module=demo".to_owned(),
        });
        module
    }

    fn store() -> HotReloadStore {
        marq_test::init_tracing();
        HotReloadStore::new(Arc::new(JitCompiler::new(Arc::new(LineParser))))
    }

    #[test]
    fn registration_does_not_compile() {
        let store = store();
        store.add(&tagged_module(), None);
        assert!(store.can_set_implementation(FILE));
        assert_eq!(store.compiler.modules_built(), 0);

        let mut instance = Instance::new("demo.Widget");
        assert!(!store.populate("demo.Widget", &mut instance));
    }

    #[test]
    fn force_reload_compiles_registered_entries() {
        let store = store();
        store.add(&tagged_module(), None);
        store.force_reload_all();

        let mut instance = Instance::new("demo.Widget");
        assert!(store.populate("demo.Widget", &mut instance));
        assert_eq!(
            instance.get("margin"),
            Some(&Value::Box4([2.0, 4.0, 2.0, 4.0]))
        );
    }

    #[test]
    fn edit_swaps_the_implementation() {
        let store = store();
        store.add(&tagged_module(), None);
        store.force_reload_all();

        store.set_implementation(FILE, "margin = 9");

        let mut instance = Instance::new("demo.Widget");
        assert!(store.populate("demo.Widget", &mut instance));
        assert_eq!(
            instance.get("margin"),
            Some(&Value::Box4([9.0, 9.0, 9.0, 9.0]))
        );
    }

    #[test]
    fn broken_edit_keeps_the_working_implementation() {
        let store = store();
        store.add(&tagged_module(), None);
        store.force_reload_all();

        // No '=' separator: the parser faults.
        store.set_implementation(FILE, "this is not markup");

        let mut instance = Instance::new("demo.Widget");
        assert!(store.populate("demo.Widget", &mut instance));
        assert_eq!(
            instance.get("margin"),
            Some(&Value::Box4([2.0, 4.0, 2.0, 4.0]))
        );
        assert_eq!(
            instance.get("title"),
            Some(&Value::Text("hello".to_owned()))
        );
    }

    #[test]
    fn broken_edit_without_prior_implementation_stays_absent() {
        let store = store();
        store.add(&tagged_module(), None);

        store.set_implementation(FILE, "margin = 1,2,3");

        let mut instance = Instance::new("demo.Widget");
        assert!(!store.populate("demo.Widget", &mut instance));
    }

    #[test]
    fn unregistered_files_are_rejected() {
        let store = store();
        assert!(!store.can_set_implementation("demo/Unknown.marq"));
        // Fire-and-forget; must not panic.
        store.set_implementation("demo/Unknown.marq", "margin = 4");
    }
}

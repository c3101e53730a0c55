//! The binary module format patched by the AOT embedder.
//!
//! A [`Module`] is the persisted form of a compiled host binary: a type table
//! whose method bodies are decoded instruction sequences, a set of embedded
//! resources (the markup units), and a table of discovery-tag records written
//! at embed time and read back at load time.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModuleError;

/// Well-known names shared between the embedder, the evaluator and the JIT
/// runtime. These are the identities the call-site matcher and the generated
/// trampolines agree on.
pub mod names {
    /// Owner type of the generic runtime markup loader.
    pub const LOADER_TYPE: &str = "MarqLoader";
    /// The "load markup for self" method replaced by the embedder.
    pub const LOADER_METHOD: &str = "load";
    /// Injected service resolved by generated trampolines.
    pub const JIT_HOOKUP_SERVICE: &str = "MarqJitHookup";
    /// Population entry point invoked by trampolines.
    pub const POPULATE_JIT: &str = "populate_jit";
    /// Name of the static trampoline the embedder adds to each target type.
    pub const TRAMPOLINE: &str = "!marq_populate_trampoline";
    /// Sentinel type marking a module as already embedded (idempotency guard).
    pub const SENTINEL_TYPE: &str = "!MarqEmbedded";
    /// Name prefix of generated population-holder types.
    pub const COMPILED_PREFIX: &str = "!MarqCompiled::";
    /// Name of the generated population method on a compiled holder type.
    pub const POPULATE_METHOD: &str = "!populate";
}

/// Shape of a settable member on a target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Float,
    Vec2,
    Box4,
    Color,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDef {
    pub name: String,
    pub kind: MemberKind,
}

impl MemberDef {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Constant operand of a population instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Const {
    Float(f32),
    Vec2([f32; 2]),
    Box4([f32; 4]),
    /// Deferred symbolic color literal, resolved at population time.
    Color(String),
    Text(String),
}

/// One decoded instruction of a method body.
///
/// This is the representation the AOT embedder scans and rewrites; it is
/// deliberately small and data-only so patching is a pure transformation on
/// `Vec<Instr>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    /// Push the method receiver.
    LoadSelf,
    /// Implicit base-constructor call.
    CallBase,
    /// Resolve an injected service instance by well-known name.
    ResolveService { service: String },
    /// Push the runtime type token for a type name.
    TypeToken { type_name: String },
    /// Call a method by owner type and name, consuming `argc` stack values.
    Call {
        owner: String,
        name: String,
        argc: u8,
    },
    /// Assign a constant to a member of the instance being populated.
    SetMember { member: String, value: Const },
    Ret,
    Nop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub is_static: bool,
    pub is_ctor: bool,
    pub body: Vec<Instr>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, body: Vec<Instr>) -> Self {
        Self {
            name: name.into(),
            is_static: false,
            is_ctor: false,
            body,
        }
    }

    pub fn ctor(body: Vec<Instr>) -> Self {
        Self {
            name: ".ctor".to_owned(),
            is_static: false,
            is_ctor: true,
            body,
        }
    }

    pub fn static_method(name: impl Into<String>, body: Vec<Instr>) -> Self {
        Self {
            name: name.into(),
            is_static: true,
            is_ctor: false,
            body,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub members: Vec<MemberDef>,
    pub methods: Vec<MethodDef>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn ctors(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter().filter(|m| m.is_ctor && !m.is_static)
    }
}

/// An embedded resource: the raw bytes of one markup unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub path: String,
    pub uri: String,
    pub contents: Vec<u8>,
}

/// Persisted discovery metadata: which markup unit a type was compiled from.
///
/// A plain keyed record (type name -> unit path + URI) written at embed time
/// and scanned at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryTag {
    pub type_name: String,
    pub path: String,
    pub uri: String,
}

/// A compiled host binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub types: Vec<TypeDef>,
    pub resources: Vec<Resource>,
    pub tags: Vec<DiscoveryTag>,
    /// Raw strong-name key bytes embedded at write time, if signing was
    /// requested.
    pub strong_name: Option<Vec<u8>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            resources: Vec::new(),
            tags: Vec::new(),
            strong_name: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ModuleError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModuleError> {
        let bytes = serde_json::to_vec(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_type_mut(&mut self, name: &str) -> Option<&mut TypeDef> {
        self.types.iter_mut().find(|t| t.name == name)
    }

    /// Look up an embedded resource by path, falling back to its name.
    pub fn find_resource(&self, path: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.path == path)
            .or_else(|| self.resources.iter().find(|r| r.name == path))
    }

    pub fn tag_for(&self, type_name: &str) -> Option<&DiscoveryTag> {
        self.tags.iter().find(|t| t.type_name == type_name)
    }

    /// True if the embedder already ran on this module.
    pub fn is_embedded(&self) -> bool {
        self.find_type(names::SENTINEL_TYPE).is_some()
    }
}

//! Cranelift lowering of population operations to native code.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cranelift_codegen::ir::types::F32;
use cranelift_codegen::ir::{AbiParam, Function, InstBuilder, Signature, Type, UserFuncName};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_codegen::Context;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module as _};
use tracing::info;

use marq_core::ast::MarkupParser;
use marq_core::codegen::{generate, CodeBuilder, PopOp};
use marq_core::error::CompileError;
use marq_core::markup::FileSource;
use marq_core::module::TypeDef;
use marq_core::value::{Instance, PopulateContext};

use crate::error::JitError;
use crate::runtime;

/// A JIT-compiled population function.
///
/// Owns the constant pool its generated code points into. The code memory
/// itself belongs to the compiler's shared dynamic module, which lives for
/// the process lifetime; a `PopulateFn` must not outlive the [`JitCompiler`]
/// that produced it.
pub struct PopulateFn {
    ptr: *const u8,
    _consts: Vec<Box<str>>,
}

// SAFETY: the function pointer targets immutable finalized code; the constant
// pool is never written after compilation.
unsafe impl Send for PopulateFn {}
unsafe impl Sync for PopulateFn {}

impl std::fmt::Debug for PopulateFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulateFn")
            .field("ptr", &self.ptr)
            .finish_non_exhaustive()
    }
}

impl PopulateFn {
    /// Run the population routine against `instance`, returning the fresh
    /// per-call context with its name-resolution scope.
    pub fn populate(&self, instance: &mut Instance) -> PopulateContext {
        let mut ctx = PopulateContext::default();
        let f: unsafe extern "C" fn(*mut PopulateContext, *mut Instance) =
            unsafe { std::mem::transmute(self.ptr) };
        unsafe { f(&mut ctx, instance) };
        ctx
    }
}

/// Import symbols of the dynamic module, declared once at construction.
struct Helpers {
    set_float: FuncId,
    set_vec2: FuncId,
    set_box4: FuncId,
    set_color: FuncId,
    set_text: FuncId,
    register_name: FuncId,
}

struct JitState {
    module: JITModule,
    helpers: Helpers,
    next_fn: u32,
}

// SAFETY: the module's code memory is only mutated while holding the
// compiler's state lock.
unsafe impl Send for JitState {}

/// The JIT compiler.
///
/// Holds one lazily-constructed dynamic module: construction is expensive
/// and must not be paid per loaded binary, and concurrent first callers must
/// observe exactly one module.
pub struct JitCompiler {
    parser: Arc<dyn MarkupParser>,
    state: Mutex<Option<JitState>>,
    built: AtomicUsize,
}

impl JitCompiler {
    pub fn new(parser: Arc<dyn MarkupParser>) -> Self {
        Self {
            parser,
            state: Mutex::new(None),
            built: AtomicUsize::new(0),
        }
    }

    /// How many dynamic modules this compiler ever constructed. Stays at one
    /// for the process lifetime once the first compile ran.
    pub fn modules_built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    pub fn compile(&self, target: &TypeDef, source: &FileSource) -> Result<PopulateFn, JitError> {
        self.compile_text(target, &source.path, &source.text())
    }

    /// Compile `text` as the markup unit at `path` for `target`.
    ///
    /// Never raises into caller state: every failure comes back as
    /// [`JitError::Compile`] with a short hint and the raw fault.
    pub fn compile_text(
        &self,
        target: &TypeDef,
        path: &str,
        text: &str,
    ) -> Result<PopulateFn, JitError> {
        info!(type_name = %target.name, path, "jit compiling");

        let doc = self
            .parser
            .parse(text)
            .map_err(|f| JitError::compile("markup does not parse", f))?;

        let mut ops = OpCollector::default();
        generate(&doc, target, path, &mut ops)
            .map_err(|e| JitError::compile(hint_for(&e), e))?;

        let mut guard = self.state.lock().unwrap();
        let state = guard.get_or_insert_with(|| {
            self.built.fetch_add(1, Ordering::SeqCst);
            info!("constructing dynamic module");
            JitState::new()
        });
        state.define_populate(&ops.ops)
    }
}

fn hint_for(err: &CompileError) -> &'static str {
    match err {
        CompileError::Parse { .. } => "markup does not parse",
        CompileError::UnknownType { .. } => "markup names an unknown type",
        CompileError::UnknownMember { .. } => "markup sets a member the type does not have",
        CompileError::BadLiteral { .. } => "markup literal does not convert",
    }
}

#[derive(Default)]
struct OpCollector {
    ops: Vec<PopOp>,
}

impl CodeBuilder for OpCollector {
    fn emit(&mut self, op: PopOp) -> Result<(), CompileError> {
        self.ops.push(op);
        Ok(())
    }
}

fn make_jit_module() -> JITModule {
    let mut flag_builder = settings::builder();
    flag_builder
        .set("use_colocated_libcalls", "false")
        .expect("cranelift setting");
    flag_builder
        .set("is_pic", "false")
        .expect("cranelift setting");
    let isa_builder =
        cranelift_native::builder().unwrap_or_else(|e| panic!("cranelift ISA builder: {e}"));
    let isa = isa_builder
        .finish(settings::Flags::new(flag_builder))
        .unwrap_or_else(|e| panic!("cranelift ISA finish: {e}"));

    let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
    builder.symbol("marq_set_float", runtime::marq_set_float as *const u8);
    builder.symbol("marq_set_vec2", runtime::marq_set_vec2 as *const u8);
    builder.symbol("marq_set_box4", runtime::marq_set_box4 as *const u8);
    builder.symbol("marq_set_color", runtime::marq_set_color as *const u8);
    builder.symbol("marq_set_text", runtime::marq_set_text as *const u8);
    builder.symbol("marq_register_name", runtime::marq_register_name as *const u8);
    JITModule::new(builder)
}

impl JitState {
    fn new() -> Self {
        let mut module = make_jit_module();
        let ptr = module.target_config().pointer_type();

        let mut import = |name: &str, params: &[Type]| -> FuncId {
            let mut sig = module.make_signature();
            for p in params {
                sig.params.push(AbiParam::new(*p));
            }
            module
                .declare_function(name, Linkage::Import, &sig)
                .unwrap_or_else(|e| panic!("declare runtime helper {name}: {e}"))
        };

        let helpers = Helpers {
            set_float: import("marq_set_float", &[ptr, ptr, ptr, F32]),
            set_vec2: import("marq_set_vec2", &[ptr, ptr, ptr, F32, F32]),
            set_box4: import("marq_set_box4", &[ptr, ptr, ptr, F32, F32, F32, F32]),
            set_color: import("marq_set_color", &[ptr, ptr, ptr, ptr, ptr]),
            set_text: import("marq_set_text", &[ptr, ptr, ptr, ptr, ptr]),
            register_name: import("marq_register_name", &[ptr, ptr, ptr, ptr]),
        };

        Self {
            module,
            helpers,
            next_fn: 0,
        }
    }

    /// Lower `ops` into one fresh `populate_N` function and finalize it.
    fn define_populate(&mut self, ops: &[PopOp]) -> Result<PopulateFn, JitError> {
        let ptr_type = self.module.target_config().pointer_type();

        let mut sig: Signature = self.module.make_signature();
        sig.params.push(AbiParam::new(ptr_type)); // *mut PopulateContext
        sig.params.push(AbiParam::new(ptr_type)); // *mut Instance

        let index = self.next_fn;
        self.next_fn += 1;
        let func_id = self
            .module
            .declare_function(&format!("populate_{index}"), Linkage::Local, &sig)
            .map_err(|e| JitError::compile("code generation failed", e))?;

        let mut func = Function::with_name_signature(UserFuncName::user(0, index), sig);
        let mut func_ctx = FunctionBuilderContext::new();
        let mut consts: Vec<Box<str>> = Vec::new();

        {
            let mut builder = FunctionBuilder::new(&mut func, &mut func_ctx);
            let entry = builder.create_block();
            builder.append_block_params_for_function_params(entry);
            builder.switch_to_block(entry);
            builder.seal_block(entry);

            let ctx_ptr = builder.block_params(entry)[0];
            let inst_ptr = builder.block_params(entry)[1];

            let set_float = self.module.declare_func_in_func(self.helpers.set_float, builder.func);
            let set_vec2 = self.module.declare_func_in_func(self.helpers.set_vec2, builder.func);
            let set_box4 = self.module.declare_func_in_func(self.helpers.set_box4, builder.func);
            let set_color = self.module.declare_func_in_func(self.helpers.set_color, builder.func);
            let set_text = self.module.declare_func_in_func(self.helpers.set_text, builder.func);
            let register_name = self
                .module
                .declare_func_in_func(self.helpers.register_name, builder.func);

            let mut intern = |builder: &mut FunctionBuilder, s: &str| {
                let boxed: Box<str> = s.into();
                let ptr = boxed.as_ptr() as i64;
                let len = boxed.len() as i64;
                consts.push(boxed);
                (
                    builder.ins().iconst(ptr_type, ptr),
                    builder.ins().iconst(ptr_type, len),
                )
            };

            for op in ops {
                match op {
                    PopOp::SetFloat { member, value } => {
                        let (p, l) = intern(&mut builder, member);
                        let v = builder.ins().f32const(*value);
                        builder.ins().call(set_float, &[inst_ptr, p, l, v]);
                    }
                    PopOp::SetVec2 { member, value } => {
                        let (p, l) = intern(&mut builder, member);
                        let x = builder.ins().f32const(value[0]);
                        let y = builder.ins().f32const(value[1]);
                        builder.ins().call(set_vec2, &[inst_ptr, p, l, x, y]);
                    }
                    PopOp::SetBox4 { member, value } => {
                        let (p, l) = intern(&mut builder, member);
                        let sides: Vec<_> =
                            value.iter().map(|v| builder.ins().f32const(*v)).collect();
                        builder.ins().call(
                            set_box4,
                            &[inst_ptr, p, l, sides[0], sides[1], sides[2], sides[3]],
                        );
                    }
                    PopOp::SetColor { member, literal } => {
                        let (p, l) = intern(&mut builder, member);
                        let (lp, ll) = intern(&mut builder, literal);
                        builder.ins().call(set_color, &[inst_ptr, p, l, lp, ll]);
                    }
                    PopOp::SetText { member, value } => {
                        let (p, l) = intern(&mut builder, member);
                        let (tp, tl) = intern(&mut builder, value);
                        builder.ins().call(set_text, &[inst_ptr, p, l, tp, tl]);
                    }
                    PopOp::RegisterName { name } => {
                        let (p, l) = intern(&mut builder, name);
                        builder.ins().call(register_name, &[ctx_ptr, inst_ptr, p, l]);
                    }
                }
            }

            builder.ins().return_(&[]);
            builder.finalize();
        }

        let mut ctx = Context::for_function(func);
        self.module
            .define_function(func_id, &mut ctx)
            .map_err(|e| JitError::compile("code generation failed", e))?;
        self.module.clear_context(&mut ctx);
        self.module
            .finalize_definitions()
            .map_err(|e| JitError::compile("code generation failed", e))?;

        Ok(PopulateFn {
            ptr: self.module.get_finalized_function(func_id),
            _consts: consts,
        })
    }
}

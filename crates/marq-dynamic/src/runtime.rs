//! Population runtime helpers called by JIT-compiled code.
//!
//! Each helper is registered as an import symbol of the dynamic module.
//! String arguments are (pointer, length) pairs into the constant pool owned
//! by the calling [`PopulateFn`](crate::PopulateFn); they are valid UTF-8 by
//! construction and live as long as the compiled function.

use std::slice;
use std::str;

use tracing::warn;

use marq_core::color;
use marq_core::value::{Instance, PopulateContext, Value};

unsafe fn as_str<'a>(ptr: *const u8, len: usize) -> &'a str {
    str::from_utf8_unchecked(slice::from_raw_parts(ptr, len))
}

/// # Safety
/// `inst` must point to a live `Instance`; `(name, name_len)` must be a
/// constant-pool string of the calling compiled function.
pub unsafe extern "C" fn marq_set_float(
    inst: *mut Instance,
    name: *const u8,
    name_len: usize,
    value: f32,
) {
    (*inst).set(as_str(name, name_len), Value::Float(value));
}

/// # Safety
/// See [`marq_set_float`].
pub unsafe extern "C" fn marq_set_vec2(
    inst: *mut Instance,
    name: *const u8,
    name_len: usize,
    x: f32,
    y: f32,
) {
    (*inst).set(as_str(name, name_len), Value::Vec2([x, y]));
}

/// # Safety
/// See [`marq_set_float`].
pub unsafe extern "C" fn marq_set_box4(
    inst: *mut Instance,
    name: *const u8,
    name_len: usize,
    a: f32,
    b: f32,
    c: f32,
    d: f32,
) {
    (*inst).set(as_str(name, name_len), Value::Box4([a, b, c, d]));
}

/// Resolves the deferred color literal now, at population time. An
/// unresolvable literal leaves the member unset.
///
/// # Safety
/// See [`marq_set_float`]; `(literal, literal_len)` is a constant-pool
/// string as well.
pub unsafe extern "C" fn marq_set_color(
    inst: *mut Instance,
    name: *const u8,
    name_len: usize,
    literal: *const u8,
    literal_len: usize,
) {
    let member = as_str(name, name_len);
    let literal = as_str(literal, literal_len);
    match color::resolve(literal) {
        Some(rgba) => (*inst).set(member, Value::Color(rgba)),
        None => warn!(member, literal, "unresolvable color literal; member left unset"),
    }
}

/// # Safety
/// See [`marq_set_color`].
pub unsafe extern "C" fn marq_set_text(
    inst: *mut Instance,
    name: *const u8,
    name_len: usize,
    text: *const u8,
    text_len: usize,
) {
    (*inst).set(
        as_str(name, name_len),
        Value::Text(as_str(text, text_len).to_owned()),
    );
}

/// # Safety
/// `ctx` must point to the live `PopulateContext` of this populate call.
pub unsafe extern "C" fn marq_register_name(
    ctx: *mut PopulateContext,
    inst: *mut Instance,
    name: *const u8,
    name_len: usize,
) {
    let type_name = (*inst).type_name.clone();
    (*ctx).names.register(as_str(name, name_len), type_name);
}

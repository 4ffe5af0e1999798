// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Argument lowering, the C-ABI call itself, and return lifting.
//
// Under the C calling convention every integer-class argument (integers of
// any width, bool, pointers) travels in a general-purpose register and every
// double in a floating-point register. Lowering reduces each argument to one
// of those two slot kinds, sign- or zero-extended from its declared width,
// and the call is made through a function pointer of the matching shape.
// Returns come back as a full register and are narrowed to the declared
// type, since the callee leaves the upper bits unspecified.

use std::ffi::{CStr, CString, c_char};

use nativebridge_core::error::{BridgeError, Result};
use nativebridge_core::{Value, ValueType};
use nativebridge_loader::SymbolAddress;

/// One lowered argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Slot {
    Word(u64),
    Double(f64),
}

/// Register class of a return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReturnClass {
    Unit,
    Word,
    Double,
}

impl ReturnClass {
    pub(crate) fn of(ty: ValueType) -> Self {
        match ty {
            ValueType::Void => ReturnClass::Unit,
            ValueType::F64 => ReturnClass::Double,
            _ => ReturnClass::Word,
        }
    }
}

/// Raw register contents after a call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RawReturn {
    Unit,
    Word(u64),
    Double(f64),
}

/// Lowered arguments plus the C strings their pointers refer to.
pub(crate) struct Lowered {
    slots: Vec<Slot>,
    // Text arguments point into these; they must outlive the call.
    _texts: Vec<CString>,
}

impl Lowered {
    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

/// Lower already type-checked arguments. Fails only on text containing NUL,
/// before anything is called.
pub(crate) fn lower(function: &str, args: &[Value]) -> Result<Lowered> {
    let mut slots = Vec::with_capacity(args.len());
    let mut texts = Vec::new();

    for arg in args {
        let slot = match arg {
            Value::I8(v) => Slot::Word(i64::from(*v) as u64),
            Value::I16(v) => Slot::Word(i64::from(*v) as u64),
            Value::I32(v) => Slot::Word(i64::from(*v) as u64),
            Value::I64(v) => Slot::Word(*v as u64),
            Value::U8(v) => Slot::Word(u64::from(*v)),
            Value::U16(v) => Slot::Word(u64::from(*v)),
            Value::U32(v) => Slot::Word(u64::from(*v)),
            Value::U64(v) => Slot::Word(*v),
            Value::Bool(v) => Slot::Word(u64::from(*v)),
            Value::Handle(v) => Slot::Word(*v as u64),
            Value::F64(v) => Slot::Double(*v),
            Value::Text(s) => {
                let c = CString::new(s.as_str()).map_err(|e| BridgeError::Marshal {
                    function: function.to_owned(),
                    detail: format!("text argument contains NUL at byte {}", e.nul_position()),
                })?;
                let ptr = c.as_ptr() as usize as u64;
                texts.push(c);
                Slot::Word(ptr)
            }
            Value::Void => {
                return Err(BridgeError::Marshal {
                    function: function.to_owned(),
                    detail: "void is not a value that can be passed".into(),
                });
            }
        };
        slots.push(slot);
    }

    Ok(Lowered {
        slots,
        _texts: texts,
    })
}

/// Call `addr` with `slots`, reading the result from the register `ret`
/// selects. `None` when the slot shape has no dispatch arm, which descriptor
/// validation rules out.
///
/// # Safety
///
/// `addr` must be a function using the C calling convention whose
/// parameters, position by position, are integer-class where `slots` holds
/// `Word` and `double` where it holds `Double`, and whose return type belongs
/// to `ret`. Pointer arguments must be valid for whatever the callee does
/// with them.
pub(crate) unsafe fn call(addr: SymbolAddress, slots: &[Slot], ret: ReturnClass) -> Option<RawReturn> {
    // SAFETY: forwarded from the caller.
    unsafe {
        match ret {
            ReturnClass::Unit => call_as::<()>(addr, slots).map(|()| RawReturn::Unit),
            ReturnClass::Word => call_as::<u64>(addr, slots).map(RawReturn::Word),
            ReturnClass::Double => call_as::<f64>(addr, slots).map(RawReturn::Double),
        }
    }
}

unsafe fn call_as<R>(addr: SymbolAddress, slots: &[Slot]) -> Option<R> {
    use Slot::{Double as D, Word as W};

    let ptr = addr.as_ptr();

    macro_rules! invoke {
        ($($arg:ident : $ty:ty),*) => {{
            // SAFETY: the shape was chosen from the slots; the caller
            // guarantees the callee has this shape.
            unsafe {
                let f: unsafe extern "C" fn($($ty),*) -> R = std::mem::transmute_copy(&ptr);
                f($($arg),*)
            }
        }};
    }

    let result = match *slots {
        [] => invoke!(),

        [W(a)] => invoke!(a: u64),
        [D(a)] => invoke!(a: f64),

        [W(a), W(b)] => invoke!(a: u64, b: u64),
        [W(a), D(b)] => invoke!(a: u64, b: f64),
        [D(a), W(b)] => invoke!(a: f64, b: u64),
        [D(a), D(b)] => invoke!(a: f64, b: f64),

        [W(a), W(b), W(c)] => invoke!(a: u64, b: u64, c: u64),
        [W(a), W(b), D(c)] => invoke!(a: u64, b: u64, c: f64),
        [W(a), D(b), W(c)] => invoke!(a: u64, b: f64, c: u64),
        [W(a), D(b), D(c)] => invoke!(a: u64, b: f64, c: f64),
        [D(a), W(b), W(c)] => invoke!(a: f64, b: u64, c: u64),
        [D(a), W(b), D(c)] => invoke!(a: f64, b: u64, c: f64),
        [D(a), D(b), W(c)] => invoke!(a: f64, b: f64, c: u64),
        [D(a), D(b), D(c)] => invoke!(a: f64, b: f64, c: f64),

        [W(a), W(b), W(c), W(d)] => invoke!(a: u64, b: u64, c: u64, d: u64),
        [W(a), W(b), W(c), W(d), W(e)] => invoke!(a: u64, b: u64, c: u64, d: u64, e: u64),
        [W(a), W(b), W(c), W(d), W(e), W(g)] => {
            invoke!(a: u64, b: u64, c: u64, d: u64, e: u64, g: u64)
        }

        _ => return None,
    };
    Some(result)
}

/// Narrow a raw return to the declared non-text type.
pub(crate) fn lift(ty: ValueType, raw: RawReturn) -> Option<Value> {
    let value = match (ty, raw) {
        (ValueType::Void, RawReturn::Unit) => Value::Void,
        (ValueType::F64, RawReturn::Double(v)) => Value::F64(v),
        (ValueType::I8, RawReturn::Word(w)) => Value::I8(w as u8 as i8),
        (ValueType::I16, RawReturn::Word(w)) => Value::I16(w as u16 as i16),
        (ValueType::I32, RawReturn::Word(w)) => Value::I32(w as u32 as i32),
        (ValueType::I64, RawReturn::Word(w)) => Value::I64(w as i64),
        (ValueType::U8, RawReturn::Word(w)) => Value::U8(w as u8),
        (ValueType::U16, RawReturn::Word(w)) => Value::U16(w as u16),
        (ValueType::U32, RawReturn::Word(w)) => Value::U32(w as u32),
        (ValueType::U64, RawReturn::Word(w)) => Value::U64(w),
        (ValueType::Bool, RawReturn::Word(w)) => Value::Bool(w as u8 != 0),
        (ValueType::Handle, RawReturn::Word(w)) => Value::Handle(w as usize),
        _ => return None,
    };
    Some(value)
}

/// Copy a returned C string into an owned `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of this call.
pub(crate) unsafe fn copy_text(function: &str, ptr: *const c_char) -> Result<String> {
    if ptr.is_null() {
        return Err(BridgeError::Marshal {
            function: function.to_owned(),
            detail: "returned a null text pointer".into(),
        });
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    let text = unsafe { CStr::from_ptr(ptr) };
    text.to_str()
        .map(str::to_owned)
        .map_err(|e| BridgeError::Marshal {
            function: function.to_owned(),
            detail: format!("returned text that is not UTF-8: {e}"),
        })
}

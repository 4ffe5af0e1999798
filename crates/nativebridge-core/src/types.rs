// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: module names, load states, and the semantic value types
// that can cross the bridge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Logical name of a native module, e.g. `native-lib`.
///
/// Validated on construction: non-empty, no path separators, no whitespace.
/// The platform file name (`libnative-lib.so`) is derived by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| BridgeError::InvalidModuleName {
            name: name.clone(),
            reason: reason.to_owned(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name == "." || name == ".." {
            return Err(invalid("name is a directory reference"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')))
        {
            return Err(invalid(&format!("character {c:?} is not allowed")));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ModuleName {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ModuleName> for String {
    fn from(name: ModuleName) -> Self {
        name.0
    }
}

impl FromStr for ModuleName {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Lifecycle of a module handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Never requested, or a handle that exists only as a name.
    Unloaded,
    /// A load attempt is in flight.
    Loading,
    /// Mapped into the process; terminal.
    Loaded,
    /// The last attempt failed. Retried on the next request unless failures
    /// are cached.
    Failed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadState::Unloaded => "unloaded",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Semantic types that can appear in a bridge signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// No value. Only valid as a return type.
    Void,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F64,
    Bool,
    /// NUL-terminated UTF-8 (`const char*`).
    Text,
    /// Opaque pointer-sized value (`void*`).
    Handle,
}

impl ValueType {
    /// Passed in a general-purpose register under the C calling convention.
    pub fn is_integer_class(&self) -> bool {
        !matches!(self, ValueType::Void | ValueType::F64)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Void => "void",
            ValueType::I8 => "i8",
            ValueType::I16 => "i16",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::U8 => "u8",
            ValueType::U16 => "u16",
            ValueType::U32 => "u32",
            ValueType::U64 => "u64",
            ValueType::F64 => "f64",
            ValueType::Bool => "bool",
            ValueType::Text => "text",
            ValueType::Handle => "handle",
        };
        f.write_str(s)
    }
}

impl FromStr for ValueType {
    type Err = BridgeError;

    /// Accepts the canonical spelling plus the common C spellings.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let ty = match normalized.to_ascii_lowercase().as_str() {
            "void" => ValueType::Void,
            "i8" | "int8_t" | "signed char" => ValueType::I8,
            "i16" | "int16_t" | "short" => ValueType::I16,
            "i32" | "int32_t" | "int" => ValueType::I32,
            "i64" | "int64_t" | "long long" => ValueType::I64,
            "u8" | "uint8_t" | "unsigned char" => ValueType::U8,
            "u16" | "uint16_t" | "unsigned short" => ValueType::U16,
            "u32" | "uint32_t" | "unsigned" | "unsigned int" => ValueType::U32,
            "u64" | "uint64_t" | "unsigned long long" => ValueType::U64,
            "f64" | "double" => ValueType::F64,
            "bool" | "_bool" => ValueType::Bool,
            "text" | "char*" | "char *" | "const char*" | "const char *" => ValueType::Text,
            "handle" | "void*" | "void *" | "ptr" => ValueType::Handle,
            other => {
                return Err(BridgeError::InvalidSignature(format!(
                    "unknown type `{other}`"
                )));
            }
        };
        Ok(ty)
    }
}

/// A value crossing the bridge in either direction.
///
/// Returned values are owned by the caller; `Text` is always a fresh copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F64(f64),
    Bool(bool),
    Text(String),
    Handle(usize),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Void => ValueType::Void,
            Value::I8(_) => ValueType::I8,
            Value::I16(_) => ValueType::I16,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::U8(_) => ValueType::U8,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::F64(_) => ValueType::F64,
            Value::Bool(_) => ValueType::Bool,
            Value::Text(_) => ValueType::Text,
            Value::Handle(_) => ValueType::Handle,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

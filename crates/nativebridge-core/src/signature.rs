// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge function signatures and their C-style textual declarations.
//
// Declarations look like C prototypes: `text string_from_native()`,
// `i32 add(i32 a, i32 b)`, `const char* greet(const char* who)`. The same
// grammar is used by call sites and by the manifests modules export.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::types::ValueType;

/// Most parameters a bridge function may declare.
pub const MAX_PARAMS: usize = 6;

/// Parameter and return types of a bridge function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<ValueType>,
    pub ret: ValueType,
}

impl Signature {
    /// Build a signature, rejecting `void` parameters and excess arity.
    pub fn new(params: Vec<ValueType>, ret: ValueType) -> Result<Self> {
        if params.len() > MAX_PARAMS {
            return Err(BridgeError::InvalidSignature(format!(
                "{} parameters declared, at most {MAX_PARAMS} are supported",
                params.len()
            )));
        }
        if params.contains(&ValueType::Void) {
            return Err(BridgeError::InvalidSignature(
                "`void` is only valid as a return type".into(),
            ));
        }
        Ok(Self { params, ret })
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

/// A named signature: one line of a manifest or one call-site declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub signature: Signature,
}

impl Declaration {
    pub fn new(name: impl Into<String>, signature: Signature) -> Result<Self> {
        let name = name.into();
        if !is_symbol_name(&name) {
            return Err(BridgeError::InvalidSignature(format!(
                "`{name}` is not a valid symbol name"
            )));
        }
        Ok(Self { name, signature })
    }

    /// Parse a C-style prototype such as `text string_from_native()`.
    pub fn parse(decl: &str) -> Result<Self> {
        let invalid = |why: &str| BridgeError::InvalidSignature(format!("`{decl}`: {why}"));

        let decl_trimmed = decl.trim().trim_end_matches(';').trim_end();
        let open = decl_trimmed
            .find('(')
            .ok_or_else(|| invalid("missing parameter list"))?;
        if !decl_trimmed.ends_with(')') {
            return Err(invalid("parameter list is not closed"));
        }

        let head = decl_trimmed[..open].trim_end();
        let name_start = head
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .map_or(0, |i| i + 1);
        let name = &head[name_start..];
        let ret_text = head[..name_start].trim();
        if name.is_empty() {
            return Err(invalid("missing function name"));
        }
        if ret_text.is_empty() {
            return Err(invalid("missing return type"));
        }
        let ret = ret_text.parse::<ValueType>()?;

        let body = decl_trimmed[open + 1..decl_trimmed.len() - 1].trim();
        let mut params = Vec::new();
        if !body.is_empty() && body != "void" {
            for param in body.split(',') {
                params.push(parse_param(param.trim()).map_err(|e| match e {
                    BridgeError::InvalidSignature(why) => invalid(&why),
                    other => other,
                })?);
            }
        }

        Declaration::new(name, Signature::new(params, ret)?)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.signature.ret, self.name)?;
        for (i, param) in self.signature.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

impl FromStr for Declaration {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A parameter is a type, optionally followed by a parameter name.
fn parse_param(param: &str) -> Result<ValueType> {
    if param.is_empty() {
        return Err(BridgeError::InvalidSignature("empty parameter".into()));
    }
    if param == "..." {
        return Err(BridgeError::InvalidSignature(
            "variadic functions are not supported".into(),
        ));
    }
    if let Ok(ty) = param.parse::<ValueType>() {
        return Ok(ty);
    }
    // Drop a trailing parameter name: `i32 count`, `const char* who`.
    let split = param
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .map_or(0, |i| i + 1);
    if split == 0 {
        return param.parse::<ValueType>();
    }
    param[..split].trim().parse::<ValueType>()
}

/// C identifier rules; exported symbols never need anything else.
pub fn is_symbol_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

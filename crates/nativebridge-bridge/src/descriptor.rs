// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge function descriptors: which module, which export, which signature.

use std::fmt;

use nativebridge_core::error::{BridgeError, Result};
use nativebridge_core::signature::is_symbol_name;
use nativebridge_core::{Declaration, ModuleName, Signature, ValueType};

/// Parameters beyond this position must be integer-class.
pub const MAX_MIXED_PARAMS: usize = 3;

/// A declared native function, as the managed side sees it.
///
/// Construction validates the declaration and rejects shapes the marshaler
/// cannot call, so an invalid descriptor never reaches `invoke`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BridgeFunction {
    module: ModuleName,
    declaration: Declaration,
    release: Option<String>,
}

impl BridgeFunction {
    pub fn new(
        module: &str,
        name: &str,
        params: Vec<ValueType>,
        ret: ValueType,
    ) -> Result<Self> {
        let declaration = Declaration::new(name, Signature::new(params, ret)?)?;
        Self::from_declaration(ModuleName::new(module)?, declaration)
    }

    /// Build from a C-style prototype, e.g.
    /// `BridgeFunction::declare("native-lib", "text string_from_native()")`.
    pub fn declare(module: &str, declaration: &str) -> Result<Self> {
        Self::from_declaration(ModuleName::new(module)?, Declaration::parse(declaration)?)
    }

    pub fn from_declaration(module: ModuleName, declaration: Declaration) -> Result<Self> {
        check_callable(&declaration)?;
        Ok(Self {
            module,
            declaration,
            release: None,
        })
    }

    /// Text returned by this function was allocated by the module and must
    /// be handed back to `symbol` (a `void symbol(handle)` export) once
    /// copied. Without this the text is treated as module-owned and only
    /// copied.
    pub fn releasing_text_with(mut self, symbol: &str) -> Result<Self> {
        if self.declaration.signature.ret != ValueType::Text {
            return Err(BridgeError::InvalidSignature(format!(
                "`{}` does not return text; nothing to release",
                self.declaration
            )));
        }
        if !is_symbol_name(symbol) {
            return Err(BridgeError::InvalidSignature(format!(
                "`{symbol}` is not a valid symbol name"
            )));
        }
        self.release = Some(symbol.to_owned());
        Ok(self)
    }

    pub fn module(&self) -> &ModuleName {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn signature(&self) -> &Signature {
        &self.declaration.signature
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn release_symbol(&self) -> Option<&str> {
        self.release.as_deref()
    }
}

impl fmt::Display for BridgeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.declaration)
    }
}

/// Up to three parameters may mix integer and `f64` arguments; longer
/// lists must be all integer-class.
fn check_callable(declaration: &Declaration) -> Result<()> {
    let params = &declaration.signature.params;
    if params.len() > MAX_MIXED_PARAMS && params.iter().any(|p| !p.is_integer_class()) {
        return Err(BridgeError::InvalidSignature(format!(
            "`{declaration}`: f64 parameters are only supported in functions with at most \
             {MAX_MIXED_PARAMS} parameters"
        )));
    }
    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Modules linked into the executable.
//
// Some targets forbid loading code at runtime (iOS apps link their native
// code statically). A `StaticModule` gives such code the same name-based
// lookup a shared library has, so callers go through the same registry and
// adapter either way.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use nativebridge_core::ModuleName;
use nativebridge_core::error::{BridgeError, LoadCause, Result};

use crate::module::{ModuleOpener, NativeModule, SymbolAddress};

/// A named symbol table of in-process addresses.
#[derive(Debug, Clone)]
pub struct StaticModule {
    name: ModuleName,
    symbols: HashMap<String, SymbolAddress>,
}

impl StaticModule {
    pub fn new(name: ModuleName) -> Self {
        Self {
            name,
            symbols: HashMap::new(),
        }
    }

    /// Export `addr` under `symbol`, e.g.
    /// `.with_symbol("string_from_native", string_from_native as *const c_void)`.
    /// A null address is ignored.
    pub fn with_symbol(mut self, symbol: &str, addr: *const c_void) -> Self {
        match SymbolAddress::new(addr) {
            Some(addr) => {
                self.symbols.insert(symbol.to_owned(), addr);
            }
            None => warn!(module = %self.name, symbol, "ignoring null static symbol"),
        }
        self
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

impl NativeModule for StaticModule {
    fn name(&self) -> &ModuleName {
        &self.name
    }

    fn symbol(&self, symbol: &str) -> Result<SymbolAddress> {
        self.symbols
            .get(symbol)
            .copied()
            .ok_or_else(|| BridgeError::SymbolResolution {
                module: self.name.to_string(),
                symbol: symbol.to_owned(),
                detail: "not in the static symbol table".into(),
            })
    }
}

/// Opener over a set of registered static modules.
#[derive(Default)]
pub struct StaticOpener {
    modules: RwLock<HashMap<ModuleName, Arc<StaticModule>>>,
}

impl StaticOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `module` available under its name, replacing any earlier one
    /// that has not been opened yet.
    pub fn register(&self, module: StaticModule) {
        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        debug!(module = %module.name, symbols = module.symbols.len(), "registered static module");
        modules.insert(module.name.clone(), Arc::new(module));
    }

    pub fn with_module(self, module: StaticModule) -> Self {
        self.register(module);
        self
    }
}

impl ModuleOpener for StaticOpener {
    fn open(&self, name: &ModuleName) -> Result<Arc<dyn NativeModule>> {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        match modules.get(name) {
            Some(module) => Ok(Arc::clone(module) as Arc<dyn NativeModule>),
            None => Err(BridgeError::Load {
                name: name.to_string(),
                cause: LoadCause::NotFound { searched: vec![] },
            }),
        }
    }
}

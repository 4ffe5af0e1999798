// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native bridge loader: maps named native modules into the process exactly
// once and hands out shared handles to them.
//
// Opening goes through the `ModuleOpener` seam: `DylibOpener` for real
// shared libraries, `StaticOpener` for code linked into the executable.

pub mod background;
pub mod dylib;
pub mod module;
pub mod registry;
pub mod search;
pub mod static_module;

use std::sync::{Arc, OnceLock};

use nativebridge_core::BridgeConfig;
use nativebridge_core::error::Result;

pub use background::load_in_background;
pub use dylib::DylibOpener;
pub use module::{ModuleOpener, NativeModule, SymbolAddress};
pub use registry::{ModuleInfo, ModuleRegistry};
pub use search::{LibrarySearch, Located};
pub use static_module::{StaticModule, StaticOpener};

static GLOBAL: OnceLock<Arc<ModuleRegistry>> = OnceLock::new();

/// The process-wide registry, created on first use with the shared-library
/// opener and default configuration.
pub fn global() -> &'static Arc<ModuleRegistry> {
    GLOBAL.get_or_init(|| Arc::new(ModuleRegistry::from_config(&BridgeConfig::default())))
}

/// Install a configured registry as the process-wide one.
///
/// Returns the registry back if one was already installed (or created by an
/// earlier call to [`global`]).
pub fn install_global(registry: Arc<ModuleRegistry>) -> std::result::Result<(), Arc<ModuleRegistry>> {
    GLOBAL.set(registry)
}

/// Load trigger for static initializers: load `name` into the process-wide
/// registry, or return the cached success.
pub fn ensure_loaded(name: &str) -> Result<Arc<dyn NativeModule>> {
    global().ensure_loaded(name)
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The two seams of the loader: a loaded module that resolves symbols, and an
// opener that produces one from a logical name.

use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use nativebridge_core::ModuleName;
use nativebridge_core::error::Result;

/// Address of a resolved symbol inside a loaded module.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SymbolAddress(NonNull<c_void>);

// SAFETY: the address refers to code or static data of an image that stays
// mapped for the rest of the process; it carries no thread affinity.
unsafe impl Send for SymbolAddress {}
unsafe impl Sync for SymbolAddress {}

impl SymbolAddress {
    /// `None` for null.
    pub fn new(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr.cast_mut()).map(Self)
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr().cast_const()
    }
}

impl fmt::Debug for SymbolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolAddress({:p})", self.0)
    }
}

/// A module mapped into the process.
///
/// Implementations never unmap: a module lives until the process exits, so
/// every `SymbolAddress` it hands out stays valid.
pub trait NativeModule: Send + Sync {
    fn name(&self) -> &ModuleName;

    /// File the image was mapped from, when it came from disk.
    fn image_path(&self) -> Option<&Path> {
        None
    }

    /// Look up an exported symbol. Fails with
    /// `BridgeError::SymbolResolution` when the module does not export it.
    fn symbol(&self, symbol: &str) -> Result<SymbolAddress>;
}

/// Produces loaded modules from logical names.
///
/// Called by the registry at most once per attempt; implementations need not
/// deduplicate.
pub trait ModuleOpener: Send + Sync {
    fn open(&self, name: &ModuleName) -> Result<Arc<dyn NativeModule>>;
}

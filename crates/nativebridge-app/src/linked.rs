// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `native-lib` linked into the executable, for hosts that cannot (or choose
// not to) open shared libraries at runtime.

use std::ffi::c_void;

use nativebridge_core::ModuleName;
use nativebridge_core::error::Result;
use nativebridge_loader::{StaticModule, StaticOpener};

use crate::component::NATIVE_LIB;

/// The statically linked `native-lib` symbol table.
pub fn native_lib() -> Result<StaticModule> {
    Ok(StaticModule::new(ModuleName::new(NATIVE_LIB)?)
        .with_symbol(
            native_lib::STRING_FROM_NATIVE,
            native_lib::string_from_native as *const c_void,
        )
        .with_symbol(
            native_lib::FREE_TEXT,
            native_lib::nativebridge_free_text as *const c_void,
        )
        .with_symbol(
            nativebridge_core::MANIFEST_SYMBOL,
            native_lib::nativebridge_manifest as *const c_void,
        ))
}

/// An opener serving the linked `native-lib`.
pub fn opener() -> Result<StaticOpener> {
    Ok(StaticOpener::new().with_module(native_lib()?))
}

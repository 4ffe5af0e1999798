// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native bridge call adapter: makes a function exported by a loaded native
// module callable as a typed Rust method.
//
// A `BridgeFunction` names the module, the export and its declared
// signature. `BridgeAdapter::invoke` checks the call against that
// declaration and against the module's own export manifest, then crosses the
// C ABI and copies the result into an owned value.
//
// Calls pass every argument in a 64-bit register slot, so only 64-bit
// targets are supported.

#[cfg(not(target_pointer_width = "64"))]
compile_error!("nativebridge-bridge requires a 64-bit target");

pub mod adapter;
pub mod descriptor;
mod marshal;

pub use adapter::BridgeAdapter;
pub use descriptor::{BridgeFunction, MAX_MIXED_PARAMS};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native bridge: core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod manifest;
pub mod signature;
pub mod types;

pub use config::{BridgeConfig, SignaturePolicy};
pub use error::{BridgeError, LoadCause};
pub use manifest::{MANIFEST_SYMBOL, Manifest};
pub use signature::{Declaration, MAX_PARAMS, Signature};
pub use types::*;

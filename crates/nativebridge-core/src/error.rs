// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the native bridge.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a module failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadCause {
    /// No image was found under any candidate name.
    NotFound { searched: Vec<PathBuf> },
    /// The image was found but one of its own dependencies could not be
    /// satisfied (missing `DT_NEEDED` library, undefined symbol at bind time).
    UnsatisfiedDependency(String),
    /// The image exists but was built for another architecture or ABI.
    AbiMismatch(String),
    /// Anything else the system loader reported.
    Other(String),
}

impl fmt::Display for LoadCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadCause::NotFound { searched } if searched.is_empty() => {
                write!(f, "module not found")
            }
            LoadCause::NotFound { searched } => {
                write!(f, "module not found (searched ")?;
                for (i, path) in searched.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                write!(f, ")")
            }
            LoadCause::UnsatisfiedDependency(detail) => {
                write!(f, "unsatisfied link dependency: {detail}")
            }
            LoadCause::AbiMismatch(detail) => write!(f, "ABI/architecture mismatch: {detail}"),
            LoadCause::Other(detail) => write!(f, "{detail}"),
        }
    }
}

/// Top-level error type for all bridge operations.
///
/// `Clone` so that one load outcome can be handed to every thread that was
/// waiting on the same attempt.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    // -- Loader --
    #[error("invalid module name {name:?}: {reason}")]
    InvalidModuleName { name: String, reason: String },

    #[error("failed to load module `{name}`: {cause}")]
    Load { name: String, cause: LoadCause },

    // -- Adapter --
    #[error("module `{0}` is not loaded")]
    NotLoaded(String),

    #[error("cannot resolve symbol `{symbol}` in module `{module}`: {detail}")]
    SymbolResolution {
        module: String,
        symbol: String,
        detail: String,
    },

    #[error("signature mismatch for `{function}` (declared `{declared}`): {detail}")]
    SignatureMismatch {
        function: String,
        declared: String,
        detail: String,
    },

    #[error("cannot marshal value for `{function}`: {detail}")]
    Marshal { function: String, detail: String },

    #[error("invalid signature declaration: {0}")]
    InvalidSignature(String),

    // -- Configuration --
    #[error("configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Name of the module this error concerns, when there is one.
    pub fn module(&self) -> Option<&str> {
        match self {
            BridgeError::InvalidModuleName { name, .. } => Some(name),
            BridgeError::Load { name, .. } => Some(name),
            BridgeError::NotLoaded(name) => Some(name),
            BridgeError::SymbolResolution { module, .. } => Some(module),
            _ => None,
        }
    }

    /// True for the failure kinds raised by the loader.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::Load { .. } | BridgeError::InvalidModuleName { .. }
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

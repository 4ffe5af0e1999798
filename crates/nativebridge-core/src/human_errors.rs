// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the front-end.
//
// A failed bridge call must never crash the host; the component shows a
// placeholder instead. Every error maps to plain English with a suggestion,
// and a severity tells the front-end who can fix it.

use crate::error::{BridgeError, LoadCause};

/// Who can act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// May succeed on a later attempt without any change.
    Transient,
    /// The app package is missing or carries the wrong native image; fixed
    /// by a redeploy.
    Deployment,
    /// The managed declaration and the native export disagree; fixed by
    /// rebuilding one side.
    Integration,
    /// The integrating code called things in the wrong order.
    ProgrammingError,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What to try next.
    pub suggestion: String,
    /// Whether asking again may help.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    /// Text suitable for a display sink standing in for the real content.
    pub fn placeholder(&self) -> String {
        format!("[unavailable] {}", self.message)
    }
}

/// Convert a `BridgeError` into a `HumanError`.
pub fn humanize_error(err: &BridgeError) -> HumanError {
    match err {
        BridgeError::Load { name, cause } => humanize_load_cause(name, cause),

        BridgeError::InvalidModuleName { name, .. } => HumanError {
            message: format!("\"{name}\" is not a valid native module name."),
            suggestion: "Use the bare library name, e.g. \"native-lib\" for libnative-lib.so."
                .into(),
            retriable: false,
            severity: Severity::ProgrammingError,
        },

        BridgeError::NotLoaded(name) => HumanError {
            message: format!("The native module \"{name}\" was used before it was loaded."),
            suggestion: "Call ensure_loaded during start-up, before any bridge function runs."
                .into(),
            retriable: false,
            severity: Severity::ProgrammingError,
        },

        BridgeError::SymbolResolution { module, symbol, .. } => HumanError {
            message: format!("\"{module}\" does not provide the function \"{symbol}\"."),
            suggestion: "Check the exported name (and that it was not stripped), then rebuild the native library."
                .into(),
            retriable: false,
            severity: Severity::Integration,
        },

        BridgeError::SignatureMismatch { function, .. } => HumanError {
            message: format!("The app and the native library disagree about \"{function}\"."),
            suggestion: "Rebuild the app and the native library from the same version.".into(),
            retriable: false,
            severity: Severity::Integration,
        },

        BridgeError::Marshal { function, detail } => HumanError {
            message: format!("A value passed to or from \"{function}\" could not be converted."),
            suggestion: format!("Check the arguments. ({detail})"),
            retriable: false,
            severity: Severity::Integration,
        },

        BridgeError::InvalidSignature(detail) => HumanError {
            message: "A native function declaration could not be understood.".into(),
            suggestion: format!("Fix the declaration. ({detail})"),
            retriable: false,
            severity: Severity::ProgrammingError,
        },

        BridgeError::Config(detail) => HumanError {
            message: "The bridge settings could not be read.".into(),
            suggestion: format!("Fix or remove the configuration file. ({detail})"),
            retriable: false,
            severity: Severity::Deployment,
        },
    }
}

fn humanize_load_cause(name: &str, cause: &LoadCause) -> HumanError {
    match cause {
        LoadCause::NotFound { .. } => HumanError {
            message: format!("The native library \"{name}\" is missing from this installation."),
            suggestion: "Reinstall or redeploy the app so the library is packaged with it.".into(),
            retriable: true,
            severity: Severity::Deployment,
        },
        LoadCause::UnsatisfiedDependency(detail) => HumanError {
            message: format!("The native library \"{name}\" needs another library that is missing."),
            suggestion: format!("Package the missing dependency alongside it. ({detail})"),
            retriable: true,
            severity: Severity::Deployment,
        },
        LoadCause::AbiMismatch(detail) => HumanError {
            message: format!("The native library \"{name}\" was built for a different device type."),
            suggestion: format!("Build it for this CPU architecture and redeploy. ({detail})"),
            retriable: false,
            severity: Severity::Deployment,
        },
        LoadCause::Other(detail) => HumanError {
            message: format!("The native library \"{name}\" could not be started."),
            suggestion: format!("Try again; if it keeps failing, reinstall the app. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

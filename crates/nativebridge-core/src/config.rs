// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// How the adapter treats exports the module does not describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignaturePolicy {
    /// Every invoked function must appear in the module's manifest.
    #[default]
    Strict,
    /// Trust the call-site declaration when the module publishes no entry
    /// for the function. A manifest entry that disagrees still fails.
    Trusting,
}

/// Loader and adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Extra directories searched for module images, in order.
    pub search_paths: Vec<PathBuf>,
    /// Explicit image path (or system soname) per logical module name.
    pub module_paths: BTreeMap<String, PathBuf>,
    /// Also search `LD_LIBRARY_PATH` / `DYLD_LIBRARY_PATH` / `PATH`.
    pub use_system_search_paths: bool,
    /// Keep returning the first load failure instead of retrying.
    pub cache_failures: bool,
    /// Signature checking for invoked functions.
    pub signature_policy: SignaturePolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            module_paths: BTreeMap::new(),
            use_system_search_paths: true,
            cache_failures: false,
            signature_policy: SignaturePolicy::Strict,
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BridgeError::Config(format!("invalid JSON: {e}")))
    }

    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Write this configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BridgeError::Config(format!("cannot serialize: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| BridgeError::Config(format!("cannot write {}: {e}", path.display())))
    }

    /// Override the image location for one module.
    pub fn with_module_path(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.module_paths.insert(name.into(), path.into());
        self
    }

    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mapping logical module names to image files.
//
// `native-lib` becomes `libnative-lib.so` / `libnative-lib.dylib` /
// `native-lib.dll`. Cargo writes `-` as `_` in library file names, so the
// underscore spelling is always tried second.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use nativebridge_core::{BridgeConfig, ModuleName};

#[cfg(any(target_os = "macos", target_os = "ios"))]
const PREFIX: &str = "lib";
#[cfg(any(target_os = "macos", target_os = "ios"))]
const SUFFIX: &str = ".dylib";

#[cfg(windows)]
const PREFIX: &str = "";
#[cfg(windows)]
const SUFFIX: &str = ".dll";

#[cfg(not(any(target_os = "macos", target_os = "ios", windows)))]
const PREFIX: &str = "lib";
#[cfg(not(any(target_os = "macos", target_os = "ios", windows)))]
const SUFFIX: &str = ".so";

/// Where an image for a module is, or where we looked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Explicit path from configuration, used as given (it may be a bare
    /// soname such as `libc.so.6` for the system loader to resolve).
    Override(PathBuf),
    /// First existing candidate in the search directories.
    Found(PathBuf),
    /// Nothing on disk; `fallbacks` are bare file names the system loader
    /// may still resolve through its own search path.
    Missing {
        searched: Vec<PathBuf>,
        fallbacks: Vec<String>,
    },
}

/// Ordered search directories plus per-module overrides.
#[derive(Debug, Clone, Default)]
pub struct LibrarySearch {
    dirs: Vec<PathBuf>,
    overrides: BTreeMap<String, PathBuf>,
}

impl LibrarySearch {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            overrides: BTreeMap::new(),
        }
    }

    /// Configured directories, then the executable's directory, then the
    /// platform library path variable when enabled.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let mut dirs = config.search_paths.clone();
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            dirs.push(exe_dir);
        }
        if config.use_system_search_paths {
            dirs.extend(system_search_paths());
        }
        // First occurrence wins; later repeats would only be searched again.
        let mut seen = HashSet::new();
        dirs.retain(|dir| seen.insert(dir.clone()));

        Self {
            dirs,
            overrides: config.module_paths.clone(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn add_override(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.overrides.insert(name.into(), path.into());
    }

    pub fn locate(&self, name: &ModuleName) -> Located {
        if let Some(path) = self.overrides.get(name.as_str()) {
            return Located::Override(path.clone());
        }

        let file_names = candidate_file_names(name);
        let mut searched = Vec::new();
        for dir in &self.dirs {
            for file_name in &file_names {
                let path = dir.join(file_name);
                if path.is_file() {
                    return Located::Found(path);
                }
                searched.push(path);
            }
        }

        Located::Missing {
            searched,
            fallbacks: file_names,
        }
    }
}

/// Platform file names a logical name may be stored under, most specific
/// first.
pub fn candidate_file_names(name: &ModuleName) -> Vec<String> {
    let name = name.as_str();
    if name.starts_with(PREFIX) && name.ends_with(SUFFIX) && name.len() > SUFFIX.len() {
        return vec![name.to_owned()];
    }

    let mut names = vec![format!("{PREFIX}{name}{SUFFIX}")];
    if name.contains('-') {
        names.push(format!("{PREFIX}{}{SUFFIX}", name.replace('-', "_")));
    }
    names
}

fn system_search_paths() -> Vec<PathBuf> {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    const VAR: &str = "DYLD_LIBRARY_PATH";
    #[cfg(windows)]
    const VAR: &str = "PATH";
    #[cfg(not(any(target_os = "macos", target_os = "ios", windows)))]
    const VAR: &str = "LD_LIBRARY_PATH";

    std::env::var_os(VAR)
        .map(|value| {
            std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

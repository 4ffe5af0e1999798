// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared-library opener backed by `libloading`.
//
// The system loader reports failures as free text (`dlerror`, `LoadLibrary`
// messages). They are classified into not-found, unsatisfied dependency and
// ABI mismatch by matching the wording each platform uses.

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::{debug, info};

use nativebridge_core::error::{BridgeError, LoadCause, Result};
use nativebridge_core::{BridgeConfig, ModuleName};

use crate::module::{ModuleOpener, NativeModule, SymbolAddress};
use crate::search::{LibrarySearch, Located};

/// Opens modules as shared libraries found through a [`LibrarySearch`].
pub struct DylibOpener {
    search: LibrarySearch,
}

impl DylibOpener {
    pub fn new(search: LibrarySearch) -> Self {
        Self { search }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(LibrarySearch::from_config(config))
    }
}

impl ModuleOpener for DylibOpener {
    fn open(&self, name: &ModuleName) -> Result<Arc<dyn NativeModule>> {
        match self.search.locate(name) {
            Located::Override(path) | Located::Found(path) => {
                let module = DylibModule::open(name, &path)?;
                Ok(Arc::new(module))
            }
            Located::Missing {
                searched,
                fallbacks,
            } => {
                // Let the system loader try its own search path (Android's
                // per-app library directory, the ldconfig cache, ...).
                let mut last_cause = None;
                for file_name in fallbacks {
                    debug!(module = %name, file = %file_name, "trying system loader search");
                    match DylibModule::open(name, Path::new(&file_name)) {
                        Ok(module) => return Ok(Arc::new(module)),
                        Err(BridgeError::Load {
                            cause: LoadCause::NotFound { .. },
                            ..
                        }) => continue,
                        Err(other) => last_cause = Some(other),
                    }
                }
                Err(last_cause.unwrap_or_else(|| BridgeError::Load {
                    name: name.to_string(),
                    cause: LoadCause::NotFound { searched },
                }))
            }
        }
    }
}

/// A shared library mapped with `dlopen`/`LoadLibrary`.
pub struct DylibModule {
    name: ModuleName,
    path: PathBuf,
    library: Library,
}

impl DylibModule {
    pub fn open(name: &ModuleName, path: &Path) -> Result<Self> {
        // SAFETY: loading runs the image's initializers. Which images are
        // loaded is decided by the application's configuration and search
        // path; the bridge cannot vet their contents.
        let library = unsafe { Library::new(path) }.map_err(|e| BridgeError::Load {
            name: name.to_string(),
            cause: classify_load_error(path, &e.to_string()),
        })?;

        info!(module = %name, path = %path.display(), "mapped native module");
        Ok(Self {
            name: name.clone(),
            path: path.to_path_buf(),
            library,
        })
    }
}

impl NativeModule for DylibModule {
    fn name(&self) -> &ModuleName {
        &self.name
    }

    fn image_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn symbol(&self, symbol: &str) -> Result<SymbolAddress> {
        let unresolved = |detail: String| BridgeError::SymbolResolution {
            module: self.name.to_string(),
            symbol: symbol.to_owned(),
            detail,
        };

        if symbol.is_empty() || symbol.contains('\0') {
            return Err(unresolved("not a valid symbol name".into()));
        }

        // SAFETY: the symbol is read as an untyped address; nothing is called
        // or dereferenced here. Typing happens in the adapter against a
        // checked signature.
        let raw: *const c_void = unsafe {
            let sym = self
                .library
                .get::<*const c_void>(symbol.as_bytes())
                .map_err(|e| unresolved(e.to_string()))?;
            *sym
        };

        SymbolAddress::new(raw).ok_or_else(|| unresolved("symbol resolves to null".into()))
    }
}

/// Sort a loader message into a [`LoadCause`].
///
/// `target` is what was handed to the loader. A "cannot open" message that
/// names some other file means a dependency of the target is missing.
pub fn classify_load_error(target: &Path, message: &str) -> LoadCause {
    let lower = message.to_ascii_lowercase();

    if lower.contains("wrong elf class")
        || lower.contains("invalid elf header")
        || lower.contains("file too short")
        || lower.contains("elf file's phentsize")
        || lower.contains("wrong architecture")
        || lower.contains("incompatible architecture")
        || lower.contains("not a mach-o file")
        || lower.contains("not a valid win32 application")
        || lower.contains("os error 193")
    {
        return LoadCause::AbiMismatch(message.to_owned());
    }

    if lower.contains("undefined symbol")
        || lower.contains("symbol not found")
        || lower.contains("library not loaded")
        || lower.contains("procedure could not be located")
        || lower.contains("os error 127")
    {
        return LoadCause::UnsatisfiedDependency(message.to_owned());
    }

    if lower.contains("no such file")
        || lower.contains("cannot open shared object")
        || lower.contains("image not found")
        || lower.contains("could not be found")
        || lower.contains("os error 126")
    {
        let target_text = target.to_string_lossy();
        let file_name = target
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| target_text.clone().into_owned());
        // glibc and bionic prefix the message with the file they failed on.
        let names_other_file = lower.contains("cannot open shared object")
            && !message.starts_with(target_text.as_ref())
            && !message.starts_with(&file_name);
        if names_other_file {
            return LoadCause::UnsatisfiedDependency(message.to_owned());
        }
        return LoadCause::NotFound {
            searched: vec![target.to_path_buf()],
        };
    }

    LoadCause::Other(message.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_missing_target() {
        let target = Path::new("/opt/app/libnative-lib.so");
        let cause = classify_load_error(
            target,
            "/opt/app/libnative-lib.so: cannot open shared object file: No such file or directory",
        );
        assert_eq!(
            cause,
            LoadCause::NotFound {
                searched: vec![target.to_path_buf()]
            }
        );
    }

    #[test]
    fn classifies_missing_dependency() {
        let cause = classify_load_error(
            Path::new("/opt/app/libnative-lib.so"),
            "libc++_shared.so: cannot open shared object file: No such file or directory",
        );
        assert!(matches!(cause, LoadCause::UnsatisfiedDependency(_)));

        let cause = classify_load_error(
            Path::new("/opt/app/libnative-lib.so"),
            "/opt/app/libnative-lib.so: undefined symbol: __cxa_thread_atexit_impl",
        );
        assert!(matches!(cause, LoadCause::UnsatisfiedDependency(_)));
    }

    #[test]
    fn classifies_wrong_architecture() {
        let cause = classify_load_error(
            Path::new("libnative-lib.so"),
            "libnative-lib.so: wrong ELF class: ELFCLASS32",
        );
        assert!(matches!(cause, LoadCause::AbiMismatch(_)));

        let cause = classify_load_error(
            Path::new("libnative-lib.dylib"),
            "dlopen(libnative-lib.dylib, 5): mach-o file, but is an incompatible architecture",
        );
        assert!(matches!(cause, LoadCause::AbiMismatch(_)));
    }

    #[test]
    fn unknown_messages_are_kept_verbatim() {
        let cause = classify_load_error(Path::new("x"), "initializer aborted");
        assert_eq!(cause, LoadCause::Other("initializer aborted".into()));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared-library opener against real files.

use std::sync::Arc;

use nativebridge_core::error::{BridgeError, LoadCause};
use nativebridge_core::{BridgeConfig, LoadState};
use nativebridge_loader::{DylibOpener, LibrarySearch, ModuleRegistry};

fn isolated_config(dir: &std::path::Path) -> BridgeConfig {
    BridgeConfig {
        use_system_search_paths: false,
        ..BridgeConfig::default()
    }
    .with_search_path(dir)
}

#[test]
fn missing_library_is_not_found_and_lists_search_paths() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModuleRegistry::from_config(&isolated_config(dir.path()));

    for _ in 0..2 {
        match registry.ensure_loaded("nativebridge-missing-module") {
            Err(BridgeError::Load {
                cause: LoadCause::NotFound { searched },
                ..
            }) => {
                assert!(searched.iter().any(|p| p.starts_with(dir.path())));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("nonexistent module loaded"),
        }
    }
    assert_eq!(
        registry.state("nativebridge-missing-module"),
        LoadState::Failed
    );
    assert_eq!(registry.modules()[0].attempts, 2);
}

#[cfg(target_os = "linux")]
#[test]
fn garbage_image_is_an_abi_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("libbroken.so"),
        "this is a text file pretending to be a shared object, long enough to have a header"
            .repeat(4),
    )
    .unwrap();

    let registry = ModuleRegistry::from_config(&isolated_config(dir.path()));
    match registry.ensure_loaded("broken") {
        Err(BridgeError::Load {
            cause: LoadCause::AbiMismatch(detail),
            ..
        }) => assert!(!detail.is_empty()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("garbage image loaded"),
    }
}

#[cfg(target_os = "linux")]
#[test]
fn system_library_loads_through_an_override() {
    let mut search = LibrarySearch::default();
    search.add_override("c", "libc.so.6");
    let registry = ModuleRegistry::new(Arc::new(DylibOpener::new(search)));

    let module = registry.ensure_loaded("c").unwrap();
    assert!(module.symbol("getpid").is_ok());

    match module.symbol("nativebridge_definitely_not_exported") {
        Err(BridgeError::SymbolResolution { module, symbol, .. }) => {
            assert_eq!(module, "c");
            assert_eq!(symbol, "nativebridge_definitely_not_exported");
        }
        other => panic!("unexpected lookup result: {:?}", other.map(|a| a.as_ptr())),
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `native-lib` opened as a shared library from the build's output
// directories, the way a host without the linked copy reaches it.

#![cfg(target_os = "linux")]

use std::path::PathBuf;
use std::sync::Arc;

use nativebridge_bridge::{BridgeAdapter, BridgeFunction};
use nativebridge_core::{BridgeConfig, LoadState, SignaturePolicy};
use nativebridge_loader::{DylibOpener, LibrarySearch, ModuleRegistry};

/// `target/<profile>/deps` (where this test binary lives) and its parent.
/// The `native-lib` cdylib is written to both.
fn build_output_dirs() -> Vec<PathBuf> {
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap().to_path_buf();
    let profile = deps.parent().unwrap().to_path_buf();
    vec![profile, deps]
}

fn search_config() -> BridgeConfig {
    let mut config = BridgeConfig {
        use_system_search_paths: false,
        ..BridgeConfig::default()
    };
    for dir in build_output_dirs() {
        config = config.with_search_path(dir);
    }
    config
}

#[test]
fn opens_native_lib_from_the_build_directory() {
    let search = LibrarySearch::from_config(&search_config());
    let registry = Arc::new(ModuleRegistry::new(Arc::new(DylibOpener::new(search))));

    registry.ensure_loaded("native-lib").unwrap();
    assert_eq!(registry.state("native-lib"), LoadState::Loaded);

    let info = &registry.modules()[0];
    let image = info.image_path.as_ref().unwrap();
    assert_eq!(image.file_name().unwrap(), "libnative_lib.so");
    assert_eq!(info.attempts, 1);
}

#[test]
fn greeting_crosses_the_real_library_boundary() {
    let registry = Arc::new(ModuleRegistry::from_config(&search_config()));
    registry.ensure_loaded("native-lib").unwrap();

    // Strict: the declaration must agree with the library's own manifest.
    let adapter = BridgeAdapter::new(registry).with_policy(SignaturePolicy::Strict);
    let greeting = BridgeFunction::declare("native-lib", "text string_from_native()")
        .unwrap()
        .releasing_text_with(native_lib::FREE_TEXT)
        .unwrap();

    assert_eq!(adapter.invoke_text(&greeting).unwrap(), native_lib::GREETING);
    assert_eq!(adapter.invoke_text(&greeting).unwrap(), "Hello from native code");
}

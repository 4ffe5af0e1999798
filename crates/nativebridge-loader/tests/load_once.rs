// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Load-once behaviour of the module registry, observed through a counting
// opener.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use nativebridge_core::error::{BridgeError, LoadCause, Result};
use nativebridge_core::{LoadState, ModuleName};
use nativebridge_loader::{ModuleOpener, ModuleRegistry, NativeModule, StaticModule, StaticOpener};

/// Counts calls and optionally stalls to widen race windows.
struct CountingOpener {
    opens: AtomicUsize,
    delay: Duration,
    inner: StaticOpener,
}

impl CountingOpener {
    fn new(delay: Duration) -> Self {
        Self {
            opens: AtomicUsize::new(0),
            delay,
            inner: StaticOpener::new()
                .with_module(StaticModule::new(ModuleName::new("native-lib").unwrap())),
        }
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ModuleOpener for CountingOpener {
    fn open(&self, name: &ModuleName) -> Result<Arc<dyn NativeModule>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.inner.open(name)
    }
}

#[test]
fn second_call_reuses_the_first_load() {
    let opener = Arc::new(CountingOpener::new(Duration::ZERO));
    let registry = ModuleRegistry::new(opener.clone());

    let first = registry.ensure_loaded("native-lib").unwrap();
    let second = registry.ensure_loaded("native-lib").unwrap();

    assert_eq!(opener.opens(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.state("native-lib"), LoadState::Loaded);
}

#[test]
fn concurrent_callers_share_one_successful_load() {
    let opener = Arc::new(CountingOpener::new(Duration::from_millis(50)));
    let registry = Arc::new(ModuleRegistry::new(opener.clone()));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.ensure_loaded("native-lib").is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(opener.opens(), 1);
}

#[test]
fn concurrent_callers_share_one_failed_load() {
    let opener = Arc::new(CountingOpener::new(Duration::from_millis(200)));
    let registry = Arc::new(ModuleRegistry::new(opener.clone()));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.ensure_loaded("missing-lib").err().map(|e| e.to_string())
            })
        })
        .collect();

    let messages: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().expect("load should fail"))
        .collect();

    // Every caller saw the same failure; the long stall keeps all of them
    // inside the single in-flight attempt.
    assert!(messages.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(opener.opens(), 1);
    assert_eq!(registry.state("missing-lib"), LoadState::Failed);
}

#[test]
fn missing_module_fails_every_time_and_is_retried() {
    let opener = Arc::new(CountingOpener::new(Duration::ZERO));
    let registry = ModuleRegistry::new(opener.clone());

    for attempt in 1..=3 {
        match registry.ensure_loaded("missing-lib") {
            Err(BridgeError::Load { name, cause }) => {
                assert_eq!(name, "missing-lib");
                assert!(matches!(cause, LoadCause::NotFound { .. }));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("missing module loaded"),
        }
        assert_ne!(registry.state("missing-lib"), LoadState::Loaded);
        assert_eq!(opener.opens(), attempt);
    }
}

#[test]
fn cached_failures_open_once() {
    let opener = Arc::new(CountingOpener::new(Duration::ZERO));
    let registry = ModuleRegistry::new(opener.clone()).with_cached_failures(true);
    assert!(registry.caches_failures());

    assert!(registry.ensure_loaded("missing-lib").is_err());
    assert!(registry.ensure_loaded("missing-lib").is_err());
    assert_eq!(opener.opens(), 1);
}

#[test]
fn names_are_tracked_independently() {
    let opener = Arc::new(CountingOpener::new(Duration::ZERO));
    let registry = ModuleRegistry::new(opener.clone());

    registry.ensure_loaded("native-lib").unwrap();
    let _ = registry.ensure_loaded("missing-lib");

    let modules = registry.modules();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].name.as_str(), "missing-lib");
    assert_eq!(modules[0].state, LoadState::Failed);
    assert_eq!(modules[1].name.as_str(), "native-lib");
    assert_eq!(modules[1].state, LoadState::Loaded);
    assert_eq!(registry.state("never-requested"), LoadState::Unloaded);
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Module registry with a one-shot load barrier per module name.
//
// Each name owns a handle guarded by its own mutex. The first caller to find
// a handle unloaded (or failed, when failures are not cached) becomes the
// leader: it marks the handle `Loading`, releases the lock and opens the
// module. Callers that arrive meanwhile wait on that attempt and receive its
// outcome, so one attempt produces one result for everyone who asked during
// it. Success is terminal; modules are never unloaded.

use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use nativebridge_core::error::{BridgeError, LoadCause, Result};
use nativebridge_core::{BridgeConfig, LoadState, ModuleName};

use crate::dylib::DylibOpener;
use crate::module::{ModuleOpener, NativeModule};

type Outcome = Result<Arc<dyn NativeModule>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One in-flight load. Waiters block here until the leader publishes.
#[derive(Default)]
struct Attempt {
    outcome: Mutex<Option<Outcome>>,
    done: Condvar,
}

impl Attempt {
    fn publish(&self, outcome: Outcome) {
        *lock(&self.outcome) = Some(outcome);
        self.done.notify_all();
    }

    fn wait(&self) -> Outcome {
        let mut slot = lock(&self.outcome);
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self.done.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

enum Phase {
    Unloaded,
    Loading(Arc<Attempt>),
    Loaded(Arc<dyn NativeModule>),
    Failed(BridgeError),
}

struct HandleState {
    phase: Phase,
    attempts: u32,
    loaded_at: Option<DateTime<Utc>>,
}

/// Load state of one logical module name.
struct ModuleHandle {
    name: ModuleName,
    state: Mutex<HandleState>,
}

impl ModuleHandle {
    fn new(name: ModuleName) -> Self {
        Self {
            name,
            state: Mutex::new(HandleState {
                phase: Phase::Unloaded,
                attempts: 0,
                loaded_at: None,
            }),
        }
    }

    fn info(&self) -> ModuleInfo {
        let state = lock(&self.state);
        let (load_state, image_path, last_error) = match &state.phase {
            Phase::Unloaded => (LoadState::Unloaded, None, None),
            Phase::Loading(_) => (LoadState::Loading, None, None),
            Phase::Loaded(module) => (
                LoadState::Loaded,
                module.image_path().map(|p| p.to_path_buf()),
                None,
            ),
            Phase::Failed(err) => (LoadState::Failed, None, Some(err.to_string())),
        };
        ModuleInfo {
            name: self.name.clone(),
            state: load_state,
            image_path,
            attempts: state.attempts,
            loaded_at: state.loaded_at,
            last_error,
        }
    }
}

/// Snapshot of a module handle, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub name: ModuleName,
    pub state: LoadState,
    pub image_path: Option<PathBuf>,
    pub attempts: u32,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

enum Role {
    Leader(Arc<Attempt>, u32),
    Waiter(Arc<Attempt>),
}

/// Registry of module handles, at most one per logical name.
pub struct ModuleRegistry {
    opener: Arc<dyn ModuleOpener>,
    cache_failures: bool,
    handles: Mutex<HashMap<ModuleName, Arc<ModuleHandle>>>,
}

impl ModuleRegistry {
    /// Registry over `opener`; failed loads are retried on the next request.
    pub fn new(opener: Arc<dyn ModuleOpener>) -> Self {
        Self {
            opener,
            cache_failures: false,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Shared-library registry configured from `config`.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(Arc::new(DylibOpener::from_config(config)))
            .with_cached_failures(config.cache_failures)
    }

    /// Keep returning the first failure for a name instead of retrying.
    pub fn with_cached_failures(mut self, cache: bool) -> Self {
        self.cache_failures = cache;
        self
    }

    pub fn caches_failures(&self) -> bool {
        self.cache_failures
    }

    fn handle(&self, name: &ModuleName) -> Arc<ModuleHandle> {
        let mut handles = lock(&self.handles);
        Arc::clone(
            handles
                .entry(name.clone())
                .or_insert_with(|| Arc::new(ModuleHandle::new(name.clone()))),
        )
    }

    /// Load `name` once, or return the module loaded earlier.
    ///
    /// Blocks while another thread's attempt for the same name is in flight
    /// and then returns that attempt's outcome.
    pub fn ensure_loaded(&self, name: &str) -> Result<Arc<dyn NativeModule>> {
        let name = ModuleName::new(name)?;
        let handle = self.handle(&name);

        let role = {
            let mut state = lock(&handle.state);
            match &state.phase {
                Phase::Loaded(module) => {
                    debug!(module = %name, "native module already loaded");
                    return Ok(Arc::clone(module));
                }
                Phase::Failed(err) if self.cache_failures => {
                    debug!(module = %name, "returning cached load failure");
                    return Err(err.clone());
                }
                Phase::Loading(attempt) => Role::Waiter(Arc::clone(attempt)),
                Phase::Unloaded | Phase::Failed(_) => {
                    let attempt = Arc::new(Attempt::default());
                    state.phase = Phase::Loading(Arc::clone(&attempt));
                    state.attempts += 1;
                    Role::Leader(attempt, state.attempts)
                }
            }
        };

        match role {
            Role::Waiter(attempt) => {
                debug!(module = %name, "waiting for in-flight load");
                attempt.wait()
            }
            Role::Leader(attempt, number) => {
                info!(module = %name, attempt = number, "loading native module");
                let outcome = self.open_guarded(&name);

                {
                    let mut state = lock(&handle.state);
                    match &outcome {
                        Ok(module) => {
                            state.phase = Phase::Loaded(Arc::clone(module));
                            state.loaded_at = Some(Utc::now());
                        }
                        Err(err) => {
                            warn!(module = %name, attempt = number, error = %err, "native module failed to load");
                            state.phase = Phase::Failed(err.clone());
                        }
                    }
                }
                attempt.publish(outcome.clone());
                outcome
            }
        }
    }

    /// A panicking opener must not strand the waiters of its attempt.
    fn open_guarded(&self, name: &ModuleName) -> Outcome {
        catch_unwind(AssertUnwindSafe(|| self.opener.open(name))).unwrap_or_else(|_| {
            Err(BridgeError::Load {
                name: name.to_string(),
                cause: LoadCause::Other("module opener panicked".into()),
            })
        })
    }

    /// The loaded module for `name`, if its load has succeeded.
    pub fn get(&self, name: &str) -> Option<Arc<dyn NativeModule>> {
        let name = ModuleName::new(name).ok()?;
        let handle = lock(&self.handles).get(&name).cloned()?;
        let state = lock(&handle.state);
        match &state.phase {
            Phase::Loaded(module) => Some(Arc::clone(module)),
            _ => None,
        }
    }

    /// Current state of `name`; names never requested are `Unloaded`.
    pub fn state(&self, name: &str) -> LoadState {
        let Ok(name) = ModuleName::new(name) else {
            return LoadState::Unloaded;
        };
        let handle = lock(&self.handles).get(&name).cloned();
        handle.map_or(LoadState::Unloaded, |h| h.info().state)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.state(name) == LoadState::Loaded
    }

    /// Snapshots of every handle, ordered by name.
    pub fn modules(&self) -> Vec<ModuleInfo> {
        let handles: BTreeMap<ModuleName, Arc<ModuleHandle>> = lock(&self.handles)
            .iter()
            .map(|(name, handle)| (name.clone(), Arc::clone(handle)))
            .collect();
        handles.values().map(|handle| handle.info()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_module::{StaticModule, StaticOpener};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct PanickingOpener;

    impl ModuleOpener for PanickingOpener {
        fn open(&self, _name: &ModuleName) -> Result<Arc<dyn NativeModule>> {
            panic!("initializer blew up");
        }
    }

    struct FlakyOpener {
        calls: AtomicUsize,
        inner: StaticOpener,
    }

    impl ModuleOpener for FlakyOpener {
        fn open(&self, name: &ModuleName) -> Result<Arc<dyn NativeModule>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(BridgeError::Load {
                    name: name.to_string(),
                    cause: LoadCause::Other("transient packaging issue".into()),
                });
            }
            self.inner.open(name)
        }
    }

    fn flaky() -> FlakyOpener {
        FlakyOpener {
            calls: AtomicUsize::new(0),
            inner: StaticOpener::new()
                .with_module(StaticModule::new(ModuleName::new("native-lib").unwrap())),
        }
    }

    #[test]
    fn invalid_names_never_reach_the_opener() {
        let registry = ModuleRegistry::new(Arc::new(PanickingOpener));
        let err = registry.ensure_loaded("../evil").err().unwrap();
        assert!(matches!(err, BridgeError::InvalidModuleName { .. }));
        assert!(registry.modules().is_empty());
    }

    #[test]
    fn panicking_opener_becomes_a_load_error() {
        let registry = ModuleRegistry::new(Arc::new(PanickingOpener));
        let err = registry.ensure_loaded("native-lib").err().unwrap();
        assert!(matches!(
            err,
            BridgeError::Load {
                cause: LoadCause::Other(_),
                ..
            }
        ));
        assert_eq!(registry.state("native-lib"), LoadState::Failed);
    }

    #[test]
    fn failure_is_retried_and_can_recover() {
        let registry = ModuleRegistry::new(Arc::new(flaky()));
        assert!(registry.ensure_loaded("native-lib").is_err());
        assert_eq!(registry.state("native-lib"), LoadState::Failed);

        assert!(registry.ensure_loaded("native-lib").is_ok());
        assert!(registry.is_loaded("native-lib"));

        let info = &registry.modules()[0];
        assert_eq!(info.attempts, 2);
        assert!(info.loaded_at.is_some());
        assert!(info.last_error.is_none());
    }

    #[test]
    fn cached_failure_is_sticky() {
        let registry = ModuleRegistry::new(Arc::new(flaky())).with_cached_failures(true);
        assert!(registry.ensure_loaded("native-lib").is_err());
        assert!(registry.ensure_loaded("native-lib").is_err());

        let info = &registry.modules()[0];
        assert_eq!(info.attempts, 1);
        assert_eq!(info.state, LoadState::Failed);
        assert!(info.last_error.as_deref().unwrap().contains("transient"));
    }

    #[test]
    fn get_only_returns_loaded_modules() {
        let registry = ModuleRegistry::new(Arc::new(flaky()));
        assert!(registry.get("native-lib").is_none());
        let _ = registry.ensure_loaded("native-lib");
        assert!(registry.get("native-lib").is_none());
        registry.ensure_loaded("native-lib").unwrap();
        assert!(registry.get("native-lib").is_some());
        assert!(registry.get("not a name").is_none());
    }

    #[test]
    fn info_serializes_for_diagnostics() {
        let registry = ModuleRegistry::new(Arc::new(flaky()));
        let _ = registry.ensure_loaded("native-lib");
        let json = serde_json::to_string(&registry.modules()).unwrap();
        assert!(json.contains("\"state\":\"failed\""));
        assert!(json.contains("\"name\":\"native-lib\""));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading off the controlling thread.
//
// Mapping an image is disk I/O. A front-end that must not block its UI
// thread hands the load to tokio's blocking pool and awaits the same outcome
// `ensure_loaded` would have produced.

use std::sync::Arc;

use nativebridge_core::error::{BridgeError, LoadCause, Result};

use crate::module::NativeModule;
use crate::registry::ModuleRegistry;

/// Run `registry.ensure_loaded(name)` on the blocking pool.
///
/// Shares the registry's load barrier: a background load and a foreground
/// `ensure_loaded` for the same name still produce a single load.
pub async fn load_in_background(
    registry: Arc<ModuleRegistry>,
    name: impl Into<String>,
) -> Result<Arc<dyn NativeModule>> {
    let name = name.into();
    let task_name = name.clone();
    tokio::task::spawn_blocking(move || registry.ensure_loaded(&task_name))
        .await
        .map_err(|e| BridgeError::Load {
            name,
            cause: LoadCause::Other(format!("background load task failed: {e}")),
        })?
}

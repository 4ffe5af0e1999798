// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// nativebridge demo host.
//
// Plays the part of an application framework: initializes logging and the
// process-wide module registry, runs the greeting component's class
// initialization, creates one instance and lets it display its text.

mod component;
mod display;
mod linked;
mod options;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use nativebridge_bridge::BridgeAdapter;
use nativebridge_core::BridgeConfig;
use nativebridge_core::error::Result;
use nativebridge_loader::ModuleRegistry;

use component::GreetingComponent;
use display::LineDisplay;
use options::Options;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Options::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "nativebridge-demo failed");
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(options: Options) -> Result<()> {
    let config = options.bridge_config()?;

    let registry = Arc::new(registry_for(&options, &config)?);
    if nativebridge_loader::install_global(Arc::clone(&registry)).is_err() {
        tracing::warn!("process-wide registry already installed");
    }
    let registry = Arc::clone(nativebridge_loader::global());
    tracing::info!(
        linked = options.linked,
        policy = ?config.signature_policy,
        cache_failures = registry.caches_failures(),
        "nativebridge-demo starting"
    );

    // A failed load is not fatal: the component shows a placeholder.
    if let Err(e) = GreetingComponent::class_init(&registry) {
        tracing::warn!(error = %e, "class initialization failed; continuing");
    }

    let adapter = Arc::new(BridgeAdapter::from_config(Arc::clone(&registry), &config));
    let mut component = GreetingComponent::new(adapter)?;
    component.on_create(&mut LineDisplay::stdout());

    if options.modules {
        let table = serde_json::to_string_pretty(&registry.modules())
            .map_err(|e| nativebridge_core::error::BridgeError::Config(e.to_string()))?;
        println!("{table}");
    }
    Ok(())
}

fn registry_for(options: &Options, config: &BridgeConfig) -> Result<ModuleRegistry> {
    if options.linked {
        Ok(ModuleRegistry::new(Arc::new(linked::opener()?))
            .with_cached_failures(config.cache_failures))
    } else {
        Ok(ModuleRegistry::from_config(config))
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The greeting component, driven by its host through two lifecycle points:
// class initialization (load the native module) and creation (call into it
// once and display the result).

use std::sync::Arc;

use nativebridge_bridge::{BridgeAdapter, BridgeFunction};
use nativebridge_core::error::{BridgeError, Result};
use nativebridge_core::human_errors::humanize_error;
use nativebridge_loader::ModuleRegistry;
use tracing::{error, info, warn};

use crate::display::DisplaySink;

/// Logical name of the module the component depends on.
pub const NATIVE_LIB: &str = "native-lib";

pub struct GreetingComponent {
    adapter: Arc<BridgeAdapter>,
    greeting: BridgeFunction,
    shown: Option<String>,
}

impl GreetingComponent {
    /// Class initialization: make sure `native-lib` is loaded before any
    /// instance exists. Failure leaves the class usable; instances show a
    /// placeholder instead.
    pub fn class_init(registry: &ModuleRegistry) -> Result<()> {
        match registry.ensure_loaded(NATIVE_LIB) {
            Ok(_) => {
                info!(module = NATIVE_LIB, "greeting component ready");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "greeting component will show a placeholder");
                Err(e)
            }
        }
    }

    pub fn new(adapter: Arc<BridgeAdapter>) -> Result<Self> {
        let greeting = BridgeFunction::declare(NATIVE_LIB, "text string_from_native()")?
            .releasing_text_with("nativebridge_free_text")?;
        Ok(Self {
            adapter,
            greeting,
            shown: None,
        })
    }

    /// Creation: call the native function once and hand the text to `sink`.
    pub fn on_create(&mut self, sink: &mut dyn DisplaySink) {
        let text = match self.adapter.invoke_text(&self.greeting) {
            Ok(text) => text,
            Err(e) => {
                if matches!(e, BridgeError::NotLoaded(_)) {
                    error!(function = %self.greeting, "module not loaded; class initialization failed or never ran");
                }
                let human = humanize_error(&e);
                warn!(error = %e, suggestion = %human.suggestion, "showing placeholder");
                human.placeholder()
            }
        };
        sink.show_text(&text);
        self.shown = Some(text);
    }

    /// Text shown by the last `on_create`, if it has run.
    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::RecordingDisplay;
    use crate::linked;
    use nativebridge_core::ModuleName;
    use nativebridge_loader::{StaticModule, StaticOpener};

    fn linked_registry() -> Arc<ModuleRegistry> {
        Arc::new(ModuleRegistry::new(Arc::new(linked::opener().unwrap())))
    }

    #[test]
    fn shows_the_native_greeting() {
        let registry = linked_registry();
        GreetingComponent::class_init(&registry).unwrap();

        let adapter = Arc::new(BridgeAdapter::new(registry));
        let mut component = GreetingComponent::new(adapter).unwrap();
        let mut display = RecordingDisplay::default();
        component.on_create(&mut display);

        assert_eq!(display.shown, vec!["Hello from native code".to_owned()]);
        assert_eq!(component.shown(), Some("Hello from native code"));
    }

    #[test]
    fn failed_class_init_leads_to_a_placeholder() {
        let registry = Arc::new(ModuleRegistry::new(Arc::new(StaticOpener::new())));
        let err = GreetingComponent::class_init(&registry).unwrap_err();
        assert!(err.is_load_failure());

        let adapter = Arc::new(BridgeAdapter::new(registry));
        let mut component = GreetingComponent::new(adapter).unwrap();
        let mut display = RecordingDisplay::default();
        component.on_create(&mut display);

        assert_eq!(display.shown.len(), 1);
        assert!(display.shown[0].starts_with("[unavailable]"));
        assert!(display.shown[0].contains("native-lib"));
    }

    #[test]
    fn module_without_the_export_leads_to_a_placeholder() {
        let opener = StaticOpener::new()
            .with_module(StaticModule::new(ModuleName::new(NATIVE_LIB).unwrap()));
        let registry = Arc::new(ModuleRegistry::new(Arc::new(opener)));
        GreetingComponent::class_init(&registry).unwrap();

        let mut component =
            GreetingComponent::new(Arc::new(BridgeAdapter::new(registry))).unwrap();
        let mut display = RecordingDisplay::default();
        component.on_create(&mut display);

        assert!(display.shown[0].contains("string_from_native"));
    }
}

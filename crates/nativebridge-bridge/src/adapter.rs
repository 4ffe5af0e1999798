// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The call adapter: checks, binds and invokes declared native functions.
//
// Every check happens before the boundary crossing. A call proceeds only when
// the owning module is loaded, the arguments match the declaration, the
// symbol resolves, and the declaration agrees with the module's manifest (or
// the policy allows trusting it). Only lifting the return value can fail
// after the call.

use std::collections::HashMap;
use std::ffi::c_char;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use nativebridge_core::error::{BridgeError, Result};
use nativebridge_core::{
    BridgeConfig, MANIFEST_SYMBOL, Manifest, ModuleName, Signature, SignaturePolicy, Value,
    ValueType,
};
use nativebridge_loader::{ModuleRegistry, NativeModule, SymbolAddress};

use crate::descriptor::BridgeFunction;
use crate::marshal::{self, RawReturn, ReturnClass, Slot};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Entry points resolved for one descriptor.
#[derive(Debug, Clone, Copy)]
struct Binding {
    entry: SymbolAddress,
    release: Option<SymbolAddress>,
}

/// Invokes [`BridgeFunction`]s against modules loaded in a registry.
///
/// The adapter never loads modules itself; callers run `ensure_loaded`
/// first. Resolved bindings and module manifests are cached, failed
/// resolutions are not.
pub struct BridgeAdapter {
    registry: Arc<ModuleRegistry>,
    policy: SignaturePolicy,
    bindings: Mutex<HashMap<BridgeFunction, Binding>>,
    manifests: Mutex<HashMap<ModuleName, Option<Arc<Manifest>>>>,
}

impl BridgeAdapter {
    /// Adapter with the default (strict) signature policy.
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            policy: SignaturePolicy::default(),
            bindings: Mutex::new(HashMap::new()),
            manifests: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(registry: Arc<ModuleRegistry>, config: &BridgeConfig) -> Self {
        Self::new(registry).with_policy(config.signature_policy)
    }

    pub fn with_policy(mut self, policy: SignaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SignaturePolicy {
        self.policy
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Whether `function` has a cached binding.
    pub fn is_bound(&self, function: &BridgeFunction) -> bool {
        lock(&self.bindings).contains_key(function)
    }

    /// Call `function` with `args` and return its result as an owned value.
    pub fn invoke(&self, function: &BridgeFunction, args: &[Value]) -> Result<Value> {
        let module = self.loaded_module(function)?;
        check_arguments(function, args)?;
        let binding = self.bind(function, module.as_ref())?;

        let lowered = marshal::lower(function.name(), args)?;
        let ret = function.signature().ret;
        debug!(function = %function, "crossing into native code");

        // SAFETY: the descriptor was checked against the module's manifest
        // (or trusted by policy), the arguments match it, and descriptor
        // construction guarantees a dispatchable shape.
        let raw = unsafe { marshal::call(binding.entry, lowered.slots(), ReturnClass::of(ret)) }
            .ok_or_else(|| unsupported_shape(function))?;
        drop(lowered);

        if ret == ValueType::Text {
            return self.lift_text(function, binding, raw).map(Value::Text);
        }
        marshal::lift(ret, raw).ok_or_else(|| BridgeError::Marshal {
            function: function.name().to_owned(),
            detail: format!("unexpected return register for `{ret}`"),
        })
    }

    /// Call a zero-argument function declared to return text.
    pub fn invoke_text(&self, function: &BridgeFunction) -> Result<String> {
        if function.signature().ret != ValueType::Text {
            return Err(mismatch(
                function,
                format!("declared to return `{}`, not text", function.signature().ret),
            ));
        }
        self.invoke(function, &[])?
            .into_text()
            .ok_or_else(|| BridgeError::Marshal {
                function: function.name().to_owned(),
                detail: "text function returned a non-text value".into(),
            })
    }

    fn loaded_module(&self, function: &BridgeFunction) -> Result<Arc<dyn NativeModule>> {
        self.registry
            .get(function.module().as_str())
            .ok_or_else(|| {
                error!(
                    module = %function.module(),
                    function = function.name(),
                    state = %self.registry.state(function.module().as_str()),
                    "bridge function invoked before its module was loaded"
                );
                BridgeError::NotLoaded(function.module().to_string())
            })
    }

    fn bind(&self, function: &BridgeFunction, module: &dyn NativeModule) -> Result<Binding> {
        if let Some(binding) = lock(&self.bindings).get(function) {
            return Ok(*binding);
        }

        let entry = module.symbol(function.name())?;
        let manifest = self.manifest(module)?;
        self.check_declared(function, manifest.as_deref())?;

        let release = match function.release_symbol() {
            Some(symbol) => {
                let addr = module.symbol(symbol)?;
                self.check_release(function, symbol, manifest.as_deref())?;
                Some(addr)
            }
            None => None,
        };

        let binding = Binding { entry, release };
        lock(&self.bindings).insert(function.clone(), binding);
        info!(function = %function, address = ?entry, "bound native function");
        Ok(binding)
    }

    /// The module's manifest, or `None` when it publishes none. A manifest
    /// that cannot be read or parsed is an error and is not cached.
    fn manifest(&self, module: &dyn NativeModule) -> Result<Option<Arc<Manifest>>> {
        if let Some(cached) = lock(&self.manifests).get(module.name()) {
            return Ok(cached.clone());
        }

        let manifest = match module.symbol(MANIFEST_SYMBOL) {
            Ok(addr) => Some(Arc::new(read_manifest(module.name(), addr)?)),
            Err(BridgeError::SymbolResolution { .. }) => {
                debug!(module = %module.name(), "module publishes no signature manifest");
                None
            }
            Err(e) => return Err(e),
        };

        lock(&self.manifests).insert(module.name().clone(), manifest.clone());
        Ok(manifest)
    }

    fn check_declared(&self, function: &BridgeFunction, manifest: Option<&Manifest>) -> Result<()> {
        let declared = function.signature();
        match manifest.and_then(|m| m.lookup(function.name())) {
            Some(exported) if exported == declared => Ok(()),
            Some(exported) => Err(mismatch(
                function,
                format!("module exports `{exported}`"),
            )),
            None => self.unlisted(function, function.name(), manifest.is_some()),
        }
    }

    /// Release functions take the returned pointer and return nothing.
    fn check_release(
        &self,
        function: &BridgeFunction,
        symbol: &str,
        manifest: Option<&Manifest>,
    ) -> Result<()> {
        match manifest.and_then(|m| m.lookup(symbol)) {
            Some(exported) if is_release_signature(exported) => Ok(()),
            Some(exported) => Err(mismatch(
                function,
                format!("release function `{symbol}` is exported as `{exported}`, expected `void (handle)`"),
            )),
            None => self.unlisted(function, symbol, manifest.is_some()),
        }
    }

    fn unlisted(&self, function: &BridgeFunction, symbol: &str, has_manifest: bool) -> Result<()> {
        let detail = if has_manifest {
            format!("`{symbol}` is not listed in the manifest of `{}`", function.module())
        } else {
            format!("module `{}` publishes no signature manifest", function.module())
        };
        match self.policy {
            SignaturePolicy::Strict => Err(mismatch(function, detail)),
            SignaturePolicy::Trusting => {
                warn!(function = %function, symbol, "{detail}; trusting the declaration");
                Ok(())
            }
        }
    }

    fn lift_text(&self, function: &BridgeFunction, binding: Binding, raw: RawReturn) -> Result<String> {
        let RawReturn::Word(word) = raw else {
            return Err(BridgeError::Marshal {
                function: function.name().to_owned(),
                detail: "text returned outside an integer register".into(),
            });
        };
        let ptr = word as usize as *const c_char;

        // SAFETY: the callee is declared to return a NUL-terminated string
        // that remains valid at least until it is released.
        let text = unsafe { marshal::copy_text(function.name(), ptr) };

        if let Some(release) = binding.release.filter(|_| !ptr.is_null()) {
            // SAFETY: the release export was checked to be `void (handle)`
            // and receives the pointer its module handed out.
            let released = unsafe { marshal::call(release, &[Slot::Word(word)], ReturnClass::Unit) };
            if released.is_some() {
                debug!(function = %function, "released returned text");
            } else {
                warn!(function = %function, "release call was not dispatched; returned text leaked");
            }
        }
        text
    }
}

fn read_manifest(module: &ModuleName, addr: SymbolAddress) -> Result<Manifest> {
    // SAFETY: `nativebridge_manifest` is by contract `const char *(void)`
    // returning a static string.
    let raw = unsafe { marshal::call(addr, &[], ReturnClass::Word) };
    let Some(RawReturn::Word(word)) = raw else {
        return Err(BridgeError::Marshal {
            function: MANIFEST_SYMBOL.to_owned(),
            detail: "manifest export did not return a pointer".into(),
        });
    };
    // SAFETY: as above; null is handled by `copy_text`.
    let text = unsafe { marshal::copy_text(MANIFEST_SYMBOL, word as usize as *const c_char) }?;

    let manifest = Manifest::parse(&text).map_err(|e| {
        let detail = match e {
            BridgeError::InvalidSignature(detail) => detail,
            other => other.to_string(),
        };
        BridgeError::InvalidSignature(format!("manifest of `{module}`: {detail}"))
    })?;
    info!(module = %module, exports = manifest.len(), "read signature manifest");
    Ok(manifest)
}

fn check_arguments(function: &BridgeFunction, args: &[Value]) -> Result<()> {
    let params = &function.signature().params;
    if args.len() != params.len() {
        return Err(mismatch(
            function,
            format!("called with {} argument(s), declared {}", args.len(), params.len()),
        ));
    }
    for (index, (arg, param)) in args.iter().zip(params).enumerate() {
        if arg.value_type() != *param {
            return Err(mismatch(
                function,
                format!("argument {index} is `{}`, declared `{param}`", arg.value_type()),
            ));
        }
    }
    Ok(())
}

fn is_release_signature(signature: &Signature) -> bool {
    signature.ret == ValueType::Void
        && matches!(signature.params.as_slice(), [ValueType::Handle] | [ValueType::Text])
}

fn mismatch(function: &BridgeFunction, detail: String) -> BridgeError {
    BridgeError::SignatureMismatch {
        function: function.name().to_owned(),
        declared: function.declaration().to_string(),
        detail,
    }
}

fn unsupported_shape(function: &BridgeFunction) -> BridgeError {
    BridgeError::SignatureMismatch {
        function: function.name().to_owned(),
        declared: function.declaration().to_string(),
        detail: "no calling shape for this parameter list".into(),
    }
}

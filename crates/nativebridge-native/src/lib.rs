// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! The `native-lib` module.
//!
//! Built as a `cdylib` for loading at runtime and as an `rlib` so that
//! statically linked hosts (and tests) can register the same functions in a
//! static module table.
//!
//! Exports over the C ABI:
//!
//! | symbol | declaration |
//! |---|---|
//! | `string_from_native` | `text string_from_native()` |
//! | `nativebridge_free_text` | `void nativebridge_free_text(handle)` |
//! | `nativebridge_manifest` | the two lines above, as a static C string |
//!
//! On Android the module additionally implements
//! `com.example.myapp.MainActivity.stringFromJNI()` through JNI.

use std::ffi::{CStr, c_char};

#[cfg(target_os = "android")]
pub mod android;

/// Text returned by [`string_from_native`].
pub const GREETING: &str = "Hello from native code";

const GREETING_C: &CStr = c"Hello from native code";

/// Published through [`nativebridge_manifest`].
pub const MANIFEST: &CStr = c"# native-lib exports
text string_from_native()
void nativebridge_free_text(handle)
";

/// Symbol names, for hosts that register this module statically.
pub const STRING_FROM_NATIVE: &str = "string_from_native";
pub const FREE_TEXT: &str = "nativebridge_free_text";

/// Return a freshly allocated copy of [`GREETING`].
///
/// The caller owns the string and releases it with
/// [`nativebridge_free_text`].
#[unsafe(no_mangle)]
pub extern "C" fn string_from_native() -> *mut c_char {
    GREETING_C.to_owned().into_raw()
}

/// Release text returned by this module.
///
/// # Safety
///
/// `text` must be null or a pointer returned by [`string_from_native`] that
/// has not been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nativebridge_free_text(text: *mut c_char) {
    if text.is_null() {
        return;
    }
    // SAFETY: per the contract above, `text` came from `CString::into_raw`.
    drop(unsafe { std::ffi::CString::from_raw(text) });
}

/// The export manifest. The returned pointer is static and must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn nativebridge_manifest() -> *const c_char {
    MANIFEST.as_ptr()
}

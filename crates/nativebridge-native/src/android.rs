// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JNI entry points.
//
// The Java side declares
//
//     static { System.loadLibrary("native-lib"); }
//     public native String stringFromJNI();
//
// in `com.example.myapp.MainActivity`. ART binds the method to the symbol
// below by its mangled name the first time it is called; a mismatch there
// surfaces on the Java side as `UnsatisfiedLinkError`.

#![cfg(target_os = "android")]

use std::ffi::c_void;

use jni::JNIEnv;
use jni::objects::JObject;
use jni::sys::{JNI_VERSION_1_6, JavaVM, jint, jstring};

use crate::GREETING;

/// Report the JNI version this library was built against.
#[unsafe(no_mangle)]
pub extern "system" fn JNI_OnLoad(_vm: *mut JavaVM, _reserved: *mut c_void) -> jint {
    tracing::debug!("native-lib: JNI_OnLoad");
    JNI_VERSION_1_6
}

/// `public native String stringFromJNI()`.
///
/// Returns a new local reference to a `java.lang.String`, owned by the Java
/// caller. On failure an exception is already pending in `env`, and null is
/// returned for the VM to raise it.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_myapp_MainActivity_stringFromJNI<'local>(
    mut env: JNIEnv<'local>,
    _activity: JObject<'local>,
) -> jstring {
    match env.new_string(GREETING) {
        Ok(text) => text.into_raw(),
        Err(e) => {
            tracing::error!(error = %e, "stringFromJNI: NewStringUTF failed");
            std::ptr::null_mut()
        }
    }
}

//! FFI bindings for WFDB Holter decoding
//!
//! This module provides C-compatible functions for calling the decoder from other
//! languages. Results are returned as JSON in allocated C strings that must be
//! freed by the caller using `holter_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::slice;

use crate::pipeline::{parse, parse_header};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Decode a record and return the `HolterData` as JSON.
///
/// # Safety
/// - `header` must be a valid null-terminated C string.
/// - `data` must point to `len` readable bytes, or be NULL when `len` is 0.
/// - Returns a newly allocated string that must be freed with `holter_free_string`.
/// - Returns NULL on error; call `holter_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn holter_parse(
    header: *const c_char,
    data: *const u8,
    len: usize,
) -> *mut c_char {
    clear_last_error();

    let header_str = match cstr_to_string(header) {
        Some(s) => s,
        None => {
            set_last_error("Invalid header string pointer");
            return ptr::null_mut();
        }
    };

    let buffer: &[u8] = if len == 0 {
        &[]
    } else if data.is_null() {
        set_last_error("Invalid data pointer");
        return ptr::null_mut();
    } else {
        slice::from_raw_parts(data, len)
    };

    match parse(buffer, &header_str) {
        Ok(holter) => match serde_json::to_string(&holter) {
            Ok(json) => string_to_cstr(&json),
            Err(e) => {
                set_last_error(&e.to_string());
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Parse a header and return the `Metadata` as JSON.
///
/// # Safety
/// - `header` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `holter_free_string`.
/// - Returns NULL on error; call `holter_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn holter_parse_header(header: *const c_char) -> *mut c_char {
    clear_last_error();

    let header_str = match cstr_to_string(header) {
        Some(s) => s,
        None => {
            set_last_error("Invalid header string pointer");
            return ptr::null_mut();
        }
    };

    match parse_header(&header_str) {
        Ok(metadata) => match serde_json::to_string(&metadata) {
            Ok(json) => string_to_cstr(&json),
            Err(e) => {
                set_last_error(&e.to_string());
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a string returned by this library.
///
/// # Safety
/// - `s` must be a pointer returned by a holter function, or NULL.
/// - Must not be called twice on the same pointer.
#[no_mangle]
pub unsafe extern "C" fn holter_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next holter function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn holter_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn holter_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

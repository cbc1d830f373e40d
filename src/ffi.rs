//! FFI bindings for the vitals engine
//!
//! This module provides C-compatible functions for calling the engine from host
//! UI layers. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `vitals_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::VitalsError;
use crate::pipeline::{analyze_series_json, assess_reading_json, score_profile_json, VitalsProcessor};
use crate::score::StandardWeights;

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

/// Hand a result to C: the string on success, NULL plus last error on failure
fn result_to_cstr(result: Result<String, VitalsError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Classify a reading JSON and return an assessment report.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_assess_reading(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(assess_reading_json(json_str))
}

/// Analyze a newest-first JSON array of readings.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `window` must be at least 1.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_analyze_series(json: *const c_char, window: i32) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    // Negative windows are rejected the same way as zero
    let window = usize::try_from(window).unwrap_or(0);
    result_to_cstr(analyze_series_json(json_str, window))
}

/// Score a profile JSON.
///
/// # Safety
/// - `json` and `scale` must be valid null-terminated C strings.
/// - `scale` is `"wellness"` or `"health"`.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_score_profile(json: *const c_char, scale: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let scale_str = match cstr_to_string(scale) {
        Some(s) => s,
        None => {
            set_last_error("Invalid scale string pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(
        scale_str
            .parse::<StandardWeights>()
            .and_then(|scale| score_profile_json(json_str, scale)),
    )
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a VitalsProcessor
pub struct VitalsProcessorHandle {
    processor: VitalsProcessor,
}

/// Create a new VitalsProcessor.
///
/// # Safety
/// - `tables_json` may be NULL for the built-in tables, or a valid C string of
///   band tables overlaid onto them.
/// - Must be freed with `vitals_processor_free`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_new(tables_json: *const c_char) -> *mut VitalsProcessorHandle {
    clear_last_error();

    let mut processor = VitalsProcessor::new();

    if !tables_json.is_null() {
        let tables = match cstr_to_string(tables_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid tables string pointer");
                return ptr::null_mut();
            }
        };
        if let Err(e) = processor.load_tables(&tables) {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    }

    let handle = Box::new(VitalsProcessorHandle { processor });
    Box::into_raw(handle)
}

/// Free a VitalsProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_free(processor: *mut VitalsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

unsafe fn record_day(
    processor: *mut VitalsProcessorHandle,
    habit: *const c_char,
    date: *const c_char,
    completed: bool,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let habit_str = match cstr_to_string(habit) {
        Some(s) => s,
        None => {
            set_last_error("Invalid habit string pointer");
            return ptr::null_mut();
        }
    };

    let date_str = match cstr_to_string(date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid date string pointer");
            return ptr::null_mut();
        }
    };

    if completed {
        result_to_cstr(handle.processor.record_completion_json(&habit_str, &date_str))
    } else {
        result_to_cstr(handle.processor.record_miss_json(&habit_str, &date_str))
    }
}

/// Record a completed day (`YYYY-MM-DD`) for a habit.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - `habit` and `date` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_record_completion(
    processor: *mut VitalsProcessorHandle,
    habit: *const c_char,
    date: *const c_char,
) -> *mut c_char {
    record_day(processor, habit, date, true)
}

/// Record a missed day (`YYYY-MM-DD`) for a habit.
///
/// # Safety
/// Same contract as `vitals_processor_record_completion`.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_record_miss(
    processor: *mut VitalsProcessorHandle,
    habit: *const c_char,
    date: *const c_char,
) -> *mut c_char {
    record_day(processor, habit, date, false)
}

/// Save processor streaks to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_save_streaks(processor: *mut VitalsProcessorHandle) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    result_to_cstr(handle.processor.save_streaks())
}

/// Load processor streaks from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_load_streaks(
    processor: *mut VitalsProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_streaks(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by vitals functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a vitals function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitals_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next vitals function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vitals_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vitals_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

//! FFI bindings for the Pedestrian engine
//!
//! This module provides C-compatible functions so a mobile host can call the
//! engine. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `pedestrian_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{parse_samples_array, samples_to_streak, StepProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

/// Map a result to an owned C string, recording the error on failure
fn result_to_cstr<E: std::fmt::Display>(result: Result<String, E>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn goal_from_c(daily_step_goal: i32) -> Option<u32> {
    u32::try_from(daily_step_goal).ok().filter(|g| *g > 0)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Merge a JSON array of samples into a fresh history and return the streak JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pedestrian_free_string`.
/// - Returns NULL on error; call `pedestrian_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_samples_to_streak(
    json: *const c_char,
    daily_step_goal: i32,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };
    let Some(goal) = goal_from_c(daily_step_goal) else {
        set_last_error("Daily step goal must be greater than zero");
        return ptr::null_mut();
    };

    result_to_cstr(samples_to_streak(&json_str, goal))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a StepProcessor
pub struct StepProcessorHandle {
    processor: StepProcessor,
}

/// Create a new StepProcessor with an empty history.
///
/// # Safety
/// - Must be freed with `pedestrian_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_processor_new() -> *mut StepProcessorHandle {
    clear_last_error();
    let handle = Box::new(StepProcessorHandle {
        processor: StepProcessor::new(),
    });
    Box::into_raw(handle)
}

/// Free a StepProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pedestrian_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_processor_free(processor: *mut StepProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Merge a JSON array of samples and return the merged records as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pedestrian_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pedestrian_free_string`.
/// - Returns NULL on error; call `pedestrian_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_processor_ingest(
    processor: *mut StepProcessorHandle,
    json: *const c_char,
    daily_step_goal: i32,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };
    let Some(goal) = goal_from_c(daily_step_goal) else {
        set_last_error("Daily step goal must be greater than zero");
        return ptr::null_mut();
    };

    let result = parse_samples_array(&json_str)
        .and_then(|samples| handle.processor.ingest(&samples, &goal))
        .and_then(|records| serde_json::to_string(&records).map_err(Into::into));

    result_to_cstr(result)
}

/// Return the streak over the processor's history as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pedestrian_processor_new`.
/// - Returns a newly allocated string that must be freed with `pedestrian_free_string`.
/// - Returns NULL on error; call `pedestrian_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_processor_streak(
    processor: *mut StepProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let result = handle
        .processor
        .streak()
        .and_then(|streak| serde_json::to_string(&streak).map_err(Into::into));

    result_to_cstr(result)
}

/// Return the activity summary over the processor's history as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pedestrian_processor_new`.
/// - Returns a newly allocated string that must be freed with `pedestrian_free_string`.
/// - Returns NULL on error; call `pedestrian_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_processor_summary(
    processor: *mut StepProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let result = handle
        .processor
        .summary()
        .and_then(|summary| serde_json::to_string(&summary).map_err(Into::into));

    result_to_cstr(result)
}

/// Save the processor's history to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pedestrian_processor_new`.
/// - Returns a newly allocated string that must be freed with `pedestrian_free_string`.
/// - Returns NULL on error; call `pedestrian_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_processor_save_records(
    processor: *mut StepProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    result_to_cstr(handle.processor.save_records())
}

/// Load the processor's history from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pedestrian_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `pedestrian_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_processor_load_records(
    processor: *mut StepProcessorHandle,
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

    match handle.processor.load_records(&json_str) {
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

/// Free a string returned by any `pedestrian_*` function.
///
/// # Safety
/// - `s` must be a pointer returned by a `pedestrian_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local string that is valid until the next
///   `pedestrian_*` call on the same thread.
/// - Do NOT free this pointer.
/// - Returns NULL if there was no error.
#[no_mangle]
pub unsafe extern "C" fn pedestrian_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        pedestrian_free_string(ptr);
        s
    }

    const SAMPLES: &str = r#"[
        {"start": "2024-01-15T00:00:00Z", "end": "2024-01-16T00:00:00Z", "step_count": 12000},
        {"start": "2024-01-16T00:00:00Z", "end": "2024-01-17T00:00:00Z", "step_count": 3000}
    ]"#;

    #[test]
    fn test_stateless_streak() {
        unsafe {
            let json = c(SAMPLES);
            let out = take(pedestrian_samples_to_streak(json.as_ptr(), 10_000));
            let streak: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(streak["current"], 0);
            assert_eq!(streak["longest"], 1);
        }
    }

    #[test]
    fn test_invalid_goal_sets_last_error() {
        unsafe {
            let json = c(SAMPLES);
            let out = pedestrian_samples_to_streak(json.as_ptr(), 0);
            assert!(out.is_null());
            assert!(!pedestrian_last_error().is_null());
        }
    }

    #[test]
    fn test_processor_lifecycle() {
        unsafe {
            let processor = pedestrian_processor_new();
            let json = c(SAMPLES);

            let records = take(pedestrian_processor_ingest(processor, json.as_ptr(), 10_000));
            let records: serde_json::Value = serde_json::from_str(&records).unwrap();
            assert_eq!(records.as_array().unwrap().len(), 2);

            let saved = take(pedestrian_processor_save_records(processor));

            let restored = pedestrian_processor_new();
            let saved_c = c(&saved);
            assert_eq!(pedestrian_processor_load_records(restored, saved_c.as_ptr()), 0);

            let summary = take(pedestrian_processor_summary(restored));
            let summary: serde_json::Value = serde_json::from_str(&summary).unwrap();
            assert_eq!(summary["total_steps"], 15_000);

            let streak = take(pedestrian_processor_streak(restored));
            let streak: serde_json::Value = serde_json::from_str(&streak).unwrap();
            assert_eq!(streak["longest"], 1);

            pedestrian_processor_free(processor);
            pedestrian_processor_free(restored);
        }
    }

    #[test]
    fn test_null_processor() {
        unsafe {
            assert!(pedestrian_processor_streak(ptr::null_mut()).is_null());
            assert_eq!(
                pedestrian_processor_load_records(ptr::null_mut(), ptr::null()),
                -1
            );
        }
    }
}

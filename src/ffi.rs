//! FFI bindings for Liftflux
//!
//! This module provides C-compatible functions for calling Liftflux from other
//! languages (a web backend, a mobile app). All functions take null-terminated
//! C strings, exchange structured data as JSON, and return allocated memory
//! that must be freed by the caller using `liftflux_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::adapters::CsvAdapter;
use crate::classifier::{muscle_group, strength_rank};
use crate::config::UserConfig;
use crate::error::ComputeError;
use crate::forecast::TrendForecaster;
use crate::pipeline::{csv_to_sets, LiftProcessor};
use crate::store::CsvStore;
use crate::types::{NewEntry, WorkoutSet};

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

/// Serialize a result to a JSON C string, recording the error on failure
fn result_to_json<T: Serialize>(result: Result<T, ComputeError>) -> *mut c_char {
    let json = result.and_then(|value| serde_json::to_string(&value).map_err(ComputeError::from));
    match json {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Read a required string argument, recording an error naming it when invalid
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {} string pointer", name));
    }
    value
}

/// Parse an optional YYYY-MM-DD date, falling back to the local date
unsafe fn date_or_today(ptr: *const c_char) -> Result<NaiveDate, ComputeError> {
    match cstr_to_string(ptr) {
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|e| ComputeError::ParseError(format!("invalid date '{}': {}", text, e))),
        None => Ok(Local::now().date_naive()),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Normalize workout CSV text.
///
/// Returns the normalization outcome as JSON: either
/// `{"status":"normalized","sets":[...],"rejected":[...]}` or
/// `{"status":"format_rejected","missing":[...]}`.
///
/// # Safety
/// - `csv` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liftflux_free_string`.
/// - Returns NULL on error; call `liftflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn liftflux_normalize_csv(csv: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(csv) = required_arg(csv, "CSV") else {
        return ptr::null_mut();
    };

    result_to_json(csv_to_sets(&csv))
}

/// Forecast one exercise from a JSON array of canonical workout sets.
///
/// # Safety
/// - `sets_json` and `exercise` must be valid null-terminated C strings.
/// - `today` may be NULL (local date) or a `YYYY-MM-DD` C string.
/// - Returns a newly allocated string that must be freed with `liftflux_free_string`.
/// - Returns NULL on error (including too few sessions); see `liftflux_last_error`.
#[no_mangle]
pub unsafe extern "C" fn liftflux_forecast(
    sets_json: *const c_char,
    exercise: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(sets_json) = required_arg(sets_json, "sets JSON") else {
        return ptr::null_mut();
    };
    let Some(exercise) = required_arg(exercise, "exercise") else {
        return ptr::null_mut();
    };

    let result = date_or_today(today).and_then(|today| {
        let sets: Vec<WorkoutSet> = serde_json::from_str(&sets_json)?;
        TrendForecaster::forecast_exercise(&sets, &exercise, today)
    });
    result_to_json(result)
}

/// Strength rank label ("-", "UNRANKED", "BEGINNER", ...).
///
/// # Safety
/// - `exercise` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liftflux_free_string`.
#[no_mangle]
pub unsafe extern "C" fn liftflux_strength_rank(
    exercise: *const c_char,
    one_rep_max: f64,
    bodyweight: f64,
) -> *mut c_char {
    clear_last_error();

    let Some(exercise) = required_arg(exercise, "exercise") else {
        return ptr::null_mut();
    };

    string_to_cstr(strength_rank(&exercise, one_rep_max, bodyweight).as_str())
}

/// Muscle group label ("CHEST", "LEGS", ..., "OTHER").
///
/// # Safety
/// - `exercise` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liftflux_free_string`.
#[no_mangle]
pub unsafe extern "C" fn liftflux_muscle_group(exercise: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(exercise) = required_arg(exercise, "exercise") else {
        return ptr::null_mut();
    };

    string_to_cstr(muscle_group(&exercise).as_str())
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a LiftProcessor backed by a CSV dataset file
pub struct LiftProcessorHandle {
    processor: LiftProcessor<CsvStore>,
}

/// Open a processor over the dataset at `data_path`.
///
/// A missing file is an empty dataset. A non-positive `bodyweight` selects the
/// default (65).
///
/// # Safety
/// - `data_path` must be a valid null-terminated C string.
/// - Must be freed with `liftflux_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn liftflux_processor_open(
    data_path: *const c_char,
    bodyweight: f64,
) -> *mut LiftProcessorHandle {
    clear_last_error();

    let Some(path) = required_arg(data_path, "data path") else {
        return ptr::null_mut();
    };

    let config = if bodyweight > 0.0 {
        match UserConfig::with_bodyweight(bodyweight) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    } else {
        UserConfig::default()
    };

    let processor = LiftProcessor::with_config(CsvStore::new(path), config);
    Box::into_raw(Box::new(LiftProcessorHandle { processor }))
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `liftflux_processor_open`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn liftflux_processor_free(processor: *mut LiftProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Replace the dataset with uploaded CSV text; returns the ingest report JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `liftflux_processor_open`.
/// - `csv` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liftflux_free_string`.
/// - Returns NULL on error (including a rejected format).
#[no_mangle]
pub unsafe extern "C" fn liftflux_processor_upload_csv(
    processor: *mut LiftProcessorHandle,
    csv: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(handle) = processor.as_ref() else {
        set_last_error("Invalid processor pointer");
        return ptr::null_mut();
    };
    let Some(csv) = required_arg(csv, "CSV") else {
        return ptr::null_mut();
    };

    result_to_json(handle.processor.upload_with(&CsvAdapter::new(), &csv))
}

/// Forecast and rank one exercise; returns the insight JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `liftflux_processor_open`.
/// - `exercise` must be a valid null-terminated C string.
/// - `today` may be NULL (local date) or a `YYYY-MM-DD` C string.
/// - Returns a newly allocated string that must be freed with `liftflux_free_string`.
#[no_mangle]
pub unsafe extern "C" fn liftflux_processor_predict(
    processor: *mut LiftProcessorHandle,
    exercise: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(handle) = processor.as_ref() else {
        set_last_error("Invalid processor pointer");
        return ptr::null_mut();
    };
    let Some(exercise) = required_arg(exercise, "exercise") else {
        return ptr::null_mut();
    };

    let result = date_or_today(today)
        .and_then(|today| handle.processor.predict_as_of(&exercise, today));
    result_to_json(result)
}

/// Append a set given as JSON `{"date","exercise","weight","reps"}`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `liftflux_processor_open`.
/// - `entry_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liftflux_free_string`.
#[no_mangle]
pub unsafe extern "C" fn liftflux_processor_add_entry(
    processor: *mut LiftProcessorHandle,
    entry_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(handle) = processor.as_ref() else {
        set_last_error("Invalid processor pointer");
        return ptr::null_mut();
    };
    let Some(entry_json) = required_arg(entry_json, "entry JSON") else {
        return ptr::null_mut();
    };

    let result = serde_json::from_str::<NewEntry>(&entry_json)
        .map_err(ComputeError::from)
        .and_then(|entry| handle.processor.add_entry(&entry));
    result_to_json(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Liftflux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Liftflux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn liftflux_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Liftflux function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn liftflux_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Liftflux library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn liftflux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

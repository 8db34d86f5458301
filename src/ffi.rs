//! FFI bindings for the demo fixture engine
//!
//! C-compatible functions over [`FixtureRepository`]. Inputs are null-terminated C
//! strings; query results are JSON strings allocated by this library that must be
//! freed by the caller with `fixtures_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::FixtureConfig;
use crate::error::{parse_date, FixtureError};
use crate::repository::FixtureRepository;
use crate::types::DateRange;

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

/// NULL means an open end; anything else must be a `YYYY-MM-DD` date
unsafe fn optional_date(ptr: *const c_char) -> Result<Option<chrono::NaiveDate>, FixtureError> {
    if ptr.is_null() {
        return Ok(None);
    }
    let value = cstr_to_string(ptr)
        .ok_or_else(|| FixtureError::InvalidDate("date is not valid UTF-8".to_string()))?;
    parse_date(&value).map(Some)
}

/// Serialize a query result, or record the error and return NULL
fn respond<T: Serialize>(result: Result<T, FixtureError>) -> *mut c_char {
    match result.and_then(|value| Ok(serde_json::to_string(&value)?)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Repository Lifecycle
// ============================================================================

/// Opaque handle to a FixtureRepository
pub struct FixtureRepositoryHandle {
    repository: FixtureRepository,
}

fn into_handle(result: Result<FixtureRepository, FixtureError>) -> *mut FixtureRepositoryHandle {
    match result {
        Ok(repository) => Box::into_raw(Box::new(FixtureRepositoryHandle { repository })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Build the demo dataset ending on `reference_date` (`YYYY-MM-DD`).
///
/// # Safety
/// - `reference_date` must be a valid null-terminated C string.
/// - Returns a pointer that must be freed with `fixtures_repository_free`.
/// - Returns NULL on error; call `fixtures_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fixtures_repository_new(
    reference_date: *const c_char,
) -> *mut FixtureRepositoryHandle {
    clear_last_error();

    let date_str = match cstr_to_string(reference_date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid reference date pointer");
            return ptr::null_mut();
        }
    };

    into_handle(FixtureRepository::from_reference_str(&date_str))
}

/// Build the demo dataset with a JSON configuration.
///
/// # Safety
/// - `reference_date` and `config_json` must be valid null-terminated C strings.
/// - Returns a pointer that must be freed with `fixtures_repository_free`.
/// - Returns NULL on error; call `fixtures_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fixtures_repository_new_with_config(
    reference_date: *const c_char,
    config_json: *const c_char,
) -> *mut FixtureRepositoryHandle {
    clear_last_error();

    let date_str = match cstr_to_string(reference_date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid reference date pointer");
            return ptr::null_mut();
        }
    };

    let config_str = match cstr_to_string(config_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid config JSON pointer");
            return ptr::null_mut();
        }
    };

    into_handle(parse_date(&date_str).and_then(|date| {
        let config = FixtureConfig::from_json(&config_str)?;
        Ok(FixtureRepository::with_config(date, config))
    }))
}

/// Free a FixtureRepository.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `fixtures_repository_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn fixtures_repository_free(handle: *mut FixtureRepositoryHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Activities between `oldest` and `newest` inclusive, newest first, as a JSON array.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `fixtures_repository_new`.
/// - `oldest` and `newest` must be valid null-terminated C strings or NULL (open end).
/// - Returns a newly allocated string that must be freed with `fixtures_free_string`.
/// - Returns NULL on error; call `fixtures_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fixtures_get_activities(
    handle: *const FixtureRepositoryHandle,
    oldest: *const c_char,
    newest: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null repository pointer");
        return ptr::null_mut();
    }
    let repository = &(*handle).repository;

    respond(date_range(oldest, newest).map(|range| repository.get_activities(&range)))
}

/// Wellness rows between `oldest` and `newest` inclusive, oldest first, as a JSON array.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `fixtures_repository_new`.
/// - `oldest` and `newest` must be valid null-terminated C strings or NULL (open end).
/// - Returns a newly allocated string that must be freed with `fixtures_free_string`.
/// - Returns NULL on error; call `fixtures_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fixtures_get_wellness(
    handle: *const FixtureRepositoryHandle,
    oldest: *const c_char,
    newest: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null repository pointer");
        return ptr::null_mut();
    }
    let repository = &(*handle).repository;

    respond(date_range(oldest, newest).map(|range| repository.get_wellness(&range)))
}

unsafe fn date_range(
    oldest: *const c_char,
    newest: *const c_char,
) -> Result<DateRange, FixtureError> {
    Ok(DateRange::new(optional_date(oldest)?, optional_date(newest)?))
}

/// Resolve the handle and activity id shared by the per-activity queries
unsafe fn activity_query<'a>(
    handle: *const FixtureRepositoryHandle,
    id: *const c_char,
) -> Result<(&'a FixtureRepository, String), FixtureError> {
    if handle.is_null() {
        return Err(FixtureError::Config("Null repository pointer".to_string()));
    }
    let id = cstr_to_string(id)
        .ok_or_else(|| FixtureError::UnknownActivity("invalid activity id pointer".to_string()))?;
    Ok((&(*handle).repository, id))
}

/// One activity as a JSON object.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `fixtures_repository_new`.
/// - `id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `fixtures_free_string`.
/// - Returns NULL for unknown ids; call `fixtures_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fixtures_get_activity(
    handle: *const FixtureRepositoryHandle,
    id: *const c_char,
) -> *mut c_char {
    clear_last_error();
    respond(
        activity_query(handle, id).and_then(|(repository, id)| repository.require_activity(&id)),
    )
}

/// Sensor streams of an activity as a JSON array of `{type, data, data2}` objects.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `fixtures_repository_new`.
/// - `id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `fixtures_free_string`.
/// - Returns NULL for unknown ids; call `fixtures_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fixtures_get_activity_streams(
    handle: *const FixtureRepositoryHandle,
    id: *const c_char,
) -> *mut c_char {
    clear_last_error();
    respond(activity_query(handle, id).and_then(|(repository, id)| {
        repository
            .get_activity_streams(&id)
            .map(|streams| streams.to_api_streams())
            .ok_or(FixtureError::UnknownActivity(id))
    }))
}

/// Interval analysis of an activity as a JSON object.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `fixtures_repository_new`.
/// - `id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `fixtures_free_string`.
/// - Returns NULL for unknown ids; call `fixtures_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fixtures_get_activity_intervals(
    handle: *const FixtureRepositoryHandle,
    id: *const c_char,
) -> *mut c_char {
    clear_last_error();
    respond(activity_query(handle, id).and_then(|(repository, id)| {
        repository
            .get_activity_intervals(&id)
            .ok_or(FixtureError::UnknownActivity(id))
    }))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a fixtures function.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a fixtures function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn fixtures_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next fixtures function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn fixtures_last_error() -> *const c_char {
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
pub unsafe extern "C" fn fixtures_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

// FFI bridge for the ranked-term store
// The host holds one service handle from open to close; results cross as JSON

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use serde::Serialize;
use tracing::warn;

use super::backend::BackendKind;
use super::service::{AdminOutcome, RankedTermService, RecordOutcome};
use crate::config::StoreConfig;

/// Read an optional C string; `Err` on invalid UTF-8
fn read_c_str<'a>(s: *const c_char) -> Result<Option<&'a str>, ()> {
    if s.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(s) }.to_str().map(Some).map_err(|_| ())
}

/// Serialize `value` into a caller-owned C string and report its length
fn to_json_c_string<T: Serialize>(value: &T, output_len: *mut usize) -> *mut c_char {
    let json_str = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "failed to serialize bridge result");
            return ptr::null_mut();
        }
    };

    // serde_json escapes control characters, so no interior NULs
    let c_str = match CString::new(json_str) {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    if !output_len.is_null() {
        unsafe {
            *output_len = c_str.as_bytes_with_nul().len();
        }
    }

    c_str.into_raw()
}

/// Open the term store
///
/// # Arguments
/// * `config_path` - Path to a TOML config file, or null for env/defaults
///
/// # Returns
/// Pointer to the service (free with `ranked_terms_close`). Never null: an
/// unreadable config falls back to defaults plus env overrides, and the store
/// falls back to memory if SQLite cannot be opened.
#[no_mangle]
pub extern "C" fn ranked_terms_open(config_path: *const c_char) -> *mut RankedTermService {
    let config = match read_c_str(config_path) {
        Ok(Some(path)) => StoreConfig::from_file(Path::new(path)),
        Ok(None) => StoreConfig::load(),
        Err(()) => {
            warn!("config path is not valid UTF-8, using defaults");
            Ok(StoreConfig::from_env())
        }
    };

    let config = config.unwrap_or_else(|err| {
        warn!(error = %err, "failed to load term store config, using defaults");
        StoreConfig::from_env()
    });

    Box::into_raw(Box::new(RankedTermService::open(&config)))
}

/// Record one use of a term
///
/// # Returns
/// 1 if recorded, 0 if ignored, rejected, failed or on bad arguments
#[no_mangle]
pub extern "C" fn ranked_terms_record(service: *mut RankedTermService, term: *const c_char) -> i32 {
    if service.is_null() {
        return 0;
    }
    let service = unsafe { &*service };

    match read_c_str(term) {
        Ok(Some(term)) => i32::from(service.record(term) == RecordOutcome::Recorded),
        _ => 0,
    }
}

/// Ranked terms as a JSON array
///
/// # Arguments
/// * `limit` - Maximum terms; negative uses the configured default
/// * `output_len` - Receives the string length including NUL
///
/// # Returns
/// JSON string (free with `ranked_terms_free_string`), or null on error
#[no_mangle]
pub extern "C" fn ranked_terms_list_json(
    service: *mut RankedTermService,
    limit: i64,
    output_len: *mut usize,
) -> *mut c_char {
    if service.is_null() {
        return ptr::null_mut();
    }
    let service = unsafe { &*service };

    let records = match usize::try_from(limit) {
        Ok(limit) => service.list(limit),
        Err(_) => service.list_default(),
    };
    to_json_c_string(&records, output_len)
}

/// Terms starting with `prefix` as a JSON array
///
/// # Arguments
/// * `limit` - Maximum terms; negative uses the configured default
#[no_mangle]
pub extern "C" fn ranked_terms_suggest_json(
    service: *mut RankedTermService,
    prefix: *const c_char,
    limit: i64,
    output_len: *mut usize,
) -> *mut c_char {
    if service.is_null() {
        return ptr::null_mut();
    }
    let service = unsafe { &*service };

    let prefix = match read_c_str(prefix) {
        Ok(prefix) => prefix.unwrap_or(""),
        Err(()) => return ptr::null_mut(),
    };
    let limit = usize::try_from(limit).unwrap_or(service.limits().default_list_limit);
    to_json_c_string(&service.suggest(prefix, limit), output_len)
}

/// `{"total": n, "topTerms": [...]}`
#[no_mangle]
pub extern "C" fn ranked_terms_stats_json(service: *mut RankedTermService, output_len: *mut usize) -> *mut c_char {
    if service.is_null() {
        return ptr::null_mut();
    }
    let service = unsafe { &*service };
    to_json_c_string(&service.stats(), output_len)
}

/// Admin delete of one term; returns `{"success": bool, "message": str}`
#[no_mangle]
pub extern "C" fn ranked_terms_admin_delete_json(
    service: *mut RankedTermService,
    term: *const c_char,
    secret: *const c_char,
    output_len: *mut usize,
) -> *mut c_char {
    if service.is_null() {
        return ptr::null_mut();
    }
    let service = unsafe { &*service };

    let outcome = match (read_c_str(term), read_c_str(secret)) {
        (Ok(term), Ok(secret)) => service.admin_delete(term.unwrap_or(""), secret.unwrap_or("")),
        _ => AdminOutcome {
            success: false,
            message: "invalid argument".to_string(),
        },
    };
    to_json_c_string(&outcome, output_len)
}

/// Admin clear of every term; returns `{"success": bool, "message": str}`
#[no_mangle]
pub extern "C" fn ranked_terms_admin_clear_json(
    service: *mut RankedTermService,
    secret: *const c_char,
    output_len: *mut usize,
) -> *mut c_char {
    if service.is_null() {
        return ptr::null_mut();
    }
    let service = unsafe { &*service };

    let outcome = match read_c_str(secret) {
        Ok(secret) => service.admin_clear(secret.unwrap_or("")),
        Err(()) => AdminOutcome {
            success: false,
            message: "invalid argument".to_string(),
        },
    };
    to_json_c_string(&outcome, output_len)
}

/// Bytes of persisted state (0 for the in-memory fallback)
#[no_mangle]
pub extern "C" fn ranked_terms_database_size(service: *mut RankedTermService) -> u64 {
    if service.is_null() {
        return 0;
    }
    unsafe { &*service }.database_size()
}

/// 1 = durable, 2 = transient, 0 = closed or null
#[no_mangle]
pub extern "C" fn ranked_terms_backend_kind(service: *mut RankedTermService) -> i32 {
    if service.is_null() {
        return 0;
    }
    match unsafe { &*service }.backend_kind() {
        Some(BackendKind::Durable) => 1,
        Some(BackendKind::Transient) => 2,
        None => 0,
    }
}

/// Close the store and free the handle
#[no_mangle]
pub extern "C" fn ranked_terms_close(service: *mut RankedTermService) {
    if !service.is_null() {
        unsafe {
            let service = Box::from_raw(service);
            service.close();
        }
    }
}

/// Free a string returned by any `ranked_terms_*_json` function
#[no_mangle]
pub extern "C" fn ranked_terms_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            let _ = CString::from_raw(s);
        }
    }
}

/// Install the stderr log subscriber
///
/// # Arguments
/// * `filter` - `RUST_LOG`-style directives, or null to read `RUST_LOG`
///
/// # Returns
/// 1 if installed, 0 if a subscriber already existed
#[no_mangle]
pub extern "C" fn ranked_terms_init_logging(filter: *const c_char) -> i32 {
    let filter = read_c_str(filter).ok().flatten();
    i32::from(crate::logging::init_logging(filter))
}

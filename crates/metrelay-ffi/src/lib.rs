//! C ABI surface re-exposing the framework operations to non-native callers.
//!
//! Lifecycle is a strict process-wide singleton: `metrelay_initialize` fails
//! if a framework is already live, and `metrelay_shutdown` must run before a
//! re-initialize. Every status return is 0 (success) or -1 (failure); error
//! detail goes to the tracing log, not across the boundary.
//!
//! Label sets cross the boundary as flattened key/value string arrays:
//! `[k1, v1, k2, v2, ...]` with `count` naming the total number of strings.
//! `metrelay_list_metrics` hands ownership of the returned array to the
//! caller, who must release it with `metrelay_free_metric_list`.

use std::ffi::{c_char, c_double, c_int, CStr, CString};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use metrelay_backends::{build_backend, BackendKind};
use metrelay_core::{LabelSet, MetricsFramework};

const STATUS_OK: c_int = 0;
const STATUS_ERR: c_int = -1;

static FRAMEWORK: RwLock<Option<Arc<MetricsFramework>>> = RwLock::new(None);

fn current_framework() -> Option<Arc<MetricsFramework>> {
    FRAMEWORK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Borrow a C string for the duration of the call. `None` on null or
/// non-UTF-8 input.
unsafe fn cstr_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Rebuild a label set from flattened key/value pairs. A trailing key
/// without a value is dropped.
unsafe fn labels_from_pairs(pairs: *const *const c_char, count: c_int) -> Option<LabelSet> {
    let mut labels = LabelSet::new();
    if pairs.is_null() || count <= 0 {
        return Some(labels);
    }
    let strings = unsafe { std::slice::from_raw_parts(pairs, count as usize) };
    let mut chunks = strings.chunks_exact(2);
    for pair in &mut chunks {
        let key = unsafe { cstr_arg(pair[0]) }?;
        let value = unsafe { cstr_arg(pair[1]) }?;
        labels.insert(key.to_string(), value.to_string());
    }
    Some(labels)
}

fn status(result: metrelay_core::Result<()>, op: &str) -> c_int {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => {
            tracing::warn!(%op, error = %e, "ffi call failed");
            STATUS_ERR
        }
    }
}

/// Construct the selected backend and the framework singleton.
///
/// Fails when `backend` is unknown or a framework is already initialized.
#[no_mangle]
pub unsafe extern "C" fn metrelay_initialize(
    backend: *const c_char,
    namespace: *const c_char,
) -> c_int {
    let Some(backend) = (unsafe { cstr_arg(backend) }) else {
        return STATUS_ERR;
    };
    let namespace = unsafe { cstr_arg(namespace) }.unwrap_or("");

    let kind = match BackendKind::from_str(backend) {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!(%backend, error = %e, "initialize failed");
            return STATUS_ERR;
        }
    };

    let mut slot = FRAMEWORK.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        tracing::warn!("initialize called on a live framework; shutdown first");
        return STATUS_ERR;
    }

    match build_backend(kind, namespace) {
        Ok(built) => {
            *slot = Some(Arc::new(MetricsFramework::new(built)));
            tracing::info!(backend = kind.as_str(), "framework initialized");
            STATUS_OK
        }
        Err(e) => {
            tracing::warn!(error = %e, "backend construction failed");
            STATUS_ERR
        }
    }
}

/// Tear down the singleton so a fresh initialize may run. Idempotent.
#[no_mangle]
pub extern "C" fn metrelay_shutdown() -> c_int {
    let mut slot = FRAMEWORK.write().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
    STATUS_OK
}

/// Load the KPI catalog from a caller-supplied file path.
#[no_mangle]
pub unsafe extern "C" fn metrelay_load_kpis(path: *const c_char) -> c_int {
    let Some(path) = (unsafe { cstr_arg(path) }) else {
        return STATUS_ERR;
    };
    let Some(fw) = current_framework() else {
        tracing::warn!("load_kpis called before initialize");
        return STATUS_ERR;
    };
    status(fw.load_catalog_file(path), "load_kpis")
}

/// Register every catalog entry. Idempotent.
#[no_mangle]
pub extern "C" fn metrelay_register_metrics() -> c_int {
    let Some(fw) = current_framework() else {
        tracing::warn!("register_metrics called before initialize");
        return STATUS_ERR;
    };
    status(fw.register_all(), "register_metrics")
}

unsafe fn mutate(
    name: *const c_char,
    pairs: *const *const c_char,
    count: c_int,
    op: &str,
    apply: impl FnOnce(&MetricsFramework, &str, &LabelSet) -> metrelay_core::Result<()>,
) -> c_int {
    let Some(name) = (unsafe { cstr_arg(name) }) else {
        return STATUS_ERR;
    };
    let Some(labels) = (unsafe { labels_from_pairs(pairs, count) }) else {
        return STATUS_ERR;
    };
    let Some(fw) = current_framework() else {
        tracing::warn!(%op, "called before initialize");
        return STATUS_ERR;
    };
    status(apply(&fw, name, &labels), op)
}

#[no_mangle]
pub unsafe extern "C" fn metrelay_increment_metric(
    name: *const c_char,
    labels: *const *const c_char,
    count: c_int,
) -> c_int {
    unsafe {
        mutate(name, labels, count, "increment", |fw, name, labels| {
            fw.increment(name, labels)
        })
    }
}

#[no_mangle]
pub unsafe extern "C" fn metrelay_decrement_metric(
    name: *const c_char,
    labels: *const *const c_char,
    count: c_int,
) -> c_int {
    unsafe {
        mutate(name, labels, count, "decrement", |fw, name, labels| {
            fw.decrement(name, labels)
        })
    }
}

#[no_mangle]
pub unsafe extern "C" fn metrelay_add_to_metric(
    name: *const c_char,
    value: c_double,
    labels: *const *const c_char,
    count: c_int,
) -> c_int {
    unsafe {
        mutate(name, labels, count, "add_to", move |fw, name, labels| {
            fw.add_to(name, value, labels)
        })
    }
}

#[no_mangle]
pub unsafe extern "C" fn metrelay_set_metric(
    name: *const c_char,
    value: c_double,
    labels: *const *const c_char,
    count: c_int,
) -> c_int {
    unsafe {
        mutate(name, labels, count, "set", move |fw, name, labels| {
            fw.set(name, value, labels)
        })
    }
}

/// Flush collected metrics to a push acceptor. Blocking, bounded by the
/// backend's own timeout.
#[no_mangle]
pub unsafe extern "C" fn metrelay_push_metrics(
    gateway_url: *const c_char,
    job_name: *const c_char,
) -> c_int {
    let (Some(url), Some(job)) = (unsafe { cstr_arg(gateway_url) }, unsafe {
        cstr_arg(job_name)
    }) else {
        return STATUS_ERR;
    };
    let Some(fw) = current_framework() else {
        tracing::warn!("push_metrics called before initialize");
        return STATUS_ERR;
    };
    status(fw.push_metrics(url, job), "push_metrics")
}

/// Snapshot of registered metric names as a caller-owned array of C strings.
/// Writes the element count to `out_len`; returns null (and 0) on failure or
/// before initialize. Release with `metrelay_free_metric_list`.
#[no_mangle]
pub unsafe extern "C" fn metrelay_list_metrics(out_len: *mut c_int) -> *mut *mut c_char {
    if out_len.is_null() {
        return std::ptr::null_mut();
    }
    unsafe { *out_len = 0 };

    let Some(fw) = current_framework() else {
        return std::ptr::null_mut();
    };

    let names: Vec<*mut c_char> = fw
        .list_metrics()
        .into_iter()
        .filter_map(|name| CString::new(name).ok())
        .map(CString::into_raw)
        .collect();

    let len = names.len();
    let list = Box::into_raw(names.into_boxed_slice()) as *mut *mut c_char;
    unsafe { *out_len = len as c_int };
    list
}

/// Release an array produced by `metrelay_list_metrics`.
#[no_mangle]
pub unsafe extern "C" fn metrelay_free_metric_list(list: *mut *mut c_char, len: c_int) {
    if list.is_null() || len < 0 {
        return;
    }
    let slice = unsafe { Box::from_raw(std::slice::from_raw_parts_mut(list, len as usize)) };
    for &entry in slice.iter() {
        if !entry.is_null() {
            drop(unsafe { CString::from_raw(entry) });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {
            "name": "ho_attempts",
            "displayName": "Handover Attempts",
            "description": "Total handover attempts",
            "object": ["node"],
            "metric_kind": "Counter"
        },
        {
            "name": "active_ues",
            "displayName": "Active UEs",
            "object": [],
            "metric_kind": "Gauge"
        }
    ]"#;

    fn cstring(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    // The singleton is process-global, so the whole lifecycle runs in one
    // test to keep ordering deterministic.
    #[test]
    fn full_lifecycle_through_the_c_abi() {
        let backend = cstring("prometheus");
        let namespace = cstring("ran");

        assert_eq!(
            unsafe { metrelay_initialize(backend.as_ptr(), namespace.as_ptr()) },
            STATUS_OK
        );
        // strict single-init: a second initialize is rejected
        assert_eq!(
            unsafe { metrelay_initialize(backend.as_ptr(), namespace.as_ptr()) },
            STATUS_ERR
        );

        let path = std::env::temp_dir().join(format!("metrelay-ffi-{}.json", std::process::id()));
        std::fs::write(&path, CATALOG).unwrap();
        let catalog_path = cstring(path.to_str().unwrap());
        assert_eq!(
            unsafe { metrelay_load_kpis(catalog_path.as_ptr()) },
            STATUS_OK
        );
        assert_eq!(metrelay_register_metrics(), STATUS_OK);
        // idempotent
        assert_eq!(metrelay_register_metrics(), STATUS_OK);

        let name = cstring("Handover Attempts");
        let key = cstring("node");
        let value = cstring("gnb-1");
        let pairs = [key.as_ptr(), value.as_ptr()];

        assert_eq!(
            unsafe { metrelay_increment_metric(name.as_ptr(), pairs.as_ptr(), 2) },
            STATUS_OK
        );
        // required label missing
        assert_eq!(
            unsafe { metrelay_increment_metric(name.as_ptr(), std::ptr::null(), 0) },
            STATUS_ERR
        );
        // set on a counter is an invalid operation
        assert_eq!(
            unsafe { metrelay_set_metric(name.as_ptr(), 3.0, pairs.as_ptr(), 2) },
            STATUS_ERR
        );

        let gauge = cstring("Active UEs");
        assert_eq!(
            unsafe { metrelay_set_metric(gauge.as_ptr(), 12.0, std::ptr::null(), 0) },
            STATUS_OK
        );

        let mut len: c_int = 0;
        let list = unsafe { metrelay_list_metrics(&mut len) };
        assert!(!list.is_null());
        assert_eq!(len, 2);
        let mut names: Vec<String> = (0..len as usize)
            .map(|i| {
                unsafe { CStr::from_ptr(*list.add(i)) }
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        assert_eq!(names, vec!["active_ues", "handover_attempts"]);
        unsafe { metrelay_free_metric_list(list, len) };

        assert_eq!(metrelay_shutdown(), STATUS_OK);
        // everything fails after teardown
        assert_eq!(metrelay_register_metrics(), STATUS_ERR);
        // and a fresh initialize is allowed again
        assert_eq!(
            unsafe { metrelay_initialize(backend.as_ptr(), namespace.as_ptr()) },
            STATUS_OK
        );
        assert_eq!(metrelay_shutdown(), STATUS_OK);
    }

    #[test]
    fn null_arguments_are_rejected() {
        assert_eq!(
            unsafe { metrelay_initialize(std::ptr::null(), std::ptr::null()) },
            STATUS_ERR
        );
        assert_eq!(unsafe { metrelay_load_kpis(std::ptr::null()) }, STATUS_ERR);
        assert!(unsafe { metrelay_list_metrics(std::ptr::null_mut()) }.is_null());
    }
}

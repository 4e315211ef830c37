//! # TetForge FFI
//!
//! C/C++ host bindings for the TetForge tetrahedralization plugin.
//!
//! The host registers its callbacks once, then fires operations at the
//! plugin; progress, log, and completion notifications arrive on the
//! worker thread and must be marshaled to the host's own thread affinity
//! by the host.
//!
//! ## Usage (C++)
//!
//! ```cpp
//! #include "tetforge.h"
//!
//! bool on_progress(float percent, const char* message) {
//!     printf("[%5.1f%%] %s\n", percent, message);
//!     return true; // false requests cancellation
//! }
//!
//! void on_complete(int32_t status) {
//!     printf("finished with status %d\n", status);
//! }
//!
//! int main() {
//!     tetforge_on_load();
//!     tetforge_register_progress_callback(on_progress);
//!     tetforge_register_complete_callback(on_complete);
//!
//!     if (!tetforge_tetrahedralize_mesh(vertex_count, vertices,
//!                                       triangle_count, indices, NULL)) {
//!         printf("rejected: %s\n", tetforge_last_error());
//!     }
//!
//!     // ... the worker reports back through the callbacks ...
//!     tetforge_on_unload(); // cancels and joins any in-flight worker
//!     return 0;
//! }
//! ```

mod bridge;
mod handler;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::ptr;
use std::slice;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use tetforge_core::{
    CancelToken, FanTetrahedralizer, HandlerPtr, Level, Operation, OperationHandle, SurfaceMesh,
    TetOptions, Tetrahedralizer,
};

pub use bridge::{CompleteCallback, HostBridge, LogCallback, ProgressCallback};
pub use handler::{HostCompletion, HostHandler, STATUS_CANCELLED, STATUS_COMPLETED, STATUS_FAILED};

/// Interface revision reported by `tetforge_get_version`. Revision 1 was
/// the original fire-and-forget surface without cancellation or status.
pub const INTERFACE_VERSION: i32 = 2;

// Thread-local error message storage
thread_local! {
    static LAST_ERROR: std::cell::RefCell<Option<String>> = std::cell::RefCell::new(None);
}

/// Callback registry shared by every operation.
static BRIDGE: Lazy<Arc<HostBridge>> = Lazy::new(|| Arc::new(HostBridge::new()));

/// Handle of the most recently started operation, kept so the host can
/// cancel it and so unload can join it.
static CURRENT: Lazy<Mutex<Option<OperationHandle>>> = Lazy::new(|| Mutex::new(None));

fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

fn current_operation() -> std::sync::MutexGuard<'static, Option<OperationHandle>> {
    CURRENT.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================
// Error Handling
// ============================================================

/// Get the last error message.
/// Returns NULL if no error occurred.
/// The returned string is valid until the next FFI call on the same thread.
#[no_mangle]
pub extern "C" fn tetforge_last_error() -> *const c_char {
    thread_local! {
        static ERROR_BUF: std::cell::RefCell<Option<CString>> = std::cell::RefCell::new(None);
    }

    LAST_ERROR.with(|e| {
        if let Some(ref msg) = *e.borrow() {
            ERROR_BUF.with(|buf| {
                let cstring = CString::new(msg.clone()).unwrap_or_default();
                let ptr = cstring.as_ptr();
                *buf.borrow_mut() = Some(cstring);
                ptr
            })
        } else {
            ptr::null()
        }
    })
}

// ============================================================
// Plugin Lifecycle
// ============================================================

/// Called by the host after loading the plugin. Idempotent.
#[no_mangle]
pub extern "C" fn tetforge_on_load() {
    Lazy::force(&BRIDGE);
    tracing::debug!(target: "tetforge", version = INTERFACE_VERSION, "plugin loaded");
}

/// Called by the host before unloading the plugin.
///
/// Cancels and joins any in-flight worker before clearing the callback
/// registry, so no worker can write into a torn-down host.
#[no_mangle]
pub extern "C" fn tetforge_on_unload() {
    let handle = current_operation().take();
    if let Some(handle) = handle {
        handle.cancel();
        handle.join();
    }
    BRIDGE.clear();
    tracing::debug!(target: "tetforge", "plugin unloaded");
}

/// Interface revision for host-side compatibility checks.
#[no_mangle]
pub extern "C" fn tetforge_get_version() -> i32 {
    INTERFACE_VERSION
}

// ============================================================
// Callback Registration
// ============================================================

/// Register the progress callback. Pass NULL to unregister.
///
/// The callback receives a percentage in `[0, 100]` and the checkpoint
/// message; returning `false` requests cooperative cancellation of the
/// operation that emitted it.
#[no_mangle]
pub extern "C" fn tetforge_register_progress_callback(callback: Option<ProgressCallback>) {
    BRIDGE.set_progress(callback);
}

/// Register the completion callback. Pass NULL to unregister.
///
/// Fires exactly once per started operation, on the worker thread, with
/// status 0 (completed), 1 (cancelled), or 2 (failed).
#[no_mangle]
pub extern "C" fn tetforge_register_complete_callback(callback: Option<CompleteCallback>) {
    BRIDGE.set_complete(callback);
}

/// Register the log callback. Pass NULL to unregister.
///
/// The callback receives a category (0 info, 1 warning, 2 error) and the
/// message text.
#[no_mangle]
pub extern "C" fn tetforge_register_log_callback(callback: Option<LogCallback>) {
    BRIDGE.set_log(callback);
}

/// Unregister every callback and reset the log level filter.
#[no_mangle]
pub extern "C" fn tetforge_clear_callbacks() {
    BRIDGE.clear();
}

/// Set the minimum severity delivered to the log callback:
/// 0 trace, 1 debug, 2 info, 3 warn, 4 error, 5 critical, 6 off.
///
/// Returns false (with the last error set) for an unknown level.
#[no_mangle]
pub extern "C" fn tetforge_set_log_level(level: i32) -> bool {
    match Level::from_index(level) {
        Some(level) => {
            BRIDGE.set_min_level(level);
            true
        }
        None => {
            set_last_error(format!("unknown log level {level}"));
            false
        }
    }
}

// ============================================================
// Operations
// ============================================================

/// Start a tetrahedralization of the given triangulated surface.
///
/// `vertices` must hold `vertex_count * 3` doubles (xyz per vertex) and
/// `indices` must hold `triangle_count * 3` vertex indices. Both buffers
/// are copied before this function returns. `output_path` is optional
/// (NULL or empty for none); when set, the finished mesh is written there.
///
/// Returns immediately. `true` means a worker was started and the
/// completion callback will fire exactly once; `false` means nothing was
/// started, see `tetforge_last_error()`. Starts are serialized: a second
/// start while one operation is in flight is rejected.
#[no_mangle]
pub extern "C" fn tetforge_tetrahedralize_mesh(
    vertex_count: i32,
    vertices: *const f64,
    triangle_count: i32,
    indices: *const u32,
    output_path: *const c_char,
) -> bool {
    start_operation(vertex_count, vertices, triangle_count, indices, output_path, ptr::null())
}

/// Like `tetforge_tetrahedralize_mesh`, with a JSON options document, e.g.
/// `{"checkpoint_granularity": 16, "estimated_steps": 55}`.
#[no_mangle]
pub extern "C" fn tetforge_tetrahedralize_mesh_with_options(
    vertex_count: i32,
    vertices: *const f64,
    triangle_count: i32,
    indices: *const u32,
    output_path: *const c_char,
    options_json: *const c_char,
) -> bool {
    start_operation(vertex_count, vertices, triangle_count, indices, output_path, options_json)
}

/// Request cooperative cancellation of the in-flight operation.
///
/// Returns true when a running operation was asked to stop; the actual
/// stop happens at the operation's next checkpoint and is reported
/// through the completion callback with the cancelled status.
#[no_mangle]
pub extern "C" fn tetforge_cancel_operation() -> bool {
    match current_operation().as_ref() {
        Some(handle) if !handle.is_finished() => {
            handle.cancel();
            true
        }
        _ => false,
    }
}

/// True while an operation's worker is running.
#[no_mangle]
pub extern "C" fn tetforge_operation_in_flight() -> bool {
    tetforge_core::operation_in_flight()
}

fn start_operation(
    vertex_count: i32,
    vertices: *const f64,
    triangle_count: i32,
    indices: *const u32,
    output_path: *const c_char,
    options_json: *const c_char,
) -> bool {
    match try_start(vertex_count, vertices, triangle_count, indices, output_path, options_json) {
        Ok(()) => true,
        Err(msg) => {
            set_last_error(msg);
            false
        }
    }
}

fn try_start(
    vertex_count: i32,
    vertices: *const f64,
    triangle_count: i32,
    indices: *const u32,
    output_path: *const c_char,
    options_json: *const c_char,
) -> Result<(), String> {
    if vertices.is_null() {
        return Err("vertex buffer is null".to_string());
    }
    if indices.is_null() {
        return Err("index buffer is null".to_string());
    }
    if vertex_count <= 0 {
        return Err(format!("vertex count must be positive, got {vertex_count}"));
    }
    if triangle_count <= 0 {
        return Err(format!("triangle count must be positive, got {triangle_count}"));
    }

    let vertex_buffer =
        unsafe { slice::from_raw_parts(vertices, vertex_count as usize * 3) };
    let index_buffer =
        unsafe { slice::from_raw_parts(indices, triangle_count as usize * 3) };
    let mesh = SurfaceMesh::from_buffers(vertex_buffer, index_buffer).map_err(|e| e.to_string())?;

    let options = if options_json.is_null() {
        TetOptions::default()
    } else {
        let json = unsafe { CStr::from_ptr(options_json) }.to_string_lossy();
        TetOptions::from_json(&json).map_err(|e| e.to_string())?
    };

    let output_path = if output_path.is_null() {
        None
    } else {
        let path = unsafe { CStr::from_ptr(output_path) }
            .to_string_lossy()
            .into_owned();
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    };

    let algorithm = FanTetrahedralizer;
    let total_steps = options
        .estimated_steps
        .unwrap_or_else(|| algorithm.estimated_steps(&mesh, &options));

    let token = CancelToken::new();
    let handler: HandlerPtr = Arc::new(HostHandler::new(
        Arc::clone(&BRIDGE),
        total_steps,
        token.clone(),
    ));

    let mut operation = Operation::new(mesh)
        .with_options(options)
        .with_algorithm(Arc::new(algorithm))
        .with_handler(handler)
        .with_token(token)
        .on_complete(Arc::new(HostCompletion::new(Arc::clone(&BRIDGE))));
    if let Some(path) = output_path {
        operation = operation.with_output_path(path);
    }

    let handle = operation.spawn().map_err(|e| e.to_string())?;
    *current_operation() = Some(handle);
    Ok(())
}

//! C-ABI wrapper around `todo-core`.
//!
//! # Overview
//! Exposes the todo list synchronizer through `extern "C"` functions so any
//! language with a C FFI can drive it without linking to Rust's async
//! runtime or serde directly. The host still does all IO: it pulls commands
//! with `todo_sync_next_command`, executes them, and reports each completion
//! back by request id.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Operations queue their commands in the handle's outbox; events are
//!   folded into the handle's revision, which the host polls before calling
//!   `todo_sync_view`.
//! - The C caller owns all returned pointers and must call the matching
//!   `todo_free_*` function to release them.

pub mod types;

use std::collections::VecDeque;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use todo_core::{
    ClientConfig, HttpResponse, Intent, ListPresenter, ListSync, Outcome, SyncEvent, TodoClient,
    TodoId,
};

use types::*;

fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn parse_id(ptr: *const c_char) -> Result<TodoId, FfiErrorCode> {
    if ptr.is_null() {
        return Err(FfiErrorCode::NullArg);
    }
    read_str(ptr)
        .and_then(|s| uuid::Uuid::parse_str(s).ok())
        .ok_or(FfiErrorCode::InvalidId)
}

/// Run `f` against the handle, translating null handles and panics into
/// error codes.
fn with_handle(
    handle: *mut FfiListSync,
    f: impl FnOnce(&mut FfiListSync) -> FfiErrorCode,
) -> FfiErrorCode {
    if handle.is_null() {
        return FfiErrorCode::NullArg;
    }
    catch_unwind(AssertUnwindSafe(|| f(unsafe { &mut *handle }))).unwrap_or(FfiErrorCode::Panic)
}

impl FfiListSync {
    fn absorb(&mut self, outcome: Outcome) -> Outcome {
        self.outbox.extend(outcome.commands);
        Outcome {
            commands: Vec::new(),
            events: outcome.events,
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Create a synchronizer bound to `base_url`, starting on `filter`.
///
/// Returns null if `base_url` is null or not UTF-8, or if an internal panic
/// occurs. The caller must free the returned pointer with `todo_sync_free`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_new(base_url: *const c_char, filter: FfiFilterTab) -> *mut FfiListSync {
    catch_unwind(|| {
        let Some(url) = read_str(base_url) else {
            return std::ptr::null_mut();
        };
        let config = ClientConfig {
            base_url: url.to_string(),
            default_filter: filter.into(),
            ..ClientConfig::default()
        };
        Box::into_raw(Box::new(FfiListSync {
            sync: ListSync::new(TodoClient::new(&config.base_url), config.default_filter),
            presenter: ListPresenter::from_config(&config),
            outbox: VecDeque::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a synchronizer created by `todo_sync_new`. Safe to call with null.
/// Queued commands that were never collected are dropped.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_free(handle: *mut FfiListSync) {
    if !handle.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(handle) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Issue the initial fetch for the active filter.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_start(handle: *mut FfiListSync) -> FfiErrorCode {
    with_handle(handle, |h| {
        let outcome = h.sync.start();
        h.absorb(outcome);
        FfiErrorCode::Ok
    })
}

/// Switch the active filter tab. Selecting the active tab is a no-op.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_select_filter(
    handle: *mut FfiListSync,
    filter: FfiFilterTab,
) -> FfiErrorCode {
    with_handle(handle, |h| {
        let outcome = h.presenter.dispatch(Intent::SelectFilter(filter.into()), &mut h.sync);
        h.absorb(outcome);
        FfiErrorCode::Ok
    })
}

/// Refetch the active filter, e.g. from a retry button.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_refresh(handle: *mut FfiListSync) -> FfiErrorCode {
    with_handle(handle, |h| {
        let outcome = h.presenter.dispatch(Intent::Retry, &mut h.sync);
        h.absorb(outcome);
        FfiErrorCode::Ok
    })
}

/// Toggle the row with `id`.
///
/// Returns `UnknownRow` if no displayed row has that id.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_toggle(handle: *mut FfiListSync, id: *const c_char) -> FfiErrorCode {
    row_intent(handle, id, Intent::Toggle)
}

/// Delete the row with `id`.
///
/// Returns `UnknownRow` if no displayed row has that id.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_delete(handle: *mut FfiListSync, id: *const c_char) -> FfiErrorCode {
    row_intent(handle, id, Intent::Delete)
}

fn row_intent(
    handle: *mut FfiListSync,
    id: *const c_char,
    intent: fn(TodoId) -> Intent,
) -> FfiErrorCode {
    with_handle(handle, |h| {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(code) => return code,
        };
        if h.sync.todo(id).is_none() {
            return FfiErrorCode::UnknownRow;
        }
        let outcome = h.presenter.dispatch(intent(id), &mut h.sync);
        h.absorb(outcome);
        FfiErrorCode::Ok
    })
}

/// Create a todo with `body`.
///
/// Returns `InvalidInput` for blank bodies; no command is queued then.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_create(handle: *mut FfiListSync, body: *const c_char) -> FfiErrorCode {
    with_handle(handle, |h| {
        let Some(body) = read_str(body) else {
            return FfiErrorCode::NullArg;
        };
        let outcome = h.sync.create_todo(body);
        let rest = h.absorb(outcome);
        if rest
            .events
            .iter()
            .any(|e| matches!(e, SyncEvent::CreateFailed { .. }))
        {
            FfiErrorCode::InvalidInput
        } else {
            FfiErrorCode::Ok
        }
    })
}

/// Forward a key press to the presenter's keyboard model.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_key(handle: *mut FfiListSync, key: FfiKey) -> FfiErrorCode {
    with_handle(handle, |h| {
        let outcome = h.presenter.on_key(key.into(), &mut h.sync);
        h.absorb(outcome);
        FfiErrorCode::Ok
    })
}

// ---------------------------------------------------------------------------
// Host IO
// ---------------------------------------------------------------------------

/// Take the oldest command the host has not executed yet.
///
/// Returns null when there is nothing to do or `handle` is null.
/// The caller must free the returned pointer with `todo_free_command`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_next_command(handle: *mut FfiListSync) -> *mut FfiCommand {
    if handle.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let h = unsafe { &mut *handle };
        match h.outbox.pop_front() {
            Some(cmd) => FfiCommand::from_core(cmd),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Report the HTTP response for `request_id`. A null body is treated as
/// empty. Unknown request ids are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_handle_response(
    handle: *mut FfiListSync,
    request_id: u64,
    response: *const FfiHttpResponse,
) -> FfiErrorCode {
    with_handle(handle, |h| {
        if response.is_null() {
            return FfiErrorCode::NullArg;
        }
        let resp = unsafe { &*response };
        let body = read_str(resp.body).unwrap_or("");
        let outcome = h
            .sync
            .handle_response(request_id, HttpResponse::new(resp.status, body));
        h.absorb(outcome);
        FfiErrorCode::Ok
    })
}

/// Report that the request for `request_id` could not be executed.
/// `message` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_handle_transport_error(
    handle: *mut FfiListSync,
    request_id: u64,
    message: *const c_char,
) -> FfiErrorCode {
    with_handle(handle, |h| {
        let message = read_str(message).unwrap_or("transport error");
        let outcome = h.sync.handle_transport_error(request_id, message);
        h.absorb(outcome);
        FfiErrorCode::Ok
    })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Monotonic counter bumped on every visible change. Hosts compare it
/// against the last rendered value to decide whether to call
/// `todo_sync_view`. Returns 0 for a null handle.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_revision(handle: *const FfiListSync) -> u64 {
    if handle.is_null() {
        return 0;
    }
    catch_unwind(AssertUnwindSafe(|| unsafe { &*handle }.sync.revision())).unwrap_or(0)
}

/// Render the current list, with the transition from the previous call.
///
/// Returns null if `handle` is null. The caller must free the returned
/// pointer with `todo_free_view`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_sync_view(handle: *mut FfiListSync) -> *mut FfiListView {
    if handle.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let h = unsafe { &mut *handle };
        let frame = h.presenter.render(&h.sync);
        FfiListView::from_frame(frame, h.sync.active_filter())
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiCommand` and all its owned strings. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_command(cmd: *mut FfiCommand) {
    if cmd.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let mut cmd = unsafe { Box::from_raw(cmd) };
        cmd.request.free_fields();
    });
}

/// Free an `FfiListView` and all its rows. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_view(view: *mut FfiListView) {
    if view.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let mut view = unsafe { Box::from_raw(view) };
        free_c_string(view.message);
        view.transition.free_fields();
        if !view.rows.is_null() && view.rows_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(view.rows, view.rows_len as usize);
            let rows = unsafe { Box::from_raw(slice) };
            for row in rows.iter() {
                free_row_fields(row);
            }
        }
    });
}

/// Free a C string returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_string(s: *mut c_char) {
    free_c_string(s);
}

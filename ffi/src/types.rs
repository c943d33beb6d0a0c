//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! enums with explicit discriminants. Conversions live here to keep `lib.rs`
//! focused on the `extern "C"` surface.

use std::collections::VecDeque;
use std::ffi::CString;
use std::os::raw::c_char;

use todo_core::animate::{Easing, TransitionPlan};
use todo_core::http::HttpMethod;
use todo_core::presenter::{Background, Frame, Key, ListBody};
use todo_core::TodoId;
use todo_core::{Command, FilterTab, HttpRequest, ListPresenter, ListSync};

/// Opaque handle to a synchronizer and its presenter. C callers receive a
/// pointer to this and pass it back into every `todo_sync_*` function.
pub struct FfiListSync {
    pub(crate) sync: ListSync,
    pub(crate) presenter: ListPresenter,
    /// Commands issued by the core that the host has not collected yet.
    pub(crate) outbox: VecDeque<Command>,
}

/// Copy `s` into a heap C string, dropping interior NULs.
pub(crate) fn c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

/// Free a string produced by `c_string`. Safe with null.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Filters and keys
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FfiFilterTab {
    All = 0,
    Pending = 1,
    Completed = 2,
}

impl From<FfiFilterTab> for FilterTab {
    fn from(tab: FfiFilterTab) -> Self {
        match tab {
            FfiFilterTab::All => FilterTab::All,
            FfiFilterTab::Pending => FilterTab::Pending,
            FfiFilterTab::Completed => FilterTab::Completed,
        }
    }
}

impl From<FilterTab> for FfiFilterTab {
    fn from(tab: FilterTab) -> Self {
        match tab {
            FilterTab::All => FfiFilterTab::All,
            FilterTab::Pending => FfiFilterTab::Pending,
            FilterTab::Completed => FfiFilterTab::Completed,
        }
    }
}

/// Keyboard input forwarded by the host. `Retry` and `Tab1`..`Tab3` stand
/// for the `r` and `1`..`3` character keys.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FfiKey {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    Tab = 4,
    BackTab = 5,
    Space = 6,
    Enter = 7,
    Delete = 8,
    Retry = 9,
    Tab1 = 10,
    Tab2 = 11,
    Tab3 = 12,
}

impl From<FfiKey> for Key {
    fn from(key: FfiKey) -> Self {
        match key {
            FfiKey::Up => Key::Up,
            FfiKey::Down => Key::Down,
            FfiKey::Left => Key::Left,
            FfiKey::Right => Key::Right,
            FfiKey::Tab => Key::Tab,
            FfiKey::BackTab => Key::BackTab,
            FfiKey::Space => Key::Space,
            FfiKey::Enter => Key::Enter,
            FfiKey::Delete => Key::Delete,
            FfiKey::Retry => Key::Char('r'),
            FfiKey::Tab1 => Key::Char('1'),
            FfiKey::Tab2 => Key::Char('2'),
            FfiKey::Tab3 => Key::Char('3'),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Patch = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data. `body` is null for
/// requests without one.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    fn from_core(req: HttpRequest) -> Self {
        let body = match req.body {
            Some(b) => c_string(&b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        FfiHttpRequest {
            method: req.method.into(),
            url: c_string(&req.url),
            headers,
            headers_len,
            body,
        }
    }

    /// Release the strings and header array owned by this request.
    pub(crate) fn free_fields(&mut self) {
        free_c_string(self.url);
        free_c_string(self.body);
        if !self.headers.is_null() && self.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(self.headers, self.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
        self.url = std::ptr::null_mut();
        self.body = std::ptr::null_mut();
        self.headers = std::ptr::null_mut();
        self.headers_len = 0;
    }
}

/// A request the host must execute, then report back with
/// `todo_sync_handle_response` or `todo_sync_handle_transport_error` using
/// the same `request_id`.
#[repr(C)]
pub struct FfiCommand {
    pub request_id: u64,
    pub request: FfiHttpRequest,
}

impl FfiCommand {
    pub(crate) fn from_core(cmd: Command) -> *mut Self {
        Box::into_raw(Box::new(FfiCommand {
            request_id: cmd.request_id,
            request: FfiHttpRequest::from_core(cmd.request),
        }))
    }
}

/// An HTTP response described as C-compatible plain data.
///
/// The C caller builds this on the stack after executing a command. The FFI
/// layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Results and views
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FfiErrorCode {
    Ok = 0,
    NullArg = 1,
    InvalidId = 2,
    InvalidInput = 3,
    UnknownRow = 4,
    Panic = 5,
}

#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FfiCollectionState {
    Loading = 0,
    Available = 1,
    Unavailable = 2,
}

/// One rendered row. `error` is null unless the last mutation on the row
/// failed.
#[repr(C)]
pub struct FfiRow {
    pub id: *mut c_char,
    pub body: *mut c_char,
    pub checked: bool,
    pub strikethrough: bool,
    pub muted_background: bool,
    pub busy: bool,
    pub error: *mut c_char,
    pub check_label: *mut c_char,
    pub delete_label: *mut c_char,
}

/// `None` means the rows should swap without animating.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FfiEasing {
    None = 0,
    Linear = 1,
    EaseInOut = 2,
}

impl From<Option<Easing>> for FfiEasing {
    fn from(easing: Option<Easing>) -> Self {
        match easing {
            None => FfiEasing::None,
            Some(Easing::Linear) => FfiEasing::Linear,
            Some(Easing::EaseInOut) => FfiEasing::EaseInOut,
        }
    }
}

/// Row ids as C strings. `ids` is null when `len` is 0.
#[repr(C)]
pub struct FfiIdList {
    pub ids: *mut *mut c_char,
    pub len: u32,
}

impl FfiIdList {
    fn from_ids(ids: &[TodoId]) -> Self {
        if ids.is_empty() {
            return FfiIdList {
                ids: std::ptr::null_mut(),
                len: 0,
            };
        }
        let strings: Box<[*mut c_char]> = ids.iter().map(|id| c_string(&id.to_string())).collect();
        FfiIdList {
            len: strings.len() as u32,
            ids: Box::into_raw(strings) as *mut *mut c_char,
        }
    }

    pub(crate) fn free(&mut self) {
        if !self.ids.is_null() && self.len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(self.ids, self.len as usize);
            let strings = unsafe { Box::from_raw(slice) };
            for s in strings.iter() {
                free_c_string(*s);
            }
        }
        self.ids = std::ptr::null_mut();
        self.len = 0;
    }
}

/// How rows changed since the previous `todo_sync_view` call.
#[repr(C)]
pub struct FfiTransition {
    pub entering: FfiIdList,
    pub leaving: FfiIdList,
    pub moved: FfiIdList,
    pub duration_ms: u64,
    pub easing: FfiEasing,
}

impl FfiTransition {
    fn from_plan(plan: &TransitionPlan) -> Self {
        FfiTransition {
            entering: FfiIdList::from_ids(&plan.entering),
            leaving: FfiIdList::from_ids(&plan.leaving),
            moved: FfiIdList::from_ids(&plan.moved),
            duration_ms: plan.duration.as_millis() as u64,
            easing: plan.easing.into(),
        }
    }

    pub(crate) fn free_fields(&mut self) {
        self.entering.free();
        self.leaving.free();
        self.moved.free();
    }
}

/// The rendered list. `message` is set when `state` is `Unavailable`.
#[repr(C)]
pub struct FfiListView {
    pub state: FfiCollectionState,
    pub active_filter: FfiFilterTab,
    pub rows: *mut FfiRow,
    pub rows_len: u32,
    pub message: *mut c_char,
    pub revision: u64,
    pub transition: FfiTransition,
}

impl FfiListView {
    pub(crate) fn from_frame(frame: Frame, active_filter: FilterTab) -> *mut Self {
        let transition = FfiTransition::from_plan(&frame.transition);
        let view = frame.view;
        let (state, message, rows) = match view.body {
            ListBody::Loading => (FfiCollectionState::Loading, std::ptr::null_mut(), Vec::new()),
            ListBody::Unavailable { message, detail } => (
                FfiCollectionState::Unavailable,
                c_string(&format!("{message} ({detail})")),
                Vec::new(),
            ),
            ListBody::Rows(rows) => (FfiCollectionState::Available, std::ptr::null_mut(), rows),
        };

        let rows_len = rows.len() as u32;
        let rows = if rows.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_rows: Box<[FfiRow]> = rows
                .into_iter()
                .map(|row| FfiRow {
                    id: c_string(&row.id.to_string()),
                    body: c_string(&row.body),
                    checked: row.checked,
                    strikethrough: row.visual.strikethrough,
                    muted_background: row.visual.background == Background::Muted,
                    busy: row.busy,
                    error: row.error.as_deref().map_or(std::ptr::null_mut(), c_string),
                    check_label: c_string(&row.check_control.name),
                    delete_label: c_string(&row.delete_control.name),
                })
                .collect();
            Box::into_raw(ffi_rows) as *mut FfiRow
        };

        Box::into_raw(Box::new(FfiListView {
            state,
            active_filter: active_filter.into(),
            rows,
            rows_len,
            message,
            revision: view.revision,
            transition,
        }))
    }
}

/// Free the C strings of an `FfiRow` (but not the struct itself).
pub(crate) fn free_row_fields(row: &FfiRow) {
    free_c_string(row.id);
    free_c_string(row.body);
    free_c_string(row.error);
    free_c_string(row.check_label);
    free_c_string(row.delete_label);
}

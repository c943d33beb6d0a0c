//! Drive the C ABI the way a host application would: pull commands, run them
//! over real HTTP against the mock server, push the responses back, and read
//! the rendered view.

use std::ffi::{CStr, CString};

use todo_ffi::types::*;
use todo_ffi::*;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn c_str(ptr: *const std::os::raw::c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string())
    }
}

/// Execute every queued command until the outbox is empty.
fn pump(handle: *mut FfiListSync) {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    loop {
        let cmd = todo_sync_next_command(handle);
        if cmd.is_null() {
            break;
        }
        let c = unsafe { &*cmd };
        let url = c_str(c.request.url).unwrap();
        let body = c_str(c.request.body);

        let result = match (&c.request.method, body) {
            (FfiHttpMethod::Get, _) => agent.get(&url).call(),
            (FfiHttpMethod::Delete, _) => agent.delete(&url).call(),
            (FfiHttpMethod::Post, Some(b)) => agent
                .post(&url)
                .content_type("application/json")
                .send(b.as_bytes()),
            (FfiHttpMethod::Post, None) => agent.post(&url).send_empty(),
            (FfiHttpMethod::Patch, Some(b)) => agent
                .patch(&url)
                .content_type("application/json")
                .send(b.as_bytes()),
            (FfiHttpMethod::Patch, None) => agent.patch(&url).send_empty(),
        };

        let request_id = c.request_id;
        todo_free_command(cmd);

        match result {
            Ok(mut response) => {
                let status = response.status().as_u16();
                let text = response.body_mut().read_to_string().unwrap_or_default();
                let text = CString::new(text).unwrap();
                let resp = FfiHttpResponse {
                    status,
                    body: text.as_ptr(),
                };
                assert_eq!(todo_sync_handle_response(handle, request_id, &resp), FfiErrorCode::Ok);
            }
            Err(e) => {
                let msg = CString::new(e.to_string()).unwrap();
                todo_sync_handle_transport_error(handle, request_id, msg.as_ptr());
            }
        }
    }
}

fn rows(handle: *mut FfiListSync) -> Vec<(String, String, bool)> {
    let view = todo_sync_view(handle);
    let v = unsafe { &*view };
    let out = if v.rows.is_null() {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(v.rows, v.rows_len as usize) }
            .iter()
            .map(|r| (c_str(r.id).unwrap(), c_str(r.body).unwrap(), r.checked))
            .collect()
    };
    todo_free_view(view);
    out
}

#[test]
fn create_toggle_filter_delete_through_c_abi() {
    let base_url = CString::new(start_server()).unwrap();
    let handle = todo_sync_new(base_url.as_ptr(), FfiFilterTab::All);
    assert!(!handle.is_null());

    todo_sync_start(handle);
    pump(handle);
    assert!(rows(handle).is_empty());

    for body in ["Buy milk", "Walk dog"] {
        let body = CString::new(body).unwrap();
        assert_eq!(todo_sync_create(handle, body.as_ptr()), FfiErrorCode::Ok);
        pump(handle);
    }
    let listed = rows(handle);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].1, "Buy milk");
    assert!(!listed[1].2);

    let revision = todo_sync_revision(handle);
    let dog = CString::new(listed[1].0.clone()).unwrap();
    assert_eq!(todo_sync_toggle(handle, dog.as_ptr()), FfiErrorCode::Ok);
    pump(handle);
    assert!(todo_sync_revision(handle) > revision);
    assert!(rows(handle)[1].2);

    todo_sync_select_filter(handle, FfiFilterTab::Completed);
    pump(handle);
    let completed = rows(handle);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].1, "Walk dog");

    assert_eq!(todo_sync_delete(handle, dog.as_ptr()), FfiErrorCode::Ok);
    pump(handle);
    assert!(rows(handle).is_empty());

    todo_sync_select_filter(handle, FfiFilterTab::Pending);
    pump(handle);
    let pending = rows(handle);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].1, "Buy milk");

    todo_sync_free(handle);
}

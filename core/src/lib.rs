//! Client core for a filterable todo list backed by a remote service.
//!
//! # Overview
//! Keeps a displayed todo list consistent with the service that owns it.
//! The core never touches the network (host-does-IO pattern): it emits
//! plain-data HTTP requests and consumes plain-data responses, so it is
//! deterministic and easy to drive from tests, threads, an async runtime or
//! the C ABI in `todo-ffi`.
//!
//! # Design
//! - `TodoClient` is stateless: `build_*` produces a request, `parse_*`
//!   consumes a response, one pair per remote capability.
//! - `FilterController` holds the active tab and its status set.
//! - `ListSync` owns the collection. Mutations go to the service first and
//!   the view only changes when the follow-up refetch lands; stale fetches
//!   are discarded by filter and generation.
//! - `ListPresenter` renders rows from `ListSync` and maps pointer and
//!   keyboard gestures back onto it. Transitions are computed by an
//!   `Animator` and never touch data.

pub mod animate;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod presenter;
pub mod sync;
pub mod types;

pub use animate::{Animator, AutoAnimate, NoAnimation, TransitionPlan};
pub use client::TodoClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, FilterParseError};
pub use filter::{FilterController, FilterTab, TabView};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use presenter::{Frame, Intent, Key, ListBody, ListPresenter, ListView, RowView, RowVisual};
pub use sync::{Collection, Command, ListSync, Mutation, MutationKind, Operation, Outcome, RequestId, SyncEvent};
pub use types::{CreateTodo, Todo, TodoId, TodoStatus, UpdateTodoStatus};

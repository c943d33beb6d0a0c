//! Domain DTOs for the todo service.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates. `TodoStatus` is
//! a closed enum so an unrecognized status can never be represented locally:
//! a response carrying one fails to deserialize instead of being coerced.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque todo identifier assigned by the service.
pub type TodoId = Uuid;

/// The two states a todo can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Pending,
    Completed,
}

impl TodoStatus {
    /// The status a toggle moves to.
    pub fn toggled(self) -> Self {
        match self {
            TodoStatus::Pending => TodoStatus::Completed,
            TodoStatus::Completed => TodoStatus::Pending,
        }
    }

    /// Wire name, as used in JSON bodies and the `statuses` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single todo item returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub body: String,
    pub status: TodoStatus,
}

/// Request payload for creating a todo. New todos always start pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    pub body: String,
}

/// Request payload for setting a todo's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTodoStatus {
    pub status: TodoStatus,
}

use std::{fmt, str::FromStr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Pending,
    Completed,
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoStatus::Pending => write!(f, "pending"),
            TodoStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for TodoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TodoStatus::Pending),
            "completed" => Ok(TodoStatus::Completed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub body: String,
    pub status: TodoStatus,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub body: String,
}

#[derive(Deserialize)]
pub struct UpdateTodoStatus {
    pub status: TodoStatus,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub statuses: Option<String>,
}

/// Todos in creation order. A `Vec` keeps list responses stable, which the
/// client relies on since it never sorts.
pub type Db = Arc<RwLock<Vec<Todo>>>;

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Build the router over an existing store so tests can seed or inspect it.
pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}/status", patch(update_todo_status))
        .route("/todos/{id}", delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "todo service listening");
    }
    axum::serve(listener, app()).await
}

/// Parse `pending,completed` into a status list. A missing parameter means
/// every status; an empty or unknown entry is rejected.
pub fn parse_statuses(raw: Option<&str>) -> Result<Vec<TodoStatus>, String> {
    let Some(raw) = raw else {
        return Ok(vec![TodoStatus::Pending, TodoStatus::Completed]);
    };
    if raw.trim().is_empty() {
        return Err("statuses must not be empty".to_string());
    }
    raw.split(',').map(|s| s.trim().parse()).collect()
}

async fn list_todos(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Todo>>> {
    let statuses = parse_statuses(params.statuses.as_deref()).map_err(|e| {
        tracing::warn!(error = %e, "rejected list request");
        (StatusCode::BAD_REQUEST, e)
    })?;
    let todos = db.read().await;
    let matching: Vec<Todo> = todos
        .iter()
        .filter(|t| statuses.contains(&t.status))
        .cloned()
        .collect();
    tracing::debug!(count = matching.len(), ?statuses, "listed todos");
    Ok(Json(matching))
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    if input.body.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "body must not be empty".to_string()));
    }
    let todo = Todo {
        id: Uuid::new_v4(),
        body: input.body,
        status: TodoStatus::Pending,
    };
    db.write().await.push(todo.clone());
    tracing::info!(id = %todo.id, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo_status(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTodoStatus>,
) -> Result<Json<Todo>, StatusCode> {
    let mut todos = db.write().await;
    let todo = todos
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    todo.status = input.status;
    tracing::info!(%id, status = %input.status, "updated todo status");
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<Uuid>) -> StatusCode {
    let mut todos = db.write().await;
    match todos.iter().position(|t| t.id == id) {
        Some(index) => {
            todos.remove(index);
            tracing::info!(%id, "deleted todo");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_status_as_lowercase() {
        let todo = Todo {
            id: Uuid::nil(),
            body: "Test".to_string(),
            status: TodoStatus::Completed,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["body"], "Test");
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn create_todo_rejects_missing_body() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"title":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_status_rejects_unknown_status() {
        let result: Result<UpdateTodoStatus, _> =
            serde_json::from_str(r#"{"status":"archived"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_statuses_means_all() {
        let statuses = parse_statuses(None).unwrap();
        assert_eq!(statuses, vec![TodoStatus::Pending, TodoStatus::Completed]);
    }

    #[test]
    fn statuses_are_comma_separated() {
        assert_eq!(
            parse_statuses(Some("completed")).unwrap(),
            vec![TodoStatus::Completed]
        );
        assert_eq!(
            parse_statuses(Some("pending, completed")).unwrap(),
            vec![TodoStatus::Pending, TodoStatus::Completed]
        );
    }

    #[test]
    fn empty_or_unknown_statuses_are_rejected() {
        assert!(parse_statuses(Some("")).is_err());
        assert!(parse_statuses(Some("pending,done")).is_err());
    }
}

//! List synchronizer: a read-through view of the todos matching the active
//! filter.
//!
//! # Design
//! `ListSync` never performs I/O. Every operation returns an `Outcome` whose
//! `commands` the host must execute; each completion is handed back through
//! `handle_response` or `handle_transport_error` keyed by `RequestId`. The
//! host may run commands concurrently and deliver completions in any order.
//!
//! - Mutations are never applied locally. A successful mutation triggers a
//!   refetch of the active filter, and only that refetch changes the view.
//! - Every fetch carries the filter it was issued for and a generation. A
//!   fetch result is applied only if its filter is still active and it is
//!   newer than the result on screen; anything else is a superseded response
//!   and is dropped.
//! - Mutations on one row are serialized: while one is in flight, later
//!   gestures on that row overwrite a single queued slot, which is issued
//!   once the in-flight request completes. A successful delete discards the
//!   slot.
//! - `revision` increases on every observable change, so a presenter can
//!   poll it to decide whether to redraw.

use std::collections::HashMap;

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::filter::{FilterController, FilterTab};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Todo, TodoId, TodoStatus};

/// Identifies one issued command so its completion can be matched up.
pub type RequestId = u64;

/// A change requested for a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetStatus { id: TodoId, status: TodoStatus },
    Delete { id: TodoId },
}

impl Mutation {
    pub fn id(&self) -> TodoId {
        match self {
            Mutation::SetStatus { id, .. } | Mutation::Delete { id } => *id,
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::SetStatus { .. } => MutationKind::SetStatus,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    SetStatus,
    Delete,
}

/// What an in-flight request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Fetch { filter: FilterTab, generation: u64 },
    Mutate(Mutation),
    Create { body: String },
}

/// A request the host must execute and report back on.
#[derive(Debug, Clone)]
pub struct Command {
    pub request_id: RequestId,
    pub operation: Operation,
    pub request: HttpRequest,
}

/// Signals emitted for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    FilterChanged(FilterTab),
    CollectionUpdated { filter: FilterTab, len: usize },
    CollectionUnavailable { error: String },
    ResponseDiscarded { request_id: RequestId },
    MutationQueued { id: TodoId, kind: MutationKind },
    MutationSucceeded { id: TodoId, kind: MutationKind },
    MutationFailed { id: TodoId, kind: MutationKind, error: String },
    TodoCreated { id: TodoId },
    CreateFailed { error: String },
}

/// Commands to execute and events to forward, produced by every operation.
#[derive(Debug, Default)]
pub struct Outcome {
    pub commands: Vec<Command>,
    pub events: Vec<SyncEvent>,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty()
    }

    fn merge(&mut self, other: Outcome) {
        self.commands.extend(other.commands);
        self.events.extend(other.events);
    }
}

/// The materialized view of the active filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    /// No result for the active filter has arrived yet.
    Loading,
    /// The last applied list response, in server order.
    Available(Vec<Todo>),
    /// The last fetch failed; nothing is shown until a retry succeeds.
    Unavailable { error: String },
}

impl Collection {
    pub fn todos(&self) -> Option<&[Todo]> {
        match self {
            Collection::Available(todos) => Some(todos.as_slice()),
            Collection::Loading | Collection::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug)]
struct RowQueue {
    in_flight: RequestId,
    queued: Option<Mutation>,
}

/// Owns the displayed collection and every request that can change it.
#[derive(Debug)]
pub struct ListSync {
    client: TodoClient,
    filter: FilterController,
    collection: Collection,
    next_request_id: RequestId,
    issued_generation: u64,
    applied_generation: u64,
    in_flight: HashMap<RequestId, Operation>,
    rows: HashMap<TodoId, RowQueue>,
    row_errors: HashMap<TodoId, String>,
    notices: Vec<String>,
    revision: u64,
}

impl ListSync {
    pub fn new(client: TodoClient, default_filter: FilterTab) -> Self {
        Self {
            client,
            filter: FilterController::new(default_filter),
            collection: Collection::Loading,
            next_request_id: 1,
            issued_generation: 0,
            applied_generation: 0,
            in_flight: HashMap::new(),
            rows: HashMap::new(),
            row_errors: HashMap::new(),
            notices: Vec::new(),
            revision: 0,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(TodoClient::new(&config.base_url), config.default_filter)
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn active_filter(&self) -> FilterTab {
        self.filter.active()
    }

    pub fn filter(&self) -> &FilterController {
        &self.filter
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Look up a displayed todo.
    pub fn todo(&self, id: TodoId) -> Option<&Todo> {
        self.collection.todos()?.iter().find(|t| t.id == id)
    }

    /// Whether a mutation for this row is in flight.
    pub fn is_busy(&self, id: TodoId) -> bool {
        self.rows.contains_key(&id)
    }

    /// The last mutation failure recorded for this row, if any.
    pub fn row_error(&self, id: TodoId) -> Option<&str> {
        self.row_errors.get(&id).map(String::as_str)
    }

    /// Failures not tied to a displayed row (e.g. a rejected create).
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Initial fetch for the default filter.
    pub fn start(&mut self) -> Outcome {
        self.fetch_todos()
    }

    /// Switch to `tab` and fetch its statuses. No-op if already active.
    pub fn select_filter(&mut self, tab: FilterTab) -> Outcome {
        let mut outcome = Outcome::default();
        if !self.filter.select(tab) {
            return outcome;
        }
        self.collection = Collection::Loading;
        self.touch();
        outcome.events.push(SyncEvent::FilterChanged(tab));
        outcome.merge(self.fetch_todos());
        outcome
    }

    /// Issue the list request for the active filter. The current collection
    /// stays on screen until the response arrives, unless it is unavailable.
    pub fn fetch_todos(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        let filter = self.filter.active();
        let request = match self.client.build_list_todos(filter.statuses()) {
            Ok(request) => request,
            Err(e) => {
                self.mark_unavailable(&e, &mut outcome);
                return outcome;
            }
        };
        if matches!(self.collection, Collection::Unavailable { .. }) {
            self.collection = Collection::Loading;
            self.touch();
        }
        self.issued_generation += 1;
        let generation = self.issued_generation;
        let request_id = self.next_request_id();
        tracing::debug!(request_id, %filter, generation, "issuing fetch");
        outcome.commands.push(self.track(
            request_id,
            Operation::Fetch { filter, generation },
            request,
        ));
        outcome
    }

    /// Retry after a failure. Same as `fetch_todos`.
    pub fn refresh(&mut self) -> Outcome {
        self.fetch_todos()
    }

    /// Request the inverse of `todo.status`. The displayed row does not change
    /// until the follow-up refetch completes.
    pub fn toggle_status(&mut self, todo: &Todo) -> Outcome {
        self.submit(Mutation::SetStatus {
            id: todo.id,
            status: todo.status.toggled(),
        })
    }

    /// Request deletion. The row disappears once the follow-up refetch
    /// completes.
    pub fn delete_todo(&mut self, todo: &Todo) -> Outcome {
        self.submit(Mutation::Delete { id: todo.id })
    }

    /// Request a new todo. Blank bodies are rejected without a round trip.
    pub fn create_todo(&mut self, body: &str) -> Outcome {
        let mut outcome = Outcome::default();
        let input = CreateTodo {
            body: body.to_string(),
        };
        match self.client.build_create_todo(&input) {
            Ok(request) => {
                let request_id = self.next_request_id();
                tracing::debug!(request_id, "issuing create");
                outcome.commands.push(self.track(
                    request_id,
                    Operation::Create { body: input.body },
                    request,
                ));
            }
            Err(e) => self.record_create_failure(&e, &mut outcome),
        }
        outcome
    }

    pub fn dismiss_row_error(&mut self, id: TodoId) {
        if self.row_errors.remove(&id).is_some() {
            self.touch();
        }
    }

    pub fn dismiss_notices(&mut self) {
        if !self.notices.is_empty() {
            self.notices.clear();
            self.touch();
        }
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    /// Deliver the response for a previously issued command.
    pub fn handle_response(&mut self, request_id: RequestId, response: HttpResponse) -> Outcome {
        self.complete(request_id, Ok(response))
    }

    /// Report that a command could not be executed at all.
    pub fn handle_transport_error(
        &mut self,
        request_id: RequestId,
        message: impl Into<String>,
    ) -> Outcome {
        self.complete(request_id, Err(ApiError::Transport(message.into())))
    }

    fn complete(&mut self, request_id: RequestId, reply: Result<HttpResponse, ApiError>) -> Outcome {
        let Some(operation) = self.in_flight.remove(&request_id) else {
            tracing::warn!(request_id, "completion for unknown request ignored");
            return Outcome::default();
        };
        match operation {
            Operation::Fetch { filter, generation } => {
                let result = reply.and_then(|r| self.client.parse_list_todos(r));
                self.complete_fetch(request_id, filter, generation, result)
            }
            Operation::Mutate(mutation) => {
                let result = reply.and_then(|r| match mutation {
                    Mutation::SetStatus { .. } => {
                        self.client.parse_update_todo_status(r).map(|_| ())
                    }
                    Mutation::Delete { .. } => self.client.parse_delete_todo(r),
                });
                self.complete_mutation(request_id, mutation, result)
            }
            Operation::Create { .. } => {
                let result = reply.and_then(|r| self.client.parse_create_todo(r));
                self.complete_create(result)
            }
        }
    }

    fn complete_fetch(
        &mut self,
        request_id: RequestId,
        filter: FilterTab,
        generation: u64,
        result: Result<Vec<Todo>, ApiError>,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        let current = filter == self.filter.active();
        match result {
            Ok(todos) if current && generation > self.applied_generation => {
                tracing::debug!(request_id, %filter, generation, count = todos.len(), "fetch applied");
                self.applied_generation = generation;
                self.row_errors
                    .retain(|id, _| todos.iter().any(|t| t.id == *id));
                outcome.events.push(SyncEvent::CollectionUpdated {
                    filter,
                    len: todos.len(),
                });
                self.collection = Collection::Available(todos);
                self.touch();
            }
            Err(e) if current && generation == self.issued_generation => {
                self.mark_unavailable(&e, &mut outcome);
            }
            _ => {
                tracing::debug!(request_id, %filter, generation, "superseded fetch discarded");
                outcome.events.push(SyncEvent::ResponseDiscarded { request_id });
            }
        }
        outcome
    }

    fn complete_mutation(
        &mut self,
        request_id: RequestId,
        mutation: Mutation,
        result: Result<(), ApiError>,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        let id = mutation.id();
        let kind = mutation.kind();
        let mut queued = match self.rows.remove(&id) {
            Some(row) if row.in_flight == request_id => row.queued,
            Some(row) => {
                // A newer request owns the row; keep its slot.
                self.rows.insert(id, row);
                None
            }
            None => None,
        };

        match result {
            Ok(()) => {
                tracing::debug!(request_id, %id, ?kind, "mutation acknowledged");
                self.row_errors.remove(&id);
                if kind == MutationKind::Delete {
                    if let Some(dropped) = queued.take() {
                        tracing::debug!(%id, ?dropped, "queued mutation dropped for deleted row");
                    }
                }
                outcome.events.push(SyncEvent::MutationSucceeded { id, kind });
                outcome.merge(self.fetch_todos());
            }
            Err(e) => {
                tracing::warn!(request_id, %id, ?kind, error = %e, "mutation failed");
                self.row_errors.insert(id, e.to_string());
                outcome.events.push(SyncEvent::MutationFailed {
                    id,
                    kind,
                    error: e.to_string(),
                });
            }
        }
        self.touch();

        if let Some(next) = queued {
            outcome.merge(self.dispatch(next));
        }
        outcome
    }

    fn complete_create(&mut self, result: Result<Todo, ApiError>) -> Outcome {
        let mut outcome = Outcome::default();
        match result {
            Ok(todo) => {
                tracing::debug!(id = %todo.id, "todo created");
                outcome.events.push(SyncEvent::TodoCreated { id: todo.id });
                outcome.merge(self.fetch_todos());
            }
            Err(e) => self.record_create_failure(&e, &mut outcome),
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Queue behind an in-flight mutation on the same row, or issue now.
    fn submit(&mut self, mutation: Mutation) -> Outcome {
        let id = mutation.id();
        if let Some(row) = self.rows.get_mut(&id) {
            tracing::debug!(%id, ?mutation, "row busy, mutation queued");
            let kind = mutation.kind();
            row.queued = Some(mutation);
            self.touch();
            return Outcome {
                commands: Vec::new(),
                events: vec![SyncEvent::MutationQueued { id, kind }],
            };
        }
        self.dispatch(mutation)
    }

    fn dispatch(&mut self, mutation: Mutation) -> Outcome {
        let mut outcome = Outcome::default();
        let id = mutation.id();
        let request = match &mutation {
            Mutation::SetStatus { id, status } => self.client.build_update_todo_status(*id, *status),
            Mutation::Delete { id } => Ok(self.client.build_delete_todo(*id)),
        };
        match request {
            Ok(request) => {
                let request_id = self.next_request_id();
                tracing::debug!(request_id, %id, ?mutation, "issuing mutation");
                self.rows.insert(
                    id,
                    RowQueue {
                        in_flight: request_id,
                        queued: None,
                    },
                );
                self.touch();
                outcome
                    .commands
                    .push(self.track(request_id, Operation::Mutate(mutation), request));
            }
            Err(e) => {
                self.row_errors.insert(id, e.to_string());
                self.touch();
                outcome.events.push(SyncEvent::MutationFailed {
                    id,
                    kind: mutation.kind(),
                    error: e.to_string(),
                });
            }
        }
        outcome
    }

    fn track(&mut self, request_id: RequestId, operation: Operation, request: HttpRequest) -> Command {
        self.in_flight.insert(request_id, operation.clone());
        Command {
            request_id,
            operation,
            request,
        }
    }

    fn mark_unavailable(&mut self, error: &ApiError, outcome: &mut Outcome) {
        tracing::warn!(filter = %self.filter.active(), error = %error, "collection unavailable");
        self.collection = Collection::Unavailable {
            error: error.to_string(),
        };
        self.touch();
        outcome.events.push(SyncEvent::CollectionUnavailable {
            error: error.to_string(),
        });
    }

    fn record_create_failure(&mut self, error: &ApiError, outcome: &mut Outcome) {
        tracing::warn!(error = %error, "create failed");
        self.notices.push(format!("Could not add todo: {error}"));
        self.touch();
        outcome.events.push(SyncEvent::CreateFailed {
            error: error.to_string(),
        });
    }

    fn next_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

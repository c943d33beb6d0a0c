//! List presenter: turns the synchronizer's state into rows and turns user
//! gestures into synchronizer calls.
//!
//! The presenter reads `ListSync` and never writes to the collection. Visual
//! state is a pure function of a todo's status, and every control can be
//! reached and activated from the keyboard.

use crate::animate::{self, Animator, NoAnimation, TransitionPlan};
use crate::config::ClientConfig;
use crate::filter::{FilterTab, TabView};
use crate::sync::{Collection, ListSync, Outcome};
use crate::types::{Todo, TodoId, TodoStatus};

/// A todo's check control is checked exactly when it is completed.
pub fn is_checked(todo: &Todo) -> bool {
    todo.status == TodoStatus::Completed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Plain,
    Muted,
}

/// Row decoration derived from status alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowVisual {
    pub background: Background,
    pub strikethrough: bool,
}

impl RowVisual {
    pub fn for_status(status: TodoStatus) -> Self {
        match status {
            TodoStatus::Completed => RowVisual {
                background: Background::Muted,
                strikethrough: true,
            },
            TodoStatus::Pending => RowVisual {
                background: Background::Plain,
                strikethrough: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Tab,
    BackTab,
    Space,
    Enter,
    Delete,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Checkbox,
    Delete,
}

impl ControlKind {
    fn other(self) -> Self {
        match self {
            ControlKind::Checkbox => ControlKind::Delete,
            ControlKind::Delete => ControlKind::Checkbox,
        }
    }

    /// Keys that activate this control while it has focus.
    pub fn activation_keys(self) -> &'static [Key] {
        match self {
            ControlKind::Checkbox => &[Key::Space],
            ControlKind::Delete => &[Key::Enter, Key::Space],
        }
    }
}

/// An interactive control with its accessible role and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlView {
    pub kind: ControlKind,
    pub role: &'static str,
    pub name: String,
    /// Only set for checkboxes.
    pub checked: Option<bool>,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: TodoId,
    pub body: String,
    pub checked: bool,
    pub visual: RowVisual,
    /// A mutation for this row is waiting on the service.
    pub busy: bool,
    /// Why the last mutation on this row failed.
    pub error: Option<String>,
    pub check_control: ControlView,
    pub delete_control: ControlView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListBody {
    Loading,
    Unavailable { message: String, detail: String },
    Rows(Vec<RowView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub tabs: Vec<TabView>,
    pub body: ListBody,
    pub notices: Vec<String>,
    pub revision: u64,
}

impl ListView {
    pub fn rows(&self) -> &[RowView] {
        match &self.body {
            ListBody::Rows(rows) => rows.as_slice(),
            ListBody::Loading | ListBody::Unavailable { .. } => &[],
        }
    }
}

/// One rendered frame plus the transition leading into it.
#[derive(Debug, Clone)]
pub struct Frame {
    pub view: ListView,
    pub transition: TransitionPlan,
}

/// A user intent, whether it came from a pointer or the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Toggle(TodoId),
    Delete(TodoId),
    SelectFilter(FilterTab),
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Focus {
    row: usize,
    control: ControlKind,
}

pub struct ListPresenter {
    animator: Box<dyn Animator>,
    focus: Option<Focus>,
    last_ids: Vec<TodoId>,
    last_revision: Option<u64>,
}

impl Default for ListPresenter {
    fn default() -> Self {
        Self::new(NoAnimation)
    }
}

impl ListPresenter {
    pub fn new(animator: impl Animator + 'static) -> Self {
        Self {
            animator: Box::new(animator),
            focus: None,
            last_ids: Vec::new(),
            last_revision: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            animator: animate::from_config(&config.animation),
            focus: None,
            last_ids: Vec::new(),
            last_revision: None,
        }
    }

    /// Render only if the synchronizer changed since the last frame.
    pub fn render_if_changed(&mut self, sync: &ListSync) -> Option<Frame> {
        if self.last_revision == Some(sync.revision()) {
            return None;
        }
        Some(self.render(sync))
    }

    pub fn render(&mut self, sync: &ListSync) -> Frame {
        let (body, ids) = match sync.collection() {
            Collection::Loading => (ListBody::Loading, Vec::new()),
            Collection::Unavailable { error } => (
                ListBody::Unavailable {
                    message: "Could not load todos. Press r to retry.".to_string(),
                    detail: error.clone(),
                },
                Vec::new(),
            ),
            Collection::Available(todos) => {
                self.clamp_focus(todos.len());
                let rows = todos
                    .iter()
                    .enumerate()
                    .map(|(i, todo)| self.row_view(i, todo, sync))
                    .collect();
                (ListBody::Rows(rows), todos.iter().map(|t| t.id).collect())
            }
        };

        let transition = self.animator.plan(&self.last_ids, &ids);
        self.last_ids = ids;
        self.last_revision = Some(sync.revision());

        Frame {
            view: ListView {
                tabs: sync.filter().tabs(),
                body,
                notices: sync.notices().to_vec(),
                revision: sync.revision(),
            },
            transition,
        }
    }

    fn row_view(&self, index: usize, todo: &Todo, sync: &ListSync) -> RowView {
        let checked = is_checked(todo);
        let focused = self.focus.filter(|f| f.row == index).map(|f| f.control);
        let target = todo.status.toggled();
        RowView {
            id: todo.id,
            body: todo.body.clone(),
            checked,
            visual: RowVisual::for_status(todo.status),
            busy: sync.is_busy(todo.id),
            error: sync.row_error(todo.id).map(str::to_string),
            check_control: ControlView {
                kind: ControlKind::Checkbox,
                role: "checkbox",
                name: format!("Mark \"{}\" as {target}", todo.body),
                checked: Some(checked),
                focused: focused == Some(ControlKind::Checkbox),
            },
            delete_control: ControlView {
                kind: ControlKind::Delete,
                role: "button",
                name: format!("Delete \"{}\"", todo.body),
                checked: None,
                focused: focused == Some(ControlKind::Delete),
            },
        }
    }

    fn clamp_focus(&mut self, len: usize) {
        self.focus = match self.focus {
            Some(_) if len == 0 => None,
            Some(f) => Some(Focus {
                row: f.row.min(len - 1),
                ..f
            }),
            None => None,
        };
    }

    /// Translate a key press into an intent, moving focus as a side effect.
    pub fn handle_key(&mut self, key: Key, sync: &ListSync) -> Option<Intent> {
        let todos = sync.collection().todos().unwrap_or(&[]);
        self.clamp_focus(todos.len());
        let focused_todo = self.focus.and_then(|f| todos.get(f.row).map(|t| (f, t.id)));

        match key {
            Key::Down | Key::Up if todos.is_empty() => None,
            Key::Down => {
                self.focus = Some(match self.focus {
                    Some(f) => Focus {
                        row: (f.row + 1).min(todos.len() - 1),
                        ..f
                    },
                    None => Focus {
                        row: 0,
                        control: ControlKind::Checkbox,
                    },
                });
                None
            }
            Key::Up => {
                self.focus = Some(match self.focus {
                    Some(f) => Focus {
                        row: f.row.saturating_sub(1),
                        ..f
                    },
                    None => Focus {
                        row: todos.len() - 1,
                        control: ControlKind::Checkbox,
                    },
                });
                None
            }
            Key::Tab | Key::BackTab => {
                if let Some(f) = &mut self.focus {
                    f.control = f.control.other();
                }
                None
            }
            Key::Left => Some(Intent::SelectFilter(sync.active_filter().cycle(false))),
            Key::Right => Some(Intent::SelectFilter(sync.active_filter().cycle(true))),
            Key::Delete => focused_todo.map(|(_, id)| Intent::Delete(id)),
            Key::Space | Key::Enter => {
                let (focus, id) = focused_todo?;
                if !focus.control.activation_keys().contains(&key) {
                    return None;
                }
                Some(match focus.control {
                    ControlKind::Checkbox => Intent::Toggle(id),
                    ControlKind::Delete => Intent::Delete(id),
                })
            }
            Key::Char('r') => Some(Intent::Retry),
            Key::Char(c) => {
                let n = c.to_digit(10)? as usize;
                let tab = FilterTab::ALL.get(n.checked_sub(1)?)?;
                Some(Intent::SelectFilter(*tab))
            }
        }
    }

    /// Forward an intent to the synchronizer. Intents naming a row that is
    /// no longer displayed are dropped.
    pub fn dispatch(&mut self, intent: Intent, sync: &mut ListSync) -> Outcome {
        match intent {
            Intent::Toggle(id) => match sync.todo(id).cloned() {
                Some(todo) => sync.toggle_status(&todo),
                None => {
                    tracing::debug!(%id, "toggle for row no longer displayed");
                    Outcome::default()
                }
            },
            Intent::Delete(id) => match sync.todo(id).cloned() {
                Some(todo) => sync.delete_todo(&todo),
                None => {
                    tracing::debug!(%id, "delete for row no longer displayed");
                    Outcome::default()
                }
            },
            Intent::SelectFilter(tab) => {
                if tab != sync.active_filter() {
                    self.focus = None;
                }
                sync.select_filter(tab)
            }
            Intent::Retry => sync.refresh(),
        }
    }

    /// Key press straight through to the synchronizer.
    pub fn on_key(&mut self, key: Key, sync: &mut ListSync) -> Outcome {
        match self.handle_key(key, sync) {
            Some(intent) => self.dispatch(intent, sync),
            None => Outcome::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TodoClient;
    use crate::http::HttpResponse;
    use crate::sync::Operation;
    use uuid::Uuid;

    fn todo(n: u128, body: &str, status: TodoStatus) -> Todo {
        Todo {
            id: Uuid::from_u128(n),
            body: body.to_string(),
            status,
        }
    }

    fn loaded(todos: &[Todo]) -> ListSync {
        let mut sync = ListSync::new(TodoClient::new("http://localhost:3000"), FilterTab::All);
        let fetch = sync.start().commands.remove(0);
        sync.handle_response(
            fetch.request_id,
            HttpResponse::new(200, serde_json::to_string(todos).unwrap()),
        );
        sync
    }

    fn sample() -> Vec<Todo> {
        vec![
            todo(1, "Buy milk", TodoStatus::Pending),
            todo(2, "Walk dog", TodoStatus::Completed),
        ]
    }

    #[test]
    fn visual_state_follows_status() {
        assert_eq!(
            RowVisual::for_status(TodoStatus::Completed),
            RowVisual {
                background: Background::Muted,
                strikethrough: true
            }
        );
        assert_eq!(
            RowVisual::for_status(TodoStatus::Pending),
            RowVisual {
                background: Background::Plain,
                strikethrough: false
            }
        );
    }

    #[test]
    fn rows_carry_accessible_controls() {
        let sync = loaded(&sample());
        let frame = ListPresenter::default().render(&sync);
        let rows = frame.view.rows();
        assert_eq!(rows.len(), 2);

        assert!(!rows[0].checked);
        assert_eq!(rows[0].check_control.role, "checkbox");
        assert_eq!(rows[0].check_control.name, "Mark \"Buy milk\" as completed");
        assert_eq!(rows[0].check_control.checked, Some(false));
        assert_eq!(rows[0].delete_control.role, "button");
        assert_eq!(rows[0].delete_control.name, "Delete \"Buy milk\"");

        assert!(rows[1].checked);
        assert_eq!(rows[1].check_control.name, "Mark \"Walk dog\" as pending");
        assert!(rows[1].visual.strikethrough);
    }

    #[test]
    fn loading_and_unavailable_bodies() {
        let mut sync = ListSync::new(TodoClient::new("http://localhost:3000"), FilterTab::All);
        let fetch = sync.start().commands.remove(0);
        let mut presenter = ListPresenter::default();
        assert_eq!(presenter.render(&sync).view.body, ListBody::Loading);

        sync.handle_transport_error(fetch.request_id, "unreachable");
        match presenter.render(&sync).view.body {
            ListBody::Unavailable { detail, .. } => assert!(detail.contains("unreachable")),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn keyboard_toggle_and_delete() {
        let mut sync = loaded(&sample());
        let mut presenter = ListPresenter::default();

        assert_eq!(presenter.handle_key(Key::Down, &sync), None);
        assert_eq!(
            presenter.handle_key(Key::Space, &sync),
            Some(Intent::Toggle(Uuid::from_u128(1)))
        );
        // Enter does not activate a checkbox.
        assert_eq!(presenter.handle_key(Key::Enter, &sync), None);

        presenter.handle_key(Key::Tab, &sync);
        assert_eq!(
            presenter.handle_key(Key::Enter, &sync),
            Some(Intent::Delete(Uuid::from_u128(1)))
        );

        presenter.handle_key(Key::Down, &sync);
        let outcome = presenter.on_key(Key::Delete, &mut sync);
        assert!(matches!(
            outcome.commands[0].operation,
            Operation::Mutate(crate::sync::Mutation::Delete { id }) if id == Uuid::from_u128(2)
        ));
    }

    #[test]
    fn focus_is_rendered_on_the_focused_control() {
        let sync = loaded(&sample());
        let mut presenter = ListPresenter::default();
        presenter.handle_key(Key::Down, &sync);
        presenter.handle_key(Key::Down, &sync);
        presenter.handle_key(Key::Tab, &sync);
        let frame = presenter.render(&sync);
        let rows = frame.view.rows();
        assert!(!rows[0].check_control.focused);
        assert!(rows[1].delete_control.focused);
    }

    #[test]
    fn digit_and_arrow_keys_select_tabs() {
        let sync = loaded(&sample());
        let mut presenter = ListPresenter::default();
        assert_eq!(
            presenter.handle_key(Key::Char('3'), &sync),
            Some(Intent::SelectFilter(FilterTab::Completed))
        );
        assert_eq!(presenter.handle_key(Key::Char('0'), &sync), None);
        assert_eq!(
            presenter.handle_key(Key::Right, &sync),
            Some(Intent::SelectFilter(FilterTab::Pending))
        );
        assert_eq!(presenter.handle_key(Key::Char('r'), &sync), Some(Intent::Retry));
    }

    #[test]
    fn dispatch_for_missing_row_is_dropped() {
        let mut sync = loaded(&sample());
        let outcome = ListPresenter::default().dispatch(Intent::Toggle(Uuid::from_u128(9)), &mut sync);
        assert!(outcome.is_empty());
    }

    #[test]
    fn render_if_changed_skips_unchanged_state() {
        let sync = loaded(&sample());
        let mut presenter = ListPresenter::default();
        assert!(presenter.render_if_changed(&sync).is_some());
        assert!(presenter.render_if_changed(&sync).is_none());
    }

    #[test]
    fn presenter_never_changes_rows_on_toggle() {
        let mut sync = loaded(&sample());
        let mut presenter = ListPresenter::default();
        let before = presenter.render(&sync).view.rows().to_vec();
        presenter.dispatch(Intent::Toggle(Uuid::from_u128(1)), &mut sync);
        let after = presenter.render(&sync).view.rows().to_vec();
        assert_eq!(before[0].checked, after[0].checked);
        assert!(after[0].busy);
    }
}

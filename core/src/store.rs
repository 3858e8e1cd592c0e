//! Application state, actions, and the reducer.
//!
//! # Design
//! `AppState` is immutable once built and shared as `Arc<AppState>`. The
//! reducer never touches its input: a transition allocates a new state with
//! one field replaced, and every action the reducer does not handle returns
//! the very same `Arc`, which lets `Store` skip notifying subscribers.
//!
//! `Action` covers both reducer-level updates and the CRUD intents the
//! dispatcher intercepts. `GET_LIST` plays both roles: dispatched to the
//! store it replaces the list, dispatched to the `Dispatcher` it fetches one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::types::Todo;

/// Everything the todo screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub todo_list: Vec<Todo>,
    pub checked_list: Vec<Uuid>,
    pub search_str: String,
    pub loading: bool,
}

/// A state transition, tagged on the wire by `type`.
///
/// `GetList`, `ChangeCheckedList` and `SetLoading` are handled by `reduce`.
/// The rest are intents: the dispatcher turns them into server calls and the
/// reducer leaves the state untouched if they reach it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    GetList {
        #[serde(default, rename = "todoList")]
        todo_list: Vec<Todo>,
    },
    ChangeCheckedList {
        #[serde(rename = "checkedList")]
        checked_list: Vec<Uuid>,
    },
    SetLoading,
    Add {
        content: String,
    },
    Delete {
        ids: Vec<Uuid>,
    },
    Edit {
        id: Uuid,
        content: String,
    },
    Search {
        content: String,
    },
    SetCompleted {
        id: Uuid,
        completed: bool,
    },
    #[serde(other)]
    Unknown,
}

impl Action {
    /// The `GET_LIST` intent: fetch the list from the server.
    pub fn get_list() -> Self {
        Action::GetList {
            todo_list: Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::GetList { .. } => "GET_LIST",
            Action::ChangeCheckedList { .. } => "CHANGE_CHECKED_LIST",
            Action::SetLoading => "SET_LOADING",
            Action::Add { .. } => "ADD",
            Action::Delete { .. } => "DELETE",
            Action::Edit { .. } => "EDIT",
            Action::Search { .. } => "SEARCH",
            Action::SetCompleted { .. } => "SET_COMPLETED",
            Action::Unknown => "UNKNOWN",
        }
    }
}

/// Pure transition function.
pub fn reduce(state: &Arc<AppState>, action: &Action) -> Arc<AppState> {
    match action {
        Action::GetList { todo_list } => Arc::new(AppState {
            todo_list: todo_list.clone(),
            loading: false,
            ..AppState::clone(state)
        }),
        Action::ChangeCheckedList { checked_list } => Arc::new(AppState {
            checked_list: checked_list.clone(),
            ..AppState::clone(state)
        }),
        Action::SetLoading => Arc::new(AppState {
            loading: true,
            ..AppState::clone(state)
        }),
        _ => Arc::clone(state),
    }
}

/// Holds the current state and publishes every change.
#[derive(Debug)]
pub struct Store {
    state: watch::Sender<Arc<AppState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    /// A store starting from `initial`.
    pub fn new(initial: AppState) -> Self {
        let (state, _) = watch::channel(Arc::new(initial));
        Self { state }
    }

    /// Apply `action` synchronously. Subscribers are woken only when the
    /// reducer produced a new state.
    pub fn dispatch(&self, action: &Action) {
        self.state.send_if_modified(|current| {
            let next = reduce(current, action);
            if Arc::ptr_eq(&next, current) {
                return false;
            }
            *current = next;
            true
        });
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.state.subscribe()
    }
}

use std::fmt;

use thiserror::Error;

use crate::locale::Locale;

/// Failure reported by the task-store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Rejected hour/minute field input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("hour must be within 0..=23, got {0}")]
    Hour(u32),

    #[error("minute must be one of 0, 15, 30, 45, got {0}")]
    Minute(u32),

    #[error("{field} is not a number: {input:?}")]
    NotANumber { field: &'static str, input: String },
}

/// User action a collaborator request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FetchLists,
    FetchTasks,
    FetchTask,
    CreateTask,
    UpdateTask,
    DeleteTask,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::FetchLists => "fetching lists",
            Action::FetchTasks => "fetching tasks",
            Action::FetchTask => "fetching task",
            Action::CreateTask => "creating task",
            Action::UpdateTask => "updating task",
            Action::DeleteTask => "deleting task",
        };
        f.write_str(name)
    }
}

/// Screen-boundary failure. Never fatal; the screen keeps its prior state and
/// shows [`ScreenError::user_message`].
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("{action} failed: {source}")]
    Store {
        action: Action,
        #[source]
        source: StoreError,
    },

    #[error("no list selected")]
    NoListSelected,

    #[error("form is not editing a stored task")]
    NotEditing,
}

impl ScreenError {
    pub fn store(action: Action, source: StoreError) -> Self {
        ScreenError::Store { action, source }
    }

    pub fn user_message(&self, locale: Locale) -> String {
        match self {
            ScreenError::Store { action, source } => {
                format!("{}{source}", locale.failure_prefix(*action))
            }
            ScreenError::NoListSelected => locale.no_list_selected().to_string(),
            ScreenError::NotEditing => locale.not_editing().to_string(),
        }
    }
}

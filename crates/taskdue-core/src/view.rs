use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{
  DateTime,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::compose::{
  DisplayMode,
  DueDateComposer
};
use crate::countdown::{
  Countdown,
  remaining
};
use crate::model::Task;

/// Completion partition shown on the
/// home screen.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CompletionFilter {
  #[default]
  #[serde(alias = "todo")]
  Pending,
  Done
}

impl CompletionFilter {
  /// Exact match on `done`; an unknown
  /// completion state matches neither
  /// partition.
  #[must_use]
  pub fn matches(
    self,
    done: Option<bool>
  ) -> bool {
    match self {
      | CompletionFilter::Pending => {
        done == Some(false)
      }
      | CompletionFilter::Done => {
        done == Some(true)
      }
    }
  }
}

impl FromStr for CompletionFilter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "todo" | "pending" => {
        Ok(CompletionFilter::Pending)
      }
      | "done" => {
        Ok(CompletionFilter::Done)
      }
      | other => Err(anyhow!(
        "unknown completion filter: \
         {other} (expected todo or \
         done)"
      ))
    }
  }
}

impl fmt::Display for CompletionFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | CompletionFilter::Pending => {
        f.write_str("todo")
      }
      | CompletionFilter::Done => {
        f.write_str("done")
      }
    }
  }
}

/// One rendered task with its derived
/// countdown and due display.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow<'a> {
  pub task:        &'a Task,
  pub countdown:   Countdown,
  pub due_display: String
}

/// Stable partition of `tasks` by
/// completion, paired with each task's
/// countdown against `now`.
#[tracing::instrument(skip(
  tasks, now, composer
))]
pub fn view<'a>(
  tasks: &'a [Task],
  filter: CompletionFilter,
  now: DateTime<Utc>,
  composer: &DueDateComposer
) -> Vec<TaskRow<'a>> {
  let rows: Vec<TaskRow<'a>> = tasks
    .iter()
    .filter(|task| {
      filter.matches(task.done)
    })
    .map(|task| {
      let limit = task.limit.as_deref();
      TaskRow {
        task,
        countdown: remaining(limit, now),
        due_display: composer
          .display_limit(
            limit,
            DisplayMode::DateTime
          )
      }
    })
    .collect();

  trace!(
    total = tasks.len(),
    shown = rows.len(),
    "filtered task view"
  );
  rows
}

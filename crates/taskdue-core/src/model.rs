use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::parse_wire;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: ListId,
    pub title: String,
}

/// Task record as held by the remote store.
///
/// `done` is optional because a record may omit it; such a task belongs to
/// neither the pending nor the done view. `limit` keeps the raw wire string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub detail: String,

    #[serde(default)]
    pub done: Option<bool>,

    #[serde(default)]
    pub limit: Option<String>,
}

impl Task {
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.limit.as_deref().and_then(parse_wire)
    }
}

/// Body of a task listing response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasksEnvelope {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Create/update request body. `limit: null` means "no due date"; an absent
/// `done` leaves the stored completion state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub title: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    pub limit: Option<String>,
}

impl TaskPayload {
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            detail: self.detail,
            done: self.done,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_absent() {
        let task: Task = serde_json::from_str(r#"{"id":"t-1","title":"Buy milk"}"#)
            .expect("task json");
        assert_eq!(task.done, None);
        assert_eq!(task.limit, None);
        assert_eq!(task.detail, "");
        assert_eq!(task.due_at(), None);
    }

    #[test]
    fn envelope_reads_store_listing() {
        let body = r#"{"tasks":[
            {"id":"a","title":"A","detail":"","done":false,"limit":"2024-03-05T09:15:00Z"},
            {"id":"b","title":"B","detail":"","done":true,"limit":null}
        ]}"#;
        let envelope: TasksEnvelope = serde_json::from_str(body).expect("envelope json");
        assert_eq!(envelope.tasks.len(), 2);
        assert!(envelope.tasks[0].due_at().is_some());
        assert_eq!(envelope.tasks[1].limit, None);
    }

    #[test]
    fn payload_serializes_null_limit() {
        let payload = TaskPayload {
            title: "Write report".to_string(),
            detail: String::new(),
            done: Some(false),
            limit: None,
        };
        let value = serde_json::to_value(&payload).expect("payload json");
        assert_eq!(value["limit"], serde_json::Value::Null);
        assert_eq!(value["done"], serde_json::Value::Bool(false));
    }

    #[test]
    fn payload_omits_unknown_done() {
        let payload = TaskPayload {
            title: "Legacy".to_string(),
            detail: String::new(),
            done: None,
            limit: None,
        };
        let value = serde_json::to_value(&payload).expect("payload json");
        assert!(value.get("done").is_none());
        assert_eq!(payload.into_task(TaskId::from("t1")).done, None);
    }
}

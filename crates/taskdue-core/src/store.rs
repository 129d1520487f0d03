use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{ListId, Task, TaskId, TaskList, TaskPayload};

/// Remote task-store collaborator.
///
/// Implementations own transport and authorization; every call is a single
/// attempt and failures are reported, never retried.
pub trait TaskStore {
    fn lists(&self) -> Result<Vec<TaskList>, StoreError>;

    fn tasks(&self, list_id: &ListId) -> Result<Vec<Task>, StoreError>;

    fn task(&self, list_id: &ListId, task_id: &TaskId) -> Result<Task, StoreError>;

    fn create_task(&self, list_id: &ListId, payload: &TaskPayload) -> Result<Task, StoreError>;

    fn update_task(
        &self,
        list_id: &ListId,
        task_id: &TaskId,
        payload: &TaskPayload,
    ) -> Result<Task, StoreError>;

    fn delete_task(&self, list_id: &ListId, task_id: &TaskId) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    lists: Vec<TaskList>,
    #[serde(default)]
    tasks: BTreeMap<ListId, Vec<Task>>,
}

impl Snapshot {
    fn ensure_list(&self, list_id: &ListId) -> Result<(), StoreError> {
        if self.lists.iter().any(|list| &list.id == list_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                kind: "list",
                id: list_id.to_string(),
            })
        }
    }

    fn list_tasks_mut(&mut self, list_id: &ListId) -> Result<&mut Vec<Task>, StoreError> {
        self.ensure_list(list_id)?;
        Ok(self.tasks.entry(list_id.clone()).or_default())
    }
}

/// JSON file standing in for the remote store, so the CLI works offline.
#[derive(Debug)]
pub struct SnapshotStore {
    pub path: PathBuf,
}

impl SnapshotStore {
    #[tracing::instrument(skip(path))]
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let path = path.to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        if !path.exists() {
            save_snapshot_atomic(&path, &Snapshot::default())
                .with_context(|| format!("failed to initialize {}", path.display()))?;
        }

        info!(snapshot = %path.display(), "opened snapshot store");
        Ok(Self { path })
    }

    #[tracing::instrument(skip(self))]
    pub fn create_list(&self, title: &str) -> anyhow::Result<TaskList> {
        let mut snapshot = self.load()?;
        let list = TaskList {
            id: ListId(Uuid::new_v4().to_string()),
            title: title.to_string(),
        };
        snapshot.lists.push(list.clone());
        self.save(&snapshot)?;
        info!(list = %list.id, "created list");
        Ok(list)
    }

    fn load(&self) -> anyhow::Result<Snapshot> {
        load_snapshot(&self.path).with_context(|| format!("failed to load {}", self.path.display()))
    }

    fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        save_snapshot_atomic(&self.path, snapshot)
            .with_context(|| format!("failed to save {}", self.path.display()))
    }
}

impl TaskStore for SnapshotStore {
    #[tracing::instrument(skip(self))]
    fn lists(&self) -> Result<Vec<TaskList>, StoreError> {
        Ok(self.load()?.lists)
    }

    #[tracing::instrument(skip(self))]
    fn tasks(&self, list_id: &ListId) -> Result<Vec<Task>, StoreError> {
        let mut snapshot = self.load()?;
        snapshot.ensure_list(list_id)?;
        Ok(snapshot.tasks.remove(list_id).unwrap_or_default())
    }

    #[tracing::instrument(skip(self))]
    fn task(&self, list_id: &ListId, task_id: &TaskId) -> Result<Task, StoreError> {
        self.tasks(list_id)?
            .into_iter()
            .find(|task| &task.id == task_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "task",
                id: task_id.to_string(),
            })
    }

    #[tracing::instrument(skip(self, payload))]
    fn create_task(&self, list_id: &ListId, payload: &TaskPayload) -> Result<Task, StoreError> {
        let mut snapshot = self.load()?;
        let task = payload
            .clone()
            .into_task(TaskId(Uuid::new_v4().to_string()));
        snapshot.list_tasks_mut(list_id)?.push(task.clone());
        self.save(&snapshot)?;
        info!(list = %list_id, task = %task.id, "created task");
        Ok(task)
    }

    #[tracing::instrument(skip(self, payload))]
    fn update_task(
        &self,
        list_id: &ListId,
        task_id: &TaskId,
        payload: &TaskPayload,
    ) -> Result<Task, StoreError> {
        let mut snapshot = self.load()?;
        let updated = {
            let task = snapshot
                .list_tasks_mut(list_id)?
                .iter_mut()
                .find(|task| &task.id == task_id)
                .ok_or_else(|| StoreError::NotFound {
                    kind: "task",
                    id: task_id.to_string(),
                })?;
            let previous = task.done;
            *task = payload.clone().into_task(task_id.clone());
            task.done = task.done.or(previous);
            task.clone()
        };
        self.save(&snapshot)?;
        info!(list = %list_id, task = %task_id, "updated task");
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    fn delete_task(&self, list_id: &ListId, task_id: &TaskId) -> Result<(), StoreError> {
        let mut snapshot = self.load()?;
        let tasks = snapshot.list_tasks_mut(list_id)?;
        let idx = tasks
            .iter()
            .position(|task| &task.id == task_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "task",
                id: task_id.to_string(),
            })?;
        tasks.remove(idx);
        self.save(&snapshot)?;
        info!(list = %list_id, task = %task_id, "deleted task");
        Ok(())
    }
}

#[tracing::instrument(skip(path))]
fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    debug!(file = %path.display(), "loading snapshot");
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Snapshot::default());
    }
    let snapshot: Snapshot = serde_json::from_str(&raw)?;
    debug!(lists = snapshot.lists.len(), "loaded snapshot");
    Ok(snapshot)
}

#[tracing::instrument(skip(path, snapshot))]
fn save_snapshot_atomic(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    debug!(file = %path.display(), lists = snapshot.lists.len(), "saving snapshot atomically");

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut temp, snapshot)?;
    writeln!(temp)?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn payload(title: &str, limit: Option<&str>) -> TaskPayload {
        TaskPayload {
            title: title.to_string(),
            detail: String::new(),
            done: Some(false),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn open_creates_empty_snapshot() {
        let temp = tempdir().expect("tempdir");
        let store = SnapshotStore::open(&temp.path().join("nested/snapshot.json"))
            .expect("open store");
        assert!(store.path.exists());
        assert!(store.lists().expect("lists").is_empty());
    }

    #[test]
    fn task_crud_round_trip() {
        let temp = tempdir().expect("tempdir");
        let store = SnapshotStore::open(&temp.path().join("snapshot.json")).expect("open store");
        let list = store.create_list("Inbox").expect("create list");

        let created = store
            .create_task(&list.id, &payload("Pay rent", Some("2024-03-05T09:15:00Z")))
            .expect("create task");
        assert_eq!(created.done, Some(false));

        let fetched = store.task(&list.id, &created.id).expect("fetch task");
        assert_eq!(fetched, created);

        let mut edit = payload("Pay rent", None);
        edit.done = Some(true);
        let updated = store
            .update_task(&list.id, &created.id, &edit)
            .expect("update task");
        assert_eq!(updated.done, Some(true));
        assert_eq!(updated.limit, None);

        edit.done = None;
        let kept = store
            .update_task(&list.id, &created.id, &edit)
            .expect("update task");
        assert_eq!(kept.done, Some(true), "absent done keeps the stored state");

        store.delete_task(&list.id, &created.id).expect("delete task");
        assert!(store.tasks(&list.id).expect("tasks").is_empty());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let temp = tempdir().expect("tempdir");
        let store = SnapshotStore::open(&temp.path().join("snapshot.json")).expect("open store");
        let err = store.tasks(&ListId::from("nope")).expect_err("missing list");
        assert!(matches!(err, StoreError::NotFound { kind: "list", .. }));

        let list = store.create_list("Inbox").expect("create list");
        let err = store
            .delete_task(&list.id, &TaskId::from("ghost"))
            .expect_err("missing task");
        assert!(matches!(err, StoreError::NotFound { kind: "task", .. }));
    }

    #[test]
    fn corrupt_snapshot_surfaces_backend_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("snapshot.json");
        fs::write(&path, "{not json").expect("write corrupt file");
        let store = SnapshotStore::open(&path).expect("open store");
        assert!(matches!(store.lists(), Err(StoreError::Backend(_))));
    }
}

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::compose::{ComposedDue, DisplayMode, DueDateComposer, DueDateSelection, Hour, Minute};
use crate::error::{Action, ScreenError};
use crate::model::{ListId, Task, TaskId, TaskList, TaskPayload};
use crate::store::TaskStore;

/// Which stored task, if any, the form writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Edit { list_id: ListId, task_id: TaskId },
}

/// Task create/edit form.
///
/// Create and edit share this one component; they differ only in the
/// initial [`DueDateSelection`] and in what [`TaskForm::submit`] calls. Every
/// due-date field change goes through the same recomposition.
///
/// An edit form submits the stored `limit` verbatim until a due-date field is
/// changed.
#[derive(Debug, Clone)]
pub struct TaskForm {
    target: FormTarget,
    composer: DueDateComposer,
    mode: DisplayMode,
    lists: Vec<TaskList>,
    list_id: Option<ListId>,
    title: String,
    detail: String,
    done: Option<bool>,
    selection: DueDateSelection,
    stored_limit: Option<String>,
    composed: ComposedDue,
    error: Option<String>,
}

impl TaskForm {
    fn with_initial(
        target: FormTarget,
        composer: DueDateComposer,
        list_id: Option<ListId>,
        selection: DueDateSelection,
    ) -> Self {
        let mode = DisplayMode::default();
        Self {
            target,
            composer,
            mode,
            lists: vec![],
            list_id,
            title: String::new(),
            detail: String::new(),
            done: None,
            composed: composer.compose(&selection, mode),
            selection,
            stored_limit: None,
            error: None,
        }
    }

    /// Empty form for a new task. No date is selected.
    pub fn create(composer: DueDateComposer) -> Self {
        let mut form = Self::with_initial(
            FormTarget::Create,
            composer,
            None,
            DueDateSelection::default(),
        );
        form.done = Some(false);
        form
    }

    /// Form pre-filled from a stored task, including its due date.
    pub fn edit(list_id: ListId, task: &Task, composer: DueDateComposer) -> Self {
        let selection = DueDateSelection::from_wire(task.limit.as_deref());
        let mut form = Self::with_initial(
            FormTarget::Edit {
                list_id: list_id.clone(),
                task_id: task.id.clone(),
            },
            composer,
            Some(list_id),
            selection,
        );
        form.title = task.title.clone();
        form.detail = task.detail.clone();
        form.done = task.done;
        form.stored_limit = task.limit.clone();
        form.recompose();
        form
    }

    /// Fetches the task and opens it for editing.
    #[instrument(skip(store, composer))]
    pub fn load_edit(
        store: &impl TaskStore,
        list_id: &ListId,
        task_id: &TaskId,
        composer: DueDateComposer,
    ) -> Result<Self, ScreenError> {
        let task = store
            .task(list_id, task_id)
            .map_err(|source| ScreenError::store(Action::FetchTask, source))?;
        debug!(task = %task.id, limit = ?task.limit, "loaded task for editing");
        Ok(Self::edit(list_id.clone(), &task, composer))
    }

    /// Loads the list choices for a create form and selects the first one.
    #[instrument(skip(self, store))]
    pub fn load_lists(&mut self, store: &impl TaskStore) -> Result<(), ScreenError> {
        match store.lists() {
            Ok(lists) => {
                if self.list_id.is_none() {
                    self.list_id = lists.first().map(|list| list.id.clone());
                }
                debug!(count = lists.len(), selected = ?self.list_id, "loaded list choices");
                self.lists = lists;
                Ok(())
            }
            Err(source) => Err(self.fail(ScreenError::store(Action::FetchLists, source))),
        }
    }

    pub fn with_display_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self.recompose();
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_detail(&mut self, detail: impl Into<String>) {
        self.detail = detail.into();
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = Some(done);
    }

    pub fn select_list(&mut self, list_id: ListId) {
        self.list_id = Some(list_id);
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.selection.date = date;
        self.due_edited();
    }

    pub fn set_hour(&mut self, hour: Hour) {
        self.selection.hour = hour;
        self.due_edited();
    }

    pub fn set_minute(&mut self, minute: Minute) {
        self.selection.minute = minute;
        self.due_edited();
    }

    /// Drops the due date entirely; hour and minute return to their defaults.
    pub fn clear_due(&mut self) {
        self.selection = DueDateSelection::default();
        self.due_edited();
    }

    fn due_edited(&mut self) {
        self.stored_limit = None;
        self.recompose();
    }

    fn recompose(&mut self) {
        self.composed = match self.stored_limit.as_deref() {
            Some(limit) => ComposedDue {
                wire: Some(limit.to_string()),
                display: self.composer.display_limit(Some(limit), self.mode),
            },
            None => self.composer.compose(&self.selection, self.mode),
        };
    }

    pub fn target(&self) -> &FormTarget {
        &self.target
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn list_id(&self) -> Option<&ListId> {
        self.list_id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn done(&self) -> Option<bool> {
        self.done
    }

    pub fn selection(&self) -> &DueDateSelection {
        &self.selection
    }

    pub fn composed(&self) -> &ComposedDue {
        &self.composed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Request body for the store. The composed wire value is sent verbatim;
    /// an unknown completion state is omitted rather than guessed.
    pub fn payload(&self) -> TaskPayload {
        TaskPayload {
            title: self.title.clone(),
            detail: self.detail.clone(),
            done: self.done,
            limit: self.composed.wire.clone(),
        }
    }

    #[instrument(skip(self, store), fields(target = ?self.target))]
    pub fn submit(&mut self, store: &impl TaskStore) -> Result<Task, ScreenError> {
        let payload = self.payload();
        let result = match self.target.clone() {
            FormTarget::Create => {
                let Some(list_id) = self.list_id.clone() else {
                    return Err(self.fail(ScreenError::NoListSelected));
                };
                store
                    .create_task(&list_id, &payload)
                    .map_err(|source| ScreenError::store(Action::CreateTask, source))
            }
            FormTarget::Edit { list_id, task_id } => store
                .update_task(&list_id, &task_id, &payload)
                .map_err(|source| ScreenError::store(Action::UpdateTask, source)),
        };

        match result {
            Ok(task) => {
                info!(task = %task.id, limit = ?task.limit, "task saved");
                self.error = None;
                Ok(task)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    #[instrument(skip(self, store), fields(target = ?self.target))]
    pub fn delete(&mut self, store: &impl TaskStore) -> Result<(), ScreenError> {
        let FormTarget::Edit { list_id, task_id } = self.target.clone() else {
            return Err(self.fail(ScreenError::NotEditing));
        };

        match store.delete_task(&list_id, &task_id) {
            Ok(()) => {
                info!(task = %task_id, "task deleted");
                self.error = None;
                Ok(())
            }
            Err(source) => Err(self.fail(ScreenError::store(Action::DeleteTask, source))),
        }
    }

    fn fail(&mut self, err: ScreenError) -> ScreenError {
        let message = err.user_message(self.composer.locale());
        warn!(error = %err, "form action failed");
        self.error = Some(message);
        err
    }
}

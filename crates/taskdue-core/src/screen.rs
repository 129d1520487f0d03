use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use crate::compose::DueDateComposer;
use crate::error::{Action, ScreenError, StoreError};
use crate::model::{ListId, Task, TaskList};
use crate::store::TaskStore;
use crate::sync::{FetchOutcome, FetchTicket, SelectionSynchronizer};
use crate::view::{CompletionFilter, TaskRow, view};

/// Home screen: list tabs, completion selector and the filtered task list.
///
/// The `on_*` handlers accept collaborator responses in whatever order they
/// arrive; [`HomeScreen::load`] and [`HomeScreen::select_list`] drive a
/// blocking store through the same handlers.
#[derive(Debug, Clone)]
pub struct HomeScreen {
    sync: SelectionSynchronizer,
    filter: CompletionFilter,
    composer: DueDateComposer,
    error: Option<String>,
}

impl HomeScreen {
    pub fn new(composer: DueDateComposer, filter: CompletionFilter) -> Self {
        Self {
            sync: SelectionSynchronizer::new(),
            filter,
            composer,
            error: None,
        }
    }

    #[instrument(skip(self, store))]
    pub fn load(&mut self, store: &impl TaskStore) -> Result<(), ScreenError> {
        let ticket = self.on_lists(store.lists())?;
        if let Some(ticket) = ticket {
            let response = store.tasks(&ticket.list_id);
            self.on_tasks(&ticket, response)?;
        }
        Ok(())
    }

    /// Like [`HomeScreen::load`], but fetches `preferred` in place of the
    /// auto-selected list when the collection contains it.
    #[instrument(skip(self, store))]
    pub fn load_preferring(
        &mut self,
        store: &impl TaskStore,
        preferred: &ListId,
    ) -> Result<(), ScreenError> {
        let auto = self.on_lists(store.lists())?;
        let ticket = self.request_list(preferred).or(auto);
        if let Some(ticket) = ticket {
            let response = store.tasks(&ticket.list_id);
            self.on_tasks(&ticket, response)?;
        }
        Ok(())
    }

    #[instrument(skip(self, store))]
    pub fn select_list(
        &mut self,
        store: &impl TaskStore,
        list_id: &ListId,
    ) -> Result<(), ScreenError> {
        if let Some(ticket) = self.request_list(list_id) {
            let response = store.tasks(&ticket.list_id);
            self.on_tasks(&ticket, response)?;
        }
        Ok(())
    }

    /// Starts a switch to `list_id`; the caller performs the fetch for the
    /// returned ticket.
    pub fn request_list(&mut self, list_id: &ListId) -> Option<FetchTicket> {
        self.sync.select(list_id)
    }

    pub fn on_lists(
        &mut self,
        response: Result<Vec<TaskList>, StoreError>,
    ) -> Result<Option<FetchTicket>, ScreenError> {
        match response {
            Ok(lists) => Ok(self.sync.lists_loaded(lists)),
            Err(source) => Err(self.fail(ScreenError::store(Action::FetchLists, source))),
        }
    }

    pub fn on_tasks(
        &mut self,
        ticket: &FetchTicket,
        response: Result<Vec<Task>, StoreError>,
    ) -> Result<FetchOutcome, ScreenError> {
        match response {
            Ok(tasks) => Ok(self.sync.tasks_loaded(ticket, tasks)),
            Err(source) => match self.sync.tasks_failed(ticket) {
                FetchOutcome::Stale => {
                    debug!(error = %source, "ignoring failure of superseded fetch");
                    Ok(FetchOutcome::Stale)
                }
                _ => Err(self.fail(ScreenError::store(Action::FetchTasks, source))),
            },
        }
    }

    pub fn set_filter(&mut self, filter: CompletionFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> CompletionFilter {
        self.filter
    }

    pub fn composer(&self) -> &DueDateComposer {
        &self.composer
    }

    pub fn lists(&self) -> &[TaskList] {
        self.sync.lists()
    }

    pub fn selected_list(&self) -> Option<&ListId> {
        self.sync.selected()
    }

    pub fn synchronizer(&self) -> &SelectionSynchronizer {
        &self.sync
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Rows to render against `now`.
    pub fn rows(&self, now: DateTime<Utc>) -> Vec<TaskRow<'_>> {
        view(self.sync.tasks(), self.filter, now, &self.composer)
    }

    fn fail(&mut self, err: ScreenError) -> ScreenError {
        warn!(error = %err, "home screen action failed");
        self.error = Some(err.user_message(self.composer.locale()));
        err
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use super::*;
    use crate::locale::Locale;
    use crate::model::{TaskId, TaskPayload};
    use crate::sync::SyncState;

    #[derive(Default)]
    struct FixtureStore {
        lists: Vec<TaskList>,
        tasks: HashMap<ListId, Vec<Task>>,
        broken_lists: bool,
        broken_tasks: Vec<ListId>,
    }

    impl TaskStore for FixtureStore {
        fn lists(&self) -> Result<Vec<TaskList>, StoreError> {
            if self.broken_lists {
                return Err(StoreError::Request("timeout".to_string()));
            }
            Ok(self.lists.clone())
        }

        fn tasks(&self, list_id: &ListId) -> Result<Vec<Task>, StoreError> {
            if self.broken_tasks.contains(list_id) {
                return Err(StoreError::Request("timeout".to_string()));
            }
            Ok(self.tasks.get(list_id).cloned().unwrap_or_default())
        }

        fn task(&self, _list_id: &ListId, task_id: &TaskId) -> Result<Task, StoreError> {
            Err(StoreError::NotFound {
                kind: "task",
                id: task_id.to_string(),
            })
        }

        fn create_task(&self, _list_id: &ListId, _payload: &TaskPayload) -> Result<Task, StoreError> {
            Err(StoreError::Request("read-only fixture".to_string()))
        }

        fn update_task(
            &self,
            _list_id: &ListId,
            _task_id: &TaskId,
            _payload: &TaskPayload,
        ) -> Result<Task, StoreError> {
            Err(StoreError::Request("read-only fixture".to_string()))
        }

        fn delete_task(&self, _list_id: &ListId, _task_id: &TaskId) -> Result<(), StoreError> {
            Err(StoreError::Request("read-only fixture".to_string()))
        }
    }

    fn list(id: &str) -> TaskList {
        TaskList {
            id: ListId::from(id),
            title: id.to_string(),
        }
    }

    fn task(id: &str, done: bool, limit: Option<&str>) -> Task {
        Task {
            id: TaskId::from(id),
            title: id.to_string(),
            detail: String::new(),
            done: Some(done),
            limit: limit.map(str::to_string),
        }
    }

    fn fixture() -> FixtureStore {
        let mut tasks = HashMap::new();
        tasks.insert(
            ListId::from("L1"),
            vec![
                task("a", false, Some("2024-03-06T11:45:00Z")),
                task("b", true, None),
            ],
        );
        tasks.insert(ListId::from("L2"), vec![task("c", false, None)]);
        FixtureStore {
            lists: vec![list("L1"), list("L2")],
            tasks,
            ..FixtureStore::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 15, 0)
            .single()
            .expect("valid now")
    }

    #[test]
    fn load_shows_first_list_pending_tasks() {
        let store = fixture();
        let mut screen = HomeScreen::new(DueDateComposer::default(), CompletionFilter::Pending);
        screen.load(&store).expect("load");

        assert_eq!(screen.selected_list(), Some(&ListId::from("L1")));
        let rows = screen.rows(now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].task.id, TaskId::from("a"));
        assert_eq!(rows[0].due_display, "2024年03月06日 11:45");

        screen.set_filter(CompletionFilter::Done);
        let rows = screen.rows(now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].task.id, TaskId::from("b"));
    }

    #[test]
    fn switching_lists_replaces_rows() {
        let store = fixture();
        let mut screen = HomeScreen::new(DueDateComposer::default(), CompletionFilter::Pending);
        screen.load(&store).expect("load");
        screen
            .select_list(&store, &ListId::from("L2"))
            .expect("select");
        let rows = screen.rows(now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].task.id, TaskId::from("c"));
    }

    #[test]
    fn list_failure_is_reported_without_selection() {
        let store = FixtureStore {
            broken_lists: true,
            ..fixture()
        };
        let mut screen = HomeScreen::new(DueDateComposer::new(Locale::Ja), CompletionFilter::Pending);
        assert!(screen.load(&store).is_err());
        assert_eq!(
            screen.error(),
            Some("リストの取得に失敗しました。request failed: timeout")
        );
        assert_eq!(screen.synchronizer().state(), &SyncState::NoList);
    }

    #[test]
    fn task_failure_keeps_previous_rows() {
        let store = FixtureStore {
            broken_tasks: vec![ListId::from("L2")],
            ..fixture()
        };
        let mut screen = HomeScreen::new(DueDateComposer::new(Locale::En), CompletionFilter::Pending);
        screen.load(&store).expect("load");
        assert!(screen.select_list(&store, &ListId::from("L2")).is_err());

        assert_eq!(screen.selected_list(), Some(&ListId::from("L2")));
        assert_eq!(screen.rows(now())[0].task.id, TaskId::from("a"));
        assert_eq!(
            screen.error(),
            Some("Failed to fetch tasks. request failed: timeout")
        );
    }

    #[test]
    fn out_of_order_responses_never_show_superseded_list() {
        let store = fixture();
        let mut screen = HomeScreen::new(DueDateComposer::default(), CompletionFilter::Pending);
        let l1 = screen
            .on_lists(store.lists())
            .expect("lists")
            .expect("auto-selected");
        let l2 = screen
            .request_list(&ListId::from("L2"))
            .expect("selection accepted");

        let stale = screen
            .on_tasks(&l1, store.tasks(&l1.list_id))
            .expect("stale response is not an error");
        assert_eq!(stale, FetchOutcome::Stale);
        assert!(screen.rows(now()).is_empty());

        let stale_failure = screen
            .on_tasks(&l1, Err(StoreError::Request("late".to_string())))
            .expect("stale failure is silent");
        assert_eq!(stale_failure, FetchOutcome::Stale);
        assert_eq!(screen.error(), None);

        screen
            .on_tasks(&l2, store.tasks(&l2.list_id))
            .expect("current response");
        assert_eq!(screen.rows(now())[0].task.id, TaskId::from("c"));
    }

    #[test]
    fn preferred_list_skips_failing_first_list() {
        let store = FixtureStore {
            broken_tasks: vec![ListId::from("L1")],
            ..fixture()
        };
        let mut screen = HomeScreen::new(DueDateComposer::default(), CompletionFilter::Pending);
        screen
            .load_preferring(&store, &ListId::from("L2"))
            .expect("preferred list loads");
        assert_eq!(screen.selected_list(), Some(&ListId::from("L2")));
        assert_eq!(screen.rows(now())[0].task.id, TaskId::from("c"));
        assert_eq!(screen.error(), None);
    }

    #[test]
    fn unknown_preferred_list_falls_back_to_first() {
        let store = fixture();
        let mut screen = HomeScreen::new(DueDateComposer::default(), CompletionFilter::Pending);
        screen
            .load_preferring(&store, &ListId::from("missing"))
            .expect("load");
        assert_eq!(screen.selected_list(), Some(&ListId::from("L1")));
    }

    #[test]
    fn empty_list_collection_issues_no_fetch() {
        let store = FixtureStore::default();
        let mut screen = HomeScreen::new(DueDateComposer::default(), CompletionFilter::Pending);
        assert_eq!(screen.on_lists(store.lists()).expect("lists"), None);
        assert!(screen.rows(now()).is_empty());
    }
}

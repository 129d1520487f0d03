use tracing::{debug, info, warn};

use crate::model::{ListId, Task, TaskList};

/// Tag attached to one outstanding task fetch.
///
/// Only the most recently issued ticket may change the displayed tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub list_id: ListId,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    NoList,
    Loading { ticket: FetchTicket },
    Loaded { list_id: ListId },
}

/// What happened to a task-fetch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The response belongs to a superseded selection and was dropped.
    Stale,
    /// The current fetch failed; the previous tasks are still displayed.
    Failed,
}

/// Keeps the displayed task collection consistent with the active list.
#[derive(Debug, Clone)]
pub struct SelectionSynchronizer {
    lists: Vec<TaskList>,
    state: SyncState,
    tasks: Vec<Task>,
    next_seq: u64,
}

impl Default for SelectionSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionSynchronizer {
    pub fn new() -> Self {
        Self {
            lists: vec![],
            state: SyncState::NoList,
            tasks: vec![],
            next_seq: 0,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn selected(&self) -> Option<&ListId> {
        match &self.state {
            SyncState::NoList => None,
            SyncState::Loading { ticket } => Some(&ticket.list_id),
            SyncState::Loaded { list_id } => Some(list_id),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SyncState::Loading { .. })
    }

    /// Applies a list collection. Auto-selects the first list by arrival
    /// order unless the current selection is still present; returns the fetch
    /// to issue, if any.
    #[tracing::instrument(skip(self, lists), fields(count = lists.len()))]
    pub fn lists_loaded(&mut self, lists: Vec<TaskList>) -> Option<FetchTicket> {
        self.lists = lists;

        if let Some(current) = self.selected()
            && self.lists.iter().any(|list| &list.id == current)
        {
            debug!(list = %current, "selection still present after list reload");
            return None;
        }

        let Some(first) = self.lists.first().map(|list| list.id.clone()) else {
            info!("no lists available; nothing selected");
            self.state = SyncState::NoList;
            self.tasks.clear();
            return None;
        };

        info!(list = %first, "auto-selecting first list");
        Some(self.issue(first))
    }

    /// Switches to `list_id`. Unknown ids leave the state untouched.
    #[tracing::instrument(skip(self))]
    pub fn select(&mut self, list_id: &ListId) -> Option<FetchTicket> {
        if !self.lists.iter().any(|list| &list.id == list_id) {
            warn!(list = %list_id, "ignoring selection of unknown list");
            return None;
        }
        Some(self.issue(list_id.clone()))
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        matches!(&self.state, SyncState::Loading { ticket: current } if current == ticket)
    }

    /// Replaces the displayed tasks wholesale when `ticket` is current.
    #[tracing::instrument(skip(self, tasks), fields(list = %ticket.list_id, count = tasks.len()))]
    pub fn tasks_loaded(&mut self, ticket: &FetchTicket, tasks: Vec<Task>) -> FetchOutcome {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, "discarding stale task response");
            return FetchOutcome::Stale;
        }

        self.tasks = tasks;
        self.state = SyncState::Loaded {
            list_id: ticket.list_id.clone(),
        };
        FetchOutcome::Applied
    }

    /// Records a failed fetch. The previously displayed tasks stay in place.
    #[tracing::instrument(skip(self), fields(list = %ticket.list_id))]
    pub fn tasks_failed(&mut self, ticket: &FetchTicket) -> FetchOutcome {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, "discarding stale task failure");
            return FetchOutcome::Stale;
        }

        warn!(retained = self.tasks.len(), "task fetch failed; keeping last good tasks");
        self.state = SyncState::Loaded {
            list_id: ticket.list_id.clone(),
        };
        FetchOutcome::Failed
    }

    fn issue(&mut self, list_id: ListId) -> FetchTicket {
        self.next_seq += 1;
        let ticket = FetchTicket {
            list_id,
            seq: self.next_seq,
        };
        debug!(list = %ticket.list_id, seq = ticket.seq, "issuing task fetch");
        self.state = SyncState::Loading {
            ticket: ticket.clone(),
        };
        ticket
    }
}

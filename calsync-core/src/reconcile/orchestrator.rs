use std::fmt;
use std::time::Duration;

use tokio::time::timeout;
use tracing::info;

use crate::error::{SyncError, SyncResult, Target};
use crate::event::{Event, Side};
use crate::identity::{IdGenerator, UuidGenerator};
use crate::reconcile::add_detector::planned_additions;
use crate::reconcile::conflict_resolver::planned_resolutions;
use crate::reconcile::report::{Change, ChangeKind, PassReport};
use crate::reconcile::resolution::Resolution;
use crate::source::{EventSource, EventStore, SyncWindow};

/// Default upper bound for one pass.
pub const DEFAULT_PASS_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Where a pass is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    FetchInitial,
    AddPass,
    FetchAgain,
    ReconcilePass,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::FetchInitial => write!(f, "initial fetch"),
            Phase::AddPass => write!(f, "add pass"),
            Phase::FetchAgain => write!(f, "second fetch"),
            Phase::ReconcilePass => write!(f, "reconcile pass"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Drives sync passes between the two sources and the canonical store.
pub struct Reconciler<T, S, St, G = UuidGenerator> {
    pub(super) tasks: T,
    pub(super) schedule: S,
    pub(super) store: St,
    pub(super) ids: G,
    deadline: Duration,
}

impl<T: EventSource, S: EventSource, St: EventStore> Reconciler<T, S, St> {
    pub fn new(tasks: T, schedule: S, store: St) -> SyncResult<Self> {
        if tasks.side() != Side::Tasks || schedule.side() != Side::Schedule {
            return Err(SyncError::Config(format!(
                "Sources are wired to the wrong sides (got {} and {})",
                tasks.side(),
                schedule.side()
            )));
        }

        Ok(Reconciler {
            tasks,
            schedule,
            store,
            ids: UuidGenerator,
            deadline: DEFAULT_PASS_TIMEOUT,
        })
    }
}

impl<T, S, St, G> Reconciler<T, S, St, G> {
    pub fn with_id_generator<H: IdGenerator>(self, ids: H) -> Reconciler<T, S, St, H> {
        Reconciler {
            tasks: self.tasks,
            schedule: self.schedule,
            store: self.store,
            ids,
            deadline: self.deadline,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn store(&self) -> &St {
        &self.store
    }
}

impl<T, S, St, G> Reconciler<T, S, St, G>
where
    T: EventSource,
    S: EventSource,
    St: EventStore,
    G: IdGenerator,
{
    /// Run one pass with a window opening now.
    pub async fn run_pass(&self) -> SyncResult<PassReport> {
        self.run_pass_at(SyncWindow::starting_now()).await
    }

    /// Run one pass over `window`.
    ///
    /// Listing failures, add-pass failures and an exceeded deadline abort the
    /// pass with an error. Failures on individual tracked events are collected
    /// in the returned report instead.
    pub async fn run_pass_at(&self, window: SyncWindow) -> SyncResult<PassReport> {
        match timeout(self.deadline, self.run_phases(&window)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Deadline(self.deadline.as_secs())),
        }
    }

    async fn run_phases(&self, window: &SyncWindow) -> SyncResult<PassReport> {
        info!(phase = %Phase::FetchInitial, from = %window.from, "starting sync pass");
        let (tasks, schedule) = self
            .snapshot(window)
            .await
            .map_err(|e| SyncError::aborted(Phase::FetchInitial, e))?;

        info!(
            phase = %Phase::AddPass,
            tasks = tasks.len(),
            schedule = schedule.len(),
            "looking for new events"
        );
        let mut report = self
            .detect_additions(&tasks, &schedule)
            .await
            .map_err(|e| SyncError::aborted(Phase::AddPass, e))?;

        // Re-read so the reconcile pass sees identifiers written above
        info!(phase = %Phase::FetchAgain, "refreshing snapshots");
        let (tasks, schedule) = self
            .snapshot(window)
            .await
            .map_err(|e| SyncError::aborted(Phase::FetchAgain, e))?;

        info!(phase = %Phase::ReconcilePass, "reconciling tracked events");
        let canonical = self.store.list_all().await.map_err(|e| {
            SyncError::aborted(Phase::ReconcilePass, SyncError::fetch(Target::Store, e))
        })?;
        report.merge(
            self.resolve_conflicts(&canonical, &tasks, &schedule, window)
                .await,
        );

        info!(
            phase = %Phase::Done,
            changes = report.changes.len(),
            failures = report.failures.len(),
            "sync pass finished"
        );
        Ok(report)
    }

    /// Work out what a pass over `window` would do, without writing anything.
    pub async fn plan(&self, window: SyncWindow) -> SyncResult<Plan> {
        let (tasks, schedule) = self.snapshot(&window).await?;
        let canonical = self
            .store
            .list_all()
            .await
            .map_err(|e| SyncError::fetch(Target::Store, e))?;

        Ok(Plan {
            additions: planned_additions(&tasks, &schedule),
            resolutions: planned_resolutions(&canonical, &tasks, &schedule, &window),
        })
    }

    async fn snapshot(&self, window: &SyncWindow) -> SyncResult<(Vec<Event>, Vec<Event>)> {
        let tasks = self
            .tasks
            .list_upcoming(window)
            .await
            .map_err(|e| SyncError::fetch(Side::Tasks, e))?;
        let schedule = self
            .schedule
            .list_upcoming(window)
            .await
            .map_err(|e| SyncError::fetch(Side::Schedule, e))?;
        Ok((tasks, schedule))
    }

    pub(super) async fn create_in(&self, side: Side, event: &Event) -> SyncResult<String> {
        match side {
            Side::Tasks => self.tasks.create(event).await,
            Side::Schedule => self.schedule.create(event).await,
        }
    }

    pub(super) async fn update_in(&self, side: Side, event: &Event) -> SyncResult<()> {
        match side {
            Side::Tasks => self.tasks.update(event).await,
            Side::Schedule => self.schedule.update(event).await,
        }
    }

    pub(super) async fn delete_in(&self, side: Side, event: &Event) -> SyncResult<()> {
        match side {
            Side::Tasks => self.tasks.delete(event).await,
            Side::Schedule => self.schedule.delete(event).await,
        }
    }
}

/// An untracked observation the add pass would pick up.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAddition {
    pub origin: Side,
    pub event: Event,
    /// False when the counterpart already exists (a resumed earlier attempt).
    pub creates_counterpart: bool,
}

/// Dry-run result: what the next pass would change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub additions: Vec<PlannedAddition>,
    /// Canonical record paired with its resolution. Unchanged records included.
    pub resolutions: Vec<(Event, Resolution)>,
}

impl Plan {
    /// Every write the pass would make, additions first.
    pub fn changes(&self) -> Vec<Change> {
        let mut changes = self.addition_changes();
        changes.extend(self.resolution_changes());
        changes
    }

    pub fn addition_changes(&self) -> Vec<Change> {
        let mut changes = Vec::new();
        for addition in &self.additions {
            let event = &addition.event;
            if addition.creates_counterpart {
                changes.push(Change::new(ChangeKind::Create, addition.origin.other(), event));
            }
            changes.push(Change::new(ChangeKind::Update, addition.origin, event));
            changes.push(Change::new(ChangeKind::Create, Target::Store, event));
        }
        changes
    }

    pub fn resolution_changes(&self) -> Vec<Change> {
        self.resolutions
            .iter()
            .flat_map(|(canonical, resolution)| {
                let subject = resolution.record().unwrap_or(canonical);
                resolution
                    .actions()
                    .into_iter()
                    .map(move |action| Change::new(action.kind(), action.step().target, subject))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty()
            && self
                .resolutions
                .iter()
                .all(|(_, resolution)| *resolution == Resolution::Unchanged)
    }
}

//! Reconcile pass: compare every canonical record with both sources and
//! carry out its resolution.
//!
//! A failure on one event is logged, recorded in the report and skipped;
//! the remaining events are still processed.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::event::Event;
use crate::identity::IdGenerator;
use crate::reconcile::matcher::index_by_id;
use crate::reconcile::orchestrator::Reconciler;
use crate::reconcile::report::{Change, Failure, PassReport};
use crate::reconcile::resolution::{Action, Resolution, resolve};
use crate::source::{EventSource, EventStore, SyncWindow};

fn missing_id(record: &Event) -> SyncError {
    SyncError::InvalidEvent(format!(
        "canonical record '{}' has no identifier",
        record.title
    ))
}

fn resolve_indexed(
    id: &str,
    record: &Event,
    tasks: &HashMap<&str, &Event>,
    schedule: &HashMap<&str, &Event>,
    window: &SyncWindow,
) -> Resolution {
    resolve(
        record,
        tasks.get(id).copied(),
        schedule.get(id).copied(),
        window,
    )
}

pub(super) fn planned_resolutions(
    canonical: &[Event],
    tasks: &[Event],
    schedule: &[Event],
    window: &SyncWindow,
) -> Vec<(Event, Resolution)> {
    let tasks = index_by_id(tasks);
    let schedule = index_by_id(schedule);

    canonical
        .iter()
        .filter_map(|record| match record.id.as_deref() {
            Some(id) => Some((
                record.clone(),
                resolve_indexed(id, record, &tasks, &schedule, window),
            )),
            None => {
                warn!(title = %record.title, "skipping canonical record without identifier");
                None
            }
        })
        .collect()
}

impl<T, S, St, G> Reconciler<T, S, St, G>
where
    T: EventSource,
    S: EventSource,
    St: EventStore,
    G: IdGenerator,
{
    pub(super) async fn resolve_conflicts(
        &self,
        canonical: &[Event],
        tasks: &[Event],
        schedule: &[Event],
        window: &SyncWindow,
    ) -> PassReport {
        let tasks = index_by_id(tasks);
        let schedule = index_by_id(schedule);
        let mut report = PassReport::default();

        for record in canonical {
            let outcome = match record.id.as_deref() {
                Some(id) => {
                    let resolution = resolve_indexed(id, record, &tasks, &schedule, window);
                    self.apply(id, record, &resolution, &mut report).await
                }
                None => Err(missing_id(record)),
            };

            if let Err(e) = outcome {
                warn!(event = record.label(), error = %e, "could not reconcile event");
                report.failures.push(Failure::new(record, &e));
            }
        }

        report
    }

    async fn apply(
        &self,
        id: &str,
        canonical: &Event,
        resolution: &Resolution,
        report: &mut PassReport,
    ) -> SyncResult<()> {
        if let Resolution::Merged { winner, .. } = resolution {
            debug!(event = id, %winner, "merging changes");
        }

        let subject = resolution.record().unwrap_or(canonical);
        for action in resolution.actions() {
            self.perform(action, id, canonical, subject)
                .await
                .map_err(|e| SyncError::write(action.step(), id, e))?;
            report
                .changes
                .push(Change::new(action.kind(), action.step().target, subject));
        }

        Ok(())
    }

    async fn perform(
        &self,
        action: Action,
        id: &str,
        canonical: &Event,
        subject: &Event,
    ) -> SyncResult<()> {
        match action {
            Action::Update(side) => self.update_in(side, subject).await,
            Action::Delete(side) => self.delete_in(side, canonical).await,
            Action::WriteRecord => self.store.put(subject).await,
            Action::RemoveRecord | Action::RetireRecord => self.store.remove(id).await,
        }
    }
}

//! Add pass: bring untracked observations under management.
//!
//! For each observation without a synthetic id, in tasks-then-schedule order:
//! assign an id, create the counterpart in the other source (unless a native
//! id for it is already known), write the id back to the origin and persist
//! the canonical record. Any failure aborts the pass.
//!
//! A previous attempt may have created the counterpart and then failed to
//! write the id back. The counterpart carries the origin's native id as its
//! linked id, so the observation is matched to it here and adopts its
//! identity instead of creating a duplicate.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{Op, Step, SyncError, SyncResult, Target};
use crate::event::{Event, Side};
use crate::identity::IdGenerator;
use crate::reconcile::orchestrator::{PlannedAddition, Reconciler};
use crate::reconcile::report::{Change, ChangeKind, PassReport};
use crate::source::{EventSource, EventStore};

fn observations<'a>(
    tasks: &'a [Event],
    schedule: &'a [Event],
) -> impl Iterator<Item = (Side, &'a Event)> + 'a {
    tasks
        .iter()
        .map(|e| (Side::Tasks, e))
        .chain(schedule.iter().map(|e| (Side::Schedule, e)))
}

fn snapshot_of<'a>(side: Side, tasks: &'a [Event], schedule: &'a [Event]) -> &'a [Event] {
    match side {
        Side::Tasks => tasks,
        Side::Schedule => schedule,
    }
}

/// A tracked event in `others` that already points back at `observed`.
fn find_partner<'a>(origin: Side, observed: &Event, others: &'a [Event]) -> Option<&'a Event> {
    let native_id = observed.native_id(origin)?;
    others
        .iter()
        .find(|e| e.is_tracked() && e.native_id(origin) == Some(native_id))
}

pub(super) fn planned_additions(tasks: &[Event], schedule: &[Event]) -> Vec<PlannedAddition> {
    observations(tasks, schedule)
        .filter(|(_, observed)| !observed.is_tracked())
        .map(|(origin, observed)| {
            let others = snapshot_of(origin.other(), tasks, schedule);
            PlannedAddition {
                origin,
                event: observed.clone(),
                creates_counterpart: observed.native_id(origin.other()).is_none()
                    && find_partner(origin, observed, others).is_none(),
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
    pub(super) async fn detect_additions(
        &self,
        tasks: &[Event],
        schedule: &[Event],
    ) -> SyncResult<PassReport> {
        let mut report = PassReport::default();
        let mut settled = HashSet::new();

        for (origin, observed) in observations(tasks, schedule).filter(|(_, e)| !e.is_tracked()) {
            let others = snapshot_of(origin.other(), tasks, schedule);
            let partner = find_partner(origin, observed, others);
            let event = self.track(origin, observed, partner, &mut report).await?;
            settled.extend(event.id);
        }

        // Tracked on both sides but missing from the store: the earlier
        // attempt failed on its final write
        for (_, observed) in observations(tasks, schedule).filter(|(_, e)| e.is_materialized()) {
            let Some(id) = observed.id.as_deref() else {
                continue;
            };
            if !settled.insert(id.to_string()) {
                continue;
            }

            let existing = self
                .store
                .get(id)
                .await
                .map_err(|e| SyncError::fetch(Target::Store, e))?;
            if existing.is_none() {
                self.store
                    .put(observed)
                    .await
                    .map_err(|e| SyncError::write(Step::new(Op::Put, Target::Store), id, e))?;
                info!(event = id, title = %observed.title, "restored missing canonical record");
                report
                    .changes
                    .push(Change::new(ChangeKind::Create, Target::Store, observed));
            }
        }

        Ok(report)
    }

    async fn track(
        &self,
        origin: Side,
        observed: &Event,
        partner: Option<&Event>,
        report: &mut PassReport,
    ) -> SyncResult<Event> {
        let counterpart = origin.other();
        if observed.native_id(origin).is_none() {
            return Err(SyncError::InvalidEvent(format!(
                "'{}' was listed by {} without a native id",
                observed.title, origin
            )));
        }

        let mut event = observed.clone();
        match partner {
            Some(partner) => {
                debug!(event = partner.label(), %origin, "resuming earlier add");
                event.id = partner.id.clone();
                if let Some(native_id) = partner.native_id(counterpart) {
                    event.set_native_id(counterpart, native_id.to_string());
                }
            }
            None => {
                let id = self.ids.next_id().map_err(|e| {
                    SyncError::write(Step::new(Op::AssignId, origin), observed.label(), e)
                })?;
                event.id = Some(id);

                if event.native_id(counterpart).is_none() {
                    let native_id = self.create_in(counterpart, &event).await.map_err(|e| {
                        SyncError::write(Step::new(Op::Create, counterpart), event.label(), e)
                    })?;
                    event.set_native_id(counterpart, native_id);
                    report
                        .changes
                        .push(Change::new(ChangeKind::Create, counterpart, &event));
                }
            }
        }

        // Only the tasks copy carries color
        if matches!(origin, Side::Schedule) {
            event.color = partner.and_then(|p| p.color.clone());
        }

        // Echo the identifier back so the origin copy is tracked from now on
        self.update_in(origin, &event)
            .await
            .map_err(|e| SyncError::write(Step::new(Op::Update, origin), event.label(), e))?;
        report
            .changes
            .push(Change::new(ChangeKind::Update, origin, &event));

        self.store
            .put(&event)
            .await
            .map_err(|e| SyncError::write(Step::new(Op::Put, Target::Store), event.label(), e))?;
        report
            .changes
            .push(Change::new(ChangeKind::Create, Target::Store, &event));

        info!(event = event.label(), title = %event.title, %origin, "now tracking event");
        Ok(event)
    }
}

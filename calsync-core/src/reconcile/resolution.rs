//! Deciding what to do with one tracked event.
//!
//! `resolve` is pure: it looks at the canonical record and both source
//! versions and returns a `Resolution`. Applying it (and persisting the
//! merged record) is up to the caller.

use crate::error::{Op, Step, Target};
use crate::event::{Event, Side};
use crate::reconcile::report::ChangeKind;
use crate::source::SyncWindow;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Both sources agree with the canonical record.
    Unchanged,
    /// Gone from both sources: drop the canonical record.
    Vanished,
    /// Gone from both sources after its end time: it aged out of the
    /// window. Dropped like `Vanished`, but reported as a retirement.
    Retired,
    /// Deleted in `from`: delete from the other source and the store.
    Deleted { from: Side },
    /// Content changed; `record` is the new canonical version.
    Merged {
        record: Event,
        winner: Side,
        propagate_to: Vec<Side>,
    },
}

/// One mutation needed to carry out a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update(Side),
    Delete(Side),
    WriteRecord,
    RemoveRecord,
    RetireRecord,
}

impl Action {
    pub fn step(&self) -> Step {
        match self {
            Action::Update(side) => Step::new(Op::Update, *side),
            Action::Delete(side) => Step::new(Op::Delete, *side),
            Action::WriteRecord => Step::new(Op::Put, Target::Store),
            Action::RemoveRecord | Action::RetireRecord => Step::new(Op::Remove, Target::Store),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Action::Update(_) | Action::WriteRecord => ChangeKind::Update,
            Action::Delete(_) | Action::RemoveRecord => ChangeKind::Delete,
            Action::RetireRecord => ChangeKind::Retire,
        }
    }
}

impl Resolution {
    /// Actions in execution order. Sources are written before the store so a
    /// failed propagation leaves the old canonical record in place and the
    /// change is detected again next pass.
    pub fn actions(&self) -> Vec<Action> {
        match self {
            Resolution::Unchanged => vec![],
            Resolution::Vanished => vec![Action::RemoveRecord],
            Resolution::Retired => vec![Action::RetireRecord],
            Resolution::Deleted { from } => {
                vec![Action::Delete(from.other()), Action::RemoveRecord]
            }
            Resolution::Merged { propagate_to, .. } => propagate_to
                .iter()
                .map(|side| Action::Update(*side))
                .chain(std::iter::once(Action::WriteRecord))
                .collect(),
        }
    }

    /// The record the actions operate on, if it differs from the canonical one.
    pub fn record(&self) -> Option<&Event> {
        match self {
            Resolution::Merged { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Which side wrote last. Equal (or both missing) timestamps go to the schedule side.
pub fn last_writer(tasks: &Event, schedule: &Event) -> Side {
    if tasks.updated > schedule.updated {
        Side::Tasks
    } else {
        Side::Schedule
    }
}

pub fn resolve(
    canonical: &Event,
    tasks: Option<&Event>,
    schedule: Option<&Event>,
    window: &SyncWindow,
) -> Resolution {
    match (tasks, schedule) {
        (Some(a), Some(b)) => compare(canonical, a, b),
        (None, None) if window.has_passed(canonical) => Resolution::Retired,
        (None, None) => Resolution::Vanished,
        (None, Some(_)) => Resolution::Deleted { from: Side::Tasks },
        (Some(_), None) => Resolution::Deleted { from: Side::Schedule },
    }
}

fn compare(canonical: &Event, tasks: &Event, schedule: &Event) -> Resolution {
    let tasks_changed = canonical.differs_from(tasks, Side::Tasks);
    let schedule_changed = canonical.differs_from(schedule, Side::Schedule);

    let winner = match (tasks_changed, schedule_changed) {
        (false, false) => return Resolution::Unchanged,
        (true, false) => Side::Tasks,
        (false, true) => Side::Schedule,
        (true, true) => last_writer(tasks, schedule),
    };

    // Color is only ever read from the tasks side, and only when it changed there
    let color_from = tasks_changed.then_some(tasks);
    let record = match winner {
        Side::Tasks => canonical.merged_with(tasks, color_from),
        Side::Schedule => canonical.merged_with(schedule, color_from),
    };

    let mut propagate_to = vec![winner.other()];
    // The schedule side won, but it still needs the recolor made on the tasks side
    if winner == Side::Schedule && record.color != canonical.color {
        propagate_to.push(Side::Schedule);
    }

    Resolution::Merged {
        record,
        winner,
        propagate_to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 7, hour, min, 0).unwrap()
    }

    fn canonical() -> Event {
        Event {
            id: Some("e1".to_string()),
            title: "Standup".to_string(),
            start: t(9, 0),
            end: t(9, 30),
            all_day: false,
            description: String::new(),
            color: Some("blue".to_string()),
            created: Some(t(0, 0)),
            updated: Some(t(1, 0)),
            tasks_id: Some("page-1".to_string()),
            schedule_id: Some("gcal-1".to_string()),
        }
    }

    fn window() -> SyncWindow {
        SyncWindow {
            from: t(0, 0) - Duration::days(1),
        }
    }

    /// How each side reports the canonical event: no foreign native id, and
    /// no authoritative color on the schedule side.
    fn views(c: &Event) -> (Event, Event) {
        let tasks = Event {
            schedule_id: None,
            ..c.clone()
        };
        let schedule = Event {
            tasks_id: None,
            color: None,
            ..c.clone()
        };
        (tasks, schedule)
    }

    #[test]
    fn test_unchanged_when_views_match() {
        let c = canonical();
        let (a, b) = views(&c);
        assert_eq!(resolve(&c, Some(&a), Some(&b), &window()), Resolution::Unchanged);
    }

    #[test]
    fn test_tasks_change_propagates_to_schedule_only() {
        let c = canonical();
        let (mut a, b) = views(&c);
        a.title = "Standup (moved)".to_string();
        a.updated = Some(t(2, 0));

        match resolve(&c, Some(&a), Some(&b), &window()) {
            Resolution::Merged {
                record,
                winner,
                propagate_to,
            } => {
                assert_eq!(record.title, "Standup (moved)");
                assert_eq!(record.color.as_deref(), Some("blue"));
                assert_eq!(winner, Side::Tasks);
                assert_eq!(propagate_to, vec![Side::Schedule]);
                assert_eq!(record.schedule_id.as_deref(), Some("gcal-1"));
            }
            other => panic!("Expected merge, got {:?}", other),
        }
    }

    #[test]
    fn test_schedule_change_never_alters_color() {
        let c = canonical();
        let (a, mut b) = views(&c);
        b.start = t(10, 0);
        b.end = t(10, 30);
        b.color = Some("red".to_string());

        match resolve(&c, Some(&a), Some(&b), &window()) {
            Resolution::Merged {
                record,
                winner,
                propagate_to,
            } => {
                assert_eq!(winner, Side::Schedule);
                assert_eq!(propagate_to, vec![Side::Tasks]);
                assert_eq!(record.start, t(10, 0));
                assert_eq!(record.color.as_deref(), Some("blue"));
            }
            other => panic!("Expected merge, got {:?}", other),
        }
    }

    #[test]
    fn test_schedule_color_alone_is_not_a_change() {
        let c = canonical();
        let (a, mut b) = views(&c);
        b.color = Some("red".to_string());
        assert_eq!(resolve(&c, Some(&a), Some(&b), &window()), Resolution::Unchanged);
    }

    #[test]
    fn test_both_changed_later_writer_wins() {
        let c = canonical();
        let (mut a, mut b) = views(&c);
        a.title = "From tasks".to_string();
        a.updated = Some(t(3, 0));
        b.title = "From schedule".to_string();
        b.updated = Some(t(2, 0));

        match resolve(&c, Some(&a), Some(&b), &window()) {
            Resolution::Merged {
                record,
                winner,
                propagate_to,
            } => {
                assert_eq!(record.title, "From tasks");
                assert_eq!(winner, Side::Tasks);
                assert_eq!(propagate_to, vec![Side::Schedule]);
            }
            other => panic!("Expected merge, got {:?}", other),
        }
    }

    #[test]
    fn test_equal_timestamps_resolve_to_schedule() {
        let c = canonical();
        let (mut a, mut b) = views(&c);
        a.title = "From tasks".to_string();
        b.title = "From schedule".to_string();
        a.updated = Some(t(2, 0));
        b.updated = Some(t(2, 0));

        for _ in 0..3 {
            match resolve(&c, Some(&a), Some(&b), &window()) {
                Resolution::Merged { record, winner, .. } => {
                    assert_eq!(record.title, "From schedule");
                    assert_eq!(winner, Side::Schedule);
                }
                other => panic!("Expected merge, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_schedule_wins_but_keeps_tasks_recolor() {
        let c = canonical();
        let (mut a, mut b) = views(&c);
        a.color = Some("green".to_string());
        a.updated = Some(t(2, 0));
        b.title = "Renamed".to_string();
        b.updated = Some(t(3, 0));

        match resolve(&c, Some(&a), Some(&b), &window()) {
            Resolution::Merged {
                record,
                winner,
                propagate_to,
            } => {
                assert_eq!(winner, Side::Schedule);
                assert_eq!(record.title, "Renamed");
                assert_eq!(record.color.as_deref(), Some("green"));
                assert_eq!(propagate_to, vec![Side::Tasks, Side::Schedule]);
            }
            other => panic!("Expected merge, got {:?}", other),
        }
    }

    #[test]
    fn test_presence_rules() {
        let c = canonical();
        let (a, b) = views(&c);
        let w = window();

        assert_eq!(resolve(&c, None, None, &w), Resolution::Vanished);
        assert_eq!(
            resolve(&c, None, Some(&b), &w),
            Resolution::Deleted { from: Side::Tasks }
        );
        assert_eq!(
            resolve(&c, Some(&a), None, &w),
            Resolution::Deleted { from: Side::Schedule }
        );
    }

    #[test]
    fn test_only_events_gone_from_both_sides_are_retired() {
        let c = canonical();
        let (a, b) = views(&c);
        let later = SyncWindow { from: t(12, 0) };

        assert_eq!(resolve(&c, None, None, &later), Resolution::Retired);
        assert_eq!(
            resolve(&c, None, Some(&b), &later),
            Resolution::Deleted { from: Side::Tasks }
        );
        assert_eq!(
            resolve(&c, Some(&a), None, &later),
            Resolution::Deleted { from: Side::Schedule }
        );
    }

    #[test]
    fn test_actions_write_sources_before_store() {
        let c = canonical();
        let deleted = Resolution::Deleted { from: Side::Tasks };
        assert_eq!(
            deleted.actions(),
            vec![Action::Delete(Side::Schedule), Action::RemoveRecord]
        );

        let merged = Resolution::Merged {
            record: c,
            winner: Side::Tasks,
            propagate_to: vec![Side::Schedule],
        };
        assert_eq!(
            merged.actions(),
            vec![Action::Update(Side::Schedule), Action::WriteRecord]
        );
        assert!(Resolution::Unchanged.actions().is_empty());
    }
}

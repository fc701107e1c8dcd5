//! Conversion between provider wire events and normalized events.
//!
//! Date-only values are interpreted in the timezone passed by the caller.
//! The tasks side reports all-day end dates inclusively, the schedule side
//! exclusively.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};
use crate::event::{Event, Side};
use crate::palette;
use crate::remote::protocol::{EventTime, RemoteEvent};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn inclusive_end_dates(side: Side) -> bool {
    side == Side::Tasks
}

/// Midnight of `date` in `tz`. Falls forward one hour when midnight is skipped by DST.
fn start_of_day(date: NaiveDate, tz: Tz) -> SyncResult<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| SyncError::InvalidEvent(format!("{} has no start of day in {}", date, tz)))
}

fn next_day(date: NaiveDate) -> SyncResult<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| SyncError::InvalidEvent(format!("{} is out of range", date)))
}

/// Normalize an event reported by `side`.
pub fn from_remote(remote: RemoteEvent, side: Side, tz: Tz) -> SyncResult<Event> {
    let native_id = non_empty(remote.id).ok_or_else(|| {
        SyncError::InvalidEvent(format!("'{}' from {} has no native id", remote.title, side))
    })?;

    let (start, all_day, start_date) = match remote.start {
        EventTime::DateTime(dt) => (dt, false, dt.with_timezone(&tz).date_naive()),
        EventTime::Date(d) => (start_of_day(d, tz)?, true, d),
    };

    let end = match remote.end {
        Some(EventTime::DateTime(dt)) => dt,
        Some(EventTime::Date(d)) if inclusive_end_dates(side) => start_of_day(next_day(d)?, tz)?,
        Some(EventTime::Date(d)) => start_of_day(d, tz)?,
        None if all_day => start_of_day(next_day(start_date)?, tz)?,
        None => start + Duration::hours(1),
    };

    if end < start {
        return Err(SyncError::InvalidEvent(format!(
            "'{}' from {} ends before it starts",
            remote.title, side
        )));
    }

    let color = match side {
        Side::Tasks => remote.tags.into_iter().next().and_then(|tag| tag.color),
        Side::Schedule => remote
            .color_id
            .as_deref()
            .and_then(palette::color_name)
            .map(String::from),
    };

    let mut event = Event {
        id: non_empty(remote.sync_id),
        title: remote.title,
        start,
        end,
        all_day,
        description: remote.description.unwrap_or_default(),
        color: non_empty(color),
        created: remote.created,
        updated: remote.updated,
        tasks_id: None,
        schedule_id: None,
    };
    event.set_native_id(side, native_id);
    if let Some(linked) = non_empty(remote.linked_id) {
        event.set_native_id(side.other(), linked);
    }

    Ok(event)
}

/// Render an event for `side`, carrying the synthetic id and the counterpart's id.
pub fn to_remote(event: &Event, side: Side, tz: Tz) -> RemoteEvent {
    let (start, end) = if event.all_day {
        let start_date = event.start.with_timezone(&tz).date_naive();
        let end_date = event.end.with_timezone(&tz).date_naive();

        let end = if inclusive_end_dates(side) {
            // Single-day events carry no end on the tasks side
            end_date
                .pred_opt()
                .filter(|last_day| *last_day > start_date)
                .map(EventTime::Date)
        } else {
            Some(EventTime::Date(end_date))
        };

        (EventTime::Date(start_date), end)
    } else {
        (
            EventTime::DateTime(event.start),
            Some(EventTime::DateTime(event.end)),
        )
    };

    let color_id = match side {
        Side::Tasks => None,
        Side::Schedule => event
            .color
            .as_deref()
            .and_then(palette::palette_id)
            .map(String::from),
    };

    RemoteEvent {
        id: event.native_id(side).map(String::from),
        sync_id: event.id.clone(),
        linked_id: event.native_id(side.other()).map(String::from),
        title: event.title.clone(),
        description: Some(event.description.clone()).filter(|d| !d.is_empty()),
        start,
        end,
        tags: Vec::new(),
        color_id,
        created: event.created,
        updated: event.updated,
    }
}

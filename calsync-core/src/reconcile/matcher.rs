//! Identity matching: index events by synthetic identifier.

use std::collections::HashMap;

use crate::event::Event;

/// Map synthetic id to event. Untracked events are left out.
pub fn index_by_id(events: &[Event]) -> HashMap<&str, &Event> {
    events
        .iter()
        .filter_map(|e| e.id.as_deref().map(|id| (id, e)))
        .collect()
}

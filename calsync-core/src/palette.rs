//! Mapping between tasks-side tag colors and schedule-side palette ids.

/// Tag color name to schedule palette id. Kept as a sequence so reverse
/// lookups are deterministic.
const PALETTE: &[(&str, &str)] = &[
    ("default", "1"),
    ("green", "2"),
    ("purple", "3"),
    ("pink", "4"),
    ("yellow", "5"),
    ("orange", "6"),
    ("gray", "8"),
    ("blue", "9"),
    ("brown", "10"),
    ("red", "11"),
];

pub fn palette_id(color: &str) -> Option<&'static str> {
    PALETTE
        .iter()
        .find(|(name, _)| *name == color)
        .map(|(_, id)| *id)
}

pub fn color_name(palette_id: &str) -> Option<&'static str> {
    PALETTE
        .iter()
        .find(|(_, id)| *id == palette_id)
        .map(|(name, _)| *name)
}

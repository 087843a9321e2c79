//! Points counter policy and encoding.

/// Points granted for an add that changed the note list.
pub const ADD_REWARD: u64 = 1;
/// Points granted for every delete action.
pub const DELETE_REWARD: u64 = 2;

/// Parses a persisted counter value.
///
/// Surrounding whitespace is ignored. Returns `None` for anything that is not
/// a non-negative decimal integer fitting in `u64`.
pub fn parse_points(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

/// Encodes a counter value for the key-value store.
pub fn encode_points(points: u64) -> String {
    points.to_string()
}

/// Applies a reward without overflowing.
pub fn reward(points: u64, amount: u64) -> u64 {
    points.saturating_add(amount)
}

//! Switch debounce
//!
//! A level change is accepted only when the previous accepted change is
//! older than the debounce window. There is no sample accumulation: the
//! first differing sample after the quiet period wins.

/// Decide whether a sampled switch level should be accepted
///
/// # Arguments
/// * `stored` - Currently accepted level
/// * `level` - Freshly sampled level
/// * `last_change_ms` - Timestamp of the previous accepted change
/// * `now_ms` - Current time
/// * `window_ms` - Debounce window
pub fn accept(stored: bool, level: bool, last_change_ms: u32, now_ms: u32, window_ms: u32) -> bool {
    level != stored && now_ms.wrapping_sub(last_change_ms) > window_ms
}

// ABOUTME: Wall-clock helper for lease timestamps.
// ABOUTME: All on-disk records store epoch milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
///
/// Leases are compared across processes, so they use wall-clock time rather
/// than a monotonic clock. Clocks are assumed loosely synchronized.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/*!
 * Timer Heap Entry
 * Deadline-ordered watch entries for the timer's min-heap
 */

use std::time::Instant;

/// Heap entry: the callback itself lives in the pending map keyed by `id`,
/// so a cancelled watch leaves only this small tombstone behind.
#[derive(Debug, Clone, Copy)]
pub(super) struct WatchEntry {
    pub deadline: Instant,
    pub id: u64,
}

impl PartialEq for WatchEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WatchEntry {}

impl Ord for WatchEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap: reverse so the nearest deadline is on top,
        // ties broken by scheduling order
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for WatchEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide monotonic counter backing `Body::id`. Kept outside `Body`
/// itself so construction doesn't require a `World` in hand, and so
/// `World::reset` can roll it back to zero for scenario teardown (S1..S3 in
/// the test scenarios reset it between runs).
static NEXT_BODY_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_body_id() -> u64 {
    NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed)
}

/// Resets the monotonic id counter. Intended for `World::reset` and test
/// setup; never call this while bodies from a prior generation are still
/// alive, or ids will collide.
pub fn reset_body_ids() {
    NEXT_BODY_ID.store(1, Ordering::Relaxed);
}

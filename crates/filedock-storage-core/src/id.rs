use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;

/// Upper bound (exclusive) of the random offset added to the timestamp.
const RANDOM_SPREAD: i64 = 1000;

/// Generates numeric file identifiers of the form `now_millis + random(0..1000)`.
///
/// Ids handed out by one generator are strictly increasing: a candidate that is
/// not greater than the last issued id is bumped to `last + 1`, so uploads racing
/// within the same millisecond never collide. Share one generator per process.
#[derive(Debug, Default)]
pub struct FileIdGenerator {
    last: AtomicI64,
}

impl FileIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> i64 {
        let candidate =
            chrono::Utc::now().timestamp_millis() + rand::rng().random_range(0..RANDOM_SPREAD);
        let mut issued = candidate;
        // fetch_update only fails when the closure returns None
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = candidate.max(last + 1);
                Some(issued)
            });
        issued
    }
}

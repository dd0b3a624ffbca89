use std::time::{Duration, Instant};

use tracing::info;
use uuid::Uuid;

/// Scoped timer for one classification submission. Logs the elapsed time when
/// dropped, so every exit path (success, error, panic unwind) is recorded.
pub struct SubmissionTimer {
    submission_id: Uuid,
    started: Instant,
}

impl SubmissionTimer {
    pub fn start(submission_id: Uuid) -> Self {
        Self {
            submission_id,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Drop for SubmissionTimer {
    fn drop(&mut self) {
        info!(
            submission_id = %self.submission_id,
            elapsed_ms = self.elapsed_ms(),
            "Classification submission finished"
        );
    }
}

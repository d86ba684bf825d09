//! Batch throttling for reconciliation runs.
//!
//! The catalog service is not built for sustained write bursts; the pipeline
//! pauses after every fixed count of processed records.

use std::time::Duration;

/// Counts processed records and sleeps after every `every`-th one.
///
/// An `every` of zero disables pausing entirely (used by tests and dry runs).
#[derive(Debug)]
pub struct BatchThrottle {
    every: usize,
    pause: Duration,
    processed: usize,
}

impl BatchThrottle {
    #[must_use]
    pub fn new(every: usize, pause_secs: u64) -> Self {
        Self {
            every,
            pause: Duration::from_secs(pause_secs),
            processed: 0,
        }
    }

    /// A throttle that never pauses.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    /// Records one processed record, sleeping if the batch boundary was hit.
    pub async fn tick(&mut self) {
        self.processed += 1;
        if self.every > 0 && self.processed % self.every == 0 {
            tracing::info!(
                processed = self.processed,
                pause_secs = self.pause.as_secs(),
                "batch boundary reached — pausing before next batch"
            );
            tokio::time::sleep(self.pause).await;
        }
    }

    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed
    }
}

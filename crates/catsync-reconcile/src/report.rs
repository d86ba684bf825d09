use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome counters for one supplier's reconcile pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub supplier: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Set when the supplier aborted before any per-record work, e.g.
    /// a feed fetch failure or denied access negotiation.
    pub fatal: Option<String>,
}

impl RunReport {
    pub fn start(supplier: &str) -> Self {
        Self {
            supplier: supplier.to_owned(),
            started_at: Utc::now(),
            finished_at: None,
            created: 0,
            updated: 0,
            deleted: 0,
            unchanged: 0,
            skipped: 0,
            failed: 0,
            fatal: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn abort(&mut self, reason: String) {
        self.fatal = Some(reason);
        self.finish();
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }
}

/// All supplier reports for one sync run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<RunReport>,
}

impl RunSummary {
    pub fn push(&mut self, report: RunReport) {
        self.reports.push(report);
    }

    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.reports
            .iter()
            .map(|r| r.failed + usize::from(r.is_fatal()))
            .sum()
    }
}

//! Diffing and write-back between normalized supplier catalogs and the
//! remote product catalog.

pub mod reconcile;
pub mod report;

pub use reconcile::{reconcile_supplier, ReconcileOptions};
pub use report::{RunReport, RunSummary};

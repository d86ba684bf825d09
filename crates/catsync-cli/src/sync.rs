//! Sync command handlers. Suppliers are processed sequentially; a failure
//! in one supplier is recorded in its report and the run moves on to the
//! next, so a single broken feed never blocks the rest of the catalog.

use catsync_core::{AppConfig, SupplierConfig};
use catsync_reconcile::{reconcile_supplier, ReconcileOptions, RunReport, RunSummary};
use catsync_remote::{BatchThrottle, CatalogClient};
use catsync_suppliers::{load_supplier_products, FeedFetcher, SupplierContext};

fn load_registry(
    config: &AppConfig,
    supplier_filter: Option<&str>,
) -> anyhow::Result<Vec<SupplierConfig>> {
    let mut registry = catsync_core::load_suppliers(&config.suppliers_path)?;
    // Credentials resolve once here; a missing variable fails the run
    // before any feed is touched.
    registry.resolve_credentials(|name| std::env::var(name).ok())?;

    let suppliers: Vec<SupplierConfig> = match supplier_filter {
        Some(slug) => {
            let found = registry
                .suppliers
                .into_iter()
                .find(|s| s.slug == slug)
                .ok_or_else(|| anyhow::anyhow!("supplier '{slug}' not found in registry"))?;
            vec![found]
        }
        None => registry.suppliers,
    };

    Ok(suppliers
        .into_iter()
        .filter(|s| {
            if s.enabled {
                true
            } else {
                tracing::info!(slug = %s.slug, "skipping disabled supplier");
                false
            }
        })
        .collect())
}

pub(crate) async fn run_sync(
    config: &AppConfig,
    supplier_filter: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let suppliers = load_registry(config, supplier_filter)?;
    if suppliers.is_empty() {
        anyhow::bail!("no enabled suppliers to sync");
    }

    let client = CatalogClient::new(config)?;
    let fetcher = FeedFetcher::new(config.request_timeout_secs, &config.user_agent)?;
    let ctx = SupplierContext {
        app: config,
        fetcher: &fetcher,
    };
    let options = ReconcileOptions { dry_run };

    let mut summary = RunSummary::default();
    for supplier in &suppliers {
        tracing::info!(slug = %supplier.slug, dry_run, "syncing supplier");

        let products = match load_supplier_products(&ctx, supplier).await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!(slug = %supplier.slug, error = %e, "feed load failed");
                let mut report = RunReport::start(&supplier.slug);
                report.abort(format!("feed load failed: {e}"));
                summary.push(report);
                continue;
            }
        };
        tracing::info!(slug = %supplier.slug, count = products.len(), "feed normalized");

        let mut throttle = if config.batch_pause_every == 0 {
            BatchThrottle::disabled()
        } else {
            BatchThrottle::new(config.batch_pause_every, config.batch_pause_secs)
        };
        let report = reconcile_supplier(
            &client,
            &supplier.slug,
            supplier.tag,
            &products,
            &mut throttle,
            options,
        )
        .await;
        summary.push(report);
    }

    for report in &summary.reports {
        match &report.fatal {
            Some(reason) => tracing::error!(
                supplier = %report.supplier,
                reason,
                "supplier aborted"
            ),
            None => tracing::info!(
                supplier = %report.supplier,
                created = report.created,
                updated = report.updated,
                deleted = report.deleted,
                unchanged = report.unchanged,
                skipped = report.skipped,
                failed = report.failed,
                "supplier reconciled"
            ),
        }
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.total_failures() > 0 {
        anyhow::bail!("{} record(s) failed to sync", summary.total_failures());
    }
    Ok(())
}

pub(crate) fn run_check_config(config: &AppConfig) -> anyhow::Result<()> {
    let mut registry = catsync_core::load_suppliers(&config.suppliers_path)?;
    registry.resolve_credentials(|name| std::env::var(name).ok())?;
    println!(
        "configuration ok: catalog {} with {} supplier(s)",
        config.catalog_base_url,
        registry.suppliers.len()
    );
    for supplier in &registry.suppliers {
        println!(
            "  {} (tag {}, kind {}, {})",
            supplier.slug,
            supplier.tag,
            supplier.kind,
            if supplier.enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

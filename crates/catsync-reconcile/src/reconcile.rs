use std::collections::HashSet;

use catsync_core::CanonicalProduct;
use catsync_remote::{BatchThrottle, CatalogClient, ProductPatch, RemoteProduct};

use crate::report::RunReport;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Compute the full diff and counters without issuing any write.
    pub dry_run: bool,
}

/// Reconciles one supplier's normalized feed against the remote catalog.
///
/// Remote ids are listed once and filtered down to this supplier's tag
/// prefix, so one supplier can never touch another supplier's records.
/// Stale records are deleted before creates and updates, then the feed is
/// walked in order. Per-record failures are logged and counted but never
/// abort the run; only the initial id listing is fatal.
pub async fn reconcile_supplier(
    client: &CatalogClient,
    supplier_slug: &str,
    tag: char,
    products: &[CanonicalProduct],
    throttle: &mut BatchThrottle,
    options: ReconcileOptions,
) -> RunReport {
    let mut report = RunReport::start(supplier_slug);

    let remote_ids = match client.list_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(supplier = %supplier_slug, error = %e, "failed to list remote ids");
            report.abort(format!("failed to list remote ids: {e}"));
            return report;
        }
    };
    let owned: HashSet<&str> = remote_ids
        .iter()
        .map(String::as_str)
        .filter(|id| id.starts_with(tag))
        .collect();

    let mut seen: HashSet<&str> = HashSet::with_capacity(products.len());
    let local: HashSet<&str> = products.iter().map(|p| p.id.as_str()).collect();

    // Deletions first: a record that vanished from the feed must not
    // linger while the rest of the catalog is being written.
    let mut stale: Vec<&str> = owned.difference(&local).copied().collect();
    stale.sort_unstable();
    for id in stale {
        if options.dry_run {
            tracing::info!(supplier = %supplier_slug, id, "dry run: would delete stale record");
            report.deleted += 1;
            continue;
        }
        match client.delete(id).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                tracing::warn!(supplier = %supplier_slug, id, error = %e, "delete failed");
                report.failed += 1;
            }
        }
        throttle.tick().await;
    }

    for product in products {
        if !seen.insert(product.id.as_str()) {
            tracing::warn!(
                supplier = %supplier_slug,
                id = %product.id,
                "duplicate id in feed, skipping"
            );
            report.skipped += 1;
            continue;
        }
        reconcile_record(client, product, options, &mut report).await;
        throttle.tick().await;
    }

    report.finish();
    report
}

async fn reconcile_record(
    client: &CatalogClient,
    product: &CanonicalProduct,
    options: ReconcileOptions,
    report: &mut RunReport,
) {
    let remote = match client.get(&product.id).await {
        Ok(remote) => remote,
        Err(e) => {
            tracing::warn!(id = %product.id, error = %e, "lookup failed");
            report.failed += 1;
            return;
        }
    };

    match remote {
        None => {
            if options.dry_run {
                tracing::info!(id = %product.id, "dry run: would create");
                report.created += 1;
                return;
            }
            match client.create(product).await {
                Ok(()) => report.created += 1,
                Err(e) => {
                    tracing::warn!(id = %product.id, error = %e, "create failed");
                    report.failed += 1;
                }
            }
        }
        Some(remote) => {
            if !differs(product, &remote) {
                report.unchanged += 1;
                return;
            }
            if options.dry_run {
                tracing::info!(id = %product.id, "dry run: would update");
                report.updated += 1;
                return;
            }
            match client.update(&product.id, &patch_for(product)).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    tracing::warn!(id = %product.id, error = %e, "update failed");
                    report.failed += 1;
                }
            }
        }
    }
}

/// A record needs a write when price, discount price, or total stock moved.
/// Prices compare as exact decimals, so "90" and "90.00" are equal but
/// "90.00" and "90.01" are not.
fn differs(local: &CanonicalProduct, remote: &RemoteProduct) -> bool {
    local.price != remote.price
        || local.discount_price != remote.discount_price
        || local.total_quantity() != remote.quantity()
}

fn patch_for(product: &CanonicalProduct) -> ProductPatch {
    ProductPatch {
        price: product.price,
        discount_price: product.discount_price,
        quantity: Some(product.total_quantity()),
        sizes: product.sizes.clone(),
        warehouse: Some(product.warehouse.clone()),
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;

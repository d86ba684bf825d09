//! One module per supplier feed format.
//!
//! Each module converts that supplier's raw documents into
//! [`CanonicalProduct`]s. Records missing required fields (local ID, name)
//! are skipped with a warning, never fatal; document-level failures abort
//! that supplier's run and surface as a [`FeedError`].

pub mod happygifts;
pub mod midocean;
pub mod oasis;
pub mod project111;
pub mod xindao;

use rust_decimal::Decimal;

use catsync_core::{AppConfig, CanonicalProduct, FeedKind, SupplierConfig};

use crate::error::FeedError;
use crate::fetch::FeedFetcher;

/// Shared handles threaded into every supplier pipeline. Built once at
/// process start; nothing is read from ambient globals.
pub struct SupplierContext<'a> {
    pub app: &'a AppConfig,
    pub fetcher: &'a FeedFetcher,
}

/// Fetches, parses, and normalizes one supplier's feed into canonical
/// products.
///
/// # Errors
///
/// Returns a [`FeedError`] when the feed cannot be retrieved or parsed, or
/// when a precondition (access negotiation, credentials) fails. All such
/// errors are fatal for this supplier only.
pub async fn load_supplier_products(
    ctx: &SupplierContext<'_>,
    supplier: &SupplierConfig,
) -> Result<Vec<CanonicalProduct>, FeedError> {
    match supplier.kind {
        FeedKind::Project111 => project111::load(ctx, supplier).await,
        FeedKind::Oasis => {
            let docs = ctx.fetcher.fetch(supplier, &supplier.catalog_feed).await?;
            let catalog = single_document(docs, supplier, "catalog feed")?;
            oasis::parse(&catalog, supplier)
        }
        FeedKind::Xindao => {
            let docs = ctx.fetcher.fetch(supplier, &supplier.catalog_feed).await?;
            let catalog = single_document(docs, supplier, "catalog feed")?;
            let stock_location = supplier.stock_feed.as_ref().ok_or_else(|| {
                FeedError::MissingDocument {
                    supplier: supplier.slug.clone(),
                    what: "stock feed location".to_owned(),
                }
            })?;
            let stock_docs = ctx.fetcher.fetch(supplier, stock_location).await?;
            let stock = single_document(stock_docs, supplier, "stock feed")?;
            xindao::parse(&catalog, &stock, supplier)
        }
        FeedKind::Happygifts => {
            let docs = ctx.fetcher.fetch(supplier, &supplier.catalog_feed).await?;
            let catalog = single_document(docs, supplier, "catalog feed")?;
            let stock = match &supplier.stock_feed {
                Some(location) => {
                    let stock_docs = ctx.fetcher.fetch(supplier, location).await?;
                    Some(single_document(stock_docs, supplier, "stock feed")?)
                }
                None => None,
            };
            happygifts::parse(&catalog, stock.as_deref(), supplier)
        }
        FeedKind::Midocean => {
            let docs = ctx.fetcher.fetch(supplier, &supplier.catalog_feed).await?;
            let catalog = single_document(docs, supplier, "catalog feed")?;
            midocean::parse(&catalog, supplier)
        }
    }
}

fn single_document(
    mut docs: Vec<String>,
    supplier: &SupplierConfig,
    what: &str,
) -> Result<String, FeedError> {
    if docs.is_empty() {
        return Err(FeedError::MissingDocument {
            supplier: supplier.slug.clone(),
            what: what.to_owned(),
        });
    }
    Ok(docs.swap_remove(0))
}

/// Parses a feed price string, tolerating comma decimal separators and
/// surrounding whitespace. `None`/unparseable input yields `None`.
pub(crate) fn parse_decimal(raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim().replace(',', ".");
    if raw.is_empty() {
        return None;
    }
    raw.parse::<Decimal>().ok()
}

/// Price with the ingest default: missing commercial data never blocks a
/// record, it becomes a zero price.
pub(crate) fn price_or_zero(raw: Option<&str>) -> Option<Decimal> {
    Some(parse_decimal(raw).unwrap_or(Decimal::ZERO))
}

/// Feed quantity as a non-negative integer; anything unparseable or negative
/// collapses to zero.
pub(crate) fn parse_quantity(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map_or(0, |q| q.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_accepts_comma_separator() {
        assert_eq!(
            parse_decimal(Some("120,50")),
            Some(Decimal::new(12050, 2))
        );
    }

    #[test]
    fn parse_decimal_rejects_garbage() {
        assert_eq!(parse_decimal(Some("n/a")), None);
        assert_eq!(parse_decimal(Some("")), None);
        assert_eq!(parse_decimal(None), None);
    }

    #[test]
    fn price_or_zero_defaults_missing_price() {
        assert_eq!(price_or_zero(None), Some(Decimal::ZERO));
        assert_eq!(price_or_zero(Some("oops")), Some(Decimal::ZERO));
        assert_eq!(price_or_zero(Some("15.99")), Some(Decimal::new(1599, 2)));
    }

    #[test]
    fn parse_quantity_clamps_negative_to_zero() {
        assert_eq!(parse_quantity(Some("-3")), 0);
        assert_eq!(parse_quantity(Some("7")), 7);
        assert_eq!(parse_quantity(Some("x")), 0);
        assert_eq!(parse_quantity(None), 0);
    }
}

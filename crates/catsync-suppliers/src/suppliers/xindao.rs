//! Xindao: XML catalog plus a separate per-size stock document.
//!
//! Stock rows carry a combined vendor code `"<base article>.<size suffix>"`;
//! a code without a suffix marks a sizeless product. Each row reports the
//! central warehouse under two separately named fields (on-hand and transit)
//! that sum into the "Европа" entry, plus a Moscow field for "Москва".
//!
//! Aggregation keys on the base article from the first pass: one map walk
//! accumulates both the per-size quantities and the per-location sums, so a
//! duplicated vendor-code row can never double-count into the warehouse
//! totals after the fact.

use std::collections::BTreeMap;

use catsync_core::product::{NO_BRAND, NO_DESCRIPTION, NO_MATERIAL};
use catsync_core::{namespace_id, CanonicalProduct, ImageRef, PrintOption, SupplierConfig, Warehouse};

use crate::error::FeedError;
use crate::suppliers::{parse_decimal, parse_quantity, price_or_zero};
use crate::xml::{parse_document, XmlElement};

const EUROPE: &str = "Европа";
const MOSCOW: &str = "Москва";

#[derive(Debug, Default)]
struct StockAggregate {
    sizes: BTreeMap<String, i64>,
    europe: i64,
    moscow: i64,
}

/// Parses the xindao catalog and stock documents into canonical products.
///
/// # Errors
///
/// Returns a [`FeedError`] when either document is not well-formed XML or
/// lacks its expected envelope.
pub fn parse(
    catalog: &str,
    stock: &str,
    supplier: &SupplierConfig,
) -> Result<Vec<CanonicalProduct>, FeedError> {
    let catalog_root = parse_document(catalog)?;
    let stock_root = parse_document(stock)?;
    let stock_by_article = aggregate_stock(&stock_root, supplier);

    let mut products = Vec::new();
    for item in catalog_root.children_named("product") {
        if let Some(product) = normalize(item, &stock_by_article, supplier) {
            products.push(product);
        }
    }
    Ok(products)
}

/// Splits a combined vendor code on the first `.` into base article and size
/// suffix. No suffix means the product is sizeless.
fn split_vendor_code(code: &str) -> (&str, Option<&str>) {
    match code.split_once('.') {
        Some((base, suffix)) if !suffix.is_empty() => (base, Some(suffix)),
        _ => (code, None),
    }
}

fn aggregate_stock(
    stock_root: &XmlElement,
    supplier: &SupplierConfig,
) -> BTreeMap<String, StockAggregate> {
    let mut by_article: BTreeMap<String, StockAggregate> = BTreeMap::new();

    for row in stock_root.children_named("stock") {
        let Some(code) = row.text_of("itemcode") else {
            tracing::warn!(supplier = %supplier.slug, "skipping stock row without itemcode");
            continue;
        };
        let (base, size) = split_vendor_code(code);

        let europe = parse_quantity(row.text_of("central_stock"))
            + parse_quantity(row.text_of("central_transit"));
        let moscow = parse_quantity(row.text_of("moscow_stock"));

        let agg = by_article.entry(base.to_owned()).or_default();
        agg.europe += europe;
        agg.moscow += moscow;
        if let Some(size) = size {
            *agg.sizes.entry(size.to_owned()).or_insert(0) += europe + moscow;
        }
    }

    by_article
}

fn normalize(
    item: &XmlElement,
    stock: &BTreeMap<String, StockAggregate>,
    supplier: &SupplierConfig,
) -> Option<CanonicalProduct> {
    let Some(local_id) = item.text_of("code") else {
        tracing::warn!(supplier = %supplier.slug, "skipping product without code");
        return None;
    };
    let Some(name) = item.text_of("name") else {
        tracing::warn!(supplier = %supplier.slug, local_id, "skipping product without name");
        return None;
    };
    let Some(id) = namespace_id(supplier.tag, local_id, supplier.id_width) else {
        tracing::warn!(supplier = %supplier.slug, local_id, "skipping product with non-numeric code");
        return None;
    };

    let article = item.text_of("itemcode").unwrap_or_default();
    let (base_article, _) = split_vendor_code(article);
    let agg = stock.get(base_article);

    // Absent stock entry means zero at every location, never a missing
    // warehouse list.
    let warehouse = vec![
        Warehouse {
            name: EUROPE.to_owned(),
            quantity: agg.map_or(0, |a| a.europe),
        },
        Warehouse {
            name: MOSCOW.to_owned(),
            quantity: agg.map_or(0, |a| a.moscow),
        },
    ];
    let sizes = agg
        .filter(|a| !a.sizes.is_empty())
        .map(|a| a.sizes.clone());

    Some(CanonicalProduct {
        id,
        category_id: item.text_of("category").unwrap_or_default().to_owned(),
        name: name.to_owned(),
        brand: item.text_of("brand").unwrap_or(NO_BRAND).to_owned(),
        article: base_article.to_owned(),
        description: item
            .text_of("longdescription")
            .unwrap_or(NO_DESCRIPTION)
            .to_owned(),
        material: item.text_of("material").unwrap_or(NO_MATERIAL).to_owned(),
        weight: item.text_of("weight").unwrap_or_default().to_owned(),
        price: price_or_zero(item.text_of("price")),
        discount_price: parse_decimal(item.text_of("discount_price")),
        warehouse,
        sizes,
        color_name: item
            .text_of("color")
            .unwrap_or_default()
            .to_lowercase(),
        image_set: item
            .child("images")
            .map(|images| {
                images
                    .children_named("image")
                    .map(|i| ImageRef {
                        name: i.text.trim().to_owned(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        prints: item
            .child("printingoptions")
            .map(|options| {
                options
                    .children_named("option")
                    .filter_map(|o| o.text_of("name"))
                    .map(|name| PrintOption {
                        name: name.to_owned(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        product_size: item.text_of("dimensions").unwrap_or_default().to_owned(),
        pack: None,
        site: supplier.slug.clone(),
    })
}

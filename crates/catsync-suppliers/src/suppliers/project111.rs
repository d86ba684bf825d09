//! Project111: JSON documents dropped under a fixed directory layout —
//! catalog files under `products/product/`, price/stock files under
//! `products/price/` — joined by vendor code. Feed access is gated on
//! IP-allowlist negotiation, and catalog images live on an authenticated
//! host, so they are downloaded and rehosted locally.

use std::collections::HashMap;

use serde::Deserialize;

use catsync_core::product::{NO_BRAND, NO_DESCRIPTION, NO_MATERIAL};
use catsync_core::{namespace_id, CanonicalProduct, ImageRef, PrintOption, SupplierConfig, Warehouse};

use crate::access::ensure_access;
use crate::error::FeedError;
use crate::images::ImageRehoster;
use crate::suppliers::{parse_decimal, price_or_zero, SupplierContext};

const EUROPE: &str = "Европа";
const MOSCOW: &str = "Москва";

#[derive(Debug, Deserialize)]
struct RawProduct {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    article: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    weight: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    prints: Vec<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    pack: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    article: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    discount_price: Option<String>,
    #[serde(default)]
    europe: i64,
    #[serde(default)]
    moscow: i64,
}

/// Runs the full project111 pipeline: access negotiation, catalog and price
/// document parsing, price/stock join, and image rehosting.
///
/// # Errors
///
/// Returns [`FeedError::AccessDenied`] when IP registration fails (before
/// any feed is fetched), or any fetch/parse error. All are fatal for this
/// supplier only.
pub async fn load(
    ctx: &SupplierContext<'_>,
    supplier: &SupplierConfig,
) -> Result<Vec<CanonicalProduct>, FeedError> {
    if let Some(access) = &supplier.access {
        ensure_access(ctx.fetcher.http_client(), &supplier.slug, access).await?;
    }

    let catalog_docs = ctx.fetcher.fetch(supplier, &supplier.catalog_feed).await?;
    let price_docs = match &supplier.stock_feed {
        Some(location) => ctx.fetcher.fetch(supplier, location).await?,
        None => Vec::new(),
    };
    let prices = parse_price_table(&price_docs, supplier)?;

    let rehoster = match &supplier.image_base_url {
        Some(base) => Some(ImageRehoster::new(
            ctx.fetcher.http_client().clone(),
            &ctx.app.image_dir,
            ctx.app.image_concurrency,
            base,
        )?),
        None => None,
    };

    let mut products = Vec::new();
    for doc in &catalog_docs {
        let raws: Vec<RawProduct> =
            serde_json::from_str(doc).map_err(|e| FeedError::Deserialize {
                context: format!("{} catalog document", supplier.slug),
                source: e,
            })?;

        for raw in raws {
            let Some((mut product, image_urls)) = normalize(raw, &prices, supplier) else {
                continue;
            };
            product.image_set = match &rehoster {
                Some(rehoster) => rehoster.rehost(image_urls).await,
                None => image_urls.into_iter().map(|name| ImageRef { name }).collect(),
            };
            products.push(product);
        }
    }
    Ok(products)
}

/// Joins all price documents into one vendor-code-keyed table. A vendor code
/// repeated across documents keeps the last entry, matching the feed's
/// own newest-file-wins convention.
fn parse_price_table(
    docs: &[String],
    supplier: &SupplierConfig,
) -> Result<HashMap<String, RawPrice>, FeedError> {
    let mut table = HashMap::new();
    for doc in docs {
        let rows: Vec<RawPrice> =
            serde_json::from_str(doc).map_err(|e| FeedError::Deserialize {
                context: format!("{} price document", supplier.slug),
                source: e,
            })?;
        for row in rows {
            table.insert(row.article.clone(), row);
        }
    }
    Ok(table)
}

fn normalize(
    raw: RawProduct,
    prices: &HashMap<String, RawPrice>,
    supplier: &SupplierConfig,
) -> Option<(CanonicalProduct, Vec<String>)> {
    let Some(local_id) = raw.id.as_deref().filter(|s| !s.is_empty()) else {
        tracing::warn!(supplier = %supplier.slug, "skipping record without id");
        return None;
    };
    let Some(name) = raw.name.as_deref().filter(|s| !s.is_empty()) else {
        tracing::warn!(supplier = %supplier.slug, local_id, "skipping record without name");
        return None;
    };
    let Some(id) = namespace_id(supplier.tag, local_id, supplier.id_width) else {
        tracing::warn!(supplier = %supplier.slug, local_id, "skipping record with non-numeric id");
        return None;
    };

    let article = raw.article.unwrap_or_default();
    let price_row = prices.get(&article);

    let warehouse = price_row.map_or_else(Vec::new, |row| {
        vec![
            Warehouse {
                name: EUROPE.to_owned(),
                quantity: row.europe.max(0),
            },
            Warehouse {
                name: MOSCOW.to_owned(),
                quantity: row.moscow.max(0),
            },
        ]
    });

    let product = CanonicalProduct {
        id,
        category_id: raw.category.unwrap_or_default(),
        name: name.to_owned(),
        brand: raw
            .brand
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_BRAND.to_owned()),
        article,
        description: raw
            .description
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_owned()),
        material: raw
            .material
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_MATERIAL.to_owned()),
        weight: raw.weight.unwrap_or_default(),
        price: price_or_zero(price_row.and_then(|r| r.price.as_deref())),
        discount_price: parse_decimal(price_row.and_then(|r| r.discount_price.as_deref())),
        warehouse,
        sizes: None,
        color_name: raw.color.unwrap_or_default().to_lowercase(),
        image_set: Vec::new(),
        prints: raw
            .prints
            .into_iter()
            .map(|name| PrintOption { name })
            .collect(),
        product_size: raw.size.unwrap_or_default(),
        pack: raw.pack,
        site: supplier.slug.clone(),
    };

    Some((product, raw.images))
}

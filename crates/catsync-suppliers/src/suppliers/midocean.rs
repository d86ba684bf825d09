//! Midocean: direct HTTP JSON export, one document with all products and
//! per-warehouse stock inline.

use serde::Deserialize;

use catsync_core::product::{NO_BRAND, NO_DESCRIPTION, NO_MATERIAL};
use catsync_core::{namespace_id, CanonicalProduct, ImageRef, PrintOption, SupplierConfig, Warehouse};

use crate::error::FeedError;
use crate::suppliers::{parse_decimal, price_or_zero};

#[derive(Debug, Deserialize)]
struct Export {
    #[serde(default)]
    products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
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
    price: Option<String>,
    #[serde(default)]
    discount_price: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    printing_techniques: Vec<String>,
    #[serde(default)]
    dimensions: Option<String>,
    #[serde(default)]
    pack: Option<serde_json::Value>,
    #[serde(default)]
    stock: Vec<RawStock>,
}

#[derive(Debug, Deserialize)]
struct RawStock {
    warehouse: String,
    #[serde(default)]
    quantity: i64,
}

/// Parses the midocean JSON export into canonical products.
///
/// # Errors
///
/// Returns [`FeedError::Deserialize`] when the document is not valid JSON of
/// the expected shape.
pub fn parse(document: &str, supplier: &SupplierConfig) -> Result<Vec<CanonicalProduct>, FeedError> {
    let export: Export =
        serde_json::from_str(document).map_err(|e| FeedError::Deserialize {
            context: format!("{} catalog export", supplier.slug),
            source: e,
        })?;

    let mut products = Vec::with_capacity(export.products.len());
    for raw in export.products {
        if let Some(product) = normalize(raw, supplier) {
            products.push(product);
        }
    }
    Ok(products)
}

fn normalize(raw: RawProduct, supplier: &SupplierConfig) -> Option<CanonicalProduct> {
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

    let warehouse = raw
        .stock
        .into_iter()
        .map(|s| Warehouse {
            name: s.warehouse,
            quantity: s.quantity.max(0),
        })
        .collect();

    Some(CanonicalProduct {
        id,
        category_id: raw.category_id.unwrap_or_default(),
        name: name.to_owned(),
        brand: raw.brand.filter(|s| !s.is_empty()).unwrap_or_else(|| NO_BRAND.to_owned()),
        article: raw.article.unwrap_or_default(),
        description: raw
            .description
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_owned()),
        material: raw
            .material
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_MATERIAL.to_owned()),
        weight: raw.weight.unwrap_or_default(),
        price: price_or_zero(raw.price.as_deref()),
        discount_price: parse_decimal(raw.discount_price.as_deref()),
        warehouse,
        sizes: None,
        color_name: raw.color.unwrap_or_default().to_lowercase(),
        image_set: raw.images.into_iter().map(|name| ImageRef { name }).collect(),
        prints: raw
            .printing_techniques
            .into_iter()
            .map(|name| PrintOption { name })
            .collect(),
        product_size: raw.dimensions.unwrap_or_default(),
        pack: raw.pack,
        site: supplier.slug.clone(),
    })
}

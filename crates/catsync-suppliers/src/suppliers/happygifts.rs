//! HappyGifts: two XML documents — catalog and a stock table keyed by
//! vendor code. Catalog images are relative paths that must be joined onto
//! the supplier's base URL.

use std::collections::HashMap;

use catsync_core::product::{NO_BRAND, NO_DESCRIPTION, NO_MATERIAL};
use catsync_core::{namespace_id, CanonicalProduct, ImageRef, PrintOption, SupplierConfig, Warehouse};

use crate::error::FeedError;
use crate::suppliers::{parse_decimal, parse_quantity, price_or_zero};
use crate::xml::{parse_document, XmlElement};

const MOSCOW: &str = "Москва";

/// Parses the happygifts catalog (and optional stock table) into canonical
/// products.
///
/// # Errors
///
/// Returns a [`FeedError`] when a document is not well-formed XML or the
/// catalog lacks its `items` envelope.
pub fn parse(
    catalog: &str,
    stock: Option<&str>,
    supplier: &SupplierConfig,
) -> Result<Vec<CanonicalProduct>, FeedError> {
    let catalog_root = parse_document(catalog)?;
    let items = catalog_root
        .child("items")
        .ok_or_else(|| FeedError::MalformedXml {
            reason: format!("{}: missing items envelope", supplier.slug),
        })?;

    let stock_by_article = match stock {
        Some(doc) => parse_stock_table(doc)?,
        None => HashMap::new(),
    };

    let mut products = Vec::new();
    for item in items.children_named("item") {
        if let Some(product) = normalize(item, &stock_by_article, supplier) {
            products.push(product);
        }
    }
    Ok(products)
}

/// Side-channel quantity table: `<row article="..." free="..."/>` keyed by
/// vendor code.
fn parse_stock_table(document: &str) -> Result<HashMap<String, i64>, FeedError> {
    let root = parse_document(document)?;
    Ok(root
        .children_named("row")
        .filter_map(|row| {
            let article = row.attr("article")?.to_owned();
            Some((article, parse_quantity(row.attr("free"))))
        })
        .collect())
}

fn normalize(
    item: &XmlElement,
    stock: &HashMap<String, i64>,
    supplier: &SupplierConfig,
) -> Option<CanonicalProduct> {
    let Some(local_id) = item.text_of("id") else {
        tracing::warn!(supplier = %supplier.slug, "skipping item without id");
        return None;
    };
    let Some(name) = item.text_of("name") else {
        tracing::warn!(supplier = %supplier.slug, local_id, "skipping item without name");
        return None;
    };
    let Some(id) = namespace_id(supplier.tag, local_id, supplier.id_width) else {
        tracing::warn!(supplier = %supplier.slug, local_id, "skipping item with non-numeric id");
        return None;
    };

    let article = item.text_of("article").unwrap_or_default().to_owned();
    // Missing stock entry means zero, never a negative or an error.
    let quantity = stock.get(&article).copied().unwrap_or(0);

    let image_base = supplier.image_base_url.as_deref().unwrap_or_default();
    let image_set = item
        .child("images")
        .map(|images| {
            images
                .children_named("image")
                .map(|image| ImageRef {
                    name: join_image_url(image_base, image.text.trim()),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(CanonicalProduct {
        id,
        category_id: item.text_of("group").unwrap_or_default().to_owned(),
        name: name.to_owned(),
        brand: item.text_of("brand").unwrap_or(NO_BRAND).to_owned(),
        article,
        description: item
            .text_of("content")
            .unwrap_or(NO_DESCRIPTION)
            .to_owned(),
        material: item.text_of("material").unwrap_or(NO_MATERIAL).to_owned(),
        weight: item.text_of("weight").unwrap_or_default().to_owned(),
        price: price_or_zero(item.text_of("price")),
        discount_price: parse_decimal(item.text_of("discountprice")),
        warehouse: vec![Warehouse {
            name: MOSCOW.to_owned(),
            quantity,
        }],
        sizes: None,
        color_name: item
            .text_of("color")
            .unwrap_or_default()
            .to_lowercase(),
        image_set,
        prints: item
            .child("applications")
            .map(|apps| {
                apps.children_named("application")
                    .map(|a| PrintOption {
                        name: a.text.trim().to_owned(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        product_size: item.text_of("size").unwrap_or_default().to_owned(),
        pack: item.text_of("pack").map(|p| serde_json::Value::String(p.to_owned())),
        site: supplier.slug.clone(),
    })
}

/// Joins a relative image path onto the supplier base URL; absolute URLs
/// pass through untouched.
fn join_image_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

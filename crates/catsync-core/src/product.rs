//! Canonical product model shared by all supplier pipelines.
//!
//! Every supplier-specific parser normalizes its raw feed into
//! [`CanonicalProduct`]; the reconciler and remote client never see
//! supplier-specific shapes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder used when a feed carries no brand.
pub const NO_BRAND: &str = "No brand";
/// Placeholder used when a feed carries no material.
pub const NO_MATERIAL: &str = "No material";
/// Placeholder used when a feed carries no description.
pub const NO_DESCRIPTION: &str = "No description";

/// A named stock location and its quantity. Quantities are clamped to be
/// non-negative at normalization time; a missing location means zero stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub name: String,
    pub quantity: i64,
}

/// A single product image: either a pass-through URL or a rehosted local
/// path, depending on the supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,
}

/// A branding/printing method offered for the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOption {
    pub name: String,
}

/// The normalized, supplier-agnostic product record.
///
/// `id` is globally unique across suppliers: a reserved leading tag digit
/// followed by the zero-padded supplier-local ID (see [`crate::ids`]). It is
/// stable across runs for the same (supplier, local id) pair — reconciliation
/// correctness depends on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub id: String,
    /// Supplier's category/section reference; opaque at ingestion time.
    pub category_id: String,
    pub name: String,
    pub brand: String,
    /// Vendor code as published by the supplier.
    pub article: String,
    pub description: String,
    pub material: String,
    pub weight: String,
    pub price: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    /// One entry per stock location, in feed order.
    pub warehouse: Vec<Warehouse>,
    /// Per-size quantities; `None` for sizeless products.
    pub sizes: Option<BTreeMap<String, i64>>,
    /// Lower-cased color label; empty when the supplier reports none.
    pub color_name: String,
    pub image_set: Vec<ImageRef>,
    pub prints: Vec<PrintOption>,
    /// Free-text physical dimensions.
    pub product_size: String,
    /// Supplier-specific packaging metadata, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack: Option<serde_json::Value>,
    /// Slug of the originating supplier.
    pub site: String,
}

impl CanonicalProduct {
    /// Total stock across all warehouse entries.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.warehouse.iter().map(|w| w.quantity).sum()
    }
}

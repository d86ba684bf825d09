//! Wire shapes of the remote catalog API.

use std::collections::BTreeMap;

use catsync_core::Warehouse;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `GET /products/all_ids/` response body.
#[derive(Debug, Deserialize)]
pub struct IdsResponse {
    pub product_ids: Vec<String>,
}

/// The subset of remote product fields the reconciler compares against.
///
/// The catalog may report stock either as a flat `quantity` or as a
/// `warehouse` breakdown depending on the product; [`RemoteProduct::quantity`]
/// folds both into one number.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    warehouse: Option<Vec<Warehouse>>,
}

impl RemoteProduct {
    /// Total stock as stored remotely.
    #[must_use]
    pub fn quantity(&self) -> i64 {
        if let Some(q) = self.quantity {
            return q;
        }
        self.warehouse
            .as_ref()
            .map_or(0, |ws| ws.iter().map(|w| w.quantity).sum())
    }
}

/// Partial-update body for `PUT /products/auto/uploader/{id}/`.
///
/// Only commercial and stock fields are patched; identity fields never change
/// after create. `price`, `discount_price`, and `sizes` always serialize,
/// as `null` when locally absent: a withdrawn discount or a product that
/// became sizeless must clear the remote value, or the diff re-detects the
/// same drift on every run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    pub price: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    pub sizes: Option<BTreeMap<String, i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<Vec<Warehouse>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_quantity_prefers_flat_field() {
        let p: RemoteProduct = serde_json::from_value(serde_json::json!({
            "id": "2000012345",
            "quantity": 5,
            "warehouse": [{"name": "Москва", "quantity": 99}],
        }))
        .unwrap();
        assert_eq!(p.quantity(), 5);
    }

    #[test]
    fn remote_quantity_sums_warehouses_when_no_flat_field() {
        let p: RemoteProduct = serde_json::from_value(serde_json::json!({
            "id": "2000012345",
            "warehouse": [
                {"name": "Европа", "quantity": 2},
                {"name": "Москва", "quantity": 6},
            ],
        }))
        .unwrap();
        assert_eq!(p.quantity(), 8);
    }

    #[test]
    fn remote_quantity_defaults_to_zero() {
        let p: RemoteProduct =
            serde_json::from_value(serde_json::json!({"id": "2000012345"})).unwrap();
        assert_eq!(p.quantity(), 0);
        assert!(p.price.is_none());
    }

    #[test]
    fn patch_nulls_absent_compared_fields() {
        let patch = ProductPatch {
            price: Some(Decimal::new(10050, 2)),
            quantity: Some(8),
            ..ProductPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json.get("quantity"), Some(&serde_json::json!(8)));
        assert_eq!(json.get("discount_price"), Some(&serde_json::Value::Null));
        assert_eq!(json.get("sizes"), Some(&serde_json::Value::Null));
        assert!(json.get("warehouse").is_none());
    }
}

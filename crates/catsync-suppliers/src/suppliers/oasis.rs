//! Oasis: YML-style XML catalog export.
//!
//! Offer IDs are composite (`"<category>-<local id>"`), and color, material,
//! and brand arrive as named `<param>` entries in a flat list — extraction
//! locates the parameter by its `name` attribute, never by position, and
//! falls back to an empty string when absent.

use catsync_core::product::{NO_BRAND, NO_DESCRIPTION, NO_MATERIAL};
use catsync_core::{namespace_id, CanonicalProduct, ImageRef, PrintOption, SupplierConfig, Warehouse};

use crate::error::FeedError;
use crate::suppliers::{parse_decimal, parse_quantity, price_or_zero};
use crate::xml::{parse_document, XmlElement};

/// Parses the oasis catalog XML into canonical products.
///
/// # Errors
///
/// Returns a [`FeedError`] when the document is not well-formed XML or lacks
/// the expected `shop/offers` envelope.
pub fn parse(document: &str, supplier: &SupplierConfig) -> Result<Vec<CanonicalProduct>, FeedError> {
    let root = parse_document(document)?;
    let offers = root
        .child("shop")
        .and_then(|shop| shop.child("offers"))
        .ok_or_else(|| FeedError::MalformedXml {
            reason: format!("{}: missing shop/offers envelope", supplier.slug),
        })?;

    let mut products = Vec::new();
    for offer in offers.children_named("offer") {
        if let Some(product) = normalize(offer, supplier) {
            products.push(product);
        }
    }
    Ok(products)
}

fn normalize(offer: &XmlElement, supplier: &SupplierConfig) -> Option<CanonicalProduct> {
    let Some(local_id) = offer.attr("id").filter(|s| !s.is_empty()) else {
        tracing::warn!(supplier = %supplier.slug, "skipping offer without id");
        return None;
    };
    let Some(name) = offer.text_of("name") else {
        tracing::warn!(supplier = %supplier.slug, local_id, "skipping offer without name");
        return None;
    };
    let Some(id) = namespace_id(supplier.tag, local_id, supplier.id_width) else {
        tracing::warn!(supplier = %supplier.slug, local_id, "skipping offer with non-numeric id");
        return None;
    };

    let brand = match param_value(offer, "Бренд") {
        "" => offer.text_of("vendor").unwrap_or(NO_BRAND).to_owned(),
        value => value.to_owned(),
    };
    let material = match param_value(offer, "Материал") {
        "" => NO_MATERIAL.to_owned(),
        value => value.to_owned(),
    };
    let color_name = param_value(offer, "Цвет").to_lowercase();
    let weight = param_value(offer, "Вес").to_owned();
    let product_size = param_value(offer, "Размер").to_owned();

    let warehouse = offer
        .child("outlets")
        .map(|outlets| {
            outlets
                .children_named("outlet")
                .filter_map(|outlet| {
                    let name = outlet.attr("name")?.to_owned();
                    Some(Warehouse {
                        name,
                        quantity: parse_quantity(outlet.attr("instock")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(CanonicalProduct {
        id,
        category_id: offer.text_of("categoryId").unwrap_or_default().to_owned(),
        name: name.to_owned(),
        brand,
        article: offer.text_of("vendorCode").unwrap_or_default().to_owned(),
        description: offer
            .text_of("description")
            .unwrap_or(NO_DESCRIPTION)
            .to_owned(),
        material,
        weight,
        price: price_or_zero(offer.text_of("price")),
        discount_price: parse_decimal(offer.text_of("oldprice")),
        warehouse,
        sizes: None,
        color_name,
        image_set: offer
            .children_named("picture")
            .map(|p| ImageRef {
                name: p.text.trim().to_owned(),
            })
            .collect(),
        prints: offer
            .children_named("print")
            .filter_map(|p| p.attr("name"))
            .map(|name| PrintOption {
                name: name.to_owned(),
            })
            .collect(),
        product_size,
        pack: None,
        site: supplier.slug.clone(),
    })
}

/// Named-parameter lookup: `<param name="Цвет">синий</param>`. Returns an
/// empty string when the parameter is absent.
fn param_value<'a>(offer: &'a XmlElement, name: &str) -> &'a str {
    offer
        .children_named("param")
        .find(|p| p.attr("name") == Some(name))
        .map_or("", |p| p.text.trim())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn supplier() -> SupplierConfig {
        SupplierConfig {
            slug: "oasis".to_owned(),
            kind: catsync_core::FeedKind::Oasis,
            tag: '3',
            id_width: 9,
            enabled: true,
            catalog_feed: catsync_core::FeedLocation::File {
                path: "catalog.xml".into(),
            },
            stock_feed: None,
            image_base_url: None,
            access: None,
            username_env: None,
            password_env: None,
            credentials: None,
        }
    }

    const CATALOG: &str = r#"<yml_catalog date="2024-02-01">
<shop><offers>
  <offer id="pens-12345" available="true">
    <name>Gel pen</name>
    <vendor>Lamark</vendor>
    <vendorCode>LK-77</vendorCode>
    <categoryId>540</categoryId>
    <price>45.90</price>
    <oldprice>52</oldprice>
    <description>Gel pen with soft grip</description>
    <picture>https://img.oasis.example/lk77-1.jpg</picture>
    <picture>https://img.oasis.example/lk77-2.jpg</picture>
    <param name="Цвет">Синий</param>
    <param name="Материал">пластик</param>
    <param name="Вес">0.02</param>
    <print name="Тампопечать"/>
    <outlets>
      <outlet name="Москва" instock="250"/>
      <outlet name="Европа" instock="0"/>
    </outlets>
  </offer>
  <offer id="mugs-777">
    <name>Mug</name>
    <price>100</price>
  </offer>
  <offer id="bad-id-abc">
    <name>Unsyncable</name>
  </offer>
  <offer id="pens-99999"/>
</offers></shop>
</yml_catalog>"#;

    #[test]
    fn strips_composite_id_prefix() {
        let products = parse(CATALOG, &supplier()).unwrap();
        assert_eq!(products[0].id, "3000012345");
        assert_eq!(products[1].id, "3000000777");
    }

    #[test]
    fn named_params_are_located_by_name() {
        let products = parse(CATALOG, &supplier()).unwrap();
        let p = &products[0];
        assert_eq!(p.color_name, "синий");
        assert_eq!(p.material, "пластик");
        assert_eq!(p.weight, "0.02");
    }

    #[test]
    fn absent_params_fall_back_to_placeholders() {
        let products = parse(CATALOG, &supplier()).unwrap();
        let mug = &products[1];
        assert_eq!(mug.color_name, "");
        assert_eq!(mug.material, NO_MATERIAL);
        assert_eq!(mug.brand, NO_BRAND);
        assert_eq!(mug.description, NO_DESCRIPTION);
    }

    #[test]
    fn prices_and_discount() {
        let products = parse(CATALOG, &supplier()).unwrap();
        assert_eq!(products[0].price, Some(Decimal::new(4590, 2)));
        assert_eq!(products[0].discount_price, Some(Decimal::from(52)));
        assert_eq!(products[1].price, Some(Decimal::from(100)));
        assert_eq!(products[1].discount_price, None);
    }

    #[test]
    fn outlets_become_warehouses() {
        let products = parse(CATALOG, &supplier()).unwrap();
        assert_eq!(
            products[0].warehouse,
            vec![
                Warehouse {
                    name: "Москва".to_owned(),
                    quantity: 250
                },
                Warehouse {
                    name: "Европа".to_owned(),
                    quantity: 0
                },
            ]
        );
        // No outlets element at all: zero stock, not an error.
        assert!(products[1].warehouse.is_empty());
        assert_eq!(products[1].total_quantity(), 0);
    }

    #[test]
    fn invalid_offers_are_skipped_without_aborting() {
        // Four offers: one with a non-numeric id, one with no name.
        let products = parse(CATALOG, &supplier()).unwrap();
        assert_eq!(products.len(), 2);
    }

    #[test]
    fn missing_envelope_is_malformed() {
        let err = parse("<yml_catalog><shop/></yml_catalog>", &supplier()).unwrap_err();
        assert!(matches!(err, FeedError::MalformedXml { .. }));
    }

    #[test]
    fn pictures_preserve_document_order() {
        let products = parse(CATALOG, &supplier()).unwrap();
        let names: Vec<_> = products[0].image_set.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "https://img.oasis.example/lk77-1.jpg",
                "https://img.oasis.example/lk77-2.jpg"
            ]
        );
    }
}

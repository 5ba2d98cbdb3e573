//! Price correction from SKU and product tier tables
//!
//! A row is priced from the first table that knows it:
//!
//! 1. `sku_prices`, keyed by exact `Variant SKU`;
//! 2. `products`, matched by a handle substring, then classified into a tier
//!    by keywords found in the row's own descriptor text.
//!
//! A match rewrites `Variant Price` with two decimals and clears
//! `Variant Compare At Price`. A sellable row neither table knows is
//! reported as a miss and left untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Outcome, Transform, contains_ci};
use crate::models::{GroupContext, Record, fields};

/// Price applied when any keyword occurs in the descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub name: String,
    pub keywords: Vec<String>,
    pub price: f64,
}

impl PriceTier {
    pub fn new<I, S>(name: impl Into<String>, keywords: I, price: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            price,
        }
    }
}

/// Tiered prices for one product line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPricing {
    pub name: String,
    /// Any of these substrings in the handle selects the product line
    pub handle_contains: Vec<String>,
    /// Priority order; first match wins
    pub tiers: Vec<PriceTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub sku_prices: BTreeMap<String, f64>,
    pub products: Vec<ProductPricing>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            sku_prices: BTreeMap::new(),
            products: vec![ProductPricing {
                name: "DE3 Omega Benefits".to_string(),
                handle_contains: vec!["de3".to_string()],
                tiers: vec![
                    PriceTier::new("3 month", ["270", "3 month", "3-month"], 181.95),
                    PriceTier::new("2 month", ["180", "2 month", "2-month"], 127.95),
                    PriceTier::new("1 month", ["90", "1 month", "1-month"], 64.95),
                ],
            }],
        }
    }
}

impl PricingConfig {
    pub fn is_empty(&self) -> bool {
        self.sku_prices.is_empty() && self.products.is_empty()
    }
}

/// Lookup result for one row
#[derive(Debug, Clone, PartialEq)]
pub enum PriceLookup {
    Found(f64),
    /// Key that had no entry
    Missing(String),
}

/// Rewrites prices from the configured tables
#[derive(Debug, Clone)]
pub struct PriceCorrection {
    config: PricingConfig,
}

impl PriceCorrection {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn lookup(&self, record: &Record, ctx: &GroupContext) -> PriceLookup {
        let sku = record.get(fields::VARIANT_SKU).trim();
        if let Some(price) = self.config.sku_prices.get(sku) {
            return PriceLookup::Found(*price);
        }

        let handle = if ctx.handle.is_empty() {
            record.handle()
        } else {
            ctx.handle.as_str()
        };
        let Some(product) = self.config.products.iter().find(|product| {
            product
                .handle_contains
                .iter()
                .any(|part| contains_ci(handle, part))
        }) else {
            let key = if sku.is_empty() { handle } else { sku };
            return PriceLookup::Missing(key.to_string());
        };

        let descriptor = [
            record.title(),
            record.get(fields::OPTION1_VALUE),
            sku,
            handle,
        ]
        .join(" ");
        product
            .tiers
            .iter()
            .find(|tier| tier.keywords.iter().any(|kw| contains_ci(&descriptor, kw)))
            .map(|tier| PriceLookup::Found(tier.price))
            .unwrap_or_else(|| PriceLookup::Missing(format!("{} ({})", handle, product.name)))
    }
}

impl Transform for PriceCorrection {
    fn name(&self) -> &'static str {
        "price"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[fields::VARIANT_PRICE, fields::VARIANT_COMPARE_AT_PRICE]
    }

    fn lookup_table(&self) -> &'static str {
        "pricing"
    }

    fn apply(&self, record: &mut Record, ctx: &GroupContext) -> Outcome {
        if self.config.is_empty() || !record.is_sellable() {
            return Outcome::Unchanged;
        }
        match self.lookup(record, ctx) {
            PriceLookup::Found(price) => {
                let mut changed = record.set(fields::VARIANT_PRICE, format!("{:.2}", price));
                changed |= record.set(fields::VARIANT_COMPARE_AT_PRICE, "");
                Outcome::from_changed(changed)
            }
            PriceLookup::Missing(key) => Outcome::Missed(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::test_support::{ctx, record};

    #[test]
    fn test_de3_three_month_tier() {
        let transform = PriceCorrection::new(PricingConfig::default());
        let mut row = record(&[
            (fields::HANDLE, "de3-omega-benefits"),
            (fields::TITLE, "DE3 Omega Benefits 270ct 3 Month Supply"),
            (fields::VARIANT_PRICE, "199.00"),
            (fields::VARIANT_COMPARE_AT_PRICE, "219.00"),
        ]);
        let ctx = ctx(&row);
        assert_eq!(transform.apply(&mut row, &ctx), Outcome::Changed);
        assert_eq!(row.get(fields::VARIANT_PRICE), "181.95");
        assert_eq!(row.get(fields::VARIANT_COMPARE_AT_PRICE), "");
        assert_eq!(transform.apply(&mut row, &ctx), Outcome::Unchanged);
    }

    #[test]
    fn test_first_matching_tier_wins() {
        let transform = PriceCorrection::new(PricingConfig::default());
        let mut row = record(&[
            (fields::HANDLE, "de3-omega"),
            (fields::TITLE, "DE3 Omega 270ct 1 Month"),
            (fields::VARIANT_SKU, "ECOC-DE3"),
            (fields::VARIANT_PRICE, "70.00"),
        ]);
        let ctx = ctx(&row);
        assert_eq!(transform.lookup(&row, &ctx), PriceLookup::Found(181.95));
        assert_eq!(transform.apply(&mut row, &ctx), Outcome::Changed);
        assert_eq!(row.get(fields::VARIANT_PRICE), "181.95");
    }

    #[test]
    fn test_variant_rows_use_option_value() {
        let transform = PriceCorrection::new(PricingConfig::default());
        let primary = record(&[(fields::HANDLE, "de3-omega"), (fields::TITLE, "DE3 Omega Benefits")]);
        let group = GroupContext::from_primary(&primary);
        let mut variant = record(&[
            (fields::HANDLE, "de3-omega"),
            (fields::OPTION1_VALUE, "2 Month Supply"),
            (fields::VARIANT_PRICE, "140"),
        ]);
        assert_eq!(transform.apply(&mut variant, &group), Outcome::Changed);
        assert_eq!(variant.get(fields::VARIANT_PRICE), "127.95");
    }

    #[test]
    fn test_sku_table_takes_precedence() {
        let mut config = PricingConfig::default();
        config.sku_prices.insert("ECOC-DE3-270".to_string(), 175.0);
        let transform = PriceCorrection::new(config);
        let mut row = record(&[
            (fields::HANDLE, "de3-omega"),
            (fields::TITLE, "DE3 Omega 270ct"),
            (fields::VARIANT_SKU, "ECOC-DE3-270"),
        ]);
        let ctx = ctx(&row);
        transform.apply(&mut row, &ctx);
        assert_eq!(row.get(fields::VARIANT_PRICE), "175.00");
    }

    #[test]
    fn test_unknown_rows_are_missed_and_untouched() {
        let transform = PriceCorrection::new(PricingConfig::default());
        let mut row = record(&[
            (fields::HANDLE, "eye-drops"),
            (fields::TITLE, "Eye Drops"),
            (fields::VARIANT_SKU, "ECOC-DROPS"),
            (fields::VARIANT_PRICE, "12.50"),
            (fields::VARIANT_COMPARE_AT_PRICE, "15.00"),
        ]);
        let ctx = ctx(&row);
        assert_eq!(
            transform.apply(&mut row, &ctx),
            Outcome::Missed("ECOC-DROPS".to_string())
        );
        assert_eq!(row.get(fields::VARIANT_PRICE), "12.50");
        assert_eq!(row.get(fields::VARIANT_COMPARE_AT_PRICE), "15.00");
    }

    #[test]
    fn test_non_sellable_rows_are_ignored() {
        let transform = PriceCorrection::new(PricingConfig::default());
        let mut row = record(&[(fields::HANDLE, "de3-omega"), (fields::TITLE, "DE3 Omega")]);
        let ctx = ctx(&row);
        assert_eq!(transform.apply(&mut row, &ctx), Outcome::Unchanged);
    }

    #[test]
    fn test_pricing_from_toml() {
        let config: PricingConfig = toml::from_str(
            r#"
            [sku_prices]
            "ECOC-1" = 9.5

            [[products]]
            name = "Heat Mask"
            handle_contains = ["mask"]
            tiers = [{ name = "single", keywords = ["single"], price = 24.0 }]
            "#,
        )
        .unwrap();
        assert_eq!(config.sku_prices.get("ECOC-1"), Some(&9.5));
        assert_eq!(config.products[0].tiers[0].price, 24.0);
    }
}

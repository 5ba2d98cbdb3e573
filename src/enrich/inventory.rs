//! Inventory defaults for sellable variants

use serde::{Deserialize, Serialize};

use super::{Outcome, Transform};
use crate::models::{GroupContext, Record, fields};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub quantity: u32,
    /// `continue` keeps selling when out of stock
    pub policy: String,
    pub fulfillment_service: String,
    pub tracker: String,
    pub requires_shipping: String,
    pub taxable: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            quantity: 100,
            policy: "continue".to_string(),
            fulfillment_service: "manual".to_string(),
            tracker: "shopify".to_string(),
            requires_shipping: "TRUE".to_string(),
            taxable: "TRUE".to_string(),
        }
    }
}

/// Sets stock quantity, policy and fulfillment on every sellable row
#[derive(Debug, Clone)]
pub struct InventoryDefaults {
    config: InventoryConfig,
}

impl InventoryDefaults {
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }
}

impl Transform for InventoryDefaults {
    fn name(&self) -> &'static str {
        "inventory"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[
            fields::VARIANT_INVENTORY_QTY,
            fields::VARIANT_INVENTORY_POLICY,
            fields::VARIANT_FULFILLMENT_SERVICE,
            fields::VARIANT_INVENTORY_TRACKER,
            fields::VARIANT_REQUIRES_SHIPPING,
            fields::VARIANT_TAXABLE,
        ]
    }

    fn apply(&self, record: &mut Record, _ctx: &GroupContext) -> Outcome {
        if !record.is_sellable() {
            return Outcome::Unchanged;
        }
        let config = &self.config;
        let mut changed = record.set(fields::VARIANT_INVENTORY_QTY, config.quantity.to_string());
        changed |= record.set(fields::VARIANT_INVENTORY_POLICY, config.policy.clone());
        changed |= record.set(fields::VARIANT_FULFILLMENT_SERVICE, config.fulfillment_service.clone());
        changed |= record.set(fields::VARIANT_INVENTORY_TRACKER, config.tracker.clone());
        changed |= record.set_if_empty(fields::VARIANT_REQUIRES_SHIPPING, config.requires_shipping.clone());
        changed |= record.set_if_empty(fields::VARIANT_TAXABLE, config.taxable.clone());
        Outcome::from_changed(changed)
    }
}

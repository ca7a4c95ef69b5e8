use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub current_stock: i64,
    pub avg_daily_usage: Decimal,
    /// Falls back to the category default when absent.
    #[serde(default)]
    pub lead_time_days: Option<Decimal>,
    /// Falls back to the category default when absent.
    #[serde(default)]
    pub safety_factor: Option<Decimal>,
    pub max_stock_level: i64,
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl InventoryItem {
    pub fn new(
        sku: impl Into<String>,
        current_stock: i64,
        avg_daily_usage: Decimal,
        max_stock_level: i64,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: String::new(),
            category: String::new(),
            current_stock,
            avg_daily_usage,
            lead_time_days: None,
            safety_factor: None,
            max_stock_level,
            unit_cost: None,
            supplier: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_lead_time_days(mut self, lead_time_days: Decimal) -> Self {
        self.lead_time_days = Some(lead_time_days);
        self
    }

    pub fn with_safety_factor(mut self, safety_factor: Decimal) -> Self {
        self.safety_factor = Some(safety_factor);
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.sku
        } else {
            &self.name
        }
    }
}

/// Alert tier, ordered from least to most urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Emergency,
}

impl Severity {
    pub fn requires_action(self) -> bool {
        self != Self::Ok
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEvaluation {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub current_stock: i64,
    pub avg_daily_usage: Decimal,
    pub lead_time_days: Decimal,
    pub safety_factor: Decimal,
    pub safety_stock: Decimal,
    pub reorder_point: Decimal,
    /// Only meaningful when `severity` requires action.
    pub recommended_order_qty: u64,
    pub severity: Severity,
    pub demand_spike: bool,
    pub days_until_stockout: Option<Decimal>,
    pub estimated_cost: Option<Decimal>,
    pub supplier: Option<String>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{InventoryItem, Severity};

    #[test]
    fn severity_orders_emergency_highest() {
        let mut tiers =
            vec![Severity::Warning, Severity::Emergency, Severity::Ok, Severity::Critical];
        tiers.sort();
        assert_eq!(
            tiers,
            vec![Severity::Ok, Severity::Warning, Severity::Critical, Severity::Emergency]
        );
        assert!(!Severity::Ok.requires_action());
        assert!(Severity::Warning.requires_action());
    }

    #[test]
    fn display_name_falls_back_to_sku() {
        let item = InventoryItem::new("ACC-NZL-04", 52, Decimal::from(4), 500);
        assert_eq!(item.display_name(), "ACC-NZL-04");
    }

    #[test]
    fn inventory_items_deserialize_with_optional_fields_missing() {
        let item: InventoryItem = toml::from_str(
            r#"
sku = "FIL-PLA-WHT"
current_stock = 12
avg_daily_usage = 8
max_stock_level = 200
"#,
        )
        .expect("minimal inventory item");

        assert_eq!(item.sku, "FIL-PLA-WHT");
        assert_eq!(item.avg_daily_usage, Decimal::from(8));
        assert!(item.lead_time_days.is_none());
        assert!(item.safety_factor.is_none());
    }
}

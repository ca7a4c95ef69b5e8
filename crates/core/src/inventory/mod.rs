//! Reorder-point evaluation for consumables (filament, resin, spare parts).
//!
//! Evaluations only recommend; placing a purchase order stays a human decision.

pub mod report;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::config::InventoryConfig;
use crate::domain::inventory::{InventoryItem, ReorderEvaluation, Severity};
use crate::errors::DomainError;
use crate::pricing::round_money;

pub trait ReorderPolicy: Send + Sync {
    fn evaluate(
        &self,
        item: &InventoryItem,
        demand_spike: bool,
    ) -> Result<ReorderEvaluation, DomainError>;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicReorderEvaluator {
    config: InventoryConfig,
}

impl DeterministicReorderEvaluator {
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }
}

impl ReorderPolicy for DeterministicReorderEvaluator {
    fn evaluate(
        &self,
        item: &InventoryItem,
        demand_spike: bool,
    ) -> Result<ReorderEvaluation, DomainError> {
        let inputs = self.resolve(item)?;
        let out_of_range = |what: &str| {
            DomainError::invalid_item(&item.sku, format!("{what} is out of range"))
        };

        let usage_over_lead = item
            .avg_daily_usage
            .checked_mul(inputs.lead_time_days)
            .ok_or_else(|| out_of_range("usage over lead time"))?;
        let safety_stock = usage_over_lead
            .checked_mul(inputs.safety_factor)
            .ok_or_else(|| out_of_range("safety stock"))?;
        let reorder_point = safety_stock
            .checked_add(usage_over_lead)
            .ok_or_else(|| out_of_range("reorder point"))?;

        let shortfall = Decimal::from(item.max_stock_level - item.current_stock)
            .checked_add(safety_stock)
            .ok_or_else(|| out_of_range("recommended order quantity"))?;
        let mut recommended = shortfall.max(Decimal::ZERO);
        if demand_spike {
            recommended = recommended
                .checked_mul(self.config.demand_spike_multiplier)
                .ok_or_else(|| out_of_range("recommended order quantity"))?;
        }
        let recommended_order_qty = recommended
            .ceil()
            .to_u64()
            .ok_or_else(|| out_of_range("recommended order quantity"))?;

        let severity = classify(item.current_stock, safety_stock, reorder_point);

        let days_until_stockout = if item.avg_daily_usage > Decimal::ZERO {
            let days = Decimal::from(item.current_stock)
                .checked_div(item.avg_daily_usage)
                .ok_or_else(|| out_of_range("days until stockout"))?;
            Some(days.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        } else {
            None
        };
        let estimated_cost = item
            .unit_cost
            .map(|cost| {
                cost.checked_mul(Decimal::from(recommended_order_qty))
                    .map(round_money)
                    .ok_or_else(|| out_of_range("estimated cost"))
            })
            .transpose()?;

        if severity == Severity::Emergency {
            warn!(
                event_name = "inventory.reorder.stockout",
                sku = %item.sku,
                recommended_order_qty,
                "item is out of stock"
            );
        } else {
            debug!(
                event_name = "inventory.reorder.evaluated",
                sku = %item.sku,
                severity = %severity,
                current_stock = item.current_stock,
                reorder_point = %reorder_point,
                demand_spike,
                "inventory item evaluated"
            );
        }

        Ok(ReorderEvaluation {
            sku: item.sku.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            current_stock: item.current_stock,
            avg_daily_usage: item.avg_daily_usage,
            lead_time_days: inputs.lead_time_days,
            safety_factor: inputs.safety_factor,
            safety_stock,
            reorder_point,
            recommended_order_qty,
            severity,
            demand_spike,
            days_until_stockout,
            estimated_cost,
            supplier: item.supplier.clone(),
        })
    }
}

struct ResolvedInputs {
    lead_time_days: Decimal,
    safety_factor: Decimal,
}

impl DeterministicReorderEvaluator {
    fn resolve(&self, item: &InventoryItem) -> Result<ResolvedInputs, DomainError> {
        if item.sku.trim().is_empty() {
            return Err(DomainError::invalid_item("<missing>", "sku must not be empty"));
        }
        if item.current_stock < 0 {
            return Err(DomainError::invalid_item(
                &item.sku,
                format!("current_stock must not be negative, got {}", item.current_stock),
            ));
        }
        if item.avg_daily_usage < Decimal::ZERO {
            return Err(DomainError::invalid_item(
                &item.sku,
                "avg_daily_usage must not be negative",
            ));
        }
        if item.max_stock_level <= 0 {
            return Err(DomainError::invalid_item(
                &item.sku,
                "max_stock_level must be greater than zero",
            ));
        }

        let defaults = self.config.category_defaults(&item.category);
        let missing = |field: &str| {
            DomainError::invalid_item(
                &item.sku,
                format!("{field} is not set and category `{}` has no default", item.category),
            )
        };

        let lead_time_days = item
            .lead_time_days
            .or(defaults.map(|defaults| defaults.lead_time_days))
            .ok_or_else(|| missing("lead_time_days"))?;
        if lead_time_days <= Decimal::ZERO {
            return Err(DomainError::invalid_item(
                &item.sku,
                "lead_time_days must be greater than zero",
            ));
        }

        let safety_factor = item
            .safety_factor
            .or(defaults.map(|defaults| defaults.safety_factor))
            .ok_or_else(|| missing("safety_factor"))?;
        if safety_factor <= Decimal::ZERO {
            return Err(DomainError::invalid_item(
                &item.sku,
                "safety_factor must be greater than zero",
            ));
        }

        Ok(ResolvedInputs { lead_time_days, safety_factor })
    }
}

/// First match wins, most urgent first.
pub fn classify(current_stock: i64, safety_stock: Decimal, reorder_point: Decimal) -> Severity {
    let stock = Decimal::from(current_stock);
    if current_stock == 0 {
        Severity::Emergency
    } else if stock <= safety_stock {
        Severity::Critical
    } else if stock <= reorder_point {
        Severity::Warning
    } else {
        Severity::Ok
    }
}

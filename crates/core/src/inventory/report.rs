use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::inventory::{InventoryItem, ReorderEvaluation, Severity};
use crate::errors::DomainError;

use super::ReorderPolicy;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub ok: usize,
    pub warning: usize,
    pub critical: usize,
    pub emergency: usize,
}

impl SeverityCounts {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Ok => self.ok += 1,
            Severity::Warning => self.warning += 1,
            Severity::Critical => self.critical += 1,
            Severity::Emergency => self.emergency += 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedItem {
    pub sku: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReport {
    pub generated_at: DateTime<Utc>,
    /// Most urgent first, then by sku.
    pub entries: Vec<ReorderEvaluation>,
    pub counts: SeverityCounts,
    pub total_reorder_cost: Decimal,
    pub rejected: Vec<RejectedItem>,
}

impl StockReport {
    pub fn build(
        mut entries: Vec<ReorderEvaluation>,
        rejected: Vec<RejectedItem>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        entries.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.sku.cmp(&b.sku)));

        let mut counts = SeverityCounts::default();
        let mut total_reorder_cost = Decimal::ZERO;
        for entry in &entries {
            counts.record(entry.severity);
            if entry.severity.requires_action() {
                // saturates at Decimal::MAX
                total_reorder_cost = total_reorder_cost
                    .saturating_add(entry.estimated_cost.unwrap_or(Decimal::ZERO));
            }
        }

        Self { generated_at, entries, counts, total_reorder_cost, rejected }
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ReorderEvaluation> {
        self.entries.iter().filter(move |entry| entry.severity == severity)
    }

    pub fn actionable(&self) -> impl Iterator<Item = &ReorderEvaluation> {
        self.entries.iter().filter(|entry| entry.severity.requires_action())
    }

    /// Keeps only critical and emergency entries.
    pub fn critical_only(mut self) -> Self {
        self.entries.retain(|entry| entry.severity >= Severity::Critical);
        self
    }
}

/// Evaluates every item independently; invalid rows are reported, not fatal.
pub fn evaluate_batch<P: ReorderPolicy + ?Sized>(
    policy: &P,
    items: &[InventoryItem],
    spiking_skus: &HashSet<String>,
    generated_at: DateTime<Utc>,
) -> StockReport {
    let mut entries = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();

    for item in items {
        match policy.evaluate(item, spiking_skus.contains(&item.sku)) {
            Ok(evaluation) => entries.push(evaluation),
            Err(error) => {
                rejected.push(RejectedItem { sku: item.sku.clone(), reason: error.to_string() })
            }
        }
    }

    let report = StockReport::build(entries, rejected, generated_at);
    info!(
        event_name = "inventory.report.built",
        items = items.len(),
        emergency = report.counts.emergency,
        critical = report.counts.critical,
        warning = report.counts.warning,
        rejected = report.rejected.len(),
        "stock report built"
    );
    report
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRow {
    pub sku: String,
    pub name: String,
    pub avg_daily_usage: Decimal,
    pub projected_usage: Decimal,
    pub current_stock: i64,
    pub days_left: Option<Decimal>,
    pub runs_out_within_horizon: bool,
}

/// Projected usage over `days`, highest daily usage first.
pub fn project_consumption(
    items: &[InventoryItem],
    days: u32,
) -> Result<Vec<ConsumptionRow>, DomainError> {
    let horizon = Decimal::from(days);
    let mut rows = items
        .iter()
        .map(|item| {
            let out_of_range = |what: &str| {
                DomainError::invalid_item(&item.sku, format!("{what} is out of range"))
            };
            let days_left = if item.avg_daily_usage > Decimal::ZERO {
                let left = Decimal::from(item.current_stock)
                    .checked_div(item.avg_daily_usage)
                    .ok_or_else(|| out_of_range("days left"))?;
                Some(left.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
            } else {
                None
            };
            let projected_usage = item
                .avg_daily_usage
                .checked_mul(horizon)
                .ok_or_else(|| out_of_range("projected usage"))?;
            Ok(ConsumptionRow {
                sku: item.sku.clone(),
                name: item.display_name().to_string(),
                avg_daily_usage: item.avg_daily_usage,
                projected_usage,
                current_stock: item.current_stock,
                runs_out_within_horizon: days_left.is_some_and(|left| left < horizon),
                days_left,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    rows.sort_by(|a, b| {
        b.avg_daily_usage.cmp(&a.avg_daily_usage).then_with(|| a.sku.cmp(&b.sku))
    });
    Ok(rows)
}

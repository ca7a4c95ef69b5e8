use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use printdesk_core::domain::inventory::Severity;
use printdesk_core::errors::ApplicationError;
use printdesk_core::inventory::report::{evaluate_batch, StockReport};
use printdesk_core::inventory::DeterministicReorderEvaluator;
use rust_decimal::{Decimal, RoundingStrategy};

use super::{load_config, money, CommandResult};
use crate::inventory_file;

#[derive(Debug, Clone, Args)]
pub struct StockArgs {
    #[arg(long, help = "TOML inventory snapshot with [[items]] tables")]
    pub inventory: PathBuf,
    #[arg(long, help = "Only evaluate items in this category")]
    pub category: Option<String>,
    #[arg(long, help = "Only list critical and emergency items")]
    pub critical_only: bool,
    #[arg(long = "spike", value_name = "SKU", help = "Treat this SKU as having a demand spike")]
    pub spikes: Vec<String>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

pub fn run(config_path: Option<PathBuf>, args: &StockArgs) -> CommandResult {
    match build_report(config_path, args) {
        Ok(report) if args.json => CommandResult::json("stock", &report),
        Ok(report) => CommandResult::rendered(render_report(&report)),
        Err(error) => CommandResult::from_application_error("stock", error),
    }
}

pub fn build_report(
    config_path: Option<PathBuf>,
    args: &StockArgs,
) -> Result<StockReport, ApplicationError> {
    let config = load_config(config_path)?;
    let items = inventory_file::load(&args.inventory)?;
    let items = inventory_file::filter_category(items, args.category.as_deref());

    let evaluator = DeterministicReorderEvaluator::new(config.inventory);
    let spikes = args.spikes.iter().map(|sku| sku.trim().to_string()).collect::<HashSet<_>>();
    let report = evaluate_batch(&evaluator, &items, &spikes, Utc::now());

    Ok(if args.critical_only { report.critical_only() } else { report })
}

pub fn render_report(report: &StockReport) -> String {
    let mut lines = vec![
        format!("Stock check {}", report.generated_at.format("%Y-%m-%d %H:%M UTC")),
        "=".repeat(40),
    ];

    for severity in [Severity::Emergency, Severity::Critical, Severity::Warning] {
        let entries = report.with_severity(severity).collect::<Vec<_>>();
        if entries.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{} ({})", severity.as_str().to_ascii_uppercase(), entries.len()));
        for entry in entries {
            let name = if entry.name.is_empty() { entry.sku.as_str() } else { entry.name.as_str() };
            let reorder_point = entry
                .reorder_point
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
                .normalize();
            let mut line = format!(
                "  {} {}: {} in stock, reorder point {}, order {}",
                entry.sku,
                name,
                entry.current_stock,
                reorder_point,
                entry.recommended_order_qty
            );
            if let Some(days) = entry.days_until_stockout {
                line.push_str(&format!(", ~{}d left", days.normalize()));
            }
            if let Some(cost) = entry.estimated_cost {
                line.push_str(&format!(", est. ${}", money(cost)));
            }
            if entry.demand_spike {
                line.push_str(" [spike]");
            }
            lines.push(line);
        }
    }

    let healthy = report.with_severity(Severity::Ok).count();
    if healthy > 0 {
        lines.push(String::new());
        lines.push(format!("OK: {healthy} item(s) above reorder point"));
    }

    if report.entries.is_empty() {
        lines.push(String::new());
        lines.push("No items to report.".to_string());
    }

    if report.total_reorder_cost > Decimal::ZERO {
        lines.push(String::new());
        lines.push(format!("Estimated reorder cost: ${}", money(report.total_reorder_cost)));
    }

    if !report.rejected.is_empty() {
        lines.push(String::new());
        lines.push(format!("Skipped {} invalid item(s):", report.rejected.len()));
        for rejected in &report.rejected {
            lines.push(format!("  ! {}: {}", rejected.sku, rejected.reason));
        }
    }

    lines.push(String::new());
    lines.push("Recommendations only; no orders were placed.".to_string());
    lines.join("\n")
}

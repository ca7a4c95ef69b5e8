use std::path::PathBuf;

use clap::Args;
use printdesk_core::inventory::report::{project_consumption, ConsumptionRow};
use serde::Serialize;

use super::CommandResult;
use crate::inventory_file;

#[derive(Debug, Clone, Args)]
pub struct ConsumptionArgs {
    #[arg(long, help = "TOML inventory snapshot with [[items]] tables")]
    pub inventory: PathBuf,
    #[arg(long, default_value_t = 7, help = "Projection horizon in days")]
    pub days: u32,
    #[arg(long, help = "Only include items in this category")]
    pub category: Option<String>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ConsumptionPayload<'a> {
    days: u32,
    rows: &'a [ConsumptionRow],
}

pub fn run(args: &ConsumptionArgs) -> CommandResult {
    if args.days == 0 {
        return CommandResult::failure(
            "consumption",
            "invalid_input",
            "--days must be at least 1",
            super::EXIT_INVALID_INPUT,
        );
    }

    let items = match inventory_file::load(&args.inventory) {
        Ok(items) => items,
        Err(error) => return CommandResult::from_application_error("consumption", error),
    };
    let items = inventory_file::filter_category(items, args.category.as_deref());
    let rows = match project_consumption(&items, args.days) {
        Ok(rows) => rows,
        Err(error) => return CommandResult::from_application_error("consumption", error.into()),
    };

    if args.json {
        let payload = ConsumptionPayload { days: args.days, rows: &rows };
        return CommandResult::json("consumption", &payload);
    }
    CommandResult::rendered(render_rows(&rows, args.days))
}

fn render_rows(rows: &[ConsumptionRow], days: u32) -> String {
    let mut lines = vec![format!("Consumption over the next {days} day(s)"), "=".repeat(40)];
    for row in rows {
        let days_left = row
            .days_left
            .map(|left| format!("{}d left", left.normalize()))
            .unwrap_or_else(|| "no usage".to_string());
        let marker = if row.runs_out_within_horizon { "  ! runs out" } else { "" };
        lines.push(format!(
            "  {:<14} {:>8}/day  {:>9} projected  {:>6} in stock  {}{}",
            row.sku,
            row.avg_daily_usage.normalize(),
            row.projected_usage.normalize(),
            row.current_stock,
            days_left,
            marker
        ));
    }
    lines.join("\n")
}

use std::path::PathBuf;

use clap::Args;
use printdesk_core::domain::material::{Material, QualityTier, Urgency, UseCase};
use printdesk_core::domain::quote::{
    BulkDiscount, Dimensions, PartMetrics, PricingEscalation, QuoteOutcome, QuoteRequest,
    QuoteResult,
};
use printdesk_core::errors::ApplicationError;
use printdesk_core::pricing::{DeterministicPricingEngine, PricingEngine};
use rust_decimal::Decimal;

use super::{load_config, money, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "Material: PLA, ABS, PETG, TPU, Nylon, Resin")]
    pub material: Material,
    #[arg(long, help = "Bounding box in LxWxH millimetres, e.g. 80x60x40")]
    pub dimensions: Option<Dimensions>,
    #[arg(long = "weight", help = "Part weight in grams, if known")]
    pub weight_grams: Option<Decimal>,
    #[arg(long = "hours", help = "Print time in hours, if known")]
    pub print_hours: Option<Decimal>,
    #[arg(long, default_value = "standard", help = "draft | standard | fine | ultra-fine")]
    pub quality: QualityTier,
    #[arg(long, default_value_t = 1, help = "Number of copies")]
    pub quantity: u32,
    #[arg(long, default_value = "standard", help = "standard | rush | same-day")]
    pub urgency: Urgency,
    #[arg(long = "use", help = "Intended use, for material suitability advice")]
    pub intended_use: Option<UseCase>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

impl QuoteArgs {
    pub fn request(&self) -> QuoteRequest {
        QuoteRequest {
            material: self.material,
            metrics: PartMetrics {
                dimensions: self.dimensions,
                weight_grams: self.weight_grams,
                print_hours: self.print_hours,
            },
            quantity: self.quantity,
            quality: self.quality,
            urgency: self.urgency,
            intended_use: self.intended_use,
        }
    }
}

pub fn run(config_path: Option<PathBuf>, args: &QuoteArgs) -> CommandResult {
    match compute(config_path, args) {
        Ok(outcome) if args.json => CommandResult::json("quote", &outcome),
        Ok(QuoteOutcome::Priced(result)) => CommandResult::rendered(render_quote(&result)),
        Ok(QuoteOutcome::RequiresHumanPricing(escalation)) => {
            CommandResult::rendered(render_escalation(&escalation))
        }
        Err(error) => CommandResult::from_application_error("quote", error),
    }
}

fn compute(
    config_path: Option<PathBuf>,
    args: &QuoteArgs,
) -> Result<QuoteOutcome, ApplicationError> {
    let config = load_config(config_path)?;
    let engine = DeterministicPricingEngine::new(config.pricing);
    Ok(engine.compute_quote(&args.request())?)
}

pub fn render_quote(quote: &QuoteResult) -> String {
    let dimensions = quote.dimensions.map(|d| d.to_string()).unwrap_or_else(|| "N/A".to_string());
    let mut lines = vec![
        format!("Quote #{}", quote.id),
        "=".repeat(40),
        format!("Material: {} | Quality: {}", quote.material, quote.quality),
        format!("Dimensions: {} | Weight: {}g", dimensions, quote.weight_grams.normalize()),
        format!("Print time: {}h | Quantity: {}", quote.print_hours.normalize(), quote.quantity),
        String::new(),
        format!("  Material cost:    ${:>9}", money(quote.material_cost)),
        format!("  Machine time:     ${:>9}", money(quote.machine_cost)),
        format!("  Setup & finish:   ${:>9}", money(quote.labor_cost)),
    ];

    if quote.quantity > 1 {
        lines.push(format!("  x {} units:{:>7}${:>9}", quote.quantity, "", money(quote.subtotal)));
    }
    if let BulkDiscount::Rate(rate) = quote.bulk_discount {
        lines.push(format!(
            "  Bulk discount ({}%): -${}",
            (rate * Decimal::ONE_HUNDRED).normalize(),
            money(quote.discount_amount)
        ));
    }
    if quote.urgency_surcharge > Decimal::ZERO {
        lines.push(format!(
            "  {} surcharge: +${}",
            capitalize(quote.urgency.as_str()),
            money(quote.urgency_surcharge)
        ));
    }

    lines.extend([
        format!("  {}", "-".repeat(30)),
        format!("  TOTAL:            ${:>9}", money(quote.total)),
        String::new(),
        format!("  Turnaround: {}", quote.turnaround),
        format!("  Valid until: {}", quote.valid_until.format("%Y-%m-%d")),
    ]);

    if !quote.warnings.is_empty() {
        lines.push(String::new());
        for warning in &quote.warnings {
            lines.push(format!("  ! {}", warning.message));
        }
    }

    lines.join("\n")
}

pub fn render_escalation(escalation: &PricingEscalation) -> String {
    let mut lines = vec![
        format!("Quote #{} needs custom pricing", escalation.id),
        "=".repeat(40),
        format!(
            "Material: {} | Quality: {} | Urgency: {}",
            escalation.material, escalation.quality, escalation.urgency
        ),
        format!(
            "Quantity: {} (custom pricing from {} units)",
            escalation.quantity, escalation.threshold
        ),
        String::new(),
        format!("  {}", escalation.reason),
    ];
    for warning in &escalation.warnings {
        lines.push(format!("  ! {}", warning.message));
    }
    lines.join("\n")
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

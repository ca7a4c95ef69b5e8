use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::material::{Material, QualityTier, Urgency, UseCase};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounding box of a part (or of a printer's build envelope), in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_mm: Decimal,
    pub width_mm: Decimal,
    pub height_mm: Decimal,
}

impl Dimensions {
    pub fn new(length_mm: Decimal, width_mm: Decimal, height_mm: Decimal) -> Self {
        Self { length_mm, width_mm, height_mm }
    }

    pub fn from_mm(length_mm: u32, width_mm: u32, height_mm: u32) -> Self {
        Self::new(Decimal::from(length_mm), Decimal::from(width_mm), Decimal::from(height_mm))
    }

    pub fn is_positive(&self) -> bool {
        self.axes().iter().all(|axis| *axis > Decimal::ZERO)
    }

    /// `None` when the box is too large to represent.
    pub fn volume_cm3(&self) -> Option<Decimal> {
        let cubic_mm = self.length_mm.checked_mul(self.width_mm)?.checked_mul(self.height_mm)?;
        cubic_mm.checked_div(Decimal::ONE_THOUSAND)
    }

    /// True when the part fits the envelope in at least one axis-aligned orientation.
    pub fn fits_within(&self, envelope: &Dimensions) -> bool {
        let mut part = self.axes();
        let mut bounds = envelope.axes();
        part.sort();
        bounds.sort();
        part.iter().zip(bounds.iter()).all(|(part, bound)| part <= bound)
    }

    fn axes(&self) -> [Decimal; 3] {
        [self.length_mm, self.width_mm, self.height_mm]
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}mm",
            self.length_mm.normalize(),
            self.width_mm.normalize(),
            self.height_mm.normalize()
        )
    }
}

impl FromStr for Dimensions {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let cleaned = value.trim().to_ascii_lowercase().replace("mm", "");
        let parts = cleaned.split('x').map(str::trim).collect::<Vec<_>>();
        if parts.len() != 3 {
            return Err(DomainError::InvalidQuoteRequest(format!(
                "dimensions must be in LxWxH format, got `{value}`"
            )));
        }

        let mut axes = [Decimal::ZERO; 3];
        for (slot, raw) in axes.iter_mut().zip(parts) {
            *slot = raw.parse::<Decimal>().map_err(|_| {
                DomainError::InvalidQuoteRequest(format!("dimension `{raw}` is not a number"))
            })?;
        }

        Ok(Self::new(axes[0], axes[1], axes[2]))
    }
}

/// Physical inputs for a part. Measured weight and time win over an estimate from
/// dimensions; dimensions alone are resolved through a `PrintEstimator`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartMetrics {
    pub dimensions: Option<Dimensions>,
    pub weight_grams: Option<Decimal>,
    pub print_hours: Option<Decimal>,
}

impl PartMetrics {
    pub fn measured(weight_grams: Decimal, print_hours: Decimal) -> Self {
        Self { dimensions: None, weight_grams: Some(weight_grams), print_hours: Some(print_hours) }
    }

    pub fn from_dimensions(dimensions: Dimensions) -> Self {
        Self { dimensions: Some(dimensions), weight_grams: None, print_hours: None }
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub material: Material,
    pub metrics: PartMetrics,
    pub quantity: u32,
    #[serde(default)]
    pub quality: QualityTier,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub intended_use: Option<UseCase>,
}

impl QuoteRequest {
    pub fn new(material: Material, metrics: PartMetrics) -> Self {
        Self {
            material,
            metrics,
            quantity: 1,
            quality: QualityTier::Standard,
            urgency: Urgency::Standard,
            intended_use: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_intended_use(mut self, intended_use: UseCase) -> Self {
        self.intended_use = Some(intended_use);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    BuildVolumeExceeded,
    MaterialUnsuitable,
    MinimumOrderApplied,
    EstimatedMetrics,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteWarning {
    pub code: WarningCode,
    pub message: String,
}

impl QuoteWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rate", rename_all = "snake_case")]
pub enum BulkDiscount {
    None,
    Rate(Decimal),
}

impl BulkDiscount {
    pub fn rate(&self) -> Decimal {
        match self {
            Self::None => Decimal::ZERO,
            Self::Rate(rate) => *rate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub id: QuoteId,
    pub material: Material,
    pub quality: QualityTier,
    pub urgency: Urgency,
    pub quantity: u32,
    pub dimensions: Option<Dimensions>,
    pub weight_grams: Decimal,
    pub print_hours: Decimal,
    pub material_cost: Decimal,
    pub machine_cost: Decimal,
    pub labor_cost: Decimal,
    pub subtotal: Decimal,
    pub bulk_discount: BulkDiscount,
    pub discount_amount: Decimal,
    pub urgency_modifier: Decimal,
    pub urgency_surcharge: Decimal,
    pub total: Decimal,
    pub minimum_applied: bool,
    pub turnaround: String,
    pub generated_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub warnings: Vec<QuoteWarning>,
    pub trace: Vec<PricingTraceStep>,
}

impl QuoteResult {
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|warning| warning.code == code)
    }
}

/// Quantity is outside automatic pricing; a person must set the price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingEscalation {
    pub id: QuoteId,
    pub material: Material,
    pub quality: QualityTier,
    pub urgency: Urgency,
    pub quantity: u32,
    pub threshold: u32,
    pub reason: String,
    pub generated_at: DateTime<Utc>,
    pub warnings: Vec<QuoteWarning>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuoteOutcome {
    Priced(QuoteResult),
    RequiresHumanPricing(PricingEscalation),
}

impl QuoteOutcome {
    pub fn priced(&self) -> Option<&QuoteResult> {
        match self {
            Self::Priced(result) => Some(result),
            Self::RequiresHumanPricing(_) => None,
        }
    }

    pub fn escalation(&self) -> Option<&PricingEscalation> {
        match self {
            Self::Priced(_) => None,
            Self::RequiresHumanPricing(escalation) => Some(escalation),
        }
    }

    pub fn id(&self) -> &QuoteId {
        match self {
            Self::Priced(result) => &result.id,
            Self::RequiresHumanPricing(escalation) => &escalation.id,
        }
    }
}

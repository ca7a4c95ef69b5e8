use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::MaterialRate;
use crate::domain::material::Material;
use crate::domain::quote::Dimensions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintEstimate {
    pub weight_grams: Decimal,
    /// Standard-quality machine time; the quality modifier is applied by the pricer.
    pub print_hours: Decimal,
}

/// Turns a bounding box into a weight/time pair. Slicing proper happens upstream;
/// implementations only need to be deterministic. `None` means the part is too large
/// to estimate without overflowing.
pub trait PrintEstimator: Send + Sync {
    fn estimate(
        &self,
        material: Material,
        rate: &MaterialRate,
        dimensions: &Dimensions,
    ) -> Option<PrintEstimate>;

    /// Standard-quality machine time for a part of the given weight.
    fn hours_for_weight(&self, weight_grams: Decimal) -> Option<Decimal>;
}

/// Bounding-box volume at a fixed infill, scaled by material density.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DensityEstimator {
    pub infill: Decimal,
    pub grams_per_hour: Decimal,
    pub minimum_grams: Decimal,
    pub minimum_hours: Decimal,
}

impl Default for DensityEstimator {
    fn default() -> Self {
        Self {
            infill: Decimal::new(20, 2),
            grams_per_hour: Decimal::from(15),
            minimum_grams: Decimal::new(1, 1),
            minimum_hours: Decimal::new(5, 1),
        }
    }
}

impl PrintEstimator for DensityEstimator {
    fn estimate(
        &self,
        _material: Material,
        rate: &MaterialRate,
        dimensions: &Dimensions,
    ) -> Option<PrintEstimate> {
        let grams = dimensions
            .volume_cm3()?
            .checked_mul(self.infill)?
            .checked_mul(rate.density_g_cm3)?;
        let weight = round_tenth(grams).max(self.minimum_grams);
        let hours = self.hours_for_weight(weight)?;

        Some(PrintEstimate { weight_grams: weight, print_hours: hours })
    }

    fn hours_for_weight(&self, weight_grams: Decimal) -> Option<Decimal> {
        let hours = weight_grams.checked_div(self.grams_per_hour)?;
        Some(round_tenth(hours.max(self.minimum_hours)))
    }
}

fn round_tenth(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

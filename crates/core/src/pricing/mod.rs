//! Deterministic quote engine for made-to-order prints.
//!
//! Per-unit line items are rounded to cents first so the itemized quote always adds up;
//! the bulk discount is taken off the subtotal before the urgency modifier is applied.

pub mod advisories;
pub mod estimate;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};

use crate::config::PricingConfig;
use crate::domain::quote::{
    BulkDiscount, PricingEscalation, PricingTraceStep, QuoteId, QuoteOutcome, QuoteRequest,
    QuoteResult, QuoteWarning, WarningCode,
};
use crate::errors::DomainError;

use self::advisories::collect_advisories;
use self::estimate::{DensityEstimator, PrintEstimator};

pub trait PricingEngine: Send + Sync {
    fn compute_quote_at(
        &self,
        request: &QuoteRequest,
        now: DateTime<Utc>,
    ) -> Result<QuoteOutcome, DomainError>;

    fn compute_quote(&self, request: &QuoteRequest) -> Result<QuoteOutcome, DomainError> {
        self.compute_quote_at(request, Utc::now())
    }
}

pub struct DeterministicPricingEngine<E = DensityEstimator> {
    config: PricingConfig,
    estimator: E,
}

impl DeterministicPricingEngine<DensityEstimator> {
    pub fn new(config: PricingConfig) -> Self {
        Self::with_estimator(config, DensityEstimator::default())
    }
}

impl Default for DeterministicPricingEngine<DensityEstimator> {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

impl<E> DeterministicPricingEngine<E> {
    pub fn with_estimator(config: PricingConfig, estimator: E) -> Self {
        Self { config, estimator }
    }
}

impl<E: PrintEstimator> PricingEngine for DeterministicPricingEngine<E> {
    fn compute_quote_at(
        &self,
        request: &QuoteRequest,
        now: DateTime<Utc>,
    ) -> Result<QuoteOutcome, DomainError> {
        let resolved = self.resolve(request)?;
        let mut warnings = resolved.warnings;
        warnings.extend(collect_advisories(&self.config, request));

        let id = quote_id(request, resolved.weight_grams, resolved.print_hours, now);

        if self.config.requires_custom_pricing(request.quantity) {
            info!(
                event_name = "pricing.quote.escalated",
                quote_id = %id,
                material = %request.material,
                quantity = request.quantity,
                threshold = self.config.custom_pricing_min_quantity,
                "quote requires human pricing"
            );
            return Ok(QuoteOutcome::RequiresHumanPricing(PricingEscalation {
                id,
                material: request.material,
                quality: request.quality,
                urgency: request.urgency,
                quantity: request.quantity,
                threshold: self.config.custom_pricing_min_quantity,
                reason: format!(
                    "orders of {} or more units need custom pricing from the sales team",
                    self.config.custom_pricing_min_quantity
                ),
                generated_at: now,
                warnings,
            }));
        }

        let mut trace = Vec::new();
        let quantity = Decimal::from(request.quantity);

        let material_cost = round_money(checked(
            resolved.weight_grams.checked_mul(resolved.cost_per_gram),
            "material cost",
        )?);
        trace.push(step(
            "material",
            format!("{}g x {}/g", resolved.weight_grams, resolved.cost_per_gram),
            material_cost,
        ));

        let machine_cost = round_money(checked(
            resolved
                .print_hours
                .checked_mul(resolved.machine_rate)
                .and_then(|cost| cost.checked_mul(resolved.quality_modifier)),
            "machine cost",
        )?);
        trace.push(step(
            "machine",
            format!(
                "{}h x {}/h x {} ({})",
                resolved.print_hours,
                resolved.machine_rate,
                resolved.quality_modifier,
                request.quality
            ),
            machine_cost,
        ));

        let labor_cost = round_money(self.config.labor_per_part);
        trace.push(step("labor", "setup and finishing per part".to_string(), labor_cost));

        let subtotal = checked(
            material_cost
                .checked_add(machine_cost)
                .and_then(|unit| unit.checked_add(labor_cost))
                .and_then(|unit| unit.checked_mul(quantity)),
            "subtotal",
        )?;
        trace.push(step(
            "subtotal",
            format!("(material + machine + labor) x {}", request.quantity),
            subtotal,
        ));

        let bulk_discount = self.config.bulk_discount_for(request.quantity);
        let discount_amount =
            round_money(checked(subtotal.checked_mul(bulk_discount.rate()), "bulk discount")?);
        if let BulkDiscount::Rate(rate) = bulk_discount {
            let percent = (rate * Decimal::ONE_HUNDRED).normalize();
            trace.push(step(
                "bulk_discount",
                format!("{percent}% off {} units", request.quantity),
                -discount_amount,
            ));
        }
        let discounted = subtotal - discount_amount;

        let urgency_modifier = self.config.urgency_modifier(request.urgency).ok_or_else(|| {
            DomainError::InvariantViolation(format!(
                "no urgency modifier configured for {}",
                request.urgency
            ))
        })?;
        let urgent_total =
            round_money(checked(discounted.checked_mul(urgency_modifier), "urgent total")?);
        let urgency_surcharge = urgent_total - discounted;
        if urgency_surcharge != Decimal::ZERO {
            trace.push(step(
                "urgency",
                format!("{} x {}", request.urgency, urgency_modifier),
                urgency_surcharge,
            ));
        }

        let minimum_order = round_money(self.config.minimum_order);
        let minimum_applied = urgent_total < minimum_order;
        let total = if minimum_applied {
            warnings.push(QuoteWarning::new(
                WarningCode::MinimumOrderApplied,
                format!(
                    "computed total {urgent_total} raised to the minimum order of {minimum_order}"
                ),
            ));
            trace.push(step(
                "minimum_order",
                format!("raised from {urgent_total}"),
                minimum_order - urgent_total,
            ));
            minimum_order
        } else {
            urgent_total
        };
        trace.push(step("total", "final price".to_string(), total));

        let result = QuoteResult {
            id,
            material: request.material,
            quality: request.quality,
            urgency: request.urgency,
            quantity: request.quantity,
            dimensions: request.metrics.dimensions,
            weight_grams: resolved.weight_grams,
            print_hours: resolved.print_hours,
            material_cost,
            machine_cost,
            labor_cost,
            subtotal,
            bulk_discount,
            discount_amount,
            urgency_modifier,
            urgency_surcharge,
            total,
            minimum_applied,
            turnaround: self.config.turnaround_for(request.urgency).to_string(),
            generated_at: now,
            valid_until: now + Duration::days(i64::from(self.config.validity_days)),
            warnings,
            trace,
        };

        info!(
            event_name = "pricing.quote.priced",
            quote_id = %result.id,
            material = %result.material,
            quantity = result.quantity,
            total = %result.total,
            warnings = result.warnings.len(),
            "quote priced"
        );

        Ok(QuoteOutcome::Priced(result))
    }
}

struct ResolvedRequest {
    weight_grams: Decimal,
    print_hours: Decimal,
    cost_per_gram: Decimal,
    machine_rate: Decimal,
    quality_modifier: Decimal,
    warnings: Vec<QuoteWarning>,
}

impl<E: PrintEstimator> DeterministicPricingEngine<E> {
    fn resolve(&self, request: &QuoteRequest) -> Result<ResolvedRequest, DomainError> {
        if request.quantity < 1 {
            return Err(DomainError::InvalidQuoteRequest(
                "quantity must be at least 1".to_string(),
            ));
        }

        let rate = self.config.material_rate(request.material).ok_or_else(|| {
            DomainError::InvalidQuoteRequest(format!(
                "material {} has no configured rate",
                request.material
            ))
        })?;

        let quality_modifier = self.config.quality_modifier(request.quality).ok_or_else(|| {
            DomainError::InvariantViolation(format!(
                "no quality modifier configured for {}",
                request.quality
            ))
        })?;

        let metrics = &request.metrics;
        if let Some(dimensions) = &metrics.dimensions {
            if !dimensions.is_positive() {
                return Err(DomainError::InvalidQuoteRequest(format!(
                    "every dimension must be greater than zero, got {dimensions}"
                )));
            }
        }

        let mut warnings = Vec::new();
        let (weight_grams, print_hours) = match (metrics.weight_grams, metrics.print_hours) {
            (Some(weight), Some(hours)) => (weight, hours),
            (weight, hours) => {
                let Some(dimensions) = &metrics.dimensions else {
                    return Err(DomainError::InvalidQuoteRequest(
                        "provide dimensions or both weight_grams and print_hours".to_string(),
                    ));
                };
                let weight = match weight {
                    Some(weight) => weight,
                    None => {
                        self.estimator
                            .estimate(request.material, rate, dimensions)
                            .ok_or_else(|| too_large(&format!("a {dimensions} part")))?
                            .weight_grams
                    }
                };
                let hours = match hours {
                    Some(hours) => hours,
                    None => self
                        .estimator
                        .hours_for_weight(weight)
                        .ok_or_else(|| too_large(&format!("a {weight}g part")))?,
                };
                debug!(
                    event_name = "pricing.quote.estimated",
                    material = %request.material,
                    dimensions = %dimensions,
                    weight_grams = %weight,
                    print_hours = %hours,
                    "resolved part metrics from dimensions"
                );
                warnings.push(QuoteWarning::new(
                    WarningCode::EstimatedMetrics,
                    format!(
                        "weight and print time estimated from {dimensions}; \
                         the final price may change after slicing"
                    ),
                ));
                (weight, hours)
            }
        };

        if weight_grams <= Decimal::ZERO {
            return Err(DomainError::InvalidQuoteRequest(
                "weight_grams must be greater than zero".to_string(),
            ));
        }
        if print_hours <= Decimal::ZERO {
            return Err(DomainError::InvalidQuoteRequest(
                "print_hours must be greater than zero".to_string(),
            ));
        }

        Ok(ResolvedRequest {
            weight_grams,
            print_hours,
            cost_per_gram: rate.cost_per_gram,
            machine_rate: rate.machine_rate,
            quality_modifier,
            warnings,
        })
    }
}

/// Round half away from zero to cents; every amount priced here is non-negative.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn too_large(what: &str) -> DomainError {
    DomainError::InvalidQuoteRequest(format!("{what} is too large to price"))
}

fn checked(amount: Option<Decimal>, what: &str) -> Result<Decimal, DomainError> {
    amount.ok_or_else(|| too_large(what))
}

fn step(stage: &str, detail: String, amount: Decimal) -> PricingTraceStep {
    PricingTraceStep { stage: stage.to_string(), detail, amount }
}

fn quote_id(
    request: &QuoteRequest,
    weight_grams: Decimal,
    print_hours: Decimal,
    now: DateTime<Utc>,
) -> QuoteId {
    let date = now.format("%Y%m%d").to_string();
    let dimensions =
        request.metrics.dimensions.map(|dimensions| dimensions.to_string()).unwrap_or_default();
    let canonical = format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        request.material,
        weight_grams.normalize(),
        print_hours.normalize(),
        dimensions,
        request.quantity,
        request.quality,
        request.urgency,
        date
    );
    let digest = blake3::hash(canonical.as_bytes()).to_hex();
    QuoteId(format!("QT-{date}-{}", &digest.as_str()[..6]))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::estimate::{PrintEstimate, PrintEstimator};
    use super::{round_money, DeterministicPricingEngine, PricingEngine};
    use crate::config::{MaterialRate, PricingConfig};
    use crate::domain::material::{Material, QualityTier, Urgency, UseCase};
    use crate::domain::quote::{
        BulkDiscount, Dimensions, PartMetrics, QuoteOutcome, QuoteRequest, QuoteResult,
        WarningCode,
    };
    use crate::errors::DomainError;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).single().expect("valid timestamp")
    }

    fn cents(value: i64) -> Decimal {
        Decimal::new(value, 2)
    }

    fn petg_request(quantity: u32) -> QuoteRequest {
        QuoteRequest::new(
            Material::Petg,
            PartMetrics::measured(Decimal::from(25), Decimal::new(15, 1)),
        )
        .with_quantity(quantity)
    }

    fn priced(outcome: QuoteOutcome) -> QuoteResult {
        match outcome {
            QuoteOutcome::Priced(result) => result,
            QuoteOutcome::RequiresHumanPricing(escalation) => {
                panic!("expected a price, got escalation: {}", escalation.reason)
            }
        }
    }

    fn quote(request: &QuoteRequest) -> QuoteResult {
        priced(
            DeterministicPricingEngine::default()
                .compute_quote_at(request, fixed_now())
                .expect("valid request"),
        )
    }

    #[test]
    fn petg_reference_quote_is_itemized() {
        let result = quote(&petg_request(1));

        assert_eq!(result.material_cost, cents(100));
        assert_eq!(result.machine_cost, cents(1950));
        assert_eq!(result.labor_cost, cents(500));
        assert_eq!(result.subtotal, cents(2550));
        assert_eq!(result.bulk_discount, BulkDiscount::None);
        assert_eq!(result.urgency_modifier, Decimal::ONE);
        assert_eq!(result.total, cents(2550));
        assert!(!result.minimum_applied);
        assert!(result.warnings.is_empty());
        assert_eq!(result.trace.last().map(|step| step.amount), Some(cents(2550)));
    }

    #[test]
    fn quantity_boundaries_follow_bulk_tiers() {
        let expectations = [
            (9, Decimal::ZERO),
            (10, Decimal::new(10, 2)),
            (24, Decimal::new(10, 2)),
            (25, Decimal::new(15, 2)),
            (49, Decimal::new(15, 2)),
        ];

        for (quantity, rate) in expectations {
            let result = quote(&petg_request(quantity));
            assert_eq!(result.bulk_discount.rate(), rate, "quantity {quantity}");
            let expected_subtotal = cents(2550) * Decimal::from(quantity);
            assert_eq!(result.subtotal, expected_subtotal, "quantity {quantity}");
            assert_eq!(
                result.total,
                round_money(expected_subtotal - round_money(expected_subtotal * rate)),
                "quantity {quantity}"
            );
        }
    }

    #[test]
    fn fifty_units_escalate_without_a_total() {
        let outcome = DeterministicPricingEngine::default()
            .compute_quote_at(&petg_request(50), fixed_now())
            .expect("valid request");

        assert!(outcome.priced().is_none());
        let escalation = outcome.escalation().expect("escalation");
        assert_eq!(escalation.quantity, 50);
        assert_eq!(escalation.threshold, 50);

        let json = serde_json::to_value(&outcome).expect("serializable outcome");
        assert_eq!(json["outcome"], "requires_human_pricing");
        assert!(json.get("total").is_none());
    }

    #[test]
    fn urgency_scales_the_discounted_total() {
        // 10 units: subtotal 255.00, 10% off -> 229.50
        let standard = quote(&petg_request(10));
        let rush = quote(&petg_request(10).with_urgency(Urgency::Rush));
        let same_day = quote(&petg_request(10).with_urgency(Urgency::SameDay));

        assert_eq!(standard.total, cents(22950));
        assert_eq!(rush.total, standard.total * Decimal::new(15, 1));
        assert_eq!(same_day.total, standard.total * Decimal::TWO);
        assert_eq!(same_day.urgency_surcharge, cents(22950));
        assert_eq!(rush.subtotal, standard.subtotal);
    }

    #[test]
    fn minimum_order_floor_is_enforced_with_warning() {
        let request = QuoteRequest::new(
            Material::Pla,
            PartMetrics::measured(Decimal::from(5), Decimal::new(2, 1)),
        )
        .with_quality(QualityTier::Draft);

        let result = quote(&request);
        // 0.15 + 1.92 + 5.00 = 7.07
        assert_eq!(result.subtotal, cents(707));
        assert_eq!(result.total, cents(1000));
        assert!(result.minimum_applied);
        assert!(result.has_warning(WarningCode::MinimumOrderApplied));
    }

    #[test]
    fn totals_never_drop_below_the_floor() {
        let engine = DeterministicPricingEngine::default();
        for material in Material::ALL {
            for quality in QualityTier::ALL {
                for urgency in Urgency::ALL {
                    for quantity in [1, 3, 12, 30] {
                        let request = QuoteRequest::new(
                            material,
                            PartMetrics::measured(Decimal::new(1, 1), Decimal::new(1, 1)),
                        )
                        .with_quality(quality)
                        .with_urgency(urgency)
                        .with_quantity(quantity);
                        let result = priced(
                            engine.compute_quote_at(&request, fixed_now()).expect("valid request"),
                        );
                        assert!(result.total >= cents(1000), "{request:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn identical_inputs_produce_identical_quotes() {
        let engine = DeterministicPricingEngine::default();
        let request = QuoteRequest::new(
            Material::Nylon,
            PartMetrics::from_dimensions(Dimensions::from_mm(120, 80, 30)),
        )
        .with_quality(QualityTier::Fine)
        .with_quantity(12)
        .with_urgency(Urgency::Rush);

        let first = engine.compute_quote_at(&request, fixed_now()).expect("first");
        let second = engine.compute_quote_at(&request, fixed_now()).expect("second");
        assert_eq!(first, second);
        assert!(first.id().0.starts_with("QT-20260302-"));
        assert_eq!(first.id().0.len(), "QT-20260302-".len() + 6);
    }

    #[test]
    fn validity_window_is_seven_days_from_generation() {
        let result = quote(&petg_request(1));
        assert_eq!(result.generated_at, fixed_now());
        assert_eq!(result.valid_until, fixed_now() + Duration::days(7));
    }

    #[test]
    fn quality_modifier_scales_machine_time_only() {
        let standard = quote(&petg_request(1));
        let ultra = quote(&petg_request(1).with_quality(QualityTier::UltraFine));

        assert_eq!(ultra.material_cost, standard.material_cost);
        // 1.5h x 13.00 x 1.60
        assert_eq!(ultra.machine_cost, cents(3120));
    }

    #[test]
    fn dimensions_are_resolved_through_the_estimator() {
        struct FixedEstimator;

        impl PrintEstimator for FixedEstimator {
            fn estimate(
                &self,
                _material: Material,
                _rate: &MaterialRate,
                _dimensions: &Dimensions,
            ) -> Option<PrintEstimate> {
                Some(PrintEstimate {
                    weight_grams: Decimal::from(100),
                    print_hours: Decimal::from(2),
                })
            }

            fn hours_for_weight(&self, _weight_grams: Decimal) -> Option<Decimal> {
                Some(Decimal::from(2))
            }
        }

        let engine =
            DeterministicPricingEngine::with_estimator(PricingConfig::default(), FixedEstimator);
        let request = QuoteRequest::new(
            Material::Abs,
            PartMetrics::from_dimensions(Dimensions::from_mm(50, 50, 50)),
        );

        let result = priced(engine.compute_quote_at(&request, fixed_now()).expect("valid"));
        assert_eq!(result.weight_grams, Decimal::from(100));
        assert_eq!(result.material_cost, cents(400));
        assert_eq!(result.machine_cost, cents(2800));
        assert!(result.has_warning(WarningCode::EstimatedMetrics));
    }

    #[test]
    fn measured_weight_drives_estimated_hours() {
        let request = QuoteRequest::new(
            Material::Pla,
            PartMetrics {
                dimensions: Some(Dimensions::from_mm(80, 60, 40)),
                weight_grams: Some(Decimal::from(30)),
                print_hours: None,
            },
        );

        let result = quote(&request);
        // 30g at 15g/h, not the 47.6g the bounding box alone suggests
        assert_eq!(result.weight_grams, Decimal::from(30));
        assert_eq!(result.print_hours, Decimal::from(2));
        assert!(result.has_warning(WarningCode::EstimatedMetrics));
    }

    #[test]
    fn amounts_too_large_to_price_are_rejected() {
        let engine = DeterministicPricingEngine::default();
        let huge_hours = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
        let side = Decimal::from(10_000_000_000u64);
        let cases = [
            QuoteRequest::new(Material::Nylon, PartMetrics::measured(Decimal::ONE, huge_hours)),
            QuoteRequest::new(
                Material::Pla,
                PartMetrics::from_dimensions(Dimensions::new(side, side, side)),
            ),
            // fine per unit, overflows once multiplied by the quantity
            QuoteRequest::new(
                Material::Nylon,
                PartMetrics::measured(Decimal::ONE, huge_hours / Decimal::from(50)),
            )
            .with_quantity(49),
        ];

        for request in cases {
            let result = engine.compute_quote_at(&request, fixed_now());
            let rejected = matches!(
                &result,
                Err(DomainError::InvalidQuoteRequest(message)) if message.contains("too large")
            );
            assert!(rejected, "expected rejection for {request:?}, got {result:?}");
        }
    }

    #[test]
    fn advisories_do_not_block_pricing() {
        let request = QuoteRequest::new(
            Material::Pla,
            PartMetrics::measured(Decimal::from(500), Decimal::from(20))
                .with_dimensions(Dimensions::from_mm(350, 200, 100)),
        )
        .with_intended_use(UseCase::HighTemperature);

        let result = quote(&request);
        assert!(result.total > Decimal::ZERO);
        assert!(result.has_warning(WarningCode::BuildVolumeExceeded));
        assert!(result.has_warning(WarningCode::MaterialUnsuitable));
    }

    #[test]
    fn invalid_requests_are_rejected_before_pricing() {
        let engine = DeterministicPricingEngine::default();
        let cases = [
            petg_request(0),
            QuoteRequest::new(Material::Pla, PartMetrics::default()),
            QuoteRequest::new(Material::Pla, PartMetrics::measured(Decimal::ZERO, Decimal::ONE)),
            QuoteRequest::new(Material::Pla, PartMetrics::measured(Decimal::ONE, Decimal::ZERO)),
            QuoteRequest::new(
                Material::Pla,
                PartMetrics::from_dimensions(Dimensions::from_mm(10, 0, 10)),
            ),
        ];

        for request in cases {
            let result = engine.compute_quote_at(&request, fixed_now());
            assert!(
                matches!(result, Err(DomainError::InvalidQuoteRequest(_))),
                "expected rejection for {request:?}"
            );
        }
    }

    #[test]
    fn materials_missing_from_the_rate_table_are_rejected() {
        let mut config = PricingConfig::default();
        config.materials.remove(&Material::Tpu);
        let engine = DeterministicPricingEngine::new(config);

        let request =
            QuoteRequest::new(Material::Tpu, PartMetrics::measured(Decimal::ONE, Decimal::ONE));
        let error = engine.compute_quote_at(&request, fixed_now()).expect_err("no tpu rate");
        assert!(error.to_string().contains("TPU"));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_money(Decimal::new(1005, 3)), cents(101));
        assert_eq!(round_money(Decimal::new(1004, 3)), cents(100));
        assert_eq!(round_money(Decimal::new(22495, 3)), cents(2250));
    }
}

use crate::config::PricingConfig;
use crate::domain::material::{Material, UseCase};
use crate::domain::quote::{Dimensions, QuoteRequest, QuoteWarning, WarningCode};

/// Non-blocking checks attached to an otherwise valid quote.
pub fn collect_advisories(pricing: &PricingConfig, request: &QuoteRequest) -> Vec<QuoteWarning> {
    let mut warnings = Vec::new();

    if let Some(dimensions) = &request.metrics.dimensions {
        warnings.extend(build_volume_warning(pricing, request.material, dimensions));
    }
    if let Some(use_case) = request.intended_use {
        warnings.extend(suitability_warning(pricing, request.material, use_case));
    }

    warnings
}

pub fn build_volume_warning(
    pricing: &PricingConfig,
    material: Material,
    dimensions: &Dimensions,
) -> Option<QuoteWarning> {
    let process = material.process();
    let envelope = pricing.build_volume(process)?;
    if dimensions.fits_within(envelope) {
        return None;
    }

    Some(QuoteWarning::new(
        WarningCode::BuildVolumeExceeded,
        format!(
            "part {dimensions} exceeds the {process} build volume of {envelope} \
             in every orientation; it will need to be split or printed in sections"
        ),
    ))
}

pub fn suitability_warning(
    pricing: &PricingConfig,
    material: Material,
    use_case: UseCase,
) -> Option<QuoteWarning> {
    if !pricing.is_unsuitable(material, use_case) {
        return None;
    }

    Some(QuoteWarning::new(
        WarningCode::MaterialUnsuitable,
        format!("{material} is usually a poor fit for {use_case} parts; consider another material"),
    ))
}

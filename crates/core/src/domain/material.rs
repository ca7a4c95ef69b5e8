use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "PLA")]
    Pla,
    #[serde(rename = "ABS")]
    Abs,
    #[serde(rename = "PETG")]
    Petg,
    #[serde(rename = "TPU")]
    Tpu,
    Nylon,
    Resin,
}

impl Material {
    pub const ALL: [Material; 6] =
        [Self::Pla, Self::Abs, Self::Petg, Self::Tpu, Self::Nylon, Self::Resin];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pla => "PLA",
            Self::Abs => "ABS",
            Self::Petg => "PETG",
            Self::Tpu => "TPU",
            Self::Nylon => "Nylon",
            Self::Resin => "Resin",
        }
    }

    pub fn process(self) -> PrintProcess {
        match self {
            Self::Resin => PrintProcess::Resin,
            _ => PrintProcess::Fdm,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pla" => Ok(Self::Pla),
            "abs" => Ok(Self::Abs),
            "petg" => Ok(Self::Petg),
            "tpu" => Ok(Self::Tpu),
            "nylon" => Ok(Self::Nylon),
            "resin" => Ok(Self::Resin),
            other => Err(DomainError::InvalidQuoteRequest(format!(
                "unknown material `{other}` (expected PLA|ABS|PETG|TPU|Nylon|Resin)"
            ))),
        }
    }
}

/// Printing method a material runs on; each has its own build volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintProcess {
    Fdm,
    Resin,
}

impl fmt::Display for PrintProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fdm => f.write_str("fdm"),
            Self::Resin => f.write_str("resin"),
        }
    }
}

impl FromStr for PrintProcess {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fdm" => Ok(Self::Fdm),
            "resin" | "sla" => Ok(Self::Resin),
            other => Err(DomainError::InvalidQuoteRequest(format!(
                "unknown print process `{other}` (expected fdm|resin)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Draft,
    #[default]
    Standard,
    Fine,
    UltraFine,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::Draft, Self::Standard, Self::Fine, Self::UltraFine];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Standard => "standard",
            Self::Fine => "fine",
            Self::UltraFine => "ultra-fine",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "standard" => Ok(Self::Standard),
            "fine" => Ok(Self::Fine),
            "ultra-fine" | "ultrafine" | "ultra_fine" => Ok(Self::UltraFine),
            other => Err(DomainError::InvalidQuoteRequest(format!(
                "unknown quality tier `{other}` (expected draft|standard|fine|ultra-fine)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Standard,
    Rush,
    SameDay,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Self::Standard, Self::Rush, Self::SameDay];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Rush => "rush",
            Self::SameDay => "same-day",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "rush" => Ok(Self::Rush),
            "same-day" | "sameday" | "same_day" => Ok(Self::SameDay),
            other => Err(DomainError::InvalidQuoteRequest(format!(
                "unknown urgency `{other}` (expected standard|rush|same-day)"
            ))),
        }
    }
}

/// Stated purpose of the part, used only for advisory suitability warnings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    Prototype,
    Functional,
    Outdoor,
    HighTemperature,
    Flexible,
    Miniature,
    FoodContact,
}

impl UseCase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prototype => "prototype",
            Self::Functional => "functional",
            Self::Outdoor => "outdoor",
            Self::HighTemperature => "high_temperature",
            Self::Flexible => "flexible",
            Self::Miniature => "miniature",
            Self::FoodContact => "food_contact",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "prototype" => Ok(Self::Prototype),
            "functional" => Ok(Self::Functional),
            "outdoor" => Ok(Self::Outdoor),
            "high_temperature" | "high_temp" => Ok(Self::HighTemperature),
            "flexible" => Ok(Self::Flexible),
            "miniature" => Ok(Self::Miniature),
            "food_contact" | "food_safe" => Ok(Self::FoodContact),
            other => Err(DomainError::InvalidQuoteRequest(format!("unknown use case `{other}`"))),
        }
    }
}

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::material::{Material, PrintProcess, QualityTier, Urgency, UseCase};
use crate::domain::quote::{BulkDiscount, Dimensions};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub inventory: InventoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRate {
    pub cost_per_gram: Decimal,
    /// Machine time, per hour.
    pub machine_rate: Decimal,
    pub density_g_cm3: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTier {
    pub min_quantity: u32,
    pub rate: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub materials: BTreeMap<Material, MaterialRate>,
    pub quality_modifiers: BTreeMap<QualityTier, Decimal>,
    pub urgency_modifiers: BTreeMap<Urgency, Decimal>,
    pub turnaround: BTreeMap<Urgency, String>,
    /// Sorted ascending by `min_quantity`; the highest matching tier applies.
    pub bulk_tiers: Vec<BulkTier>,
    pub custom_pricing_min_quantity: u32,
    pub labor_per_part: Decimal,
    pub minimum_order: Decimal,
    pub validity_days: u32,
    pub build_volumes: BTreeMap<PrintProcess, Dimensions>,
    pub unsuitable_uses: BTreeMap<Material, Vec<UseCase>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefaults {
    pub safety_factor: Decimal,
    pub lead_time_days: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub categories: BTreeMap<String, CategoryDefaults>,
    pub demand_spike_multiplier: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub labor_per_part: Option<Decimal>,
    pub minimum_order: Option<Decimal>,
    pub validity_days: Option<u32>,
    pub custom_pricing_min_quantity: Option<u32>,
    pub demand_spike_multiplier: Option<Decimal>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            inventory: InventoryConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        let rate = |cost_per_gram: i64, machine_rate: i64, density: i64| MaterialRate {
            cost_per_gram: Decimal::new(cost_per_gram, 2),
            machine_rate: Decimal::from(machine_rate),
            density_g_cm3: Decimal::new(density, 2),
        };

        Self {
            materials: BTreeMap::from([
                (Material::Pla, rate(3, 12, 124)),
                (Material::Abs, rate(4, 14, 104)),
                (Material::Petg, rate(4, 13, 127)),
                (Material::Tpu, rate(6, 15, 121)),
                (Material::Nylon, rate(8, 16, 114)),
                (Material::Resin, rate(7, 10, 110)),
            ]),
            quality_modifiers: BTreeMap::from([
                (QualityTier::Draft, Decimal::new(80, 2)),
                (QualityTier::Standard, Decimal::ONE),
                (QualityTier::Fine, Decimal::new(125, 2)),
                (QualityTier::UltraFine, Decimal::new(160, 2)),
            ]),
            urgency_modifiers: BTreeMap::from([
                (Urgency::Standard, Decimal::ONE),
                (Urgency::Rush, Decimal::new(15, 1)),
                (Urgency::SameDay, Decimal::TWO),
            ]),
            turnaround: BTreeMap::from([
                (Urgency::Standard, "3-5 business days".to_string()),
                (Urgency::Rush, "1-2 business days".to_string()),
                (Urgency::SameDay, "Same day (if ordered before 10 AM)".to_string()),
            ]),
            bulk_tiers: vec![
                BulkTier { min_quantity: 10, rate: Decimal::new(10, 2) },
                BulkTier { min_quantity: 25, rate: Decimal::new(15, 2) },
            ],
            custom_pricing_min_quantity: 50,
            labor_per_part: Decimal::new(500, 2),
            minimum_order: Decimal::new(1000, 2),
            validity_days: 7,
            build_volumes: BTreeMap::from([
                (PrintProcess::Fdm, Dimensions::from_mm(300, 300, 300)),
                (PrintProcess::Resin, Dimensions::from_mm(218, 123, 260)),
            ]),
            unsuitable_uses: BTreeMap::from([
                (
                    Material::Pla,
                    vec![UseCase::Outdoor, UseCase::HighTemperature, UseCase::Flexible],
                ),
                (Material::Abs, vec![UseCase::FoodContact, UseCase::Flexible, UseCase::Miniature]),
                (Material::Petg, vec![UseCase::Flexible, UseCase::Miniature]),
                (Material::Tpu, vec![UseCase::Miniature, UseCase::HighTemperature]),
                (Material::Nylon, vec![UseCase::FoodContact, UseCase::Flexible]),
                (Material::Resin, vec![UseCase::Outdoor, UseCase::Flexible, UseCase::Functional]),
            ]),
        }
    }
}

impl PricingConfig {
    pub fn material_rate(&self, material: Material) -> Option<&MaterialRate> {
        self.materials.get(&material)
    }

    pub fn quality_modifier(&self, quality: QualityTier) -> Option<Decimal> {
        self.quality_modifiers.get(&quality).copied()
    }

    pub fn urgency_modifier(&self, urgency: Urgency) -> Option<Decimal> {
        self.urgency_modifiers.get(&urgency).copied()
    }

    pub fn turnaround_for(&self, urgency: Urgency) -> &str {
        self.turnaround.get(&urgency).map(String::as_str).unwrap_or("to be confirmed")
    }

    pub fn build_volume(&self, process: PrintProcess) -> Option<&Dimensions> {
        self.build_volumes.get(&process)
    }

    pub fn is_unsuitable(&self, material: Material, use_case: UseCase) -> bool {
        self.unsuitable_uses.get(&material).is_some_and(|uses| uses.contains(&use_case))
    }

    /// Caller must check `requires_custom_pricing` first; this never signals escalation.
    pub fn bulk_discount_for(&self, quantity: u32) -> BulkDiscount {
        self.bulk_tiers
            .iter()
            .rev()
            .find(|tier| quantity >= tier.min_quantity)
            .map(|tier| BulkDiscount::Rate(tier.rate))
            .unwrap_or(BulkDiscount::None)
    }

    pub fn requires_custom_pricing(&self, quantity: u32) -> bool {
        quantity >= self.custom_pricing_min_quantity
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        let defaults = |safety_factor: i64, lead_time_days: i64| CategoryDefaults {
            safety_factor: Decimal::new(safety_factor, 1),
            lead_time_days: Decimal::from(lead_time_days),
        };

        Self {
            categories: BTreeMap::from([
                ("filament".to_string(), defaults(15, 5)),
                ("resin".to_string(), defaults(15, 7)),
                ("parts".to_string(), defaults(12, 5)),
            ]),
            demand_spike_multiplier: Decimal::new(15, 1),
        }
    }
}

impl InventoryConfig {
    pub fn category_defaults(&self, category: &str) -> Option<&CategoryDefaults> {
        self.categories.get(category.trim().to_ascii_lowercase().as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("printdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(pricing) = patch.pricing {
            self.pricing.apply_patch(pricing)?;
        }

        if let Some(inventory) = patch.inventory {
            if let Some(categories) = inventory.categories {
                for (name, defaults) in categories {
                    self.inventory.categories.insert(name.trim().to_ascii_lowercase(), defaults);
                }
            }
            if let Some(multiplier) = inventory.demand_spike_multiplier {
                self.inventory.demand_spike_multiplier = multiplier;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PRINTDESK_LABOR_PER_PART") {
            self.pricing.labor_per_part = parse_decimal("PRINTDESK_LABOR_PER_PART", &value)?;
        }
        if let Some(value) = read_env("PRINTDESK_MINIMUM_ORDER") {
            self.pricing.minimum_order = parse_decimal("PRINTDESK_MINIMUM_ORDER", &value)?;
        }
        if let Some(value) = read_env("PRINTDESK_VALIDITY_DAYS") {
            self.pricing.validity_days = parse_u32("PRINTDESK_VALIDITY_DAYS", &value)?;
        }
        if let Some(value) = read_env("PRINTDESK_CUSTOM_PRICING_MIN_QUANTITY") {
            self.pricing.custom_pricing_min_quantity =
                parse_u32("PRINTDESK_CUSTOM_PRICING_MIN_QUANTITY", &value)?;
        }
        if let Some(value) = read_env("PRINTDESK_DEMAND_SPIKE_MULTIPLIER") {
            self.inventory.demand_spike_multiplier =
                parse_decimal("PRINTDESK_DEMAND_SPIKE_MULTIPLIER", &value)?;
        }

        let log_level =
            read_env("PRINTDESK_LOGGING_LEVEL").or_else(|| read_env("PRINTDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PRINTDESK_LOGGING_FORMAT").or_else(|| read_env("PRINTDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(labor_per_part) = overrides.labor_per_part {
            self.pricing.labor_per_part = labor_per_part;
        }
        if let Some(minimum_order) = overrides.minimum_order {
            self.pricing.minimum_order = minimum_order;
        }
        if let Some(validity_days) = overrides.validity_days {
            self.pricing.validity_days = validity_days;
        }
        if let Some(threshold) = overrides.custom_pricing_min_quantity {
            self.pricing.custom_pricing_min_quantity = threshold;
        }
        if let Some(multiplier) = overrides.demand_spike_multiplier {
            self.inventory.demand_spike_multiplier = multiplier;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_inventory(&self.inventory)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

impl PricingConfig {
    fn apply_patch(&mut self, patch: PricingPatch) -> Result<(), ConfigError> {
        if let Some(materials) = patch.materials {
            for (key, rate_patch) in materials {
                let material = parse_key::<Material>("pricing.materials", &key)?;
                let current = self.materials.get(&material).copied();
                let rate = match (current, rate_patch) {
                    (Some(mut rate), patch) => {
                        if let Some(cost_per_gram) = patch.cost_per_gram {
                            rate.cost_per_gram = cost_per_gram;
                        }
                        if let Some(machine_rate) = patch.machine_rate {
                            rate.machine_rate = machine_rate;
                        }
                        if let Some(density) = patch.density_g_cm3 {
                            rate.density_g_cm3 = density;
                        }
                        rate
                    }
                    (
                        None,
                        MaterialRatePatch {
                            cost_per_gram: Some(cost_per_gram),
                            machine_rate: Some(machine_rate),
                            density_g_cm3: Some(density_g_cm3),
                        },
                    ) => MaterialRate { cost_per_gram, machine_rate, density_g_cm3 },
                    (None, _) => {
                        return Err(ConfigError::Validation(format!(
                            "pricing.materials.{key} must set cost_per_gram, machine_rate \
                             and density_g_cm3"
                        )))
                    }
                };
                self.materials.insert(material, rate);
            }
        }

        if let Some(modifiers) = patch.quality_modifiers {
            for (key, value) in modifiers {
                let tier = parse_key::<QualityTier>("pricing.quality_modifiers", &key)?;
                self.quality_modifiers.insert(tier, value);
            }
        }

        if let Some(modifiers) = patch.urgency_modifiers {
            for (key, value) in modifiers {
                let urgency = parse_key::<Urgency>("pricing.urgency_modifiers", &key)?;
                self.urgency_modifiers.insert(urgency, value);
            }
        }

        if let Some(turnaround) = patch.turnaround {
            for (key, value) in turnaround {
                let urgency = parse_key::<Urgency>("pricing.turnaround", &key)?;
                self.turnaround.insert(urgency, value);
            }
        }

        if let Some(mut tiers) = patch.bulk_tiers {
            tiers.sort_by_key(|tier| tier.min_quantity);
            self.bulk_tiers = tiers;
        }
        if let Some(threshold) = patch.custom_pricing_min_quantity {
            self.custom_pricing_min_quantity = threshold;
        }
        if let Some(labor_per_part) = patch.labor_per_part {
            self.labor_per_part = labor_per_part;
        }
        if let Some(minimum_order) = patch.minimum_order {
            self.minimum_order = minimum_order;
        }
        if let Some(validity_days) = patch.validity_days {
            self.validity_days = validity_days;
        }

        if let Some(volumes) = patch.build_volumes {
            for (key, [length, width, height]) in volumes {
                let process = parse_key::<PrintProcess>("pricing.build_volumes", &key)?;
                self.build_volumes.insert(process, Dimensions::new(length, width, height));
            }
        }

        if let Some(unsuitable) = patch.unsuitable_uses {
            for (key, uses) in unsuitable {
                let material = parse_key::<Material>("pricing.unsuitable_uses", &key)?;
                self.unsuitable_uses.insert(material, uses);
            }
        }

        Ok(())
    }
}

fn parse_key<T: FromStr>(table: &str, key: &str) -> Result<T, ConfigError> {
    key.parse::<T>()
        .map_err(|_| ConfigError::Validation(format!("{table} has unknown key `{key}`")))
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("printdesk.toml"), PathBuf::from("config/printdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    for material in Material::ALL {
        let Some(rate) = pricing.material_rate(material) else {
            return Err(ConfigError::Validation(format!(
                "pricing.materials is missing a rate row for {material}"
            )));
        };
        if rate.cost_per_gram <= Decimal::ZERO
            || rate.machine_rate <= Decimal::ZERO
            || rate.density_g_cm3 <= Decimal::ZERO
        {
            return Err(ConfigError::Validation(format!(
                "pricing.materials.{material} rates must be greater than zero"
            )));
        }
    }

    for tier in QualityTier::ALL {
        match pricing.quality_modifier(tier) {
            Some(modifier) if modifier > Decimal::ZERO => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "pricing.quality_modifiers.{tier} must be set and greater than zero"
                )))
            }
        }
    }

    for urgency in Urgency::ALL {
        match pricing.urgency_modifier(urgency) {
            Some(modifier) if modifier >= Decimal::ONE => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "pricing.urgency_modifiers.{urgency} must be set and at least 1.0"
                )))
            }
        }
    }

    let mut previous_quantity = 0;
    for tier in &pricing.bulk_tiers {
        if tier.min_quantity <= previous_quantity {
            return Err(ConfigError::Validation(
                "pricing.bulk_tiers must have strictly increasing min_quantity values above zero"
                    .to_string(),
            ));
        }
        if tier.rate < Decimal::ZERO || tier.rate >= Decimal::ONE {
            return Err(ConfigError::Validation(
                "pricing.bulk_tiers rates must be in range 0..1".to_string(),
            ));
        }
        if tier.min_quantity >= pricing.custom_pricing_min_quantity {
            return Err(ConfigError::Validation(
                "pricing.bulk_tiers must sit below custom_pricing_min_quantity".to_string(),
            ));
        }
        previous_quantity = tier.min_quantity;
    }

    if pricing.custom_pricing_min_quantity < 2 {
        return Err(ConfigError::Validation(
            "pricing.custom_pricing_min_quantity must be at least 2".to_string(),
        ));
    }

    if pricing.labor_per_part < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.labor_per_part must not be negative".to_string(),
        ));
    }

    if pricing.minimum_order < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.minimum_order must not be negative".to_string(),
        ));
    }

    if pricing.validity_days == 0 || pricing.validity_days > 365 {
        return Err(ConfigError::Validation(
            "pricing.validity_days must be in range 1..=365".to_string(),
        ));
    }

    for (process, volume) in &pricing.build_volumes {
        if !volume.is_positive() {
            return Err(ConfigError::Validation(format!(
                "pricing.build_volumes.{process} must have positive axes"
            )));
        }
    }

    Ok(())
}

fn validate_inventory(inventory: &InventoryConfig) -> Result<(), ConfigError> {
    for (name, defaults) in &inventory.categories {
        if defaults.safety_factor <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "inventory.categories.{name}.safety_factor must be greater than zero"
            )));
        }
        if defaults.lead_time_days <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "inventory.categories.{name}.lead_time_days must be greater than zero"
            )));
        }
    }

    if inventory.demand_spike_multiplier < Decimal::ONE {
        return Err(ConfigError::Validation(
            "inventory.demand_spike_multiplier must be at least 1.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    inventory: Option<InventoryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    materials: Option<BTreeMap<String, MaterialRatePatch>>,
    quality_modifiers: Option<BTreeMap<String, Decimal>>,
    urgency_modifiers: Option<BTreeMap<String, Decimal>>,
    turnaround: Option<BTreeMap<String, String>>,
    bulk_tiers: Option<Vec<BulkTier>>,
    custom_pricing_min_quantity: Option<u32>,
    labor_per_part: Option<Decimal>,
    minimum_order: Option<Decimal>,
    validity_days: Option<u32>,
    build_volumes: Option<BTreeMap<String, [Decimal; 3]>>,
    unsuitable_uses: Option<BTreeMap<String, Vec<UseCase>>>,
}

#[derive(Debug, Default, Deserialize)]
struct MaterialRatePatch {
    cost_per_gram: Option<Decimal>,
    machine_rate: Option<Decimal>,
    density_g_cm3: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct InventoryPatch {
    categories: Option<BTreeMap<String, CategoryDefaults>>,
    demand_spike_multiplier: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::material::{Material, PrintProcess, QualityTier, Urgency, UseCase};
    use crate::domain::quote::{BulkDiscount, Dimensions};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<std::path::PathBuf, String> {
        let path = dir.path().join("printdesk.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_carry_the_published_rate_card() {
        let config = AppConfig::default();
        let petg = config.pricing.material_rate(Material::Petg).expect("petg rate");
        assert_eq!(petg.cost_per_gram, Decimal::new(4, 2));
        assert_eq!(petg.machine_rate, Decimal::from(13));
        assert_eq!(
            config.pricing.quality_modifier(QualityTier::UltraFine),
            Some(Decimal::new(16, 1))
        );
        assert_eq!(config.pricing.urgency_modifier(Urgency::SameDay), Some(Decimal::TWO));
        assert_eq!(
            config.pricing.build_volume(PrintProcess::Resin),
            Some(&Dimensions::from_mm(218, 123, 260))
        );
        assert!(config.pricing.is_unsuitable(Material::Pla, UseCase::Outdoor));
        assert!(!config.pricing.is_unsuitable(Material::Tpu, UseCase::Flexible));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bulk_tiers_select_the_highest_matching_rate() {
        let pricing = AppConfig::default().pricing;
        assert_eq!(pricing.bulk_discount_for(9), BulkDiscount::None);
        assert_eq!(pricing.bulk_discount_for(10), BulkDiscount::Rate(Decimal::new(10, 2)));
        assert_eq!(pricing.bulk_discount_for(24), BulkDiscount::Rate(Decimal::new(10, 2)));
        assert_eq!(pricing.bulk_discount_for(25), BulkDiscount::Rate(Decimal::new(15, 2)));
        assert!(!pricing.requires_custom_pricing(49));
        assert!(pricing.requires_custom_pricing(50));
    }

    #[test]
    fn file_load_supports_env_interpolation_and_partial_tables() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PRINTDESK_PLA_RATE", "12.5");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[pricing]
minimum_order = 12.5

[pricing.materials.pla]
machine_rate = ${TEST_PRINTDESK_PLA_RATE}

[pricing.build_volumes]
fdm = [256, 256, 256]

[inventory.categories.hardware]
safety_factor = 2
lead_time_days = 10
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let pla = config.pricing.material_rate(Material::Pla).ok_or("pla rate missing")?;
            ensure(pla.machine_rate == Decimal::new(125, 1), "interpolated machine rate applies")?;
            ensure(pla.cost_per_gram == Decimal::new(3, 2), "unpatched fields keep defaults")?;
            ensure(
                config.pricing.minimum_order == Decimal::new(125, 1),
                "minimum order should come from file",
            )?;
            ensure(
                config.pricing.build_volume(PrintProcess::Fdm)
                    == Some(&Dimensions::from_mm(256, 256, 256)),
                "fdm build volume should come from file",
            )?;
            ensure(
                config.inventory.category_defaults("Hardware").is_some(),
                "new category should be added and looked up case-insensitively",
            )?;
            ensure(
                config.inventory.category_defaults("filament").is_some(),
                "default categories remain",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_PRINTDESK_PLA_RATE"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRINTDESK_LOG_LEVEL", "warn");
        env::set_var("PRINTDESK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["PRINTDESK_LOG_LEVEL", "PRINTDESK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRINTDESK_MINIMUM_ORDER", "15");
        env::set_var("PRINTDESK_VALIDITY_DAYS", "14");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[pricing]
minimum_order = 11
validity_days = 3
labor_per_part = 6

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    validity_days: Some(30),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.pricing.validity_days == 30, "override validity days should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.pricing.minimum_order == Decimal::from(15),
                "env minimum order should win over file and defaults",
            )?;
            ensure(
                config.pricing.labor_per_part == Decimal::from(6),
                "file labor cost should win over defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["PRINTDESK_MINIMUM_ORDER", "PRINTDESK_VALIDITY_DAYS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[pricing]
bulk_tiers = [{ min_quantity = 10, rate = 0.10 }, { min_quantity = 60, rate = 0.2 }]
"#,
        )?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("custom_pricing_min_quantity")
        );
        ensure(has_message, "validation failure should mention custom_pricing_min_quantity")
    }

    #[test]
    fn unknown_material_keys_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[pricing.materials.wood]
cost_per_gram = 0.05
"#,
        )?;

        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("wood")),
            "unknown material key should be reported",
        )
    }

    #[test]
    fn invalid_env_override_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRINTDESK_DEMAND_SPIKE_MULTIPLIER", "lots");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["PRINTDESK_DEMAND_SPIKE_MULTIPLIER"]);

        ensure(
            matches!(
                result,
                Err(ConfigError::InvalidEnvOverride { ref key, .. })
                    if key == "PRINTDESK_DEMAND_SPIKE_MULTIPLIER"
            ),
            "invalid env override should name the variable",
        )
    }

    #[test]
    fn required_file_must_exist() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist/printdesk.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;

use super::{load_config, CommandResult};

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match load_config(config_path.clone()) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_application_error("config", error),
    };

    let config_file_path = config_path.filter(|path| path.exists()).or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
    ];
    let pricing = &config.pricing;

    lines.push(render_line(
        "pricing.labor_per_part",
        &pricing.labor_per_part.to_string(),
        source("pricing.labor_per_part", &["PRINTDESK_LABOR_PER_PART"]),
    ));
    lines.push(render_line(
        "pricing.minimum_order",
        &pricing.minimum_order.to_string(),
        source("pricing.minimum_order", &["PRINTDESK_MINIMUM_ORDER"]),
    ));
    lines.push(render_line(
        "pricing.validity_days",
        &pricing.validity_days.to_string(),
        source("pricing.validity_days", &["PRINTDESK_VALIDITY_DAYS"]),
    ));
    lines.push(render_line(
        "pricing.custom_pricing_min_quantity",
        &pricing.custom_pricing_min_quantity.to_string(),
        source("pricing.custom_pricing_min_quantity", &["PRINTDESK_CUSTOM_PRICING_MIN_QUANTITY"]),
    ));

    for (material, rate) in &pricing.materials {
        let key_path = format!("pricing.materials.{material}");
        lines.push(render_line(
            &key_path,
            &format!(
                "{}/g, {}/h, {} g/cm3",
                rate.cost_per_gram, rate.machine_rate, rate.density_g_cm3
            ),
            source(&key_path, &[]),
        ));
    }

    let tiers = pricing
        .bulk_tiers
        .iter()
        .map(|tier| format!("{}+ @ {}", tier.min_quantity, tier.rate))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(render_line("pricing.bulk_tiers", &tiers, source("pricing.bulk_tiers", &[])));

    for (category, defaults) in &config.inventory.categories {
        let key_path = format!("inventory.categories.{category}");
        lines.push(render_line(
            &key_path,
            &format!(
                "safety_factor {}, lead_time_days {}",
                defaults.safety_factor, defaults.lead_time_days
            ),
            source(&key_path, &[]),
        ));
    }
    lines.push(render_line(
        "inventory.demand_spike_multiplier",
        &config.inventory.demand_spike_multiplier.to_string(),
        source("inventory.demand_spike_multiplier", &["PRINTDESK_DEMAND_SPIKE_MULTIPLIER"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["PRINTDESK_LOGGING_LEVEL", "PRINTDESK_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["PRINTDESK_LOGGING_FORMAT", "PRINTDESK_LOG_FORMAT"]),
    ));

    CommandResult::rendered(lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("printdesk.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/printdesk.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

/// Keys match the way the loader reads them: trimmed and case-insensitive.
fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(table) = current.as_table() else {
            return false;
        };
        let Some((_, next)) =
            table.iter().find(|(candidate, _)| candidate.trim().eq_ignore_ascii_case(key))
        else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

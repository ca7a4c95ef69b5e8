pub mod config;
pub mod consumption;
pub mod quote;
pub mod stock;

use std::path::PathBuf;

use printdesk_core::config::{AppConfig, ConfigError, LoadOptions};
use printdesk_core::errors::{ApplicationError, DomainError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;
pub const EXIT_DATA: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn rendered(output: String) -> Self {
        Self { exit_code: 0, output }
    }

    pub fn json<T: Serialize>(command: &str, value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(output) => Self::rendered(output),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }

    pub fn from_application_error(command: &str, error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(DomainError::InvariantViolation(message)) => {
                Self::failure(command, "invariant_violation", message, 1)
            }
            ApplicationError::Domain(domain) => {
                Self::failure(command, "invalid_input", domain.to_string(), EXIT_INVALID_INPUT)
            }
            ApplicationError::Configuration(message) => {
                Self::failure(command, "config_validation", message, EXIT_CONFIG)
            }
            ApplicationError::Data(message) => {
                Self::failure(command, "data_source", message, EXIT_DATA)
            }
        }
    }
}

pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, ApplicationError> {
    let require_file = config_path.is_some();
    AppConfig::load(LoadOptions { config_path, require_file, ..LoadOptions::default() })
        .map_err(|error: ConfigError| ApplicationError::Configuration(error.to_string()))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        let message = error.to_string().replace('\\', "\\\\").replace('"', "\\\"");
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\
             \"error_class\":\"serialization\",\"message\":\"{message}\"}}"
        )
    })
}

pub(crate) fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

pub mod config;
pub mod domain;
pub mod errors;
pub mod inventory;
pub mod pricing;

pub use config::{AppConfig, ConfigError, InventoryConfig, LoadOptions, PricingConfig};
pub use domain::inventory::{InventoryItem, ReorderEvaluation, Severity};
pub use domain::material::{Material, PrintProcess, QualityTier, Urgency, UseCase};
pub use domain::quote::{
    BulkDiscount, Dimensions, PartMetrics, PricingEscalation, QuoteId, QuoteOutcome,
    QuoteRequest, QuoteResult, QuoteWarning, WarningCode,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use inventory::report::{evaluate_batch, project_consumption, StockReport};
pub use inventory::{DeterministicReorderEvaluator, ReorderPolicy};
pub use pricing::estimate::{DensityEstimator, PrintEstimate, PrintEstimator};
pub use pricing::{DeterministicPricingEngine, PricingEngine};

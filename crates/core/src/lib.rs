pub mod catalog;
pub mod config;
pub mod errors;
pub mod order;
pub mod suggestions;
pub mod validation;

pub use catalog::{default_catalog, Catalog, Category, MenuItem, OrderTotals};
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use errors::ContractViolation;
pub use order::{Order, OrderError, OrderItem};
pub use suggestions::{
    Suggestion, SuggestionModel, SuggestionModelError, SuggestionService, SuggestionsReply,
};
pub use validation::{
    InvalidItem, InvalidReason, OrderValidator, RoomVerdict, Status, ValidItem, ValidationDetails,
    ValidationResult,
};

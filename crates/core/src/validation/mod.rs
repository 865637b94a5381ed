//! Order validation: pure verdicts over the catalog and room scheme, plus
//! suggestion enrichment on the failure path.

pub mod engine;
pub mod types;

pub use engine::OrderValidator;
pub use types::{
    FailureDetails, InvalidItem, InvalidReason, RoomVerdict, Status, SuccessDetails, ValidItem,
    ValidationDetails, ValidationResult,
};

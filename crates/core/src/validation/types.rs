use serde::{Deserialize, Serialize};

use crate::suggestions::Suggestion;

/// Outcome status reported back through tool messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Success,
    Error,
}

/// Why an order item was rejected. Exactly one reason per item; validation
/// stops at the first failing check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidReason {
    #[serde(rename = "Item is not on the menu")]
    NotOnMenu,
    #[serde(rename = "Item is currently out of stock")]
    OutOfStock,
    #[serde(rename = "This item does not allow modifications")]
    ModificationsNotAllowed,
    #[serde(rename = "There are invalid modifications in the order")]
    InvalidModifications,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotOnMenu => "Item is not on the menu",
            Self::OutOfStock => "Item is currently out of stock",
            Self::ModificationsNotAllowed => "This item does not allow modifications",
            Self::InvalidModifications => "There are invalid modifications in the order",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order item accepted by validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidItem {
    pub name: String,
    pub valid_quantity: u32,
    #[serde(default)]
    pub valid_modifications: Vec<String>,
}

/// An order item rejected by validation, with the salvageable parts kept.
///
/// The constructors are the only way these are built, which keeps the optional
/// fields consistent with the reason (e.g. `OutOfStock` always carries both a
/// valid and an invalid quantity).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidItem {
    pub name: String,
    pub reason: InvalidReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_modifications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_modifications: Option<Vec<String>>,
}

impl InvalidItem {
    pub fn not_on_menu(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: InvalidReason::NotOnMenu,
            valid_quantity: None,
            valid_modifications: None,
            invalid_quantity: None,
            invalid_modifications: None,
        }
    }

    /// `available` is the quantity the kitchen can still serve; `shortfall`
    /// is how far the request overshot it (always > 0).
    pub fn out_of_stock(name: impl Into<String>, available: u32, shortfall: u32) -> Self {
        Self {
            name: name.into(),
            reason: InvalidReason::OutOfStock,
            valid_quantity: Some(available),
            valid_modifications: None,
            invalid_quantity: Some(shortfall),
            invalid_modifications: None,
        }
    }

    pub fn modifications_not_allowed(
        name: impl Into<String>,
        quantity: u32,
        requested: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            reason: InvalidReason::ModificationsNotAllowed,
            valid_quantity: Some(quantity),
            // Explicitly empty rather than omitted: no modification survives.
            valid_modifications: Some(Vec::new()),
            invalid_quantity: None,
            invalid_modifications: Some(requested),
        }
    }

    pub fn invalid_modifications(
        name: impl Into<String>,
        quantity: u32,
        valid: Vec<String>,
        invalid: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            reason: InvalidReason::InvalidModifications,
            valid_quantity: Some(quantity),
            valid_modifications: Some(valid),
            invalid_quantity: None,
            invalid_modifications: Some(invalid),
        }
    }
}

/// Room classification on the failure path: valid xor invalid, never both,
/// never neither. The sum type enforces the exclusivity invariant that the
/// source system checked at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomVerdict {
    Valid { valid_room: String },
    Invalid { invalid_room: String },
}

impl RoomVerdict {
    pub fn valid(room: u16) -> Self {
        Self::Valid { valid_room: room.to_string() }
    }

    pub fn invalid(room: u16) -> Self {
        Self::Invalid { invalid_room: room.to_string() }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuccessDetails {
    pub valid_room: String,
    pub valid_items: Vec<ValidItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    #[serde(flatten)]
    pub room: RoomVerdict,
    pub valid_items: Vec<ValidItem>,
    pub invalid_items: Vec<InvalidItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

/// Mutually exclusive detail shapes for the two validation outcomes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationDetails {
    Success(SuccessDetails),
    Failure(FailureDetails),
}

/// Structured verdict for one validation attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: Status,
    pub response: String,
    pub details: ValidationDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_time: Option<u32>,
}

impl ValidationResult {
    pub fn success(
        room: u16,
        valid_items: Vec<ValidItem>,
        response: String,
        total_price: String,
        preparation_time: u32,
    ) -> Self {
        Self {
            status: Status::Success,
            response,
            details: ValidationDetails::Success(SuccessDetails {
                valid_room: room.to_string(),
                valid_items,
            }),
            total_price: Some(total_price),
            preparation_time: Some(preparation_time),
        }
    }

    pub fn failure(
        room: RoomVerdict,
        valid_items: Vec<ValidItem>,
        invalid_items: Vec<InvalidItem>,
        response: String,
    ) -> Self {
        Self {
            status: Status::Error,
            response,
            details: ValidationDetails::Failure(FailureDetails {
                room,
                valid_items,
                invalid_items,
                suggestions: Vec::new(),
            }),
            total_price: None,
            preparation_time: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn invalid_items(&self) -> &[InvalidItem] {
        match &self.details {
            ValidationDetails::Success(_) => &[],
            ValidationDetails::Failure(failure) => &failure.invalid_items,
        }
    }

    /// Attaches enrichment suggestions to a failure result and extends the
    /// response text to reference them. No-op for an empty batch.
    pub fn attach_suggestions(&mut self, suggestions: Vec<Suggestion>) {
        if suggestions.is_empty() {
            return;
        }
        if let ValidationDetails::Failure(failure) = &mut self.details {
            failure.suggestions = suggestions;
            self.response
                .push_str(" Suggested alternatives for the invalid items are included in the details.");
        }
    }
}

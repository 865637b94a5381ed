use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest and highest room numbers served by the property (floors 1-3).
pub const MIN_ROOM: u16 = 100;
pub const MAX_ROOM: u16 = 399;

/// One requested line of an order. Should correspond to a menu item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub modifications: Vec<String>,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self { name: name.into(), quantity, modifications: Vec::new() }
    }

    pub fn with_modifications(mut self, modifications: Vec<String>) -> Self {
        self.modifications = modifications;
        self
    }
}

/// A complete room service order, one per validation attempt.
///
/// Construction enforces the room range and a non-empty item list, so any
/// `Order` handed to the validation engine is already inside [100, 399].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Order {
    room: u16,
    items: Vec<OrderItem>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("room number {0} is outside the served range {MIN_ROOM}-{MAX_ROOM}")]
    RoomOutOfRange(i64),
    #[error("an order must contain at least one item")]
    EmptyOrder,
    #[error("item `{name}` has zero quantity")]
    ZeroQuantity { name: String },
}

impl Order {
    pub fn new(room: i64, items: Vec<OrderItem>) -> Result<Self, OrderError> {
        if room < i64::from(MIN_ROOM) || room > i64::from(MAX_ROOM) {
            return Err(OrderError::RoomOutOfRange(room));
        }
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::ZeroQuantity { name: item.name.clone() });
        }
        Ok(Self { room: room as u16, items })
    }

    pub fn room(&self) -> u16 {
        self.room
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }
}

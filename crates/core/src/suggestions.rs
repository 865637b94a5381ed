//! Remediation suggestions for rejected order items.
//!
//! Items rejected only for carrying modifications on a locked item get a
//! deterministic fix (same item, modifications stripped). Everything else is
//! batched into one structured call against a [`SuggestionModel`] capability.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::catalog::Catalog;
use crate::order::OrderItem;
use crate::validation::{InvalidItem, InvalidReason};

/// A proposed remediation for one rejected item. `fixed_item` is absent when
/// no safe repair exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub original_item: InvalidItem,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_item: Option<OrderItem>,
}

/// Structured reply expected from the suggestion model: one suggestion per
/// invalid item it was given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionsReply {
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Error)]
pub enum SuggestionModelError {
    #[error("suggestion model call failed: {0}")]
    Call(String),
    #[error("suggestion model returned a malformed reply")]
    Malformed,
}

/// Structured-output reasoning capability used for non-deterministic
/// remediations. Narrow on purpose so tests can substitute a stub.
#[async_trait]
pub trait SuggestionModel: Send + Sync {
    async fn suggest_fixes(&self, prompt: &str) -> Result<SuggestionsReply, SuggestionModelError>;
}

pub struct SuggestionService {
    catalog: Arc<Catalog>,
    model: Arc<dyn SuggestionModel>,
}

impl SuggestionService {
    pub fn new(catalog: Arc<Catalog>, model: Arc<dyn SuggestionModel>) -> Self {
        Self { catalog, model }
    }

    /// Proposes remediations for the given invalid items.
    ///
    /// Never fails: model failures and malformed replies degrade to an empty
    /// batch (logged), so enrichment can never fail a validation.
    pub async fn suggest(&self, invalid_items: &[InvalidItem]) -> Vec<Suggestion> {
        if invalid_items.is_empty() {
            return Vec::new();
        }

        let (locked, model_backed): (Vec<&InvalidItem>, Vec<&InvalidItem>) = invalid_items
            .iter()
            .partition(|item| item.reason == InvalidReason::ModificationsNotAllowed);

        let mut suggestions = Vec::new();
        for item in locked {
            // Validation always records the requested quantity for this
            // reason; a missing one means an upstream bug, not a user error.
            let Some(quantity) = item.valid_quantity else {
                warn!(item = %item.name, "modification-locked item has no valid quantity, skipping suggestion");
                continue;
            };
            suggestions.push(Suggestion {
                original_item: (*item).clone(),
                suggestion:
                    "This item does not allow modifications, so please remove the modifications."
                        .to_owned(),
                fixed_item: Some(OrderItem::new(item.name.clone(), quantity)),
            });
        }

        if !model_backed.is_empty() {
            debug!(count = model_backed.len(), "requesting model-backed suggestions");
            let prompt = self.build_prompt(&model_backed);
            match self.model.suggest_fixes(&prompt).await {
                Ok(reply) if reply.suggestions.len() == model_backed.len() => {
                    suggestions.extend(reply.suggestions);
                }
                Ok(reply) => {
                    error!(
                        expected = model_backed.len(),
                        received = reply.suggestions.len(),
                        "suggestion model returned the wrong number of suggestions"
                    );
                    return Vec::new();
                }
                Err(error) => {
                    error!(%error, "suggestion model call failed");
                    return Vec::new();
                }
            }
        }

        suggestions
    }

    fn build_prompt(&self, invalid_items: &[&InvalidItem]) -> String {
        let rendered_items =
            serde_json::to_string_pretty(invalid_items).unwrap_or_else(|_| "[]".to_owned());

        format!(
            "You are a senior room service manager at a 5-star hotel. Your employees are \
             responsible for taking orders from guests and ensuring they are processed correctly.\n\n\
             The menu items are as follows:\n\n<menu_items>\n{menu}\n</menu_items>\n\n\
             You will be given a series of invalid order items. Please suggest a valid alternative \
             for each item. These suggestions will be given to the employee who took the order.\n\n\
             If no suggestions are possible, mark that item as \"No suggestions available\".\n\n\
             The `reason` field in the invalid item will tell you why the item is invalid.\n\
             - If an item is not on the menu, you should suggest the closest menu item of the same category.\n\
             - If an item is out of stock, you should suggest the closest menu item that is in stock of the same category.\n\
             - If there are invalid modifications, you should suggest the closest modifications for that menu item or suggest no modifications.\n\n\
             Here are the invalid items:\n\n<invalid_items>\n{items}\n</invalid_items>\n",
            menu = self.catalog.menu_text(),
            items = rendered_items,
        )
    }
}

//! Deterministic stand-in for the hosted reasoning engine.
//!
//! Token-scanning intent extraction over the guest's utterance: room number,
//! quantities, catalog item names, and `with …` modification phrases. Keeps
//! the binary fully operable offline; the orchestrator neither knows nor
//! cares which engine sits behind the trait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use concierge_agent::{Message, ReasoningEngine, Reply, ToolCallRequest, ToolDescriptor};
use concierge_core::{
    Catalog, InvalidItem, InvalidReason, OrderItem, Status, Suggestion, SuggestionModel,
    SuggestionModelError, SuggestionsReply, ValidationDetails, ValidationResult,
};
use serde_json::json;

pub struct FrontDeskEngine {
    catalog: Arc<Catalog>,
    next_call: AtomicU64,
}

impl FrontDeskEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog, next_call: AtomicU64::new(0) }
    }

    fn call_id(&self) -> String {
        let seq = self.next_call.fetch_add(1, Ordering::Relaxed) + 1;
        format!("frontdesk-{seq}")
    }

    fn reply_to_user(&self, history: &[Message], content: &str) -> Reply {
        let lower = content.to_lowercase();

        if is_confirmation(&lower) && last_validation_succeeded(history) {
            return Reply {
                text: String::new(),
                tool_calls: vec![ToolCallRequest {
                    name: "order_placer".to_owned(),
                    arguments: json!({}),
                    call_id: self.call_id(),
                }],
            };
        }

        let room = extract_room(&lower).or_else(|| room_from_history(history));
        let items = extract_items(&self.catalog, &lower);

        match (room, items.is_empty()) {
            (Some(room), false) => Reply {
                text: String::new(),
                tool_calls: vec![ToolCallRequest {
                    name: "order_validator".to_owned(),
                    arguments: json!({ "order": { "room": room, "items": items } }),
                    call_id: self.call_id(),
                }],
            },
            (None, false) => {
                Reply::text_only("Which room number should we deliver to?")
            }
            (Some(_), true) => {
                Reply::text_only("What would you like to order? You can ask for the menu any time.")
            }
            (None, true) => Reply::text_only(
                "Could you share your room number and what you would like to order?",
            ),
        }
    }

    fn reply_after_tools(&self, history: &[Message]) -> Reply {
        let Some(content) = last_tool_content(history) else {
            return Reply::text_only("How may I assist you today?");
        };

        if content.starts_with("Order placed successfully") {
            let order_id = field_after(content, "order ID ").unwrap_or("unknown");
            let eta = field_after(content, "delivery time of ").unwrap_or("a few");
            return Reply::text_only(format!(
                "Your order has been placed. Order ID {order_id}, arriving in about {eta} minutes."
            ));
        }
        if content.starts_with("Order failed to place") {
            return Reply::text_only(format!(
                "I'm sorry, the kitchen couldn't take that just now. {content} \
                 Your order is still validated; say 'confirm' to try again."
            ));
        }
        if content.starts_with("Error:") {
            return Reply::text_only(format!(
                "I ran into a problem with that request. {content} \
                 Could you give me the room number and order again?"
            ));
        }

        match serde_json::from_str::<ValidationResult>(content) {
            Ok(result) => self.present_validation(&result),
            Err(_) => Reply::text_only(content.to_owned()),
        }
    }

    fn present_validation(&self, result: &ValidationResult) -> Reply {
        if result.status == Status::Success {
            let total = result.total_price.as_deref().unwrap_or("the listed price");
            let prep = result.preparation_time.unwrap_or_default();
            return Reply::text_only(format!(
                "Your order comes to {total} and should take about {prep} minutes to prepare. \
                 Say 'confirm' to place it."
            ));
        }

        let mut lines = vec!["I couldn't validate that order:".to_owned()];
        if let ValidationDetails::Failure(details) = &result.details {
            if !details.room.is_valid() {
                lines.push("- The room number doesn't look right.".to_owned());
            }
            for item in &details.invalid_items {
                lines.push(format!("- {}: {}.", item.name, item.reason));
            }
            for suggestion in &details.suggestions {
                lines.push(format!("  Suggestion: {}", suggestion.suggestion));
            }
        }
        lines.push("Could you adjust the order and try again?".to_owned());
        Reply::text_only(lines.join("\n"))
    }
}

#[async_trait]
impl ReasoningEngine for FrontDeskEngine {
    async fn infer(
        &self,
        _system_prompt: &str,
        history: &[Message],
        _tools: &[ToolDescriptor],
    ) -> Result<Reply> {
        Ok(match history.last() {
            Some(Message::Tool { .. }) => self.reply_after_tools(history),
            Some(Message::User { content }) => self.reply_to_user(history, content),
            _ => Reply::text_only(
                "How may I assist you today? Please share your room number and order.",
            ),
        })
    }
}

#[async_trait]
impl SuggestionModel for FrontDeskEngine {
    async fn suggest_fixes(&self, prompt: &str) -> Result<SuggestionsReply, SuggestionModelError> {
        let payload = prompt
            .split("<invalid_items>")
            .nth(1)
            .and_then(|rest| rest.split("</invalid_items>").next())
            .ok_or(SuggestionModelError::Malformed)?;
        let invalid_items: Vec<InvalidItem> =
            serde_json::from_str(payload.trim()).map_err(|_| SuggestionModelError::Malformed)?;

        let suggestions = invalid_items.into_iter().map(|item| self.fix_for(item)).collect();
        Ok(SuggestionsReply { suggestions })
    }
}

impl FrontDeskEngine {
    fn fix_for(&self, item: InvalidItem) -> Suggestion {
        match item.reason {
            InvalidReason::OutOfStock => {
                let available = item.valid_quantity.unwrap_or(0);
                if available > 0 {
                    let fixed = OrderItem::new(item.name.clone(), available);
                    Suggestion {
                        suggestion: format!(
                            "Only {available} of these are available right now; reduce the \
                             quantity to {available}."
                        ),
                        fixed_item: Some(fixed),
                        original_item: item,
                    }
                } else {
                    self.closest_alternative(item)
                }
            }
            InvalidReason::NotOnMenu => self.closest_alternative(item),
            InvalidReason::InvalidModifications => {
                let quantity = item.valid_quantity.unwrap_or(1);
                let keep = item.valid_modifications.clone().unwrap_or_default();
                let suggestion = if keep.is_empty() {
                    "None of those modifications are available; order the item unmodified."
                        .to_owned()
                } else {
                    format!("Keep only the available modifications: {}.", keep.join(", "))
                };
                Suggestion {
                    suggestion,
                    fixed_item: Some(
                        OrderItem::new(item.name.clone(), quantity).with_modifications(keep),
                    ),
                    original_item: item,
                }
            }
            // The enrichment service fixes these deterministically before the
            // model is consulted; answering anyway keeps the reply well-formed.
            InvalidReason::ModificationsNotAllowed => {
                let quantity = item.valid_quantity.unwrap_or(1);
                Suggestion {
                    suggestion: "This item does not allow modifications; order it plain.".to_owned(),
                    fixed_item: Some(OrderItem::new(item.name.clone(), quantity)),
                    original_item: item,
                }
            }
        }
    }

    /// Closest in-stock menu item by shared name words, if any.
    fn closest_alternative(&self, item: InvalidItem) -> Suggestion {
        let wanted: Vec<String> =
            item.name.to_lowercase().split_whitespace().map(str::to_owned).collect();

        let alternative = self
            .catalog
            .all()
            .iter()
            .filter(|candidate| candidate.available_quantity > 0)
            .find(|candidate| {
                let candidate_name = candidate.name.to_lowercase();
                wanted.iter().any(|word| candidate_name.contains(word.as_str()))
            });

        match alternative {
            Some(menu_item) => Suggestion {
                suggestion: format!(
                    "We can't prepare {}; the closest match on our menu is {}.",
                    item.name, menu_item.name
                ),
                fixed_item: Some(OrderItem::new(menu_item.name.clone(), 1)),
                original_item: item,
            },
            None => Suggestion {
                suggestion: "No suggestions available".to_owned(),
                fixed_item: None,
                original_item: item,
            },
        }
    }
}

/// First whitespace-delimited token following `key` in `content`.
fn field_after<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content
        .split(key)
        .nth(1)
        .and_then(|rest| rest.split([' ', ',']).next())
        .filter(|token| !token.is_empty())
}

fn is_confirmation(lower: &str) -> bool {
    ["yes", "confirm", "place it", "go ahead", "please do", "sounds good"]
        .iter()
        .any(|phrase| lower.contains(phrase))
}

fn last_tool_content(history: &[Message]) -> Option<&str> {
    history.iter().rev().find_map(|message| match message {
        Message::Tool { content, .. } => Some(content.as_str()),
        _ => None,
    })
}

/// Whether the most recent validation verdict in the transcript succeeded.
fn last_validation_succeeded(history: &[Message]) -> bool {
    history
        .iter()
        .rev()
        .filter_map(|message| match message {
            Message::Tool { content, .. } => serde_json::from_str::<ValidationResult>(content).ok(),
            _ => None,
        })
        .map(|result| result.status == Status::Success)
        .next()
        .unwrap_or(false)
}

fn room_from_history(history: &[Message]) -> Option<i64> {
    history.iter().rev().find_map(|message| match message {
        Message::User { content } => extract_room(&content.to_lowercase()),
        _ => None,
    })
}

/// First plausible room number: a number following the word "room", else the
/// first standalone three-digit number.
fn extract_room(lower: &str) -> Option<i64> {
    let tokens = tokenize(lower);
    for (index, token) in tokens.iter().enumerate() {
        if token == "room" {
            if let Some(next) = tokens.get(index + 1) {
                if let Ok(room) = next.parse::<i64>() {
                    return Some(room);
                }
            }
        }
    }
    tokens
        .iter()
        .filter_map(|token| token.parse::<i64>().ok())
        .find(|number| (100..=999).contains(number))
}

fn extract_items(catalog: &Catalog, lower: &str) -> Vec<OrderItem> {
    let mut items = Vec::new();
    for menu_item in catalog.all() {
        let name_lower = menu_item.name.to_lowercase();
        let Some(position) = lower.find(&name_lower) else {
            continue;
        };

        let quantity = quantity_before(lower, position).unwrap_or(1);
        let modifications = modifications_after(lower, position + name_lower.len());
        items.push(
            OrderItem::new(menu_item.name.clone(), quantity).with_modifications(modifications),
        );
    }
    items
}

/// Nearest quantity mention within the three tokens preceding the item name.
fn quantity_before(lower: &str, position: usize) -> Option<u32> {
    let prefix = &lower[..position];
    let tokens = tokenize(prefix);
    tokens.iter().rev().take(3).find_map(|token| parse_quantity(token))
}

fn parse_quantity(token: &str) -> Option<u32> {
    if let Ok(quantity) = token.parse::<u32>() {
        // Three-digit numbers are room numbers, never quantities.
        return (1..100).contains(&quantity).then_some(quantity);
    }
    let value = match token {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(value)
}

/// Captures a `with a, b and c` phrase directly after the item name, split
/// into individual modification strings.
fn modifications_after(lower: &str, position: usize) -> Vec<String> {
    let rest = &lower[position..];
    let Some(after_with) = rest.strip_prefix(" with ") else {
        return Vec::new();
    };

    let phrase = after_with
        .split(['.', ';'])
        .next()
        .unwrap_or_default();
    phrase
        .split(" and ")
        .flat_map(|part| part.split(','))
        .map(|part| part.trim().to_owned())
        .filter(|part| !part.is_empty())
        .collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|character: char| !character.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

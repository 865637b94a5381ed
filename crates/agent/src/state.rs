use concierge_core::{Order, ValidationResult};
use uuid::Uuid;

use crate::llm::ToolCallRequest;

/// One entry in the conversation history. The system prompt is passed to the
/// reasoning engine separately and never stored here.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    User { content: String },
    Assistant { content: String, tool_calls: Vec<ToolCallRequest> },
    Tool { call_id: String, content: String },
}

/// What a tool wants changed in session state. The orchestrator applies one
/// update atomically between tool calls, preserving dispatch ordering.
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub validation: Option<ValidationUpdate>,
}

#[derive(Debug)]
pub enum ValidationUpdate {
    /// Validation succeeded: remember the order so it can be placed.
    Validated { order: Order, result: ValidationResult },
    /// Validation failed: any previously validated order is stale and cleared.
    Rejected { result: ValidationResult },
}

impl StateUpdate {
    pub fn tool_message(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::Tool { call_id: call_id.into(), content: content.into() }],
            validation: None,
        }
    }

    pub fn with_validation(mut self, validation: ValidationUpdate) -> Self {
        self.validation = Some(validation);
        self
    }
}

/// Mutable per-session conversation state. Sessions never share one of these;
/// the catalog is the only thing shared across sessions.
#[derive(Debug)]
pub struct ConversationState {
    session_id: Uuid,
    messages: Vec<Message>,
    validated_order: Option<Order>,
    validation_result: Option<ValidationResult>,
    consecutive_tool_errors: u32,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            messages: Vec::new(),
            validated_order: None,
            validation_result: None,
            consecutive_tool_errors: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn validated_order(&self) -> Option<&Order> {
        self.validated_order.as_ref()
    }

    pub fn validation_result(&self) -> Option<&ValidationResult> {
        self.validation_result.as_ref()
    }

    pub fn consecutive_tool_errors(&self) -> u32 {
        self.consecutive_tool_errors
    }

    /// Increments the consecutive-failure counter and returns the new count.
    pub fn record_tool_error(&mut self) -> u32 {
        self.consecutive_tool_errors += 1;
        self.consecutive_tool_errors
    }

    /// Any tool success resets the failure streak.
    pub fn reset_tool_errors(&mut self) {
        self.consecutive_tool_errors = 0;
    }

    pub fn apply(&mut self, update: StateUpdate) {
        match update.validation {
            Some(ValidationUpdate::Validated { order, result }) => {
                self.validated_order = Some(order);
                self.validation_result = Some(result);
            }
            Some(ValidationUpdate::Rejected { result }) => {
                self.validated_order = None;
                self.validation_result = Some(result);
            }
            None => {}
        }
        self.messages.extend(update.messages);
    }

    /// The most recent assistant text, for the driver to print.
    pub fn latest_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|message| match message {
            Message::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

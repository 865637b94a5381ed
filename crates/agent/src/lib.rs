//! Agent Runtime - tool-calling orchestration for room service orders
//!
//! This crate drives a guest conversation end to end:
//! - Calls the reasoning engine with history, system prompt, and tool catalog
//! - Detects tool-call requests and dispatches them sequentially
//! - Applies tool state updates between calls (validated order, verdicts)
//! - Escalates to a human after repeated consecutive tool failures
//!
//! # Architecture
//!
//! One turn follows a small state machine:
//! 1. **Awaiting reasoning** (`orchestrator`) - engine reply or tool requests
//! 2. **Dispatching tools** (`tools`) - validator/placer run in request order
//! 3. Loop back, or **terminal** once a reply carries no tool calls
//!
//! # Key Types
//!
//! - `Orchestrator` - per-session turn loop (see `orchestrator` module)
//! - `ReasoningEngine` - pluggable capability trait for the model vendor
//! - `FulfillmentGateway` - pluggable capability trait for order placement
//!
//! # Safety Principle
//!
//! The reasoning engine is strictly a translator. Whether an order is valid,
//! and whether it may be placed, are deterministic decisions made by the
//! validation engine and the session-state contract - never by the model.

pub mod gateway;
pub mod llm;
pub mod orchestrator;
pub mod state;
pub mod tools;

pub use gateway::{FulfillmentGateway, OrderSequence, PlacementOutcome, SimulatedGateway};
pub use llm::{ReasoningEngine, Reply, ToolCallRequest, ToolDescriptor};
pub use orchestrator::{
    Orchestrator, SessionError, TurnOutcome, MAX_CONSECUTIVE_TOOL_ERRORS,
};
pub use state::{ConversationState, Message, StateUpdate, ValidationUpdate};
pub use tools::{OrderPlacerTool, OrderValidatorTool, Tool, ToolRegistry};

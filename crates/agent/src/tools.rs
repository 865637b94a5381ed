use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use concierge_core::{ContractViolation, Order, OrderItem, OrderValidator};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::gateway::{FulfillmentGateway, PlacementOutcome};
use crate::llm::ToolDescriptor;
use crate::state::{ConversationState, StateUpdate, ValidationUpdate};

/// An executable capability exposed to the reasoning engine. Tools read
/// session state and describe their effects as a [`StateUpdate`]; they never
/// mutate state directly.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> Value;

    async fn execute(
        &self,
        arguments: Value,
        call_id: &str,
        state: &ConversationState,
    ) -> Result<StateUpdate>;
}

/// Static name → capability mapping. A lookup miss is a configuration defect,
/// not a user error, and is surfaced as a [`ContractViolation`].
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Tool, ContractViolation> {
        self.tools
            .get(name)
            .map(|tool| &**tool)
            .ok_or_else(|| ContractViolation::UnknownTool(name.to_owned()))
    }

    /// Tool surface for the reasoning engine, in stable name order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> = self
            .tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name(),
                description: tool.description(),
                parameters: tool.parameters(),
            })
            .collect();
        descriptors.sort_by_key(|descriptor| descriptor.name);
        descriptors
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ValidatorArgs {
    order: OrderDraft,
}

/// Raw order shape as the reasoning engine sends it; promoted to an [`Order`]
/// (and range-checked) before validation runs.
#[derive(Debug, Deserialize)]
struct OrderDraft {
    room: i64,
    items: Vec<OrderItem>,
}

/// Validates a candidate order and records the verdict in session state.
pub struct OrderValidatorTool {
    validator: Arc<OrderValidator>,
}

impl OrderValidatorTool {
    pub fn new(validator: Arc<OrderValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Tool for OrderValidatorTool {
    fn name(&self) -> &'static str {
        "order_validator"
    }

    fn description(&self) -> &'static str {
        "Validates a room service order against menu items and room constraints. \
         This tool should be called only once per order."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "required": ["order"],
            "properties": {
                "order": {
                    "type": "object",
                    "required": ["room", "items"],
                    "properties": {
                        "room": { "type": "integer", "minimum": 100, "maximum": 399 },
                        "items": {
                            "type": "array",
                            "minItems": 1,
                            "items": {
                                "type": "object",
                                "required": ["name", "quantity"],
                                "properties": {
                                    "name": { "type": "string" },
                                    "quantity": { "type": "integer", "minimum": 1 },
                                    "modifications": {
                                        "type": "array",
                                        "items": { "type": "string" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    async fn execute(
        &self,
        arguments: Value,
        call_id: &str,
        _state: &ConversationState,
    ) -> Result<StateUpdate> {
        let args: ValidatorArgs =
            serde_json::from_value(arguments).context("order_validator arguments did not parse")?;
        let order = Order::new(args.order.room, args.order.items)?;

        info!(room = order.room(), call_id, "validating candidate order");
        let result = self.validator.validate(&order).await;
        let content = serde_json::to_string_pretty(&result)
            .context("validation result failed to serialize")?;

        let validation = if result.is_success() {
            ValidationUpdate::Validated { order, result }
        } else {
            ValidationUpdate::Rejected { result }
        };
        Ok(StateUpdate::tool_message(call_id, content).with_validation(validation))
    }
}

/// Places the currently validated order with the fulfillment gateway.
pub struct OrderPlacerTool {
    gateway: Arc<dyn FulfillmentGateway>,
}

impl OrderPlacerTool {
    pub fn new(gateway: Arc<dyn FulfillmentGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for OrderPlacerTool {
    fn name(&self) -> &'static str {
        "order_placer"
    }

    fn description(&self) -> &'static str {
        "Places a validated order with the room service system. Any order should first be \
         validated with the `order_validator` tool and then confirmed by the user."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(
        &self,
        _arguments: Value,
        call_id: &str,
        state: &ConversationState,
    ) -> Result<StateUpdate> {
        // The agent must never be able to place an unvalidated order; the
        // gateway is not called unless both halves are present and successful.
        let order = match (state.validated_order(), state.validation_result()) {
            (Some(order), Some(result)) if result.is_success() => order,
            _ => return Err(ContractViolation::UnvalidatedPlacement.into()),
        };

        info!(room = order.room(), call_id, "placing validated order");
        let content = match self.gateway.place(order).await {
            PlacementOutcome::Accepted { order_id, eta_minutes, .. } => format!(
                "Order placed successfully. Inform the user of their order ID {order_id} and \
                 estimated delivery time of {eta_minutes} minutes."
            ),
            // Placement failed, but the validated order is kept so the user
            // can retry without revalidating.
            PlacementOutcome::Rejected { message } => {
                format!("Order failed to place with error: {message}.")
            }
        };
        Ok(StateUpdate::tool_message(call_id, content))
    }
}

#[cfg(test)]
mod tests {
    use concierge_core::{
        default_catalog, Catalog, SuggestionModel, SuggestionModelError, SuggestionService,
        SuggestionsReply,
    };

    use super::*;
    use crate::state::Message;

    struct SilentModel;

    #[async_trait]
    impl SuggestionModel for SilentModel {
        async fn suggest_fixes(
            &self,
            _prompt: &str,
        ) -> Result<SuggestionsReply, SuggestionModelError> {
            Err(SuggestionModelError::Malformed)
        }
    }

    struct StubGateway {
        outcome: PlacementOutcome,
    }

    #[async_trait]
    impl FulfillmentGateway for StubGateway {
        async fn place(&self, _order: &Order) -> PlacementOutcome {
            self.outcome.clone()
        }
    }

    fn validator_tool() -> OrderValidatorTool {
        let catalog: Arc<Catalog> = Arc::new(default_catalog());
        let suggestions = SuggestionService::new(catalog.clone(), Arc::new(SilentModel));
        OrderValidatorTool::new(Arc::new(OrderValidator::new(catalog, suggestions)))
    }

    fn accepted_gateway() -> Arc<dyn FulfillmentGateway> {
        Arc::new(StubGateway {
            outcome: PlacementOutcome::Accepted {
                order_id: "ORDER-0001".to_owned(),
                eta_minutes: 15,
                total_price: "$15.00".to_owned(),
            },
        })
    }

    fn validated_state() -> ConversationState {
        let mut state = ConversationState::new();
        let order = Order::new(101, vec![OrderItem::new("Club Sandwich", 1)]).expect("order");
        let result = concierge_core::ValidationResult::success(
            101,
            Vec::new(),
            "ok".to_owned(),
            "$15.00".to_owned(),
            15,
        );
        state.apply(StateUpdate::default().with_validation(ValidationUpdate::Validated {
            order,
            result,
        }));
        state
    }

    #[test]
    fn registry_lookup_miss_is_a_contract_violation() {
        let registry = ToolRegistry::default();
        let error = match registry.get("order_validator") {
            Err(error) => error,
            Ok(_) => panic!("lookup must fail on an empty registry"),
        };
        assert_eq!(error, ContractViolation::UnknownTool("order_validator".to_owned()));
    }

    #[test]
    fn descriptors_are_ordered_by_name() {
        let mut registry = ToolRegistry::default();
        registry.register(OrderPlacerTool::new(accepted_gateway()));
        registry.register(validator_tool());

        let names: Vec<&str> =
            registry.descriptors().iter().map(|descriptor| descriptor.name).collect();
        assert_eq!(names, vec!["order_placer", "order_validator"]);
    }

    #[tokio::test]
    async fn validator_tool_stores_successful_validation() {
        let state = ConversationState::new();
        let arguments = json!({
            "order": { "room": 101, "items": [{ "name": "Club Sandwich", "quantity": 1 }] }
        });

        let update =
            validator_tool().execute(arguments, "call-1", &state).await.expect("executes");

        assert!(matches!(update.validation, Some(ValidationUpdate::Validated { .. })));
        let Message::Tool { call_id, content } = &update.messages[0] else {
            panic!("expected tool message");
        };
        assert_eq!(call_id, "call-1");
        assert!(content.contains("\"Success\""));
    }

    #[tokio::test]
    async fn validator_tool_rejects_and_clears_on_failure() {
        let state = ConversationState::new();
        let arguments = json!({
            "order": { "room": 101, "items": [{ "name": "Lobster Roll", "quantity": 1 }] }
        });

        let update =
            validator_tool().execute(arguments, "call-2", &state).await.expect("executes");
        assert!(matches!(update.validation, Some(ValidationUpdate::Rejected { .. })));
    }

    #[tokio::test]
    async fn validator_tool_propagates_room_range_errors() {
        let state = ConversationState::new();
        let arguments = json!({
            "order": { "room": 425, "items": [{ "name": "Club Sandwich", "quantity": 1 }] }
        });

        let error = validator_tool().execute(arguments, "call-3", &state).await;
        assert!(error.is_err(), "room 425 must fail order construction");
    }

    #[tokio::test]
    async fn placer_requires_validated_order_before_touching_gateway() {
        struct PanicGateway;

        #[async_trait]
        impl FulfillmentGateway for PanicGateway {
            async fn place(&self, _order: &Order) -> PlacementOutcome {
                panic!("gateway must not be called without a validated order");
            }
        }

        let tool = OrderPlacerTool::new(Arc::new(PanicGateway));
        let error = tool
            .execute(json!({}), "call-4", &ConversationState::new())
            .await
            .expect_err("placement without validation");
        assert!(error.to_string().contains("order_validator"));
    }

    #[tokio::test]
    async fn placer_reports_order_id_and_eta() {
        let tool = OrderPlacerTool::new(accepted_gateway());
        let update =
            tool.execute(json!({}), "call-5", &validated_state()).await.expect("placement");

        let Message::Tool { content, .. } = &update.messages[0] else {
            panic!("expected tool message");
        };
        assert!(content.contains("ORDER-0001"));
        assert!(content.contains("15 minutes"));
        assert!(update.validation.is_none(), "placement must not touch the validated order");
    }

    #[tokio::test]
    async fn placer_relays_gateway_rejection_and_keeps_state() {
        let tool = OrderPlacerTool::new(Arc::new(StubGateway {
            outcome: PlacementOutcome::Rejected {
                message: "Kitchen is currently at capacity. Please try again in 15 minutes."
                    .to_owned(),
            },
        }));
        let update =
            tool.execute(json!({}), "call-6", &validated_state()).await.expect("tool runs");

        let Message::Tool { content, .. } = &update.messages[0] else {
            panic!("expected tool message");
        };
        assert!(content.contains("Order failed to place"));
        assert!(content.contains("Kitchen is currently at capacity"));
        assert!(update.validation.is_none());
    }
}

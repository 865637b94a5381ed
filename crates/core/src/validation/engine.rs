use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::order::{Order, OrderItem, MAX_ROOM, MIN_ROOM};
use crate::suggestions::SuggestionService;
use crate::validation::types::{
    InvalidItem, RoomVerdict, ValidItem, ValidationResult,
};

/// Validates candidate orders against the catalog and the room scheme.
///
/// `evaluate` is deterministic and side-effect-free; `validate` additionally
/// enriches failures with suggestions.
pub struct OrderValidator {
    catalog: Arc<Catalog>,
    suggestions: SuggestionService,
}

impl OrderValidator {
    pub fn new(catalog: Arc<Catalog>, suggestions: SuggestionService) -> Self {
        Self { catalog, suggestions }
    }

    /// Room scheme: `floor * 100 + unit`, 3 floors, units 0-20 on each floor.
    pub fn room_is_valid(room: u16) -> bool {
        // The Order constructor already bounds the floor; anything else here
        // is a caller contract violation.
        debug_assert!(
            (MIN_ROOM..=MAX_ROOM).contains(&room),
            "room {room} escaped the Order construction contract"
        );
        let unit = room % 100;
        unit <= 20
    }

    /// Checks run in a fixed order and the first failure wins, so every
    /// rejected item carries exactly one reason.
    fn validate_item(&self, item: &OrderItem) -> Result<ValidItem, InvalidItem> {
        let Some(menu_item) = self.catalog.get(&item.name) else {
            return Err(InvalidItem::not_on_menu(item.name.clone()));
        };

        if item.quantity > menu_item.available_quantity {
            return Err(InvalidItem::out_of_stock(
                item.name.clone(),
                menu_item.available_quantity,
                item.quantity - menu_item.available_quantity,
            ));
        }

        if !item.modifications.is_empty() && !menu_item.modifications_allowed {
            return Err(InvalidItem::modifications_not_allowed(
                item.name.clone(),
                item.quantity,
                item.modifications.clone(),
            ));
        }

        if !item.modifications.is_empty() {
            let (valid_mods, invalid_mods): (Vec<String>, Vec<String>) = item
                .modifications
                .iter()
                .cloned()
                .partition(|modification| menu_item.available_modifications.contains(modification));
            if !invalid_mods.is_empty() {
                return Err(InvalidItem::invalid_modifications(
                    item.name.clone(),
                    item.quantity,
                    valid_mods,
                    invalid_mods,
                ));
            }
        }

        Ok(ValidItem {
            name: item.name.clone(),
            valid_quantity: item.quantity,
            valid_modifications: item.modifications.clone(),
        })
    }

    /// Pure validation verdict: SUCCESS iff the room is valid and every item
    /// is valid. No partial acceptance.
    pub fn evaluate(&self, order: &Order) -> ValidationResult {
        let room_ok = Self::room_is_valid(order.room());

        let mut valid_items = Vec::new();
        let mut invalid_items = Vec::new();
        for item in order.items() {
            match self.validate_item(item) {
                Ok(valid) => valid_items.push(valid),
                Err(invalid) => invalid_items.push(invalid),
            }
        }

        if room_ok && invalid_items.is_empty() {
            let totals = self
                .catalog
                .totals_for(valid_items.iter().map(|item| (item.name.as_str(), item.valid_quantity)));
            let total_price = format!("${:.2}", totals.total_price);

            let items_summary = valid_items
                .iter()
                .map(|item| {
                    let mut line = format!("{} {}", item.valid_quantity, item.name);
                    if !item.valid_modifications.is_empty() {
                        line.push_str(" with ");
                        line.push_str(&item.valid_modifications.join(", "));
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join(", ");

            let response = format!(
                "The requested order of {items_summary}, will cost {total_price} and can be \
                 prepared in approximately {prep} minutes. Inform the user of this and request \
                 their confirmation to place this order. The `order_placer` tool may be used to \
                 place this order after confirmation.",
                prep = totals.max_preparation_time,
            );

            ValidationResult::success(
                order.room(),
                valid_items,
                response,
                total_price,
                totals.max_preparation_time,
            )
        } else {
            let room = if room_ok {
                RoomVerdict::valid(order.room())
            } else {
                RoomVerdict::invalid(order.room())
            };

            let mut error_messages = Vec::new();
            let mut error_resolutions = Vec::new();
            if !room.is_valid() {
                error_messages.push("Room number is invalid");
                error_resolutions.push("clarify the room number");
            }
            if !invalid_items.is_empty() {
                error_messages.push("Some requested items cannot be prepared");
                error_resolutions.push("clarify the items they would like to order");
            }
            let response = format!(
                "{}. Please ask the user to {}.",
                error_messages.join(". "),
                error_resolutions.join(" and ")
            );

            ValidationResult::failure(room, valid_items, invalid_items, response)
        }
    }

    /// Full validation: the pure verdict plus suggestion enrichment on the
    /// failure path. Enrichment can never fail validation.
    pub async fn validate(&self, order: &Order) -> ValidationResult {
        debug!(room = order.room(), item_count = order.items().len(), "validating order");
        let mut result = self.evaluate(order);

        if !result.is_success() {
            let invalid_items = result.invalid_items().to_vec();
            let suggestions = self.suggestions.suggest(&invalid_items).await;
            result.attach_suggestions(suggestions);
        }

        info!(
            room = order.room(),
            success = result.is_success(),
            invalid_count = result.invalid_items().len(),
            "order validation finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::catalog::default_catalog;
    use crate::suggestions::{SuggestionModel, SuggestionModelError, SuggestionsReply};
    use crate::validation::types::{InvalidReason, Status, ValidationDetails};

    /// Answers every batch with a per-item "no fix available" suggestion.
    struct EchoModel;

    #[async_trait]
    impl SuggestionModel for EchoModel {
        async fn suggest_fixes(
            &self,
            _prompt: &str,
        ) -> Result<SuggestionsReply, SuggestionModelError> {
            Ok(SuggestionsReply { suggestions: Vec::new() })
        }
    }

    /// Always fails, for asserting enrichment never fails validation.
    struct BrokenModel;

    #[async_trait]
    impl SuggestionModel for BrokenModel {
        async fn suggest_fixes(
            &self,
            _prompt: &str,
        ) -> Result<SuggestionsReply, SuggestionModelError> {
            Err(SuggestionModelError::Call("connection reset".to_owned()))
        }
    }

    fn validator_with(model: Arc<dyn SuggestionModel>) -> OrderValidator {
        let catalog = Arc::new(default_catalog());
        OrderValidator::new(catalog.clone(), SuggestionService::new(catalog, model))
    }

    fn validator() -> OrderValidator {
        validator_with(Arc::new(EchoModel))
    }

    fn order(room: i64, items: Vec<OrderItem>) -> Order {
        Order::new(room, items).expect("test order must construct")
    }

    #[test]
    fn room_predicate_accepts_units_zero_through_twenty() {
        assert!(OrderValidator::room_is_valid(101));
        assert!(OrderValidator::room_is_valid(100));
        assert!(OrderValidator::room_is_valid(220));
        assert!(OrderValidator::room_is_valid(315));
        assert!(OrderValidator::room_is_valid(320));

        assert!(!OrderValidator::room_is_valid(121));
        assert!(!OrderValidator::room_is_valid(199));
        assert!(!OrderValidator::room_is_valid(399));
    }

    #[test]
    fn valid_item_keeps_full_quantity_and_modifications() {
        let result = validator().validate_item(&OrderItem::new("Club Sandwich", 2)
            .with_modifications(vec!["extra bacon".to_owned(), "no tomato".to_owned()]));

        let valid = result.expect("item should validate");
        assert_eq!(valid.valid_quantity, 2);
        assert_eq!(valid.valid_modifications, vec!["extra bacon", "no tomato"]);
    }

    #[test]
    fn unknown_item_is_not_on_menu_even_with_excess_quantity() {
        // Existence is checked before stock, so an unknown item can never be
        // reported as out of stock.
        let result = validator().validate_item(&OrderItem::new("Lobster Roll", 100));
        let invalid = result.expect_err("unknown item");
        assert_eq!(invalid.reason, InvalidReason::NotOnMenu);
        assert_eq!(invalid.valid_quantity, None);
        assert_eq!(invalid.invalid_quantity, None);
    }

    #[test]
    fn out_of_stock_reports_available_and_shortfall() {
        let result = validator().validate_item(&OrderItem::new("French Fries", 100));
        let invalid = result.expect_err("over stock");
        assert_eq!(invalid.reason, InvalidReason::OutOfStock);
        assert_eq!(invalid.valid_quantity, Some(5));
        assert_eq!(invalid.invalid_quantity, Some(95));
    }

    #[test]
    fn modifications_on_locked_item_are_rejected_before_whitelist_check() {
        let result = validator().validate_item(
            &OrderItem::new("Still Water", 1).with_modifications(vec!["extra ice".to_owned()]),
        );
        let invalid = result.expect_err("locked item");
        assert_eq!(invalid.reason, InvalidReason::ModificationsNotAllowed);
        assert_eq!(invalid.valid_quantity, Some(1));
        assert_eq!(invalid.valid_modifications, Some(Vec::new()));
        assert_eq!(invalid.invalid_modifications, Some(vec!["extra ice".to_owned()]));
    }

    #[test]
    fn unknown_modifications_are_partitioned_from_known_ones() {
        let result = validator().validate_item(&OrderItem::new("Club Sandwich", 1)
            .with_modifications(vec!["extra bacon".to_owned(), "add pineapple".to_owned()]));
        let invalid = result.expect_err("bad modification");
        assert_eq!(invalid.reason, InvalidReason::InvalidModifications);
        assert_eq!(invalid.valid_modifications, Some(vec!["extra bacon".to_owned()]));
        assert_eq!(invalid.invalid_modifications, Some(vec!["add pineapple".to_owned()]));
    }

    #[test]
    fn success_totals_sum_prices_and_take_max_preparation_time() {
        let result = validator().evaluate(&order(
            101,
            vec![
                OrderItem::new("Club Sandwich", 2),  // $15.00 x2, 15 min
                OrderItem::new("Still Water", 1),    // $4.00, 1 min
            ],
        ));

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.total_price.as_deref(), Some("$34.00"));
        // Items are prepared concurrently, so the slowest one wins.
        assert_eq!(result.preparation_time, Some(15));
        assert!(result.response.contains("2 Club Sandwich"));
    }

    #[test]
    fn single_bad_item_fails_the_whole_order() {
        let result = validator().evaluate(&order(
            101,
            vec![OrderItem::new("Club Sandwich", 1), OrderItem::new("Lobster Roll", 1)],
        ));

        assert_eq!(result.status, Status::Error);
        assert_eq!(result.total_price, None);
        assert_eq!(result.preparation_time, None);
        let ValidationDetails::Failure(details) = &result.details else {
            panic!("expected failure details");
        };
        assert!(details.room.is_valid());
        assert_eq!(details.valid_items.len(), 1);
        assert_eq!(details.invalid_items.len(), 1);
        assert!(result.response.contains("Some requested items cannot be prepared"));
        assert!(!result.response.contains("Room number is invalid"));
    }

    #[test]
    fn bad_room_and_bad_items_are_both_reported() {
        let result = validator().evaluate(&order(199, vec![OrderItem::new("Lobster Roll", 1)]));

        let ValidationDetails::Failure(details) = &result.details else {
            panic!("expected failure details");
        };
        assert!(!details.room.is_valid());
        assert!(result.response.contains("Room number is invalid"));
        assert!(result.response.contains("Some requested items cannot be prepared"));
        assert!(result
            .response
            .contains("clarify the room number and clarify the items they would like to order"));
    }

    #[tokio::test]
    async fn failure_path_attaches_deterministic_suggestions() {
        let result = validator()
            .validate(&order(
                101,
                vec![OrderItem::new("Still Water", 1)
                    .with_modifications(vec!["extra ice".to_owned()])],
            ))
            .await;

        assert_eq!(result.status, Status::Error);
        let ValidationDetails::Failure(details) = &result.details else {
            panic!("expected failure details");
        };
        assert_eq!(details.suggestions.len(), 1);
        let fixed = details.suggestions[0].fixed_item.as_ref().expect("strip-mods repair");
        assert!(fixed.modifications.is_empty());
        assert!(result.response.contains("Suggested alternatives"));
    }

    #[tokio::test]
    async fn enrichment_failure_never_fails_validation() {
        let result = validator_with(Arc::new(BrokenModel))
            .validate(&order(101, vec![OrderItem::new("Lobster Roll", 1)]))
            .await;

        assert_eq!(result.status, Status::Error);
        let ValidationDetails::Failure(details) = &result.details else {
            panic!("expected failure details");
        };
        assert!(details.suggestions.is_empty());
        assert!(!result.response.contains("Suggested alternatives"));
    }

    #[tokio::test]
    async fn success_path_never_calls_enrichment() {
        let result = validator_with(Arc::new(BrokenModel))
            .validate(&order(101, vec![OrderItem::new("Club Sandwich", 1)]))
            .await;

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.total_price.as_deref(), Some("$15.00"));
        assert_eq!(result.preparation_time, Some(15));
    }

    #[test]
    fn suggestion_shapes_survive_reason_partition() {
        // A failure with mixed reasons keeps per-item reason exclusivity.
        let result = validator().evaluate(&order(
            101,
            vec![
                OrderItem::new("Lobster Roll", 1),
                OrderItem::new("French Fries", 9),
                OrderItem::new("Still Water", 1)
                    .with_modifications(vec!["extra ice".to_owned()]),
            ],
        ));

        let reasons: Vec<InvalidReason> =
            result.invalid_items().iter().map(|item| item.reason).collect();
        assert_eq!(
            reasons,
            vec![
                InvalidReason::NotOnMenu,
                InvalidReason::OutOfStock,
                InvalidReason::ModificationsNotAllowed,
            ]
        );
    }
}

use thiserror::Error;

/// Programming or integration errors, never user errors. These fail loudly
/// and abort the operation instead of being retried or degraded.
///
/// A third violation class (a validation detail carrying both or neither
/// room verdict) is unrepresentable here because `RoomVerdict` is a sum type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("no tool named `{0}` is registered")]
    UnknownTool(String),
    #[error(
        "cannot place an order without a validated order and a successful validation result; \
         validate with the `order_validator` tool first"
    )]
    UnvalidatedPlacement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_render_actionable_messages() {
        let unknown = ContractViolation::UnknownTool("table_reserver".to_owned());
        assert!(unknown.to_string().contains("table_reserver"));

        let unvalidated = ContractViolation::UnvalidatedPlacement;
        assert!(unvalidated.to_string().contains("order_validator"));
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use concierge_core::config::GatewayConfig;
use concierge_core::{Catalog, Order};
use rand::Rng;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Placement verdict from the fulfillment side. Transient gateway failures
/// (connectivity, kitchen overload) are folded into `Rejected` at this
/// boundary; they never cross it as errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlacementOutcome {
    Accepted { order_id: String, eta_minutes: u32, total_price: String },
    Rejected { message: String },
}

/// External collaborator that accepts a validated order.
#[async_trait]
pub trait FulfillmentGateway: Send + Sync {
    async fn place(&self, order: &Order) -> PlacementOutcome;
}

/// Monotonic order-id source owned by one gateway instance, so independent
/// gateways (and tests) never interfere with each other's numbering.
#[derive(Debug, Default)]
pub struct OrderSequence {
    next: AtomicU64,
}

impl OrderSequence {
    pub fn next_id(&self) -> String {
        let seq = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("ORDER-{seq:04}")
    }
}

/// Stand-in for the property-management fulfillment API: simulated network
/// latency and load shedding, with pricing and ETA recomputed from the
/// catalog rather than trusted from the caller.
pub struct SimulatedGateway {
    catalog: Arc<Catalog>,
    sequence: OrderSequence,
    simulate_failures: bool,
    simulate_latency: bool,
}

impl SimulatedGateway {
    pub fn new(catalog: Arc<Catalog>, sequence: OrderSequence, config: &GatewayConfig) -> Self {
        Self {
            catalog,
            sequence,
            simulate_failures: config.simulate_failures,
            simulate_latency: config.simulate_latency,
        }
    }
}

#[async_trait]
impl FulfillmentGateway for SimulatedGateway {
    async fn place(&self, order: &Order) -> PlacementOutcome {
        if self.simulate_latency {
            // Rolled before the await: the rng handle must not live across it.
            let delay_ms = rand::thread_rng().gen_range(100..=500);
            debug!(delay_ms, "simulating gateway latency");
            sleep(Duration::from_millis(delay_ms)).await;
        }

        if self.simulate_failures {
            let (connect_roll, overload_roll) = {
                let mut rng = rand::thread_rng();
                (rng.gen::<f64>(), rng.gen::<f64>())
            };
            if connect_roll < 0.10 {
                warn!(room = order.room(), "simulated gateway connection failure");
                return PlacementOutcome::Rejected {
                    message: "Failed to connect to the room service system".to_owned(),
                };
            }
            if overload_roll < 0.05 {
                warn!(room = order.room(), "simulated kitchen overload");
                return PlacementOutcome::Rejected {
                    message: "Kitchen is currently at capacity. Please try again in 15 minutes."
                        .to_owned(),
                };
            }
        }

        let totals = self
            .catalog
            .totals_for(order.items().iter().map(|item| (item.name.as_str(), item.quantity)));
        let order_id = self.sequence.next_id();
        info!(
            %order_id,
            room = order.room(),
            eta_minutes = totals.max_preparation_time,
            "order accepted by gateway"
        );

        PlacementOutcome::Accepted {
            order_id,
            eta_minutes: totals.max_preparation_time,
            total_price: format!("${:.2}", totals.total_price),
        }
    }
}

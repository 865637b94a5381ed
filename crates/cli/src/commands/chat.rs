use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use concierge_agent::{
    ConversationState, Orchestrator, OrderPlacerTool, OrderSequence, OrderValidatorTool,
    SimulatedGateway, ToolRegistry, TurnOutcome,
};
use concierge_core::{default_catalog, AppConfig, Catalog, OrderValidator, SuggestionService};
use tracing::info;

use crate::frontdesk::FrontDeskEngine;

/// Line-oriented chat driver: reads user utterances from stdin and prints the
/// latest assistant message per turn.
pub async fn run(config: &AppConfig) -> Result<()> {
    let catalog: Arc<Catalog> = Arc::new(default_catalog());

    let engine = FrontDeskEngine::new(catalog.clone());
    let suggestions =
        SuggestionService::new(catalog.clone(), Arc::new(FrontDeskEngine::new(catalog.clone())));
    let validator = Arc::new(OrderValidator::new(catalog.clone(), suggestions));
    let gateway = Arc::new(SimulatedGateway::new(
        catalog.clone(),
        OrderSequence::default(),
        &config.gateway,
    ));

    let mut registry = ToolRegistry::default();
    registry.register(OrderValidatorTool::new(validator));
    registry.register(OrderPlacerTool::new(gateway));

    let orchestrator = Orchestrator::new(engine, registry, catalog);
    let mut state = ConversationState::new();
    info!(
        session_id = %state.session_id(),
        model = %config.llm.model,
        "chat session started with the deterministic front-desk engine"
    );

    println!("Welcome to Room Service! Type 'quit' to exit.");
    println!("How may I assist you today?");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let input = line?.trim().to_owned();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "bye") {
            println!("\nThank you for using Room Service. Have a great day!");
            break;
        }

        match orchestrator.run_turn(&mut state, &input).await {
            Ok(TurnOutcome::Completed { reply }) => println!("\nAgent: {reply}"),
            Ok(TurnOutcome::SessionFailed { directive }) => {
                println!("\nAgent: {directive}");
                break;
            }
            Err(error) => {
                eprintln!("\nError: {error}");
                println!("Please try again.");
            }
        }
    }

    Ok(())
}

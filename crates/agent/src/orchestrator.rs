use std::sync::Arc;

use concierge_core::{Catalog, ContractViolation};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::llm::{ReasoningEngine, ToolCallRequest};
use crate::state::{ConversationState, Message};
use crate::tools::ToolRegistry;

/// Consecutive tool failures allowed before the session is declared
/// unrecoverable. No automatic retry of tool calls happens below this.
pub const MAX_CONSECUTIVE_TOOL_ERRORS: u32 = 3;

const ESCALATION_DIRECTIVE: &str =
    "I'm having repeated trouble processing this request. Please contact the front desk so a \
     member of staff can assist you directly.";

/// How one turn ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reasoning engine produced a reply with no further tool calls.
    Completed { reply: String },
    /// Too many consecutive tool failures: the session is dead and the user
    /// is directed to a human.
    SessionFailed { directive: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Programming/configuration defect; aborts the turn loudly.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    #[error("reasoning engine call failed: {0}")]
    Reasoning(String),
}

/// Turn phases. One turn starts at `AwaitingReasoning` and ends the first
/// time a reply arrives with no tool-call requests.
enum Phase {
    AwaitingReasoning,
    DispatchingTools(Vec<ToolCallRequest>),
    Terminal,
}

/// Drives one session's conversation: reasoning call, tool-call detection,
/// sequential tool dispatch, loop or terminate.
pub struct Orchestrator<E> {
    engine: E,
    registry: ToolRegistry,
    catalog: Arc<Catalog>,
}

impl<E> Orchestrator<E>
where
    E: ReasoningEngine,
{
    pub fn new(engine: E, registry: ToolRegistry, catalog: Arc<Catalog>) -> Self {
        Self { engine, registry, catalog }
    }

    /// Runs a single user turn to completion. Control returns to the caller
    /// once the engine replies without tool calls; the next utterance starts
    /// a fresh turn on the same state.
    pub async fn run_turn(
        &self,
        state: &mut ConversationState,
        user_text: &str,
    ) -> Result<TurnOutcome, SessionError> {
        state.push_message(Message::User { content: user_text.to_owned() });

        let system_prompt = self.system_prompt();
        let descriptors = self.registry.descriptors();
        let mut phase = Phase::AwaitingReasoning;

        loop {
            match phase {
                Phase::AwaitingReasoning => {
                    let reply = self
                        .engine
                        .infer(&system_prompt, state.messages(), &descriptors)
                        .await
                        .map_err(|source| SessionError::Reasoning(source.to_string()))?;

                    debug!(
                        session_id = %state.session_id(),
                        tool_calls = reply.tool_calls.len(),
                        "reasoning step produced"
                    );
                    let tool_calls = reply.tool_calls.clone();
                    state.push_message(Message::Assistant {
                        content: reply.text,
                        tool_calls: reply.tool_calls,
                    });

                    phase = if tool_calls.is_empty() {
                        Phase::Terminal
                    } else {
                        Phase::DispatchingTools(tool_calls)
                    };
                }
                Phase::DispatchingTools(calls) => {
                    // Strictly sequential: tool effects are sequenced onto the
                    // same state and must not race.
                    for call in calls {
                        let tool = self.registry.get(&call.name)?;
                        match tool.execute(call.arguments.clone(), &call.call_id, state).await {
                            Ok(update) => {
                                state.apply(update);
                                state.reset_tool_errors();
                            }
                            Err(failure) => {
                                let streak = state.record_tool_error();
                                warn!(
                                    session_id = %state.session_id(),
                                    tool = %call.name,
                                    call_id = %call.call_id,
                                    streak,
                                    "tool call failed: {failure:#}"
                                );
                                state.push_message(Message::Tool {
                                    call_id: call.call_id.clone(),
                                    content: format!("Error: {failure:#}"),
                                });
                                if streak >= MAX_CONSECUTIVE_TOOL_ERRORS {
                                    error!(
                                        session_id = %state.session_id(),
                                        streak,
                                        "consecutive tool failures exceeded limit, ending session"
                                    );
                                    return Ok(TurnOutcome::SessionFailed {
                                        directive: ESCALATION_DIRECTIVE.to_owned(),
                                    });
                                }
                            }
                        }
                    }
                    phase = Phase::AwaitingReasoning;
                }
                Phase::Terminal => {
                    let reply = state.latest_assistant_text().unwrap_or_default().to_owned();
                    info!(session_id = %state.session_id(), "turn completed");
                    return Ok(TurnOutcome::Completed { reply });
                }
            }
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a senior room service attendant at a 5-star hotel. You are responsible for \
             taking orders from guests and ensuring they are processed correctly.\n\n\
             Start the conversation by asking the guest for their room number and order.\n\n\
             Rules:\n\
             - You may only call one tool at a time.\n\
             - You must ask the user for more information if you do not have enough information \
             to call a tool.\n\n\
             For reference, here is the current menu:\n<menu>\n{menu}</menu>\n",
            menu = self.catalog.menu_text()
        )
    }
}

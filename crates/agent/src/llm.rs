use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::state::Message;

/// A structured instruction from the reasoning engine naming a capability
/// and the arguments to invoke it with.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Value,
    pub call_id: String,
}

/// One reasoning step: free text plus zero or more tool-call requests.
/// An empty `tool_calls` list ends the turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reply {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Reply {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), tool_calls: Vec::new() }
    }
}

/// Tool surface advertised to the reasoning engine.
#[derive(Clone, Debug)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Opaque reasoning capability: given history plus the tool catalog, produce
/// a reply or tool-call requests. Kept narrow so any vendor client (or a
/// deterministic stub) can sit behind it.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn infer(
        &self,
        system_prompt: &str,
        history: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<Reply>;
}

use crate::agent::prompt::render_scaffold;
use crate::agent::step::{AgentStep, Transcript, parse_step};
use crate::traits::{ChatMessage, ChatRequest, Provider, ToolSpec};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;

/// Stops generation before the model writes its own observation.
const STOP_SEQUENCES: &[&str] = &["\nObservation:"];

/// Decides the next step of a planning run from the transcript so far.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn next_step(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
    ) -> anyhow::Result<AgentStep>;
}

/// Drives a chat [`Provider`] with the ReAct text protocol.
pub struct ProviderEngine {
    provider: Arc<dyn Provider>,
}

impl ProviderEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ReasoningEngine for ProviderEngine {
    async fn next_step(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
    ) -> anyhow::Result<AgentStep> {
        let messages = [ChatMessage::user(render_scaffold(tools, transcript))];
        let request = ChatRequest {
            messages: &messages,
            stop: STOP_SEQUENCES,
        };

        let response = self.provider.chat(request).await?;
        let text = response.text_or_empty();
        trace!(provider = self.provider.name(), reply = text, "engine reply");

        if text.trim().is_empty() {
            return Ok(AgentStep::malformed(text, "empty response"));
        }

        Ok(parse_step(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ChatResponse, ToolInvocation, ToolKind};
    use std::sync::Mutex;

    struct CannedProvider {
        reply: Option<String>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Provider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
            assert_eq!(request.stop, STOP_SEQUENCES);
            self.seen
                .lock()
                .unwrap()
                .extend(request.messages.iter().map(|m| m.content.clone()));
            Ok(ChatResponse {
                text: self.reply.clone(),
            })
        }
    }

    fn specs() -> Vec<ToolSpec> {
        vec![ToolSpec {
            kind: ToolKind::Search,
            name: "search".to_string(),
            description: "web search".to_string(),
        }]
    }

    #[tokio::test]
    async fn sends_scaffold_and_parses_reply() {
        let provider = Arc::new(CannedProvider {
            reply: Some(" I should search.\nAction: search\nAction Input: ryokan Kyoto".to_string()),
            seen: Mutex::new(Vec::new()),
        });
        let engine = ProviderEngine::new(provider.clone());

        let step = engine
            .next_step(&Transcript::new("Kyoto in April"), &specs())
            .await
            .unwrap();

        assert_eq!(
            step,
            AgentStep::Action {
                thought: "I should search.".to_string(),
                invocation: ToolInvocation::new(ToolKind::Search, "ryokan Kyoto"),
            }
        );
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("Question: Kyoto in April"));
    }

    #[tokio::test]
    async fn empty_reply_is_malformed() {
        let engine = ProviderEngine::new(Arc::new(CannedProvider {
            reply: None,
            seen: Mutex::new(Vec::new()),
        }));
        let step = engine
            .next_step(&Transcript::new("x"), &specs())
            .await
            .unwrap();
        assert!(matches!(step, AgentStep::Malformed { .. }));
    }
}

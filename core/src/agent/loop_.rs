use crate::agent::ToolRegistry;
use crate::agent::engine::ReasoningEngine;
use crate::agent::prompt::build_travel_prompt;
use crate::agent::step::{AgentStep, Transcript, Turn, TurnAction};
use crate::error::PlanError;
use crate::traits::ToolInvocation;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Progress of a run, for front ends that show the loop as it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Thought(String),
    Action(ToolInvocation),
    Observation(String),
    Correction(String),
    Finished { iterations: usize },
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub answer: String,
    pub transcript: Transcript,
    pub iterations: usize,
}

pub struct PlanOrchestrator {
    engine: Arc<dyn ReasoningEngine>,
    tool_registry: Arc<ToolRegistry>,
    max_iterations: usize,
    events: Option<UnboundedSender<LoopEvent>>,
}

impl PlanOrchestrator {
    pub fn new(engine: Arc<dyn ReasoningEngine>, tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            engine,
            tool_registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            events: None,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<LoopEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: LoopEvent) {
        if let Some(events) = &self.events {
            // A closed receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }

    /// Plans a trip from the raw request text and returns the final plan.
    pub async fn plan(&self, request: &str) -> Result<String, PlanError> {
        let outcome = self.run(build_travel_prompt(request)).await?;
        Ok(outcome.answer)
    }

    pub async fn run(&self, instruction: impl Into<String>) -> Result<PlanOutcome, PlanError> {
        if self.tool_registry.is_empty() {
            return Err(PlanError::NoTools);
        }

        let tools = self.tool_registry.get_specs();
        let mut transcript = Transcript::new(instruction);
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            debug!(iteration = iterations, turns = transcript.len(), "requesting next step");

            let step = self
                .engine
                .next_step(&transcript, &tools)
                .await
                .map_err(PlanError::Engine)?;

            match step {
                AgentStep::Final { thought, answer } => {
                    if !thought.is_empty() {
                        self.emit(LoopEvent::Thought(thought));
                    }
                    info!(iterations, corrections = transcript.corrections(), "plan complete");
                    self.emit(LoopEvent::Finished { iterations });
                    return Ok(PlanOutcome {
                        answer,
                        transcript,
                        iterations,
                    });
                }
                AgentStep::Action {
                    thought,
                    invocation,
                } => {
                    if !thought.is_empty() {
                        self.emit(LoopEvent::Thought(thought.clone()));
                    }
                    self.emit(LoopEvent::Action(invocation.clone()));

                    let observation = self.tool_registry.execute(&invocation).await;
                    self.emit(LoopEvent::Observation(observation.clone()));

                    transcript.push(Turn {
                        thought,
                        action: TurnAction::Tool(invocation),
                        observation,
                    });
                }
                AgentStep::Malformed { raw, reason } => {
                    warn!(iteration = iterations, %reason, "engine step could not be parsed");
                    let observation = self.correction(&reason);
                    self.emit(LoopEvent::Correction(reason));

                    transcript.push(Turn {
                        thought: String::new(),
                        action: TurnAction::Invalid(raw),
                        observation,
                    });
                }
            }
        }

        warn!(iterations, "iteration limit reached without a final answer");
        Err(PlanError::Incomplete { iterations })
    }

    fn correction(&self, reason: &str) -> String {
        format!(
            "Invalid format: {}. Could not parse your last step. Either reply with 'Action:' (one of [{}]) followed by 'Action Input:', or with 'Final Answer:' followed by the complete plan.",
            reason,
            self.tool_registry.tool_names().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::step::parse_step;
    use crate::tools::WeatherTool;
    use crate::traits::{Tool, ToolKind, ToolResult, ToolSpec};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned engine replies in order, then repeats the last one.
    struct ScriptedEngine {
        replies: Mutex<VecDeque<String>>,
        last: String,
        calls: Mutex<Vec<usize>>,
    }

    impl ScriptedEngine {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                last: replies.last().map(|r| r.to_string()).unwrap_or_default(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReasoningEngine for ScriptedEngine {
        async fn next_step(
            &self,
            transcript: &Transcript,
            _tools: &[ToolSpec],
        ) -> anyhow::Result<AgentStep> {
            self.calls.lock().unwrap().push(transcript.len());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.last.clone());
            Ok(parse_step(&reply))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ReasoningEngine for Unreachable {
        async fn next_step(
            &self,
            _transcript: &Transcript,
            _tools: &[ToolSpec],
        ) -> anyhow::Result<AgentStep> {
            anyhow::bail!("connection refused")
        }
    }

    struct FakeSearch;

    #[async_trait]
    impl Tool for FakeSearch {
        fn kind(&self) -> ToolKind {
            ToolKind::Search
        }

        async fn execute(&self, input: &str) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::success(format!("1. Result for {}", input)))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(
            ToolRegistry::new()
                .with_tool(Arc::new(FakeSearch))
                .with_tool(Arc::new(WeatherTool::new(None))),
        )
    }

    #[tokio::test]
    async fn tool_then_final_answer() {
        let engine = Arc::new(ScriptedEngine::new(&[
            "Thought: find flights\nAction: search\nAction Input: flights to Tokyo",
            "Thought: I have all the info.\nFinal Answer: [SUMMARY]\nDESTINATION: Tokyo",
        ]));
        let orchestrator = PlanOrchestrator::new(engine.clone(), registry());

        let outcome = orchestrator.run("Tokyo in May").await.unwrap();
        assert_eq!(outcome.answer, "[SUMMARY]\nDESTINATION: Tokyo");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.transcript.turns.len(), 1);
        assert_eq!(
            outcome.transcript.turns[0].observation,
            "1. Result for flights to Tokyo"
        );
        assert_eq!(*engine.calls.lock().unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn invented_observation_runs_the_real_tool() {
        let engine = Arc::new(ScriptedEngine::new(&[
            "Thought: look up hotels\nAction: search\nAction Input: hotels Bali\nObservation: Hotel A costs 20 EUR\nFinal Answer: [SUMMARY]\nDESTINATION: Bali",
            "Final Answer: [SUMMARY]\nDESTINATION: Bali",
        ]));
        let orchestrator = PlanOrchestrator::new(engine, registry());

        let outcome = orchestrator.run("Bali").await.unwrap();
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.transcript.turns.len(), 1);
        assert_eq!(
            outcome.transcript.turns[0].observation,
            "1. Result for hotels Bali"
        );
    }

    #[tokio::test]
    async fn never_finishing_engine_hits_the_cap() {
        let engine = Arc::new(ScriptedEngine::new(&[
            "Action: search\nAction Input: more hotels",
        ]));
        let orchestrator = PlanOrchestrator::new(engine.clone(), registry()).with_max_iterations(4);

        let err = orchestrator.run("Lisbon").await.unwrap_err();
        assert!(err.is_incomplete());
        assert!(matches!(err, PlanError::Incomplete { iterations: 4 }));
        assert_eq!(engine.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn malformed_step_is_corrected_and_loop_continues() {
        let engine = Arc::new(ScriptedEngine::new(&[
            "Sure! Tokyo is lovely in spring.",
            "Action: teleport\nAction Input: Tokyo",
            "Final Answer: [SUMMARY]\nDESTINATION: Tokyo",
        ]));
        let orchestrator = PlanOrchestrator::new(engine, registry());

        let outcome = orchestrator.run("Tokyo").await.unwrap();
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.transcript.corrections(), 2);
        let first = &outcome.transcript.turns[0];
        assert_eq!(
            first.action,
            TurnAction::Invalid("Sure! Tokyo is lovely in spring.".to_string())
        );
        assert!(first.observation.starts_with("Invalid format"));
        assert!(first.observation.contains("[search, weather]"));
        assert!(outcome.transcript.turns[1].observation.contains("teleport"));
    }

    #[tokio::test]
    async fn missing_weather_key_does_not_abort() {
        let engine = Arc::new(ScriptedEngine::new(&[
            "Action: weather\nAction Input: City: Tokyo",
            "Final Answer: plan",
        ]));
        let orchestrator = PlanOrchestrator::new(engine, registry());

        let outcome = orchestrator.run("Tokyo").await.unwrap();
        assert_eq!(outcome.answer, "plan");
        let observation = &outcome.transcript.turns[0].observation;
        assert!(observation.contains("search tool"));
    }

    #[tokio::test]
    async fn engine_failure_is_fatal() {
        let orchestrator = PlanOrchestrator::new(Arc::new(Unreachable), registry());
        let err = orchestrator.plan("Rome").await.unwrap_err();
        assert!(matches!(err, PlanError::Engine(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn empty_registry_is_rejected() {
        let engine = Arc::new(ScriptedEngine::new(&["Final Answer: plan"]));
        let orchestrator = PlanOrchestrator::new(engine.clone(), Arc::new(ToolRegistry::new()));

        let err = orchestrator.run("Rome").await.unwrap_err();
        assert!(matches!(err, PlanError::NoTools));
        assert!(engine.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn events_follow_the_loop() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let engine = Arc::new(ScriptedEngine::new(&[
            "Thought: search\nAction: search\nAction Input: Bali villas",
            "nonsense",
            "Final Answer: done",
        ]));
        let orchestrator = PlanOrchestrator::new(engine, registry()).with_events(tx);
        orchestrator.run("Bali").await.unwrap();
        drop(orchestrator);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                LoopEvent::Thought("search".to_string()),
                LoopEvent::Action(ToolInvocation::new(ToolKind::Search, "Bali villas")),
                LoopEvent::Observation("1. Result for Bali villas".to_string()),
                LoopEvent::Correction("missing 'Action:' after 'Thought:'".to_string()),
                LoopEvent::Finished { iterations: 3 },
            ]
        );
    }

    #[tokio::test]
    async fn plan_wraps_request_in_travel_prompt() {
        let engine = Arc::new(ScriptedEngine::new(&["Final Answer: ok"]));
        let orchestrator = PlanOrchestrator::new(engine, registry());
        let outcome = orchestrator.run(build_travel_prompt("Oslo")).await.unwrap();
        assert!(outcome.transcript.instruction.starts_with("Oslo"));
        assert!(outcome.transcript.instruction.contains("[ITINERARY]"));
    }
}

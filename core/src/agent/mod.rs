pub mod engine;
pub mod loop_;
pub mod prompt;
pub mod registry;
pub mod step;

pub use engine::{ProviderEngine, ReasoningEngine};
pub use loop_::{LoopEvent, PlanOrchestrator, PlanOutcome};
pub use prompt::build_travel_prompt;
pub use registry::ToolRegistry;
pub use step::{AgentStep, Transcript, Turn, TurnAction};

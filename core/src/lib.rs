pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod report;
pub mod tools;
pub mod traits;

pub use agent::{PlanOrchestrator, ProviderEngine, ReasoningEngine, ToolRegistry};
pub use config::*;
pub use error::PlanError;
pub use providers::*;
pub use report::*;
pub use tools::*;
pub use traits::*;

use thiserror::Error;

/// Outcomes of a planning run that reach the caller. Tool and parsing
/// failures never show up here; they are turned into observations.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("No tools registered: the planner needs at least one capability")]
    NoTools,

    #[error("Planning incomplete: no final answer after {iterations} iterations")]
    Incomplete { iterations: usize },

    #[error("Reasoning engine failed: {0}")]
    Engine(#[source] anyhow::Error),
}

impl PlanError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, PlanError::Incomplete { .. })
    }
}

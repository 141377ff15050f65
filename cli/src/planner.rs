use crate::display;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::info;
use tripwise_core::agent::{LoopEvent, PlanOrchestrator, ProviderEngine, ToolRegistry};
use tripwise_core::config::Config;
use tripwise_core::error::PlanError;
use tripwise_core::providers::create_provider;
use tripwise_core::report::DayMarkers;

/// Orchestrator plus the pieces the CLI needs around it.
pub struct Planner {
    orchestrator: PlanOrchestrator,
    events: UnboundedReceiver<LoopEvent>,
    show_progress: bool,
    pub markers: DayMarkers,
}

impl Planner {
    pub fn from_config(
        config: &Config,
        max_iterations: Option<usize>,
        show_progress: bool,
    ) -> Result<Self> {
        let provider = create_provider(config)?;
        info!(provider = provider.name(), model = %config.model, "provider ready");

        let registry = ToolRegistry::from_config(config);
        let (tx, rx) = unbounded_channel();
        let orchestrator = PlanOrchestrator::new(
            Arc::new(ProviderEngine::new(provider)),
            Arc::new(registry),
        )
        .with_max_iterations(max_iterations.unwrap_or(config.max_iterations))
        .with_events(tx);

        Ok(Self {
            orchestrator,
            events: rx,
            show_progress,
            markers: DayMarkers::new(&config.day_markers),
        })
    }

    /// Runs one planning request, printing loop progress while it goes.
    pub async fn plan(&mut self, request: &str) -> Result<String, PlanError> {
        let show = self.show_progress;
        let events = &mut self.events;
        let run = self.orchestrator.plan(request);
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                biased;
                Some(event) = events.recv() => {
                    if show {
                        display::print_event(&event);
                    }
                }
                result = &mut run => break result,
            }
        };

        while let Ok(event) = events.try_recv() {
            if show {
                display::print_event(&event);
            }
        }
        result
    }
}

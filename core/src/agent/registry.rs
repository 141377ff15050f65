use crate::config::Config;
use crate::tools::{SearchTool, WeatherTool};
use crate::traits::{Tool, ToolInvocation, ToolKind, ToolSpec};
use std::sync::Arc;
use tracing::{debug, warn};

/// Handlers for the fixed [`ToolKind`] set, at most one per kind.
/// Built once at startup and only read afterwards.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any handler already registered for the same kind.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let kind = tool.kind();
        self.tools.retain(|t| t.kind() != kind);
        self.tools.push(tool);
    }

    /// Both travel tools, keyed from the environment or the config file.
    /// Missing keys still register the tool; it then answers with guidance.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_tool(Arc::new(SearchTool::from_config(&config.search)))
            .with_tool(Arc::new(WeatherTool::from_config(&config.weather)))
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn get(&self, kind: ToolKind) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.kind() == kind)
    }

    pub fn get_specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.kind().name()).collect()
    }

    /// Always yields an observation; handler errors are folded into the text.
    pub async fn execute(&self, invocation: &ToolInvocation) -> String {
        let Some(tool) = self.get(invocation.tool) else {
            return format!(
                "Tool '{}' is not available. Available tools: {}",
                invocation.tool,
                self.tool_names().join(", ")
            );
        };

        debug!(tool = %invocation.tool, input = %invocation.input, "executing tool");
        match tool.execute(&invocation.input).await {
            Ok(result) => result.into_observation(),
            Err(e) => {
                warn!(tool = %invocation.tool, error = %e, "tool execution failed");
                format!("Execution failed: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ToolResult;
    use async_trait::async_trait;

    struct Echo(ToolKind, &'static str);

    #[async_trait]
    impl Tool for Echo {
        fn kind(&self) -> ToolKind {
            self.0
        }

        async fn execute(&self, input: &str) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::success(format!("{}:{}", self.1, input)))
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn kind(&self) -> ToolKind {
            ToolKind::Weather
        }

        async fn execute(&self, _input: &str) -> anyhow::Result<ToolResult> {
            anyhow::bail!("socket closed")
        }
    }

    #[test]
    fn from_config_registers_both_tools() {
        let registry = ToolRegistry::from_config(&Config::default());
        assert_eq!(registry.tool_names(), vec!["search", "weather"]);
        assert_eq!(registry.get_specs().len(), 2);
    }

    #[tokio::test]
    async fn dispatches_by_kind() {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(Echo(ToolKind::Search, "s")))
            .with_tool(Arc::new(Echo(ToolKind::Weather, "w")));

        let out = registry
            .execute(&ToolInvocation::new(ToolKind::Weather, "Rome"))
            .await;
        assert_eq!(out, "w:Rome");
        assert_eq!(registry.tool_names(), vec!["search", "weather"]);
    }

    #[tokio::test]
    async fn later_registration_replaces() {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(Echo(ToolKind::Search, "old")))
            .with_tool(Arc::new(Echo(ToolKind::Search, "new")));

        assert_eq!(registry.len(), 1);
        let out = registry
            .execute(&ToolInvocation::new(ToolKind::Search, "q"))
            .await;
        assert_eq!(out, "new:q");
    }

    #[tokio::test]
    async fn unregistered_kind_is_an_observation() {
        let registry = ToolRegistry::new().with_tool(Arc::new(Echo(ToolKind::Search, "s")));
        let out = registry
            .execute(&ToolInvocation::new(ToolKind::Weather, "Rome"))
            .await;
        assert!(out.contains("not available"));
        assert!(out.contains("search"));
    }

    #[tokio::test]
    async fn handler_error_is_an_observation() {
        let registry = ToolRegistry::new().with_tool(Arc::new(Broken));
        let out = registry
            .execute(&ToolInvocation::new(ToolKind::Weather, "Rome"))
            .await;
        assert_eq!(out, "Execution failed: socket closed");
    }
}

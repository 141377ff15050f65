use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of capabilities the planner can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Search,
    Weather,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::Search, ToolKind::Weather];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Weather => "weather",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Search => {
                "Useful for searching flights, hotels, activities, visa/currency info, and price estimates. Input: a search query."
            }
            Self::Weather => {
                "Useful for getting the current weather. Input should be JUST the city name (e.g. 'Tokyo'), without 'City:' in front."
            }
        }
    }

    /// Resolves a tool name as written by the engine. Tolerates case,
    /// surrounding quotes, backticks and brackets.
    pub fn from_name(name: &str) -> Option<Self> {
        let cleaned = name
            .trim()
            .trim_matches(|c: char| matches!(c, '[' | ']' | '`' | '"' | '\'' | '*'))
            .trim();

        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(cleaned))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: ToolKind,
    pub input: String,
}

impl ToolInvocation {
    pub fn new(tool: ToolKind, input: impl Into<String>) -> Self {
        Self {
            tool,
            input: input.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }

    /// Both outcomes are fed back to the engine as plain text.
    pub fn into_observation(self) -> String {
        self.output
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub name: String,
    pub description: String,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    async fn execute(&self, input: &str) -> anyhow::Result<ToolResult>;

    fn spec(&self) -> ToolSpec {
        let kind = self.kind();
        ToolSpec {
            kind,
            name: kind.name().to_string(),
            description: kind.description().to_string(),
        }
    }
}

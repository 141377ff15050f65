//! Engine step grammar and the per-run transcript.
//!
//! Engines answer in the ReAct text protocol:
//!
//! ```text
//! Thought: I should check the weather first.
//! Action: weather
//! Action Input: Tokyo
//! ```
//!
//! or finish with `Final Answer: ...`.

use crate::traits::{ToolInvocation, ToolKind};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static FINAL_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)final\s+answer\s*:").expect("valid regex"));

static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)action\s*\d*\s*:[ \t]*(.*?)\s*action\s*\d*\s*input\s*\d*\s*:\s*(.*)")
        .expect("valid regex")
});

static ACTION_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)action\s*\d*\s*:").expect("valid regex"));

static OBSERVATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n\s*observation\s*:").expect("valid regex"));

/// What the engine decided to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Action {
        thought: String,
        invocation: ToolInvocation,
    },
    Final {
        thought: String,
        answer: String,
    },
    Malformed {
        raw: String,
        reason: String,
    },
}

impl AgentStep {
    pub fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TurnAction {
    Tool(ToolInvocation),
    /// Engine output that could not be interpreted, kept verbatim.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub thought: String,
    pub action: TurnAction,
    pub observation: String,
}

/// Instruction plus every completed thought/action/observation turn of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub instruction: String,
    pub turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            turns: Vec::new(),
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn corrections(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t.action, TurnAction::Invalid(_)))
            .count()
    }
}

fn strip_thought_label(text: &str) -> String {
    let text = text.trim();
    let stripped = text
        .get(..8)
        .filter(|p| p.eq_ignore_ascii_case("thought:"))
        .map_or(text, |_| &text[8..]);
    stripped.trim().to_string()
}

fn clean_action_input(input: &str) -> String {
    let input = input.trim();
    let input = input
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(input);
    input.trim().to_string()
}

/// Interprets one engine reply. Text after a self-written observation is
/// dropped, and a reply holding both an action and a final answer is
/// malformed; anything else that does not name a known tool is malformed.
pub fn parse_step(text: &str) -> AgentStep {
    let observation_at = OBSERVATION.find(text).map(|m| m.start());

    if let Some(m) = FINAL_ANSWER.find(text)
        && observation_at.is_none_or(|at| at > m.start())
    {
        let before = &text[..m.start()];
        if ACTION.is_match(before) {
            return AgentStep::malformed(text, "both a final answer and an action were given");
        }

        let answer = text[m.end()..].trim();
        if answer.is_empty() {
            return AgentStep::malformed(text, "'Final Answer:' was given without a plan");
        }
        return AgentStep::Final {
            thought: strip_thought_label(before),
            answer: answer.to_string(),
        };
    }

    let text_until_observation = observation_at.map_or(text, |at| &text[..at]);

    let Some(caps) = ACTION.captures(text_until_observation) else {
        let reason = if ACTION_ONLY.is_match(text_until_observation) {
            "missing 'Action Input:' after 'Action:'"
        } else {
            "missing 'Action:' after 'Thought:'"
        };
        return AgentStep::malformed(text, reason);
    };

    let (Some(whole), Some(tool), Some(input)) = (caps.get(0), caps.get(1), caps.get(2)) else {
        return AgentStep::malformed(text, "could not read the action");
    };

    let tool_name = tool.as_str().lines().next().unwrap_or("").trim();
    let Some(kind) = ToolKind::from_name(tool_name) else {
        return AgentStep::malformed(
            text,
            format!("'{}' is not a valid tool", tool_name),
        );
    };

    AgentStep::Action {
        thought: strip_thought_label(&text_until_observation[..whole.start()]),
        invocation: ToolInvocation::new(kind, clean_action_input(input.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action() {
        let step = parse_step("Thought: I need the weather.\nAction: weather\nAction Input: Tokyo");
        assert_eq!(
            step,
            AgentStep::Action {
                thought: "I need the weather.".to_string(),
                invocation: ToolInvocation::new(ToolKind::Weather, "Tokyo"),
            }
        );
    }

    #[test]
    fn parses_action_with_quoted_multiline_input() {
        let step = parse_step(
            "Let me look for flights.\nAction: [search]\nAction Input: \"flights Paris to\nNew York December\"",
        );
        match step {
            AgentStep::Action { invocation, thought } => {
                assert_eq!(invocation.tool, ToolKind::Search);
                assert_eq!(invocation.input, "flights Paris to\nNew York December");
                assert_eq!(thought, "Let me look for flights.");
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn drops_hallucinated_observation() {
        let step = parse_step(
            "Action: search\nAction Input: hotels Bali\nObservation: Hotel A is great\nThought: done",
        );
        match step {
            AgentStep::Action { invocation, .. } => assert_eq!(invocation.input, "hotels Bali"),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn invented_observation_ends_the_step() {
        let step = parse_step(
            "Thought: look up hotels\nAction: search\nAction Input: hotels Bali\nObservation: Hotel A costs 20 EUR\nThought: I have all the info.\nFinal Answer: [SUMMARY]\nDESTINATION: Bali",
        );
        assert_eq!(
            step,
            AgentStep::Action {
                thought: "look up hotels".to_string(),
                invocation: ToolInvocation::new(ToolKind::Search, "hotels Bali"),
            }
        );
    }

    #[test]
    fn action_beside_final_answer_is_malformed() {
        let step = parse_step(
            "Thought: I have all the info.\nAction: search\nAction Input: x\nFinal Answer: [SUMMARY]\nDESTINATION: Rome",
        );
        match step {
            AgentStep::Malformed { reason, .. } => {
                assert!(reason.contains("both a final answer and an action"))
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn observation_inside_final_answer_is_kept() {
        let step = parse_step("Final Answer: [PRACTICAL]\nObservation: pack warm clothes");
        match step {
            AgentStep::Final { answer, .. } => {
                assert_eq!(answer, "[PRACTICAL]\nObservation: pack warm clothes")
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn final_answer_keeps_thought() {
        let step = parse_step("Thought: I have all the info.\nFinal Answer: plan");
        assert_eq!(
            step,
            AgentStep::Final {
                thought: "I have all the info.".to_string(),
                answer: "plan".to_string(),
            }
        );
    }

    #[test]
    fn unknown_tool_is_malformed() {
        let step = parse_step("Action: calculator\nAction Input: 2+2");
        match step {
            AgentStep::Malformed { reason, raw } => {
                assert!(reason.contains("calculator"));
                assert!(raw.starts_with("Action: calculator"));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn missing_pieces_are_malformed() {
        assert!(matches!(
            parse_step("I think Tokyo is nice."),
            AgentStep::Malformed { reason, .. } if reason.contains("missing 'Action:'")
        ));
        assert!(matches!(
            parse_step("Action: search"),
            AgentStep::Malformed { reason, .. } if reason.contains("Action Input")
        ));
        assert!(matches!(
            parse_step("Final Answer:   "),
            AgentStep::Malformed { .. }
        ));
    }

    #[test]
    fn transcript_counts_corrections() {
        let mut transcript = Transcript::new("plan a trip");
        transcript.push(Turn {
            thought: String::new(),
            action: TurnAction::Invalid("???".to_string()),
            observation: "Invalid format".to_string(),
        });
        transcript.push(Turn {
            thought: "search".to_string(),
            action: TurnAction::Tool(ToolInvocation::new(ToolKind::Search, "q")),
            observation: "results".to_string(),
        });
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.corrections(), 1);
    }
}

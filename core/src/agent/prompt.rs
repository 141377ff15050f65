use crate::agent::step::{Transcript, TurnAction};
use crate::traits::ToolSpec;
use std::fmt::Write;

pub const MANDATORY_TASKS: [&str; 4] = [
    "1. Use the search tool to find real Flights and Hotels.",
    "2. Use the weather tool (or search) to check the climate.",
    "3. Find an estimate for car rental (MANDATORY).",
    "4. Create a coherent day-by-day itinerary.",
];

pub const SECTION_MARKERS: [&str; 4] = ["[SUMMARY]", "[PRACTICAL]", "[TRANSPORT]", "[ITINERARY]"];

pub const SUMMARY_KEYS: [&str; 5] = ["DESTINATION", "PERIOD", "BUDGET", "STYLE", "WEATHER"];

const RESPONSE_FORMAT: &str = "\
STRICT RESPONSE FORMAT (Respect this order):

[SUMMARY]
DESTINATION: ...
PERIOD: ...
BUDGET: ...
STYLE: ...
WEATHER: ...

[PRACTICAL]
- VISA: ...
- LUGGAGE: ...
- CURRENCY: ...

[TRANSPORT]
- CAR RENTAL: (Estimated price and recommended vehicle type)
- SUGGESTED FLIGHTS: (Estimated price)

[ITINERARY]
IMPORTANT: For each activity, create a clickable Markdown link to a Google search.
Format: [Activity Name](https://www.google.com/search?q=Activity+Name)

Day 1: [Day Title]
- Arrival and check-in

Day 2: [Day Title]
- Visit [Place A](https://www.google.com/search?q=Place+A)
- Lunch

(Etc for all days)";

const SEPARATOR: &str = "--------------------------------------------------";

/// Wraps the raw trip request in the task checklist and the output grammar.
/// The request is embedded verbatim, even when empty.
pub fn build_travel_prompt(request: &str) -> String {
    format!(
        "{request}\n\n{SEPARATOR}\nMANDATORY TASKS TO BE PERFORMED BY THE AGENT:\n{tasks}\n\n{SEPARATOR}\n{RESPONSE_FORMAT}\n",
        tasks = MANDATORY_TASKS.join("\n"),
    )
}

/// Renders the ReAct protocol around the instruction, followed by the
/// scratchpad of completed turns, ending on an open `Thought:`.
pub fn render_scaffold(tools: &[ToolSpec], transcript: &Transcript) -> String {
    let tool_names = tools
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::from("You are an expert Autonomous Travel Planner.\n\nAvailable tools:\n");
    for tool in tools {
        let _ = writeln!(out, "{}: {}", tool.name, tool.description);
    }

    let _ = write!(
        out,
        "\nTool names: {tool_names}\n\n\
PROCESS (ReAct):\n\
Question: The travel request\n\
Thought: I need to analyze the request.\n\
Action: The action to take, one of [{tool_names}]\n\
Action Input: The input for the action\n\
Observation: The result of the action\n\
... (Repeat Thought/Action/Observation)\n\
Thought: I have all the info. I generate the final answer.\n\
Final Answer: The complete plan respecting the requested format.\n\n\
Question: {instruction}\n\
Thought:{scratchpad}",
        instruction = transcript.instruction.trim_end(),
        scratchpad = render_scratchpad(transcript),
    );

    out
}

pub fn render_scratchpad(transcript: &Transcript) -> String {
    let mut pad = String::new();

    for turn in &transcript.turns {
        match &turn.action {
            TurnAction::Tool(invocation) => {
                if !turn.thought.is_empty() {
                    let _ = writeln!(pad, " {}", turn.thought);
                }
                let _ = write!(
                    pad,
                    "Action: {}\nAction Input: {}",
                    invocation.tool, invocation.input
                );
            }
            TurnAction::Invalid(raw) => pad.push_str(raw.trim_end()),
        }
        let _ = write!(pad, "\nObservation: {}\nThought: ", turn.observation);
    }

    pad
}

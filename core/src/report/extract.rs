//! Best-effort recovery of structured fields from a plan answer.
//!
//! Nothing in here fails: a missing line gives [`FIELD_SENTINEL`], a missing
//! section gives `None`, and an itinerary without day markers gives no days.

use crate::agent::prompt::{SECTION_MARKERS, SUMMARY_KEYS};
use regex::Regex;
use serde::Serialize;

pub const FIELD_SENTINEL: &str = "See details";
pub const DEFAULT_SUBTITLE: &str = "Daily schedule";
pub const DEFAULT_DAY_MARKERS: [&str; 2] = ["Day", "Jour"];

/// Value after the first `:` on the first line mentioning `keyword`
/// (case-insensitive), with `*` emphasis removed.
pub fn extract_field(text: &str, keyword: &str) -> String {
    let keyword = keyword.to_lowercase();

    text.lines()
        .filter(|line| line.to_lowercase().contains(&keyword))
        .find_map(|line| line.split_once(':'))
        .map(|(_, value)| value.replace('*', "").trim().to_string())
        .unwrap_or_else(|| FIELD_SENTINEL.to_string())
}

/// Text between the first `start` and the first `end` after it, trimmed.
/// `None` when `start` does not occur; runs to the end of the text when
/// `end` does not.
pub fn extract_section<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let rest = &text[from..];
    let section = match rest.find(end) {
        Some(to) => &rest[..to],
        None => rest,
    };
    Some(section.trim())
}

/// The words that open an itinerary day, each followed by a day number.
#[derive(Debug, Clone)]
pub struct DayMarkers {
    pattern: Option<Regex>,
}

impl DayMarkers {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        let pattern = if words.is_empty() {
            None
        } else {
            let alternatives = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(r"\b(?:{})[ \t]+\d+\b", alternatives)).ok()
        };

        Self { pattern }
    }
}

impl Default for DayMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_DAY_MARKERS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItineraryDay {
    pub title: String,
    pub subtitle: String,
    pub content: String,
}

impl ItineraryDay {
    fn from_marker(marker: &str, body: &str) -> Self {
        let body = body.trim();
        let body = body.strip_prefix(':').unwrap_or(body).trim();

        let (first, rest) = body.split_once('\n').unwrap_or((body, ""));
        let (subtitle, content) = if rest.trim().is_empty() {
            (DEFAULT_SUBTITLE, first)
        } else {
            (first.trim(), rest)
        };

        Self {
            title: marker.replace(':', "").trim().to_string(),
            subtitle: subtitle.to_string(),
            content: content.to_string(),
        }
    }
}

/// Lazily yields one [`ItineraryDay`] per day marker. A clone continues
/// from the same position; call [`parse_days`] again to start over.
#[derive(Debug, Clone)]
pub struct Days<'a> {
    text: &'a str,
    pattern: Option<&'a Regex>,
    next_marker: Option<(usize, usize)>,
}

impl<'a> Days<'a> {
    fn find_from(&self, pos: usize) -> Option<(usize, usize)> {
        self.pattern?
            .find_at(self.text, pos)
            .map(|m| (m.start(), m.end()))
    }
}

impl Iterator for Days<'_> {
    type Item = ItineraryDay;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, end) = self.next_marker?;
        let following = self.find_from(end);
        let body_end = following.map_or(self.text.len(), |(s, _)| s);
        self.next_marker = following;

        Some(ItineraryDay::from_marker(
            &self.text[start..end],
            &self.text[end..body_end],
        ))
    }
}

pub fn parse_days<'a>(text: &'a str, markers: &'a DayMarkers) -> Days<'a> {
    let mut days = Days {
        text,
        pattern: markers.pattern.as_ref(),
        next_marker: None,
    };
    days.next_marker = days.find_from(0);
    days
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSummary {
    pub destination: String,
    pub period: String,
    pub budget: String,
    pub style: String,
    pub weather: String,
}

impl TripSummary {
    pub fn from_plan(text: &str) -> Self {
        Self {
            destination: extract_field(text, "DESTINATION"),
            period: extract_field(text, "PERIOD"),
            budget: extract_field(text, "BUDGET"),
            style: extract_field(text, "STYLE"),
            weather: extract_field(text, "WEATHER"),
        }
    }
}

/// Everything the results view shows, derived from one plan answer.
#[derive(Debug, Clone, Serialize)]
pub struct PlanView<'a> {
    pub summary: TripSummary,
    pub practical: Option<&'a str>,
    pub transport: Option<&'a str>,
    pub days: Vec<ItineraryDay>,
}

impl<'a> PlanView<'a> {
    pub fn parse(text: &'a str, markers: &DayMarkers) -> Self {
        Self {
            summary: TripSummary::from_plan(text),
            practical: extract_section(text, "[PRACTICAL]", "[TRANSPORT]"),
            transport: extract_section(text, "[TRANSPORT]", "[ITINERARY]"),
            days: parse_days(text, markers).collect(),
        }
    }

    /// No day markers were found; show the raw answer instead.
    pub fn needs_raw_fallback(&self) -> bool {
        self.days.is_empty()
    }
}

/// How far an answer strays from the requested layout. Diagnostic only;
/// the text is never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanCheck {
    pub missing_sections: Vec<&'static str>,
    pub duplicated_sections: Vec<&'static str>,
    pub out_of_order: bool,
    pub missing_summary_keys: Vec<&'static str>,
    pub day_count: usize,
}

impl PlanCheck {
    pub fn is_well_formed(&self) -> bool {
        self.missing_sections.is_empty()
            && self.duplicated_sections.is_empty()
            && !self.out_of_order
            && self.missing_summary_keys.is_empty()
            && self.day_count > 0
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.missing_sections.is_empty() {
            problems.push(format!("missing sections: {}", self.missing_sections.join(", ")));
        }
        if !self.duplicated_sections.is_empty() {
            problems.push(format!(
                "repeated sections: {}",
                self.duplicated_sections.join(", ")
            ));
        }
        if self.out_of_order {
            problems.push("sections out of order".to_string());
        }
        if !self.missing_summary_keys.is_empty() {
            problems.push(format!(
                "missing summary fields: {}",
                self.missing_summary_keys.join(", ")
            ));
        }
        if self.day_count == 0 {
            problems.push("no itinerary days".to_string());
        }
        problems
    }
}

pub fn check_plan(text: &str, markers: &DayMarkers) -> PlanCheck {
    let mut check = PlanCheck::default();
    let mut positions = Vec::new();

    for marker in SECTION_MARKERS {
        match text.matches(marker).count() {
            0 => check.missing_sections.push(marker),
            1 => {}
            _ => check.duplicated_sections.push(marker),
        }
        if let Some(pos) = text.find(marker) {
            positions.push(pos);
        }
    }
    check.out_of_order = positions.windows(2).any(|w| w[0] > w[1]);

    let summary = extract_section(text, "[SUMMARY]", "[PRACTICAL]").unwrap_or(text);
    check.missing_summary_keys = SUMMARY_KEYS
        .into_iter()
        .filter(|key| extract_field(summary, key) == FIELD_SENTINEL)
        .collect();

    check.day_count = parse_days(text, markers).count();
    check
}

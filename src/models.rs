//! Data models for the track record dashboard.
//!
//! This module contains the loosely-structured year documents, the typed
//! views the aggregator reads out of them, and the report structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Shape of the `events` section for a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventsShape {
    /// Mapping of named sub-sections (workshops, talks, retreat, ...).
    #[default]
    Structured,
    /// Plain sequence of generic event records.
    Flat,
}

impl fmt::Display for EventsShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventsShape::Structured => write!(f, "structured"),
            EventsShape::Flat => write!(f, "flat"),
        }
    }
}

/// The parsed contents of one year's data file.
///
/// No schema is enforced: every accessor treats a missing section, or a
/// section of the wrong JSON type, as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct YearRecord {
    year_id: String,
    document: Value,
}

impl YearRecord {
    pub fn new(year_id: impl Into<String>, document: Value) -> Self {
        Self {
            year_id: year_id.into(),
            document,
        }
    }

    pub fn year_id(&self) -> &str {
        &self.year_id
    }

    /// Look up a top-level section by name.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.document.get(name)
    }

    /// Number of entries in a sequence section (0 when absent).
    pub fn section_len(&self, name: &str) -> usize {
        len_of(self.section(name))
    }

    /// Course views for every entry of the `courses` section.
    pub fn courses(&self) -> Vec<Course> {
        self.section("courses")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Course::from_value).collect())
            .unwrap_or_default()
    }

    /// The `events` section read with the given shape.
    ///
    /// Returns `None` when the section is missing or does not have the
    /// expected shape; the shape is never guessed from the content.
    pub fn events(&self, shape: EventsShape) -> Option<Events> {
        let section = self.section("events")?;

        match shape {
            EventsShape::Structured => section
                .is_object()
                .then(|| Events::Structured(StructuredEvents::from_value(section))),
            EventsShape::Flat => section
                .as_array()
                .map(|items| Events::Flat(items.iter().map(FlatEvent::from_value).collect())),
        }
    }
}

/// Completion figures attached to a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Completion {
    pub total_completed: Option<u64>,
    pub technical_completed: Option<u64>,
    pub governance_completed: Option<u64>,
}

impl Completion {
    fn from_value(value: &Value) -> Self {
        Self {
            total_completed: value.get("total_completed").and_then(Value::as_u64),
            technical_completed: value.get("technical_completed").and_then(Value::as_u64),
            governance_completed: value.get("governance_completed").and_then(Value::as_u64),
        }
    }
}

/// The parts of a course record that feed the participant count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Course {
    /// The `completion` sub-record, if present.
    pub completion: Option<Completion>,
    /// `metrics.completed`, if present.
    pub metrics_completed: Option<u64>,
}

impl Course {
    fn from_value(value: &Value) -> Self {
        Self {
            completion: value
                .get("completion")
                .filter(|c| c.is_object())
                .map(Completion::from_value),
            metrics_completed: value
                .get("metrics")
                .and_then(|m| m.get("completed"))
                .and_then(Value::as_u64),
        }
    }
}

/// The `events` section, in one of its two per-year shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Events {
    Structured(StructuredEvents),
    Flat(Vec<FlatEvent>),
}

/// Counts and retreat text from a structured events mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredEvents {
    pub workshops: usize,
    pub talks: usize,
    pub notable_meetups: usize,
    /// `retreat.participants` as text.
    pub retreat_participants: Option<String>,
}

impl StructuredEvents {
    fn from_value(value: &Value) -> Self {
        Self {
            workshops: len_of(value.get("workshops")),
            talks: len_of(value.get("talks")),
            notable_meetups: len_of(value.get("notable_meetups")),
            retreat_participants: value
                .get("retreat")
                .and_then(|r| r.get("participants"))
                .and_then(text_of),
        }
    }
}

/// A generic event from a flat event list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatEvent {
    /// Free-text participant figure, e.g. `"~30"`.
    pub participants: Option<String>,
}

impl FlatEvent {
    fn from_value(value: &Value) -> Self {
        Self {
            participants: value.get("participants").and_then(text_of),
        }
    }
}

fn len_of(value: Option<&Value>) -> usize {
    value.and_then(Value::as_array).map_or(0, Vec::len)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The six dashboard counters.
///
/// Additions saturate, so folding any number of years can never panic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_courses: u64,
    pub total_participants: u64,
    pub total_research_papers: u64,
    pub total_workshops_events: u64,
    pub total_university_groups: u64,
    pub total_individual_impacts: u64,
}

impl Totals {
    /// Counters paired with their dashboard labels, in display order.
    pub fn labeled(&self) -> [(&'static str, u64); 6] {
        [
            ("Total Courses", self.total_courses),
            ("Total Participants", self.total_participants),
            ("Research Papers", self.total_research_papers),
            ("Workshops & Events", self.total_workshops_events),
            ("University Groups", self.total_university_groups),
            ("Individual Career Changes", self.total_individual_impacts),
        ]
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.total_courses = self.total_courses.saturating_add(rhs.total_courses);
        self.total_participants = self.total_participants.saturating_add(rhs.total_participants);
        self.total_research_papers = self
            .total_research_papers
            .saturating_add(rhs.total_research_papers);
        self.total_workshops_events = self
            .total_workshops_events
            .saturating_add(rhs.total_workshops_events);
        self.total_university_groups = self
            .total_university_groups
            .saturating_add(rhs.total_university_groups);
        self.total_individual_impacts = self
            .total_individual_impacts
            .saturating_add(rhs.total_individual_impacts);
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Self {
        iter.fold(Totals::default(), Add::add)
    }
}

/// Outcome of loading one year's data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearStatus {
    Loaded,
    NotFound,
    Corrupt,
    Unreadable,
}

impl fmt::Display for YearStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearStatus::Loaded => write!(f, "Loaded"),
            YearStatus::NotFound => write!(f, "Not found"),
            YearStatus::Corrupt => write!(f, "Corrupt"),
            YearStatus::Unreadable => write!(f, "Unreadable"),
        }
    }
}

impl YearStatus {
    /// Returns an emoji representation of the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            YearStatus::Loaded => "✅",
            YearStatus::NotFound => "❓",
            YearStatus::Corrupt => "❌",
            YearStatus::Unreadable => "🚫",
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, YearStatus::Loaded)
    }
}

/// One year's contribution to the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotals {
    /// Year identifier.
    pub year_id: String,
    /// Whether the year's data file could be used.
    pub status: YearStatus,
    /// Counters contributed by this year (all zero unless loaded).
    pub totals: Totals,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Dashboard title.
    pub title: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Directory the year files were read from.
    pub data_dir: String,
    /// Year identifiers that were requested.
    pub years_requested: Vec<String>,
    /// Number of years whose data file loaded.
    pub years_loaded: usize,
    /// Number of years that contributed nothing because loading failed.
    pub years_failed: usize,
}

/// The complete track record report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Totals across all requested years.
    pub totals: Totals,
    /// Per-year breakdown, in request order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub years: Vec<YearTotals>,
    /// Years that failed to load, kept even when the breakdown is left out.
    #[serde(default)]
    pub failures: Vec<YearTotals>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_len_ignores_non_sequences() {
        let record = YearRecord::new(
            "2025",
            json!({
                "research": [{}, {}],
                "university_groups": {"name": "not a list"},
            }),
        );

        assert_eq!(record.section_len("research"), 2);
        assert_eq!(record.section_len("university_groups"), 0);
        assert_eq!(record.section_len("individual_impacts"), 0);
    }

    #[test]
    fn test_non_object_document_has_no_sections() {
        let record = YearRecord::new("2025", json!([1, 2, 3]));
        assert!(record.section("courses").is_none());
        assert!(record.courses().is_empty());
        assert!(record.events(EventsShape::Flat).is_none());
    }

    #[test]
    fn test_course_extraction_is_lenient() {
        let record = YearRecord::new(
            "2024",
            json!({
                "courses": [
                    {"completion": {"total_completed": 15}, "metrics": {"completed": 10}},
                    {"completion": {"technical_completed": "20", "governance_completed": -4}},
                    {"title": "No figures"},
                ]
            }),
        );

        let courses = record.courses();
        assert_eq!(courses.len(), 3);
        assert_eq!(courses[0].completion.and_then(|c| c.total_completed), Some(15));
        assert_eq!(courses[0].metrics_completed, Some(10));
        assert_eq!(courses[1].completion, Some(Completion::default()));
        assert_eq!(courses[2], Course::default());
    }

    #[test]
    fn test_events_shape_is_not_sniffed() {
        let flat = YearRecord::new("2023", json!({"events": [{"participants": "~30"}]}));
        assert!(flat.events(EventsShape::Structured).is_none());
        assert_eq!(
            flat.events(EventsShape::Flat),
            Some(Events::Flat(vec![FlatEvent {
                participants: Some("~30".to_string())
            }]))
        );

        let structured = YearRecord::new(
            "2024",
            json!({"events": {"workshops": [{}, {}], "retreat": {"participants": 24}}}),
        );
        assert!(structured.events(EventsShape::Flat).is_none());
        assert_eq!(
            structured.events(EventsShape::Structured),
            Some(Events::Structured(StructuredEvents {
                workshops: 2,
                talks: 0,
                notable_meetups: 0,
                retreat_participants: Some("24".to_string()),
            }))
        );
    }

    #[test]
    fn test_totals_sum_saturates() {
        let big = Totals {
            total_participants: u64::MAX - 1,
            ..Totals::default()
        };
        let one = Totals {
            total_courses: 1,
            total_participants: 5,
            ..Totals::default()
        };

        let sum: Totals = vec![big, one, one].into_iter().sum();
        assert_eq!(sum.total_courses, 2);
        assert_eq!(sum.total_participants, u64::MAX);
    }

    #[test]
    fn test_events_shape_serde() {
        let shape: EventsShape = serde_json::from_str("\"flat\"").unwrap();
        assert_eq!(shape, EventsShape::Flat);
        assert_eq!(
            serde_json::to_string(&EventsShape::Structured).unwrap(),
            "\"structured\""
        );
    }

    #[test]
    fn test_labeled_order() {
        let totals = Totals {
            total_individual_impacts: 7,
            ..Totals::default()
        };
        let labeled = totals.labeled();
        assert_eq!(labeled[0].0, "Total Courses");
        assert_eq!(labeled[5], ("Individual Career Changes", 7));
    }
}

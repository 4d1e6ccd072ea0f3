//! Metrics aggregation across years.
//!
//! Each year is loaded, reduced to its own [`Totals`] contribution and the
//! contributions are summed. A year that fails to load contributes zero;
//! nothing in here returns an error.

use crate::loader::YearSource;
use crate::models::{Course, Events, EventsShape, Totals, YearRecord, YearStatus, YearTotals};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Substring that marks the retreat's participant figure.
const RETREAT_MARKER: &str = "24";

/// Participants credited when [`RETREAT_MARKER`] is present.
const RETREAT_PARTICIPANTS: u64 = 24;

/// Expected `events` shape per year identifier.
#[derive(Debug, Clone, Default)]
pub struct ShapeTable {
    shapes: HashMap<String, EventsShape>,
    default: EventsShape,
}

impl ShapeTable {
    /// Create an empty table; unknown years use `default`.
    pub fn new(default: EventsShape) -> Self {
        Self {
            shapes: HashMap::new(),
            default,
        }
    }

    /// Builder-style [`ShapeTable::insert`].
    pub fn with(mut self, year_id: impl Into<String>, shape: EventsShape) -> Self {
        self.insert(year_id, shape);
        self
    }

    pub fn insert(&mut self, year_id: impl Into<String>, shape: EventsShape) {
        self.shapes.insert(year_id.into(), shape);
    }

    pub fn shape_for(&self, year_id: &str) -> EventsShape {
        self.shapes.get(year_id).copied().unwrap_or(self.default)
    }
}

/// Computes dashboard totals from a [`YearSource`].
pub struct Aggregator<S> {
    source: S,
    shapes: ShapeTable,
}

impl<S: YearSource> Aggregator<S> {
    pub fn new(source: S, shapes: ShapeTable) -> Self {
        Self { source, shapes }
    }

    /// Totals across `year_ids`. Order of the years does not matter.
    pub fn aggregate(&self, year_ids: &[String]) -> Totals {
        self.aggregate_by_year(year_ids)
            .into_iter()
            .map(|year| year.totals)
            .sum()
    }

    /// Each year's contribution, in the order requested.
    pub fn aggregate_by_year(&self, year_ids: &[String]) -> Vec<YearTotals> {
        year_ids.iter().map(|id| self.year_totals(id)).collect()
    }

    /// Load every year and report whether it could be used.
    pub fn check(&self, year_ids: &[String]) -> Vec<(String, YearStatus)> {
        year_ids
            .iter()
            .map(|id| {
                let status = match self.source.load(id) {
                    Ok(_) => YearStatus::Loaded,
                    Err(e) => e.status(),
                };
                (id.clone(), status)
            })
            .collect()
    }

    fn year_totals(&self, year_id: &str) -> YearTotals {
        match self.source.load(year_id) {
            Ok(record) => YearTotals {
                year_id: year_id.to_string(),
                status: YearStatus::Loaded,
                totals: year_contribution(&record, self.shapes.shape_for(year_id)),
            },
            Err(e) => YearTotals {
                year_id: year_id.to_string(),
                status: e.status(),
                totals: Totals::default(),
            },
        }
    }
}

/// Counters contributed by a single loaded year.
pub fn year_contribution(record: &YearRecord, shape: EventsShape) -> Totals {
    let courses = record.courses();

    let mut totals = Totals {
        total_courses: courses.len() as u64,
        total_participants: courses
            .iter()
            .map(course_participants)
            .fold(0, u64::saturating_add),
        total_research_papers: record.section_len("research") as u64,
        total_workshops_events: 0,
        total_university_groups: record.section_len("university_groups") as u64,
        total_individual_impacts: record.section_len("individual_impacts") as u64,
    };

    match record.events(shape) {
        Some(events) => totals += events_contribution(&events),
        None if record.section("events").is_some() => {
            debug!(
                "Events for {} are not {}; ignoring them",
                record.year_id(),
                shape
            );
        }
        None => {}
    }

    debug!("Year {} contributes {:?}", record.year_id(), totals);
    totals
}

/// Participants completing a course.
///
/// `completion.total_completed` wins over the technical/governance pair,
/// which only counts when both halves are present. `metrics.completed` is
/// added on top either way.
pub fn course_participants(course: &Course) -> u64 {
    let from_completion = course.completion.map_or(0, |c| {
        match (
            c.total_completed,
            c.technical_completed,
            c.governance_completed,
        ) {
            (Some(total), _, _) => total,
            (None, Some(technical), Some(governance)) => technical.saturating_add(governance),
            _ => 0,
        }
    });

    from_completion.saturating_add(course.metrics_completed.unwrap_or(0))
}

fn events_contribution(events: &Events) -> Totals {
    match events {
        Events::Structured(structured) => Totals {
            total_workshops_events: (structured.workshops
                + structured.talks
                + structured.notable_meetups) as u64,
            total_participants: structured
                .retreat_participants
                .as_deref()
                .map_or(0, retreat_participants),
            ..Totals::default()
        },
        Events::Flat(list) => Totals {
            total_workshops_events: list.len() as u64,
            total_participants: list
                .iter()
                .filter_map(|event| event.participants.as_deref())
                .filter_map(first_number)
                .fold(0, u64::saturating_add),
            ..Totals::default()
        },
    }
}

/// Retreat participants: a literal substring match, not a number parse.
pub fn retreat_participants(text: &str) -> u64 {
    if text.contains(RETREAT_MARKER) {
        RETREAT_PARTICIPANTS
    } else {
        0
    }
}

/// First run of ASCII digits in free text, optionally preceded by `~`.
pub fn first_number(text: &str) -> Option<u64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"~?([0-9]+)").expect("participant pattern is valid"));

    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}

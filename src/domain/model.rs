use chrono::{Duration, NaiveDate};
use std::fmt;
use std::path::PathBuf;

/// One date's search against the reservation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub date: NaiveDate,
    pub sport_code: String,
    pub category_code: String,
    pub region_code: String,
}

impl Query {
    pub fn for_offset(
        start: NaiveDate,
        offset: u32,
        sport_code: &str,
        category_code: &str,
        region_code: &str,
    ) -> Self {
        Self {
            date: start + Duration::days(i64::from(offset)),
            sport_code: sport_code.to_string(),
            category_code: category_code.to_string(),
            region_code: region_code.to_string(),
        }
    }

    /// Zero-padded month, as the `month` select expects.
    pub fn month_value(&self) -> String {
        self.date.format("%m").to_string()
    }

    pub fn day_value(&self) -> String {
        self.date.format("%d").to_string()
    }

    pub fn display_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Label/value pairs taken from one qualifying table.
///
/// Insertion ordered. Re-inserting a label replaces its value but keeps the
/// position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityRecord {
    fields: Vec<(String, String)>,
}

impl AvailabilityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == label) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(label, _)| label.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AvailabilityRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

pub type ResultSet = Vec<AvailabilityRecord>;

/// What happened for a single searched date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOutcome {
    Found(usize),
    NoAvailability,
    DateUnavailable,
    QueryFailed(String),
}

impl fmt::Display for DateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateOutcome::Found(count) => write!(f, "{} records found", count),
            DateOutcome::NoAvailability => write!(f, "no availability"),
            DateOutcome::DateUnavailable => write!(f, "date unavailable"),
            DateOutcome::QueryFailed(reason) => write!(f, "query failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: ResultSet,
    pub outcomes: Vec<(NaiveDate, DateOutcome)>,
}

/// Rectangular output: every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutput {
    Written { path: PathBuf, rows: usize },
    NoData,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: RunOutput,
    pub outcomes: Vec<(NaiveDate, DateOutcome)>,
}

impl RunSummary {
    pub fn outcome_for(&self, date: NaiveDate) -> Option<&DateOutcome> {
        self.outcomes
            .iter()
            .find(|(searched, _)| *searched == date)
            .map(|(_, outcome)| outcome)
    }
}

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A single named observation. Both halves are optional and are always
/// serialized, so an unscored metric comes back as `{"score":null,"notes":null}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricData {
    pub score: Option<i32>,
    pub notes: Option<String>,
}

impl MetricData {
    pub fn scored(score: i32) -> Self {
        Self {
            score: Some(score),
            notes: None,
        }
    }
}

/// Open mapping from metric name to its data. Keys are not restricted to
/// [`KNOWN_METRICS`].
pub type Metrics = BTreeMap<String, MetricData>;

/// Conventional metrics as `(transcript label, metric key)`.
pub const KNOWN_METRICS: [(&str, &str); 9] = [
    ("Mood", "mood"),
    ("Gym Performance", "gym_performance"),
    ("Soreness", "soreness"),
    ("Sleep Quality", "sleep_quality"),
    ("Energy Levels", "energy_levels"),
    ("Sex Drive", "sex_drive"),
    ("Hunger Levels", "hunger_levels"),
    ("Cravings", "cravings"),
    ("Digestion", "digestion"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiofeedbackEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub metrics: Metrics,
    pub additional_notes: Vec<String>,
    pub summary: String,
}

/// Raw `biofeedback` row. `metrics` is nullable for rows written before the
/// column existed.
#[derive(Debug, FromRow)]
pub struct EntryRow {
    pub id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub metrics: Option<Json<Metrics>>,
    pub additional_notes: Vec<String>,
    pub summary: String,
}

impl From<EntryRow> for BiofeedbackEntry {
    fn from(row: EntryRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            time: row.time,
            metrics: row.metrics.map(|Json(m)| m).unwrap_or_default(),
            additional_notes: row.additional_notes,
            summary: row.summary,
        }
    }
}

/// A validated entry ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub time: String,
    pub metrics: Metrics,
    pub additional_notes: Vec<String>,
    pub summary: String,
}

/// Optional inclusive date bounds for listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EntryFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: String,
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

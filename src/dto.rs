//! # Biofeedback — Request/Response DTOs
//!
//! All API contract types in one module.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Response` → serialized to client JSON
//! - Field validation is expressed via `validator` derive macros

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};
use crate::models::entry::{self, BiofeedbackEntry, ColumnInfo, Metrics, NewEntry};

// ============================================================================
// Entries
// ============================================================================

/// POST /biofeedback
///
/// Every field must be present; `metrics`, `additional_notes` and `summary`
/// may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateEntryRequest {
    /// Calendar date, `YYYY-MM-DD`
    #[validate(custom = "validate_iso_date")]
    pub date: String,

    /// Time of day, `HH:MM[:SS[.ffffff]]`. Stored verbatim.
    #[validate(custom = "validate_time_of_day")]
    pub time: String,

    #[validate(custom = "validate_metric_names")]
    pub metrics: Metrics,

    pub additional_notes: Vec<String>,

    pub summary: String,
}

impl CreateEntryRequest {
    /// Validate and convert into the insertable form.
    pub fn into_new_entry(self) -> AppResult<NewEntry> {
        self.validate()?;

        let date = entry::parse_date(&self.date)
            .ok_or_else(|| AppError::Validation("date must be YYYY-MM-DD".into()))?;

        Ok(NewEntry {
            date,
            time: self.time,
            metrics: self.metrics,
            additional_notes: self.additional_notes,
            summary: self.summary,
        })
    }
}

/// Response for POST /biofeedback
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEntryResponse {
    pub id: i64,
    pub message: String,
}

/// Response for DELETE /biofeedback
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearEntriesResponse {
    pub message: String,
    /// Rows removed by this call; zero when the collection was already empty
    pub deleted: u64,
}

/// GET /biofeedback/debug
#[derive(Debug, Serialize)]
pub struct DebugEntriesResponse {
    pub total_entries: usize,
    pub entries: Vec<BiofeedbackEntry>,
}

/// GET /biofeedback/schema
#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema: Vec<ColumnInfo>,
}

// ============================================================================
// Validators
// ============================================================================

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    match entry::parse_date(value) {
        Some(_) => Ok(()),
        None => Err(invalid("iso_date", format!("date must be YYYY-MM-DD, got {value:?}"))),
    }
}

fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    match entry::parse_time(value) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "time_of_day",
            format!("time must be HH:MM[:SS], got {value:?}"),
        )),
    }
}

fn validate_metric_names(metrics: &Metrics) -> Result<(), ValidationError> {
    if metrics.keys().any(|k| k.trim().is_empty()) {
        return Err(invalid("metric_name", "metric names must not be blank"));
    }
    Ok(())
}

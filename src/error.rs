//! Domain errors raised at the grade submission boundary.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by conversion, validation and record lookup.
///
/// Out-of-range grades and empty inputs are deliberately absent: values
/// outside a scale saturate, and an empty grade list aggregates to `None`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GradeError {
    /// A grade value that is NaN or infinite.
    #[error("invalid grade value: {0}")]
    InvalidGrade(f64),

    #[error("grade is missing a subject")]
    MissingSubject,

    #[error("unknown grade system '{0}'")]
    UnknownSystem(String),

    #[error("unknown display label '{0}'")]
    UnknownLabel(String),

    #[error("semester '{name}' ends ({end}) before it starts ({start})")]
    InvalidSemester {
        name: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("no grade with id {0}")]
    GradeNotFound(Uuid),
}

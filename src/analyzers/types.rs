//! Data types shared by the conversion and aggregation pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GradeError;
use crate::system::GradeSystem;

/// A persisted grade. `value` is expressed in `system`, which is always
/// [`GradeSystem::STORAGE`] for records written through the gradebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: Uuid,
    pub subject: String,
    pub value: f64,
    pub system: GradeSystem,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// A grade as shown to the user, with its value in the display scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayGrade {
    pub id: Uuid,
    pub subject: String,
    pub value: f64,
    pub system: GradeSystem,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// How averages are labelled on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayLabel {
    /// Averages in the display scale.
    #[default]
    #[serde(rename = "averageGrade")]
    AverageGrade,
    /// Averages renormalized onto 0.0–4.0.
    #[serde(rename = "gpa")]
    Gpa,
}

impl DisplayLabel {
    pub fn tag(self) -> &'static str {
        match self {
            DisplayLabel::AverageGrade => "averageGrade",
            DisplayLabel::Gpa => "gpa",
        }
    }
}

impl fmt::Display for DisplayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DisplayLabel {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "averagegrade" | "average" => Ok(DisplayLabel::AverageGrade),
            "gpa" => Ok(DisplayLabel::Gpa),
            _ => Err(GradeError::UnknownLabel(s.to_string())),
        }
    }
}

/// A user's choice of display scale and average label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPreference {
    pub grade_system: GradeSystem,
    pub display_label: DisplayLabel,
}

impl Default for DisplayPreference {
    fn default() -> Self {
        Self {
            grade_system: GradeSystem::SixBest,
            display_label: DisplayLabel::AverageGrade,
        }
    }
}

/// Result of aggregating a grade snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAggregate {
    /// Flat mean over every counted grade. `None` when nothing was counted.
    pub overall_average: Option<f64>,
    pub per_subject_average: BTreeMap<String, f64>,
    pub display_system: GradeSystem,
    pub display_label: DisplayLabel,
    pub counted: usize,
    pub skipped: usize,
}

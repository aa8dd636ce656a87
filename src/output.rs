//! Output formatting for grade tables and summaries.
//!
//! Supports plain-text rendering for the terminal and JSON serialization.

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::letter::letter;
use crate::analyzers::types::{DisplayGrade, DisplayLabel, GradeAggregate};
use crate::system::GradeSystem;

/// Formats a value in its display scale, adding a letter on the American scale.
fn format_value(value: f64, system: GradeSystem) -> String {
    match system {
        GradeSystem::American => format!("{value:.2} ({})", letter(value)),
        GradeSystem::Percentage => format!("{value:.2}%"),
        _ => format!("{value:.2}"),
    }
}

/// Renders grades as an aligned text table, one grade per line.
pub fn render_grades(grades: &[DisplayGrade]) -> String {
    let mut output = String::new();

    if grades.is_empty() {
        let _ = writeln!(output, "No grades recorded.");
        return output;
    }

    let width = grades
        .iter()
        .map(|g| g.subject.chars().count())
        .max()
        .unwrap_or(0)
        .max("Subject".len());

    let _ = writeln!(output, "{:<10}  {:<width$}  {:>14}  Id", "Date", "Subject", "Grade");
    for grade in grades {
        let _ = write!(
            output,
            "{:<10}  {:<width$}  {:>14}  {}",
            grade.date,
            grade.subject,
            format_value(grade.value, grade.system),
            grade.id
        );
        if let Some(description) = &grade.description {
            let _ = write!(output, "  {description}");
        }
        let _ = writeln!(output);
    }

    output
}

/// Renders overall and per-subject averages.
pub fn render_summary(summary: &GradeAggregate, scope: &str) -> String {
    let mut output = String::new();
    let shown_in = match summary.display_label {
        DisplayLabel::AverageGrade => summary.display_system,
        DisplayLabel::Gpa => GradeSystem::Gpa,
    };
    let heading = match summary.display_label {
        DisplayLabel::AverageGrade => "Average grade",
        DisplayLabel::Gpa => "GPA",
    };

    let _ = writeln!(output, "# Grade summary ({scope})");
    let _ = writeln!(output, "Display system: {}", summary.display_system);

    match summary.overall_average {
        Some(average) => {
            let _ = writeln!(output, "{heading}: {}", format_value(average, shown_in));
        }
        None => {
            let _ = writeln!(output, "{heading}: no grades yet");
        }
    }

    if !summary.per_subject_average.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## By subject");
        for (subject, average) in &summary.per_subject_average {
            let _ = writeln!(output, "- {subject}: {}", format_value(*average, shown_in));
        }
    }

    if summary.skipped > 0 {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "{} malformed record(s) were skipped.",
            summary.skipped
        );
    }

    output
}

/// Serializes any report value as pretty-printed JSON.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    let json = serde_json::to_string_pretty(value)?;
    debug!(bytes = json.len(), "Serialized report");
    Ok(json)
}

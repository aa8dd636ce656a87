use crate::analyzers::convert::{convert, normalize};
use crate::analyzers::types::{DisplayGrade, DisplayLabel, Grade, GradeAggregate};
use crate::analyzers::utility::{mean, round2};
use crate::system::GradeSystem;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Converts a stored grade into `display`, or explains why it cannot be counted.
fn to_display(grade: &Grade, storage: GradeSystem, display: GradeSystem) -> Option<f64> {
    if grade.subject.trim().is_empty() {
        warn!(grade_id = %grade.id, "Skipping grade record without a subject");
        return None;
    }

    if grade.system != storage {
        warn!(
            grade_id = %grade.id,
            record_system = %grade.system,
            storage_system = %storage,
            "Skipping grade record stored in a foreign scale"
        );
        return None;
    }

    match convert(grade.value, storage, display) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(grade_id = %grade.id, error = %e, "Skipping malformed grade record");
            None
        }
    }
}

/// Converts stored grades into the display scale for a grade table.
///
/// Values are rounded to two decimals. Malformed records are skipped.
pub fn display_grades(
    grades: &[Grade],
    storage: GradeSystem,
    display: GradeSystem,
) -> Vec<DisplayGrade> {
    grades
        .iter()
        .filter_map(|grade| {
            let value = to_display(grade, storage, display)?;
            Some(DisplayGrade {
                id: grade.id,
                subject: grade.subject.clone(),
                value: round2(value),
                system: display,
                date: grade.date,
                description: grade.description.clone(),
            })
        })
        .collect()
}

/// Aggregates a grade snapshot into overall and per-subject averages.
///
/// Each grade is converted from `storage` into `display_system`. The overall
/// average is the flat mean over all counted grades, not a mean of subject
/// averages. With [`DisplayLabel::Gpa`] the rounded averages are then
/// renormalized onto 0.0–4.0.
///
/// Records without a subject, with a non-finite value, or stored in a scale
/// other than `storage` are skipped with a warning.
pub fn aggregate(
    grades: &[Grade],
    storage: GradeSystem,
    display_system: GradeSystem,
    label: DisplayLabel,
) -> GradeAggregate {
    let mut all = Vec::with_capacity(grades.len());
    let mut by_subject: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut skipped = 0usize;

    for grade in grades {
        let Some(value) = to_display(grade, storage, display_system) else {
            skipped += 1;
            continue;
        };

        all.push(value);
        by_subject
            .entry(grade.subject.clone())
            .or_default()
            .push(value);
    }

    let relabel = |average: f64| match label {
        DisplayLabel::AverageGrade => average,
        DisplayLabel::Gpa => round2(normalize(average, display_system) * 4.0),
    };

    let overall_average = mean(&all).map(round2).map(relabel);

    let per_subject_average = by_subject
        .into_iter()
        .filter_map(|(subject, values)| {
            let average = mean(&values).map(round2).map(relabel)?;
            Some((subject, average))
        })
        .collect();

    debug!(
        counted = all.len(),
        skipped,
        display_system = %display_system,
        label = %label,
        "Aggregated grades"
    );

    GradeAggregate {
        overall_average,
        per_subject_average,
        display_system,
        display_label: label,
        counted: all.len(),
        skipped,
    }
}

//! The read/write boundary between a user's display scale and storage.
//!
//! Grades enter in the user's current display system and are converted to
//! [`GradeSystem::STORAGE`] before they reach the [`RecordStore`]. Every read
//! converts back. Nothing outside this module sees storage-scale values.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyzers::aggregate::{aggregate, display_grades};
use crate::analyzers::convert::convert;
use crate::analyzers::types::{
    DisplayGrade, DisplayLabel, DisplayPreference, Grade, GradeAggregate,
};
use crate::error::GradeError;
use crate::semester::{Semester, grades_in};
use crate::store::{GradePatch, PreferenceStore, RecordStore};
use crate::system::GradeSystem;

pub const GRADE_SYSTEM_KEY: &str = "gradeSystem";
pub const DISPLAY_LABEL_KEY: &str = "displayLabel";

/// A grade as submitted, with `value` in the user's display system.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGrade {
    pub subject: String,
    pub value: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Fields to change on an existing grade, `value` in the display system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeEdit {
    pub subject: Option<String>,
    pub value: Option<f64>,
    pub date: Option<NaiveDate>,
    /// A blank description clears the current one.
    pub description: Option<String>,
}

fn validate_subject(subject: &str) -> Result<String, GradeError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(GradeError::MissingSubject);
    }
    Ok(subject.to_string())
}

/// Blank descriptions are stored as no description.
fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Converts a submitted display value into the storage scale at full
/// precision. Out-of-range values are clamped to the display scale first.
pub fn to_storage(value: f64, display: GradeSystem) -> Result<f64, GradeError> {
    if !value.is_finite() {
        return Err(GradeError::InvalidGrade(value));
    }
    convert(display.range().clamp(value), display, GradeSystem::STORAGE)
}

pub struct GradeBook<R, P> {
    records: R,
    preferences: P,
}

impl<R: RecordStore, P: PreferenceStore> GradeBook<R, P> {
    pub fn new(records: R, preferences: P) -> Self {
        Self {
            records,
            preferences,
        }
    }

    /// Loads the user's display preference, falling back to defaults for
    /// unset or unreadable values.
    pub async fn preference(&self, user_id: &str) -> Result<DisplayPreference> {
        let mut preference = DisplayPreference::default();

        if let Some(raw) = self.preferences.get(user_id, GRADE_SYSTEM_KEY).await? {
            match raw.parse() {
                Ok(system) => preference.grade_system = system,
                Err(e) => warn!(user_id, error = %e, "Ignoring stored grade system"),
            }
        }

        if let Some(raw) = self.preferences.get(user_id, DISPLAY_LABEL_KEY).await? {
            match raw.parse() {
                Ok(label) => preference.display_label = label,
                Err(e) => warn!(user_id, error = %e, "Ignoring stored display label"),
            }
        }

        Ok(preference)
    }

    pub async fn set_grade_system(&self, user_id: &str, system: GradeSystem) -> Result<()> {
        self.preferences
            .set(user_id, GRADE_SYSTEM_KEY, system.tag())
            .await?;
        info!(user_id, grade_system = %system, "Grade system updated");
        Ok(())
    }

    pub async fn set_display_label(&self, user_id: &str, label: DisplayLabel) -> Result<()> {
        self.preferences
            .set(user_id, DISPLAY_LABEL_KEY, label.tag())
            .await?;
        info!(user_id, display_label = %label, "Display label updated");
        Ok(())
    }

    /// Validates and stores a grade entered in the user's display system.
    ///
    /// # Errors
    ///
    /// Fails with [`GradeError::MissingSubject`] or [`GradeError::InvalidGrade`]
    /// before anything is written, or with the store's error.
    #[tracing::instrument(skip(self, grade), fields(subject = %grade.subject))]
    pub async fn add_grade(&self, user_id: &str, grade: NewGrade) -> Result<DisplayGrade> {
        let subject = validate_subject(&grade.subject)?;
        let display = self.preference(user_id).await?.grade_system;
        let value = to_storage(grade.value, display)?;

        let stored = self
            .records
            .insert(
                user_id,
                Grade {
                    id: Uuid::new_v4(),
                    subject,
                    value,
                    system: GradeSystem::STORAGE,
                    date: grade.date,
                    description: normalize_description(grade.description),
                },
            )
            .await?;

        debug!(grade_id = %stored.id, entered = grade.value, stored = value, "Grade added");
        shown(&stored, display)
    }

    /// Applies an edit; a new value is read in the user's current display system.
    #[tracing::instrument(skip(self, edit))]
    pub async fn update_grade(
        &self,
        user_id: &str,
        id: Uuid,
        edit: GradeEdit,
    ) -> Result<DisplayGrade> {
        let display = self.preference(user_id).await?.grade_system;

        let patch = GradePatch {
            subject: edit.subject.as_deref().map(validate_subject).transpose()?,
            value: edit.value.map(|v| to_storage(v, display)).transpose()?,
            date: edit.date,
            description: edit.description.map(|d| normalize_description(Some(d))),
        };

        let stored = self.records.update(user_id, id, patch).await?;
        debug!(grade_id = %stored.id, "Grade updated");
        shown(&stored, display)
    }

    pub async fn delete_grade(&self, user_id: &str, id: Uuid) -> Result<()> {
        self.records.delete(user_id, id).await?;
        debug!(user_id, grade_id = %id, "Grade deleted");
        Ok(())
    }

    /// The user's grades in their display system, newest first.
    pub async fn list_grades(
        &self,
        user_id: &str,
        semester: Option<&Semester>,
    ) -> Result<Vec<DisplayGrade>> {
        let display = self.preference(user_id).await?.grade_system;
        let mut grades = self.snapshot(user_id, semester).await?;
        grades.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(display_grades(&grades, GradeSystem::STORAGE, display))
    }

    /// Aggregates the user's grades with their stored display preference.
    pub async fn summary(
        &self,
        user_id: &str,
        semester: Option<&Semester>,
    ) -> Result<GradeAggregate> {
        let preference = self.preference(user_id).await?;
        let grades = self.snapshot(user_id, semester).await?;
        Ok(aggregate(
            &grades,
            GradeSystem::STORAGE,
            preference.grade_system,
            preference.display_label,
        ))
    }

    async fn snapshot(&self, user_id: &str, semester: Option<&Semester>) -> Result<Vec<Grade>> {
        let grades = self.records.list(user_id).await?;
        Ok(match semester {
            Some(semester) => grades_in(&grades, semester).into_iter().cloned().collect(),
            None => grades,
        })
    }
}

fn shown(grade: &Grade, display: GradeSystem) -> Result<DisplayGrade> {
    display_grades(std::slice::from_ref(grade), grade.system, display)
        .pop()
        .ok_or_else(|| GradeError::InvalidGrade(grade.value).into())
}

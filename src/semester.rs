//! Semester date ranges and resolving which semester a date belongs to.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::analyzers::types::Grade;
use crate::error::GradeError;

/// A named, inclusive date range grades are grouped by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Semester {
    /// # Errors
    ///
    /// Returns [`GradeError::InvalidSemester`] if `end_date` precedes `start_date`.
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, GradeError> {
        let semester = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date,
            end_date,
        };
        semester.validate()?;
        Ok(semester)
    }

    pub fn validate(&self) -> Result<(), GradeError> {
        if self.end_date < self.start_date {
            return Err(GradeError::InvalidSemester {
                name: self.name.clone(),
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Returns the semester containing `date`. Where semesters overlap, the one
/// that started last wins.
pub fn semester_for(date: NaiveDate, semesters: &[Semester]) -> Option<&Semester> {
    semesters
        .iter()
        .filter(|s| s.contains(date))
        .max_by_key(|s| s.start_date)
}

/// Picks the semester to show by default on `today`.
///
/// Prefers the semester containing `today`, then the one that ended most
/// recently, then the earliest upcoming one.
pub fn default_semester(today: NaiveDate, semesters: &[Semester]) -> Option<&Semester> {
    semester_for(today, semesters)
        .or_else(|| {
            semesters
                .iter()
                .filter(|s| s.end_date < today)
                .max_by_key(|s| s.end_date)
        })
        .or_else(|| {
            semesters
                .iter()
                .filter(|s| s.start_date > today)
                .min_by_key(|s| s.start_date)
        })
}

/// Grades dated within `semester`.
pub fn grades_in<'a>(grades: &'a [Grade], semester: &Semester) -> Vec<&'a Grade> {
    grades.iter().filter(|g| semester.contains(g.date)).collect()
}

/// Loads semesters from a JSON array, rejecting inverted date ranges.
pub fn load_semesters(path: &Path) -> Result<Vec<Semester>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read semesters from {}", path.display()))?;
    let semesters: Vec<Semester> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse semesters in {}", path.display()))?;

    for semester in &semesters {
        semester.validate()?;
    }

    debug!(count = semesters.len(), path = %path.display(), "Loaded semesters");
    Ok(semesters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::GradeSystem;
    use std::env;
    use std::fs;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn year() -> Vec<Semester> {
        vec![
            Semester::new("Fall 2024", date(2024, 9, 1), date(2025, 1, 31)).unwrap(),
            Semester::new("Spring 2025", date(2025, 2, 1), date(2025, 6, 30)).unwrap(),
        ]
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = Semester::new("Broken", date(2025, 6, 1), date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, GradeError::InvalidSemester { .. }));
    }

    #[test]
    fn test_single_day_semester_is_valid() {
        let s = Semester::new("Intensive", date(2025, 7, 1), date(2025, 7, 1)).unwrap();
        assert!(s.contains(date(2025, 7, 1)));
    }

    #[test]
    fn test_semester_for_inclusive_bounds() {
        let semesters = year();
        assert_eq!(semester_for(date(2024, 9, 1), &semesters).unwrap().name, "Fall 2024");
        assert_eq!(semester_for(date(2025, 1, 31), &semesters).unwrap().name, "Fall 2024");
        assert_eq!(semester_for(date(2025, 2, 1), &semesters).unwrap().name, "Spring 2025");
        assert!(semester_for(date(2025, 8, 1), &semesters).is_none());
    }

    #[test]
    fn test_overlap_prefers_latest_start() {
        let mut semesters = year();
        semesters.push(Semester::new("Summer", date(2025, 6, 1), date(2025, 8, 31)).unwrap());
        assert_eq!(semester_for(date(2025, 6, 15), &semesters).unwrap().name, "Summer");
    }

    #[test]
    fn test_default_semester_fallbacks() {
        let semesters = year();
        assert_eq!(
            default_semester(date(2025, 3, 1), &semesters).unwrap().name,
            "Spring 2025"
        );
        assert_eq!(
            default_semester(date(2025, 8, 1), &semesters).unwrap().name,
            "Spring 2025"
        );
        assert_eq!(
            default_semester(date(2024, 8, 1), &semesters).unwrap().name,
            "Fall 2024"
        );
        assert!(default_semester(date(2025, 3, 1), &[]).is_none());
    }

    #[test]
    fn test_grades_in_filters_by_date() {
        let grade = |d: NaiveDate| Grade {
            id: Uuid::new_v4(),
            subject: "Math".into(),
            value: 5.0,
            system: GradeSystem::SixBest,
            date: d,
            description: None,
        };
        let grades = vec![grade(date(2024, 10, 1)), grade(date(2025, 3, 1))];
        let semesters = year();

        let fall = grades_in(&grades, &semesters[0]);
        assert_eq!(fall.len(), 1);
        assert_eq!(fall[0].date, date(2024, 10, 1));
    }

    #[test]
    fn test_load_semesters_from_json() {
        let path = env::temp_dir().join("gradebook_test_semesters.json");
        fs::write(&path, serde_json::to_string(&year()).unwrap()).unwrap();

        let loaded = load_semesters(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].name, "Spring 2025");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_semesters_rejects_inverted() {
        let path = env::temp_dir().join("gradebook_test_semesters_bad.json");
        let bad = Semester {
            id: Uuid::new_v4(),
            name: "Backwards".into(),
            start_date: date(2025, 6, 1),
            end_date: date(2025, 1, 1),
        };
        fs::write(&path, serde_json::to_string(&vec![bad]).unwrap()).unwrap();

        assert!(load_semesters(&path).is_err());

        fs::remove_file(&path).unwrap();
    }
}

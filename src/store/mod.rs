//! Persistence collaborators for grades and display preferences.
//!
//! [`RecordStore`] holds grade records, scoped per user.
//! [`PreferenceStore`] holds per-user key/value preferences.
//! [`MemoryStore`] implements both in memory; [`CsvRecordStore`] and
//! [`JsonPreferenceStore`] persist to local files.

mod memory;
mod preferences;
mod records;

pub use memory::MemoryStore;
pub use preferences::JsonPreferenceStore;
pub use records::CsvRecordStore;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::analyzers::types::Grade;

/// A partial update to a stored grade. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradePatch {
    pub subject: Option<String>,
    /// Already expressed in the grade's storage scale.
    pub value: Option<f64>,
    pub date: Option<NaiveDate>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl GradePatch {
    pub fn apply(&self, grade: &mut Grade) {
        if let Some(subject) = &self.subject {
            grade.subject = subject.clone();
        }
        if let Some(value) = self.value {
            grade.value = value;
        }
        if let Some(date) = self.date {
            grade.date = date;
        }
        if let Some(description) = &self.description {
            grade.description = description.clone();
        }
    }
}

/// Grade records owned by a user.
///
/// Updating or deleting an id the user does not own fails with
/// [`GradeError::GradeNotFound`](crate::error::GradeError::GradeNotFound).
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, user_id: &str) -> Result<Vec<Grade>>;
    async fn insert(&self, user_id: &str, grade: Grade) -> Result<Grade>;
    async fn update(&self, user_id: &str, id: Uuid, patch: GradePatch) -> Result<Grade>;
    async fn delete(&self, user_id: &str, id: Uuid) -> Result<()>;
}

/// Per-user string preferences.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, user_id: &str, key: &str) -> Result<Option<String>>;
    async fn set(&self, user_id: &str, key: &str, value: &str) -> Result<()>;
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// `grades.csv` becomes `grades.csv.tmp` in the same directory.
fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let mut name = path
        .file_name()
        .with_context(|| format!("{} is not a file path", path.display()))?
        .to_os_string();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}

/// Replaces the file at `path` with whatever `write` produces.
///
/// The content goes to a sibling temp file first and is renamed over `path`
/// once flushed, so readers see either the old file or the new one.
fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    ensure_parent(path)?;
    let tmp = temp_sibling(path)?;

    let result = File::create(&tmp)
        .with_context(|| format!("failed to create {}", tmp.display()))
        .and_then(|mut file| {
            write(&mut file)?;
            file.flush()?;
            file.sync_all()?;
            Ok(())
        })
        .and_then(|()| {
            std::fs::rename(&tmp, path)
                .with_context(|| format!("failed to replace {}", path.display()))
        });

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::GradeSystem;

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut grade = Grade {
            id: Uuid::new_v4(),
            subject: "Math".into(),
            value: 4.0,
            system: GradeSystem::SixBest,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            description: None,
        };

        GradePatch {
            value: Some(5.5),
            description: Some(Some("retake".into())),
            ..Default::default()
        }
        .apply(&mut grade);

        assert_eq!(grade.subject, "Math");
        assert_eq!(grade.value, 5.5);
        assert_eq!(grade.description.as_deref(), Some("retake"));

        GradePatch::default().apply(&mut grade);
        assert_eq!(grade.description.as_deref(), Some("retake"));

        GradePatch {
            description: Some(None),
            ..Default::default()
        }
        .apply(&mut grade);
        assert_eq!(grade.description, None);
        assert_eq!(grade.value, 5.5);
    }

    #[test]
    fn test_replace_file_leaves_no_temp_behind() {
        let path = std::env::temp_dir().join("gradebook_test_replace.txt");
        std::fs::write(&path, "old").unwrap();

        replace_file(&path, |file| Ok(file.write_all(b"new")?)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert!(!temp_sibling(&path).unwrap().exists());

        let failed = replace_file(&path, |_| anyhow::bail!("writer failed"));
        assert!(failed.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert!(!temp_sibling(&path).unwrap().exists());

        std::fs::remove_file(&path).unwrap();
    }
}

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{GradePatch, RecordStore, ensure_parent, replace_file};
use crate::analyzers::types::Grade;
use crate::error::GradeError;
use crate::system::GradeSystem;

/// Column order of [`GradeRow`].
const HEADER: [&str; 7] = [
    "user_id",
    "id",
    "subject",
    "value",
    "system",
    "date",
    "description",
];

/// One line of the grades CSV file.
#[derive(Debug, Serialize, Deserialize)]
struct GradeRow {
    user_id: String,
    id: Uuid,
    subject: String,
    value: f64,
    system: GradeSystem,
    date: NaiveDate,
    description: Option<String>,
}

impl GradeRow {
    fn new(user_id: &str, grade: &Grade) -> Self {
        Self {
            user_id: user_id.to_string(),
            id: grade.id,
            subject: grade.subject.clone(),
            value: grade.value,
            system: grade.system,
            date: grade.date,
            description: grade.description.clone(),
        }
    }

    fn to_grade(&self) -> Grade {
        Grade {
            id: self.id,
            subject: self.subject.clone(),
            value: self.value,
            system: self.system,
            date: self.date,
            description: self.description.clone(),
        }
    }
}

/// The parsed content of the grades file.
#[derive(Default)]
struct Rows {
    grades: Vec<GradeRow>,
    /// Lines that failed to parse, kept verbatim so rewrites do not drop them.
    unreadable: Vec<ByteRecord>,
}

/// Stores every user's grades in a single CSV file.
///
/// Inserts append a row; updates and deletes rewrite the file through a
/// temp file. All access goes through one lock so rewrites never interleave
/// with appends. Unreadable lines are skipped with a warning.
pub struct CsvRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(&self) -> Result<Rows> {
        if !self.path.exists() {
            return Ok(Rows::default());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = rdr
            .byte_headers()
            .with_context(|| format!("failed to read header of {}", self.path.display()))?
            .clone();
        let mut rows = Rows::default();

        for result in rdr.byte_records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Skipping unreadable grade row"
                    );
                    continue;
                }
            };

            match record.deserialize::<GradeRow>(Some(&headers)) {
                Ok(row) => rows.grades.push(row),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = record.position().map(|p| p.line()),
                        error = %e,
                        "Skipping unreadable grade row"
                    );
                    rows.unreadable.push(record);
                }
            }
        }

        Ok(rows)
    }

    fn write_rows(&self, rows: &Rows) -> Result<()> {
        replace_file(&self.path, |file| {
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(file);
            writer.write_record(HEADER)?;
            for row in &rows.grades {
                writer.serialize(row)?;
            }
            for record in &rows.unreadable {
                writer.write_byte_record(record)?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    fn append_row(&self, row: &GradeRow) -> Result<()> {
        ensure_parent(&self.path)?;
        let has_content = std::fs::metadata(&self.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        debug!(path = %self.path.display(), has_content, "Appending grade row");

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = WriterBuilder::new()
            .has_headers(!has_content)
            .from_writer(file);

        writer.serialize(row)?;
        writer.flush()?;

        Ok(())
    }

}

#[async_trait::async_trait]
impl RecordStore for CsvRecordStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Grade>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_rows()?
            .grades
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(GradeRow::to_grade)
            .collect())
    }

    async fn insert(&self, user_id: &str, grade: Grade) -> Result<Grade> {
        let _guard = self.lock.lock().await;
        self.append_row(&GradeRow::new(user_id, &grade))?;
        Ok(grade)
    }

    async fn update(&self, user_id: &str, id: Uuid, patch: GradePatch) -> Result<Grade> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows()?;

        let row = rows
            .grades
            .iter_mut()
            .find(|row| row.user_id == user_id && row.id == id)
            .ok_or(GradeError::GradeNotFound(id))?;

        let mut grade = row.to_grade();
        patch.apply(&mut grade);
        *row = GradeRow::new(user_id, &grade);

        self.write_rows(&rows)?;
        Ok(grade)
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows()?;
        let before = rows.grades.len();
        rows.grades
            .retain(|row| !(row.user_id == user_id && row.id == id));

        if rows.grades.len() == before {
            return Err(GradeError::GradeNotFound(id).into());
        }

        self.write_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn grade(subject: &str, value: f64) -> Grade {
        Grade {
            id: Uuid::new_v4(),
            subject: subject.into(),
            value,
            system: GradeSystem::SixBest,
            date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_missing_file_lists_nothing() {
        let store = CsvRecordStore::new(temp_path("gradebook_test_missing.csv"));
        let _ = fs::remove_file(store.path());
        assert!(store.list("ada").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_writes_header_once() {
        let path = temp_path("gradebook_test_header.csv");
        let _ = fs::remove_file(&path);
        let store = CsvRecordStore::new(&path);

        store.insert("ada", grade("Math", 5.0)).await.unwrap();
        store.insert("ada", grade("Bio", 4.25)).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("user_id")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_round_trips_full_precision() {
        let path = temp_path("gradebook_test_precision.csv");
        let _ = fs::remove_file(&path);
        let store = CsvRecordStore::new(&path);

        let mut precise = grade("Math", 10.0 / 3.0);
        precise.description = Some("quiz, part 1".into());
        store.insert("ada", precise.clone()).await.unwrap();

        let listed = store.list("ada").await.unwrap();
        assert_eq!(listed, vec![precise]);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_update_and_delete_are_user_scoped() {
        let path = temp_path("gradebook_test_scoped.csv");
        let _ = fs::remove_file(&path);
        let store = CsvRecordStore::new(&path);

        let ada = store.insert("ada", grade("Math", 5.0)).await.unwrap();
        store.insert("ben", grade("Math", 2.0)).await.unwrap();

        assert!(store.update("ben", ada.id, GradePatch::default()).await.is_err());

        let patch = GradePatch {
            value: Some(5.5),
            ..Default::default()
        };
        let updated = store.update("ada", ada.id, patch).await.unwrap();
        assert_eq!(updated.value, 5.5);
        assert_eq!(store.list("ada").await.unwrap()[0].value, 5.5);

        store.delete("ada", ada.id).await.unwrap();
        assert!(store.list("ada").await.unwrap().is_empty());
        assert_eq!(store.list("ben").await.unwrap().len(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_unreadable_row_is_skipped_and_kept() {
        let path = temp_path("gradebook_test_unreadable.csv");
        let _ = fs::remove_file(&path);
        let store = CsvRecordStore::new(&path);

        let math = store.insert("ada", grade("Math", 5.0)).await.unwrap();
        let bad_row = format!("ada,{},Bio,,6best,2025-01-02,\n", Uuid::new_v4());
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        std::io::Write::write_all(&mut file, bad_row.as_bytes()).unwrap();
        std::io::Write::write_all(&mut file, b"ada,short\n").unwrap();
        drop(file);

        let listed = store.list("ada").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, math.id);

        // A rewrite keeps the lines it could not parse.
        let patch = GradePatch {
            value: Some(4.0),
            ..Default::default()
        };
        store.update("ada", math.id, patch).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("user_id,id,subject,value,system,date,description\n"));
        assert!(content.contains(bad_row.trim_end()));
        assert!(content.contains("ada,short"));
        assert_eq!(store.list("ada").await.unwrap()[0].value, 4.0);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_rewrite_replaces_file_without_leftovers() {
        let path = temp_path("gradebook_test_rewrite.csv");
        let _ = fs::remove_file(&path);
        let store = CsvRecordStore::new(&path);

        let math = store.insert("ada", grade("Math", 5.0)).await.unwrap();
        let bio = store.insert("ada", grade("Bio", 3.0)).await.unwrap();
        store.delete("ada", math.id).await.unwrap();

        assert!(!temp_path("gradebook_test_rewrite.csv.tmp").exists());
        assert_eq!(store.list("ada").await.unwrap(), vec![bio]);

        // Appends after a rewrite do not repeat the header.
        store.insert("ada", grade("Art", 2.0)).await.unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| l.starts_with("user_id")).count(), 1);
        assert_eq!(store.list("ada").await.unwrap().len(), 2);

        fs::remove_file(&path).unwrap();
    }
}

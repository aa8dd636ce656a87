use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Result, anyhow};
use uuid::Uuid;

use super::{GradePatch, PreferenceStore, RecordStore};
use crate::analyzers::types::Grade;
use crate::error::GradeError;

/// Keeps grades and preferences in process memory.
#[derive(Default)]
pub struct MemoryStore {
    grades: RwLock<HashMap<String, Vec<Grade>>>,
    preferences: RwLock<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("memory store lock poisoned")
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Grade>> {
        let grades = self.grades.read().map_err(poisoned)?;
        Ok(grades.get(user_id).cloned().unwrap_or_default())
    }

    async fn insert(&self, user_id: &str, grade: Grade) -> Result<Grade> {
        let mut grades = self.grades.write().map_err(poisoned)?;
        grades
            .entry(user_id.to_string())
            .or_default()
            .push(grade.clone());
        Ok(grade)
    }

    async fn update(&self, user_id: &str, id: Uuid, patch: GradePatch) -> Result<Grade> {
        let mut grades = self.grades.write().map_err(poisoned)?;
        let grade = grades
            .get_mut(user_id)
            .and_then(|owned| owned.iter_mut().find(|g| g.id == id))
            .ok_or(GradeError::GradeNotFound(id))?;
        patch.apply(grade);
        Ok(grade.clone())
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> Result<()> {
        let mut grades = self.grades.write().map_err(poisoned)?;
        let owned = grades
            .get_mut(user_id)
            .ok_or(GradeError::GradeNotFound(id))?;
        let before = owned.len();
        owned.retain(|g| g.id != id);
        if owned.len() == before {
            return Err(GradeError::GradeNotFound(id).into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PreferenceStore for MemoryStore {
    async fn get(&self, user_id: &str, key: &str) -> Result<Option<String>> {
        let preferences = self.preferences.read().map_err(poisoned)?;
        Ok(preferences
            .get(&(user_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, user_id: &str, key: &str, value: &str) -> Result<()> {
        let mut preferences = self.preferences.write().map_err(poisoned)?;
        preferences.insert((user_id.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}

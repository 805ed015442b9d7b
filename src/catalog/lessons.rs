use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{Lesson, Presentation};
use super::tables::*;

impl Database {
    // ========================================================================
    // Lesson operations
    // ========================================================================

    /// Create a lesson, assigning it the next lesson number in its quarter.
    pub fn create_lesson(
        &self,
        quarter_id: &str,
        title: &str,
        created_by: i64,
    ) -> Result<Lesson, DatabaseError> {
        let write_txn = self.begin_write()?;

        let mut ids: Vec<String> = {
            let index = write_txn.open_table(QUARTER_LESSONS)?;
            let ids = index
                .get(quarter_id)?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();
            ids
        };

        let lesson = {
            let mut table = write_txn.open_table(LESSONS)?;

            let mut max_number = 0u32;
            for lid in &ids {
                let existing: Option<Lesson> = table
                    .get(lid.as_str())?
                    .map(|d| rmp_serde::from_slice(d.value()))
                    .transpose()?;
                if let Some(l) = existing {
                    max_number = max_number.max(l.lesson_number);
                }
            }

            let lesson = Lesson {
                id: uuid::Uuid::new_v4().to_string(),
                quarter_id: quarter_id.to_string(),
                lesson_number: max_number + 1,
                title: title.to_string(),
                created_by,
                created_at: Utc::now(),
            };

            let data = rmp_serde::to_vec_named(&lesson)?;
            table.insert(lesson.id.as_str(), data.as_slice())?;
            lesson
        };

        {
            let mut index = write_txn.open_table(QUARTER_LESSONS)?;
            ids.push(lesson.id.clone());
            let index_data = rmp_serde::to_vec_named(&ids)?;
            index.insert(quarter_id, index_data.as_slice())?;
        }

        write_txn.commit()?;
        Ok(lesson)
    }

    /// Get a lesson by its UUID
    pub fn get_lesson(&self, id: &str) -> Result<Option<Lesson>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(LESSONS)?;

        match table.get(id)? {
            Some(data) => {
                let lesson: Lesson = rmp_serde::from_slice(data.value())?;
                Ok(Some(lesson))
            }
            None => Ok(None),
        }
    }

    /// List a quarter's lessons ordered by lesson number
    pub fn list_lessons(&self, quarter_id: &str) -> Result<Vec<Lesson>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(QUARTER_LESSONS)?;
        let table = read_txn.open_table(LESSONS)?;

        let ids: Vec<String> = match index.get(quarter_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut lessons: Vec<Lesson> = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(data) = table.get(id.as_str())? {
                lessons.push(rmp_serde::from_slice(data.value())?);
            }
        }

        lessons.sort_by_key(|l| l.lesson_number);
        Ok(lessons)
    }

    /// Delete a lesson and cascade to all of its presentations.
    ///
    /// Returns the lesson together with the child presentations that were
    /// removed; the caller owns cleaning up their blobs. The whole cascade
    /// commits in one transaction. No renumbering is needed since the entire
    /// lesson's catalog is gone.
    pub fn delete_lesson(
        &self,
        id: &str,
    ) -> Result<Option<(Lesson, Vec<Presentation>)>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let lesson: Option<Lesson> = {
            let table = write_txn.open_table(LESSONS)?;
            let lesson = table
                .get(id)?
                .map(|d| rmp_serde::from_slice(d.value()))
                .transpose()?;
            lesson
        };
        let Some(lesson) = lesson else {
            return Ok(None);
        };

        // Capture children before removing anything
        let child_ids: Vec<String> = {
            let index = write_txn.open_table(LESSON_PRESENTATIONS)?;
            let ids = index
                .get(id)?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();
            ids
        };

        let mut children: Vec<Presentation> = Vec::with_capacity(child_ids.len());
        {
            let mut table = write_txn.open_table(PRESENTATIONS)?;
            for pid in &child_ids {
                let child: Option<Presentation> = table
                    .get(pid.as_str())?
                    .map(|d| rmp_serde::from_slice(d.value()))
                    .transpose()?;
                if let Some(p) = child {
                    children.push(p);
                }
                table.remove(pid.as_str())?;
            }
        }

        {
            let mut index = write_txn.open_table(LESSON_PRESENTATIONS)?;
            index.remove(id)?;
        }

        {
            let mut table = write_txn.open_table(LESSONS)?;
            table.remove(id)?;
        }

        // Drop the lesson from its quarter index
        let quarter_ids: Vec<String> = {
            let index = write_txn.open_table(QUARTER_LESSONS)?;
            let ids = index
                .get(lesson.quarter_id.as_str())?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();
            ids
        };
        let remaining: Vec<String> = quarter_ids.into_iter().filter(|lid| lid != id).collect();
        {
            let mut index = write_txn.open_table(QUARTER_LESSONS)?;
            if remaining.is_empty() {
                index.remove(lesson.quarter_id.as_str())?;
            } else {
                let data = rmp_serde::to_vec_named(&remaining)?;
                index.insert(lesson.quarter_id.as_str(), data.as_slice())?;
            }
        }

        write_txn.commit()?;
        Ok(Some((lesson, children)))
    }
}

use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{NewPresentation, Presentation};
use super::tables::*;

impl Database {
    // ========================================================================
    // Presentation operations
    // ========================================================================

    /// Catalog a batch of new presentations for a lesson, assigning each its
    /// display order.
    ///
    /// The next order is computed once per item (`1 + max(existing)`) inside
    /// a single write transaction, so either every row lands with a gap-free
    /// order or none do. redb allows one writer at a time, which keeps
    /// concurrent uploads to the same lesson from observing the same max.
    ///
    /// Returns `None` if the lesson does not exist.
    pub fn create_presentations(
        &self,
        lesson_id: &str,
        items: Vec<NewPresentation>,
    ) -> Result<Option<Vec<Presentation>>, DatabaseError> {
        let write_txn = self.begin_write()?;

        {
            let lessons = write_txn.open_table(LESSONS)?;
            if lessons.get(lesson_id)?.is_none() {
                // Dropping the transaction aborts it
                return Ok(None);
            }
        }

        let mut ids: Vec<String> = {
            let index = write_txn.open_table(LESSON_PRESENTATIONS)?;
            let ids = index
                .get(lesson_id)?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();
            ids
        };

        let mut created = Vec::with_capacity(items.len());
        {
            let mut table = write_txn.open_table(PRESENTATIONS)?;
            for item in items {
                debug_assert!(
                    item.category.owns_blob() || item.external_ref.is_none(),
                    "link items must not carry an external ref"
                );

                let mut max_order = 0u32;
                for pid in &ids {
                    let existing: Option<Presentation> = table
                        .get(pid.as_str())?
                        .map(|d| rmp_serde::from_slice(d.value()))
                        .transpose()?;
                    if let Some(p) = existing {
                        max_order = max_order.max(p.display_order);
                    }
                }

                let presentation = Presentation {
                    id: uuid::Uuid::new_v4().to_string(),
                    lesson_id: lesson_id.to_string(),
                    category: item.category,
                    file_url: item.file_url,
                    external_ref: item.external_ref,
                    title: item.title,
                    description: item.description,
                    display_order: max_order + 1,
                    created_by: item.created_by,
                    created_at: Utc::now(),
                };

                let data = rmp_serde::to_vec_named(&presentation)?;
                table.insert(presentation.id.as_str(), data.as_slice())?;
                ids.push(presentation.id.clone());
                created.push(presentation);
            }
        }

        {
            let mut index = write_txn.open_table(LESSON_PRESENTATIONS)?;
            let index_data = rmp_serde::to_vec_named(&ids)?;
            index.insert(lesson_id, index_data.as_slice())?;
        }

        write_txn.commit()?;
        Ok(Some(created))
    }

    /// Get a presentation by its UUID
    pub fn get_presentation(&self, id: &str) -> Result<Option<Presentation>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PRESENTATIONS)?;

        match table.get(id)? {
            Some(data) => {
                let presentation: Presentation = rmp_serde::from_slice(data.value())?;
                Ok(Some(presentation))
            }
            None => Ok(None),
        }
    }

    /// List a lesson's presentations ordered ascending by display order
    pub fn list_presentations(&self, lesson_id: &str) -> Result<Vec<Presentation>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(LESSON_PRESENTATIONS)?;
        let table = read_txn.open_table(PRESENTATIONS)?;

        let ids: Vec<String> = match index.get(lesson_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut items: Vec<Presentation> = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(data) = table.get(id.as_str())? {
                items.push(rmp_serde::from_slice(data.value())?);
            }
        }

        items.sort_by_key(|p| p.display_order);
        Ok(items)
    }

    /// Delete a presentation and close the gap it leaves: every sibling with
    /// a higher display order is decremented by one, in the same transaction,
    /// so the {1..N} invariant holds at every commit point.
    ///
    /// Returns the removed record (the caller needs its external ref for blob
    /// cleanup), or `None` if no such presentation exists.
    pub fn delete_presentation(&self, id: &str) -> Result<Option<Presentation>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let deleted: Option<Presentation> = {
            let table = write_txn.open_table(PRESENTATIONS)?;
            let deleted = table
                .get(id)?
                .map(|d| rmp_serde::from_slice(d.value()))
                .transpose()?;
            deleted
        };
        let Some(deleted) = deleted else {
            return Ok(None);
        };

        {
            let mut table = write_txn.open_table(PRESENTATIONS)?;
            table.remove(id)?;
        }

        // Remove from the lesson index
        let ids: Vec<String> = {
            let index = write_txn.open_table(LESSON_PRESENTATIONS)?;
            let ids = index
                .get(deleted.lesson_id.as_str())?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();
            ids
        };
        let remaining: Vec<String> = ids.into_iter().filter(|pid| pid != id).collect();
        {
            let mut index = write_txn.open_table(LESSON_PRESENTATIONS)?;
            if remaining.is_empty() {
                index.remove(deleted.lesson_id.as_str())?;
            } else {
                let data = rmp_serde::to_vec_named(&remaining)?;
                index.insert(deleted.lesson_id.as_str(), data.as_slice())?;
            }
        }

        // Renumber siblings that sat above the removed slot
        {
            let mut table = write_txn.open_table(PRESENTATIONS)?;
            for pid in &remaining {
                let sibling: Option<Presentation> = table
                    .get(pid.as_str())?
                    .map(|d| rmp_serde::from_slice(d.value()))
                    .transpose()?;
                if let Some(mut p) = sibling {
                    if p.display_order > deleted.display_order {
                        p.display_order -= 1;
                        let data = rmp_serde::to_vec_named(&p)?;
                        table.insert(pid.as_str(), data.as_slice())?;
                    }
                }
            }
        }

        write_txn.commit()?;
        Ok(Some(deleted))
    }
}

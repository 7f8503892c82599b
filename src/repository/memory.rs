//! Implements a repository that keeps its records in memory.

use rusqlite::ffi;

use crate::{
    Error,
    database_id::DatabaseId,
    record::{Filter, Record},
};

use super::{Repository, ensure_saved, ensure_unsaved, find_duplicate, missing_record};

/// Keeps records in a list for the lifetime of the repository.
///
/// Primary keys start at 1 and are never reused. Nothing is persisted.
/// References between records of the same type are enforced like SQLite's
/// foreign keys (a category with subcategories cannot be deleted), but
/// deleting a category does not touch expenses kept in another repository.
#[derive(Debug, Clone)]
pub struct MemoryRepository<T> {
    records: Vec<T>,
    last_pk: DatabaseId,
}

impl<T: Record> MemoryRepository<T> {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            last_pk: 0,
        }
    }

    fn position(&self, pk: DatabaseId) -> Option<usize> {
        self.records.iter().position(|record| record.pk() == pk)
    }
}

impl<T: Record> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Repository<T> for MemoryRepository<T> {
    fn add(&mut self, record: &mut T) -> Result<DatabaseId, Error> {
        if let Some(pk) = find_duplicate(&*self, record)? {
            record.set_pk(pk);
            return Ok(pk);
        }

        ensure_unsaved(record)?;

        self.last_pk += 1;
        record.set_pk(self.last_pk);
        self.records.push(record.clone());

        Ok(self.last_pk)
    }

    fn get(&self, pk: DatabaseId) -> Result<Option<T>, Error> {
        Ok(self.position(pk).map(|index| self.records[index].clone()))
    }

    fn get_all(&self, filter: Option<&Filter<T::Field>>) -> Result<Vec<T>, Error> {
        let records = match filter {
            Some(filter) => self
                .records
                .iter()
                .filter(|record| filter.matches(*record))
                .cloned()
                .collect(),
            None => self.records.clone(),
        };

        Ok(records)
    }

    fn update(&mut self, record: &T) -> Result<(), Error> {
        ensure_saved(record)?;

        let index = self
            .position(record.pk())
            .ok_or_else(|| missing_record::<T>(record.pk()))?;
        self.records[index].update_from(record);

        Ok(())
    }

    fn delete(&mut self, pk: DatabaseId) -> Result<(), Error> {
        let referenced = self
            .records
            .iter()
            .any(|record| record.pk() != pk && record.refers_to(pk));
        if referenced {
            return Err(foreign_key_violation());
        }

        self.records.retain(|record| record.pk() != pk);

        Ok(())
    }
}

/// The error SQLite reports when a delete would leave a dangling reference.
fn foreign_key_violation() -> Error {
    Error::SqlError(rusqlite::Error::SqliteFailure(
        ffi::Error::new(ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
        Some("FOREIGN KEY constraint failed".to_owned()),
    ))
}

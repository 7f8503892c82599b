//! Contains the repository trait and its in-memory and SQLite realizations.

mod memory;
mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::{SqliteRepository, Table};

use crate::{
    Error,
    category::{Category, CategoryField},
    database_id::DatabaseId,
    record::{AnyRecord, Filter, Record},
};

/// Creates, retrieves, updates and deletes records of one type.
///
/// Every realization follows the same contract:
/// - `add` rejects records that already carry a primary key, except when the
///   record type has a de-duplication key (see [Record::dedup_key]) and an
///   equivalent record exists, in which case that record's key is returned,
/// - `get` returns `Ok(None)` for unknown keys,
/// - `get_all` returns records in insertion order,
/// - `update` rejects records that were never stored,
/// - `delete` ignores unknown keys.
pub trait Repository<T: Record> {
    /// Store a new record, write the assigned primary key into `record` and
    /// return it.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::InvalidArgument] if `record` already has a primary key,
    /// - or [Error::SqlError] if the store rejects the record.
    fn add(&mut self, record: &mut T) -> Result<DatabaseId, Error>;

    /// Retrieve the record with the primary key `pk`.
    fn get(&self, pk: DatabaseId) -> Result<Option<T>, Error>;

    /// Retrieve all records, or only those matching `filter`, in insertion
    /// order.
    fn get_all(&self, filter: Option<&Filter<T::Field>>) -> Result<Vec<T>, Error>;

    /// Replace the mutable fields of the stored record with the same primary
    /// key as `record`.
    ///
    /// # Errors
    /// This function will return an [Error::InvalidArgument] if `record` has
    /// never been stored or there is no record with its primary key.
    fn update(&mut self, record: &T) -> Result<(), Error>;

    /// Delete the record with the primary key `pk`, if there is one.
    fn delete(&mut self, pk: DatabaseId) -> Result<(), Error>;

    /// Store a record whose type is only known at runtime.
    ///
    /// # Errors
    /// Returns an [Error::TypeMismatch] if `record` is not a `T`, otherwise
    /// the same errors as [Repository::add].
    fn add_record(&mut self, record: AnyRecord) -> Result<T, Error> {
        let mut record = T::from_any(record)?;
        self.add(&mut record)?;

        Ok(record)
    }

    /// Update a record whose type is only known at runtime.
    ///
    /// # Errors
    /// Returns an [Error::TypeMismatch] if `record` is not a `T`, otherwise
    /// the same errors as [Repository::update].
    fn update_record(&mut self, record: AnyRecord) -> Result<(), Error> {
        let record = T::from_any(record)?;
        self.update(&record)
    }
}

/// Lookups that only make sense for categories.
pub trait CategoryRepository: Repository<Category> {
    /// Get the first category, by primary key, named exactly `name`.
    fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, Error> {
        let filter = Filter::new().eq(CategoryField::Name, name.to_owned());

        Ok(self.get_all(Some(&filter))?.into_iter().next())
    }
}

impl<R> CategoryRepository for R where R: Repository<Category> + ?Sized {}

/// Find the primary key of a stored record equivalent to `record`.
fn find_duplicate<T, R>(repository: &R, record: &T) -> Result<Option<DatabaseId>, Error>
where
    T: Record,
    R: Repository<T> + ?Sized,
{
    let Some(key) = record.dedup_key() else {
        return Ok(None);
    };

    let existing = repository.get_all(Some(&key))?;

    Ok(existing.first().map(Record::pk))
}

fn ensure_unsaved<T: Record>(record: &T) -> Result<(), Error> {
    if record.is_saved() {
        return Err(Error::InvalidArgument(format!(
            "cannot add a {} that already has the primary key {}",
            T::KIND,
            record.pk()
        )));
    }

    Ok(())
}

fn ensure_saved<T: Record>(record: &T) -> Result<(), Error> {
    if !record.is_saved() {
        return Err(Error::InvalidArgument(format!(
            "cannot update a {} that has no primary key",
            T::KIND
        )));
    }

    Ok(())
}

fn missing_record<T: Record>(pk: DatabaseId) -> Error {
    Error::InvalidArgument(format!("there is no {} with the primary key {pk}", T::KIND))
}

/*! This module defines the traits for mapping records to and from SQLite tables and sets up new databases. */

use rusqlite::{Connection, Row, Transaction as SqlTransaction};

use crate::{Budget, Category, Error, Expense};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create the table for the model if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
///
/// # Examples
/// ```
/// use rusqlite::{Connection, Row};
///
/// use bookkeeper::db::{CreateTable, MapRow};
///
/// struct Note {
///     pk: i64,
///     text: String,
/// }
///
/// impl CreateTable for Note {
///     fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
///         connection.execute(
///             "CREATE TABLE IF NOT EXISTS notes (pk INTEGER PRIMARY KEY, text TEXT NOT NULL)",
///             (),
///         )?;
///
///         Ok(())
///     }
/// }
///
/// impl MapRow for Note {
///     type ReturnType = Self;
///
///     fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
///         Ok(Self {
///             pk: row.get(offset)?,
///             text: row.get(offset + 1)?,
///         })
///     }
/// }
///
/// let connection = Connection::open_in_memory().unwrap();
/// Note::create_table(&connection).unwrap();
/// connection.execute("INSERT INTO notes (text) VALUES ('hello')", ()).unwrap();
///
/// let note = connection
///     .query_row("SELECT pk, text FROM notes", [], Note::map_row)
///     .unwrap();
///
/// assert_eq!(note.text, "hello");
/// ```
pub trait MapRow {
    /// The type that a row is converted into.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains all the table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type, reading from column `offset` onwards.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Turn on foreign key enforcement for `connection`.
///
/// SQLite keeps this setting per connection, so it must be set every time a
/// database is opened for parent links and cascading deletes to work.
pub fn enable_foreign_keys(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Create the tables for every record type.
///
/// Existing tables are left untouched, so this is safe to run on a database
/// that has already been initialized.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    enable_foreign_keys(connection)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    Category::create_table(&transaction)?;
    Expense::create_table(&transaction)?;
    Budget::create_table(&transaction)?;

    transaction.commit()?;

    tracing::debug!("initialized the category, expense and budget tables");

    Ok(())
}

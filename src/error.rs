//! Defines the crate level error type.

use std::path::PathBuf;

use crate::record::RecordKind;

/// The errors that may occur when working with the bookkeeper's records.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The store file does not exist or could not be opened.
    ///
    /// No repository is created when this error is returned.
    #[error("could not open the store at {path:?}: {reason}")]
    Configuration {
        /// The path that was given for the store file.
        path: PathBuf,
        /// Why the store could not be opened.
        reason: String,
    },

    /// The caller broke the repository contract, e.g. by adding a record
    /// that already has a primary key or updating one that has never been
    /// persisted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A record of one kind was passed to a repository bound to another kind.
    #[error("expected a {expected} record but got a {found} record")]
    TypeMismatch {
        /// The kind of record the repository stores.
        expected: RecordKind,
        /// The kind of record that was passed in.
        found: RecordKind,
    },

    /// The indented category text could not be turned into a tree.
    ///
    /// `line` is the 1-based line number in the original input, blank lines
    /// included.
    #[error("malformed category tree at line {line}: {reason}")]
    MalformedTree {
        /// The line that could not be placed in the tree.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// An error reported by the store, e.g. a foreign key violation.
    ///
    /// These are passed on to the caller untranslated.
    #[error("an SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Error::SqlError(value)
    }
}

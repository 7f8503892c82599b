//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
///
/// A value of [UNSAVED_ID] marks a record that has not been persisted yet.
pub type DatabaseId = i64;

/// The ID of a category.
pub type CategoryId = DatabaseId;

/// The primary key carried by records that have not been added to a repository.
pub const UNSAVED_ID: DatabaseId = 0;

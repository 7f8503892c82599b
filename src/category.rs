//! This file defines the `Category` type and how categories are stored.
//! Categories form a tree: each category may have a parent category, and every expense belongs to exactly one category.

use std::fmt::Display;

use rusqlite::{Connection, Row, types::Value};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{CategoryId, DatabaseId, UNSAVED_ID},
    db::{CreateTable, MapRow},
    record::{Affinity, AnyRecord, Field, Filter, Record, RecordKind},
    repository::{Repository, Table},
    tree::TreeNode,
};

// ============================================================================
// MODELS
// ============================================================================

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an error if `name` is an empty string or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.trim().is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A spending category, e.g. 'Food', or 'Meat' inside 'Food'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The primary key of the category, [UNSAVED_ID] until it is stored.
    pub pk: DatabaseId,

    /// The name of the category.
    pub name: CategoryName,

    /// The primary key of the parent category, `None` for top-level categories.
    pub parent: Option<CategoryId>,
}

impl Category {
    /// Create a category that has not been stored yet.
    pub fn new(name: CategoryName, parent: Option<CategoryId>) -> Self {
        Self {
            pk: UNSAVED_ID,
            name,
            parent,
        }
    }

    /// Store every category in `forest`, parents before their children.
    ///
    /// Each node is added with the primary key its parent resolved to, so a
    /// node whose name already exists reuses that category (and keeps its
    /// original parent). Running this twice with the same forest does not
    /// create duplicates.
    ///
    /// Returns the stored categories in the order they were visited.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::EmptyCategoryName] if a node has a blank name,
    /// - or any error returned by [Repository::add].
    pub fn create_from_tree<R>(
        forest: &[TreeNode],
        repository: &mut R,
    ) -> Result<Vec<Self>, Error>
    where
        R: Repository<Self> + ?Sized,
    {
        let mut created = Vec::new();

        for root in forest {
            add_subtree(root, None, repository, &mut created)?;
        }

        tracing::info!("stored a tree of {} categories", created.len());

        Ok(created)
    }
}

fn add_subtree<R>(
    node: &TreeNode,
    parent: Option<CategoryId>,
    repository: &mut R,
    created: &mut Vec<Category>,
) -> Result<(), Error>
where
    R: Repository<Category> + ?Sized,
{
    let mut category = Category::new(CategoryName::new(&node.name)?, parent);
    let pk = repository.add(&mut category)?;
    created.push(category);

    for child in &node.children {
        add_subtree(child, Some(pk), repository, created)?;
    }

    Ok(())
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "{}: {} (parent {parent})", self.pk, self.name),
            None => write!(f, "{}: {}", self.pk, self.name),
        }
    }
}

/// The fields categories can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    /// The category name.
    Name,
    /// The primary key of the parent category.
    Parent,
}

impl Field for CategoryField {
    fn column(self) -> &'static str {
        match self {
            CategoryField::Name => "name",
            CategoryField::Parent => "parent",
        }
    }

    fn affinity(self) -> Affinity {
        match self {
            CategoryField::Name => Affinity::Text,
            CategoryField::Parent => Affinity::Integer,
        }
    }
}

impl Record for Category {
    type Field = CategoryField;

    const KIND: RecordKind = RecordKind::Category;

    fn pk(&self) -> DatabaseId {
        self.pk
    }

    fn set_pk(&mut self, pk: DatabaseId) {
        self.pk = pk;
    }

    fn field_value(&self, field: CategoryField) -> Value {
        match field {
            CategoryField::Name => Value::Text(self.name.to_string()),
            CategoryField::Parent => self.parent.map_or(Value::Null, Value::Integer),
        }
    }

    fn update_from(&mut self, other: &Self) {
        self.name = other.name.clone();
        self.parent = other.parent;
    }

    fn refers_to(&self, pk: DatabaseId) -> bool {
        self.parent == Some(pk)
    }

    /// Categories are identified by name when they are added.
    fn dedup_key(&self) -> Option<Filter<CategoryField>> {
        Some(Filter::new().eq(CategoryField::Name, self.name.to_string()))
    }

    fn from_any(record: AnyRecord) -> Result<Self, Error> {
        match record {
            AnyRecord::Category(category) => Ok(category),
            other => Err(other.mismatch(RecordKind::Category)),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

impl CreateTable for Category {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS categories (
                pk INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                parent INTEGER REFERENCES categories(pk)
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Category {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        let pk = row.get(offset)?;

        let raw_name: String = row.get(offset + 1)?;
        let name = CategoryName::new_unchecked(&raw_name);

        let parent = row.get(offset + 2)?;

        Ok(Self { pk, name, parent })
    }
}

impl Table for Category {
    const TABLE_NAME: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &["pk", "name", "parent"];
    const INSERT_COLUMNS: &'static [&'static str] = &["name", "parent"];
    const UPDATE_COLUMNS: &'static [&'static str] = &["name", "parent"];

    fn insert_values(&self) -> Vec<Value> {
        vec![
            self.field_value(CategoryField::Name),
            self.field_value(CategoryField::Parent),
        ]
    }

    fn update_values(&self) -> Vec<Value> {
        self.insert_values()
    }
}

// ============================================================================
// TESTS
// ============================================================================

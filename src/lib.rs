//! Bookkeeper records what you spend and where you spend it.
//!
//! This library provides the persistence layer: a [Repository] abstraction
//! with in-memory ([MemoryRepository]) and SQLite ([SqliteRepository])
//! realizations, the [Category], [Expense] and [Budget] records, and
//! [read_tree] for turning an indented outline into a category hierarchy.
//!
//! ```
//! use bookkeeper::{
//!     Category, CategoryRepository, Expense, IndentPolicy, MemoryRepository, Repository,
//!     read_tree,
//! };
//!
//! let mut categories: MemoryRepository<Category> = MemoryRepository::new();
//! let mut expenses: MemoryRepository<Expense> = MemoryRepository::new();
//!
//! let forest = read_tree("food\n    sweets\nbooks".lines(), IndentPolicy::Reject).unwrap();
//! Category::create_from_tree(&forest, &mut categories).unwrap();
//!
//! let sweets = categories.get_category_by_name("sweets").unwrap().unwrap();
//! let mut expense = Expense::new(450, sweets.pk);
//! expenses.add(&mut expense).unwrap();
//!
//! assert_eq!(expenses.get_all(None).unwrap(), vec![expense]);
//! ```

#![warn(missing_docs)]

mod budget;
mod category;
mod client;
mod config;
mod database_id;
pub mod db;
mod error;
mod expense;
mod logging;
mod record;
mod repository;
mod timestamp;
mod tree;

pub use budget::{Budget, BudgetField};
pub use category::{Category, CategoryField, CategoryName};
pub use client::{Client, Command, PROMPT};
pub use config::{DB_PATH_ENV, DEFAULT_CATEGORY_TREE, TreeArgs};
pub use database_id::{CategoryId, DatabaseId, UNSAVED_ID};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{Expense, ExpenseBuilder, ExpenseField};
pub use logging::setup_logging;
pub use record::{Affinity, AnyRecord, Field, Filter, Record, RecordKind};
pub use repository::{CategoryRepository, MemoryRepository, Repository, SqliteRepository, Table};
pub use tree::{IndentPolicy, TreeNode, flatten, read_tree};

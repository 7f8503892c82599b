//! Defines the expense record and how expenses are stored.

use std::fmt::Display;

use rusqlite::{Connection, Row, types::Value};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    Error,
    category::Category,
    database_id::{CategoryId, DatabaseId, UNSAVED_ID},
    db::{CreateTable, MapRow},
    record::{Affinity, AnyRecord, Field, Record, RecordKind},
    repository::Table,
    timestamp,
};

// ============================================================================
// MODELS
// ============================================================================

/// Money spent in a category.
///
/// To create a new `Expense`, use [Expense::new] or [Expense::build].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// The primary key of the expense, [UNSAVED_ID] until it is stored.
    pub pk: DatabaseId,
    /// The amount spent, in the smallest unit of the currency (e.g. cents).
    pub amount: i64,
    /// The primary key of the category the expense belongs to.
    pub category: CategoryId,
    /// When the money was spent (UTC).
    pub expense_date: PrimitiveDateTime,
    /// When the expense was recorded (UTC). Never changes after creation.
    pub added_date: PrimitiveDateTime,
    /// An optional note about the expense.
    pub comment: Option<String>,
}

impl Expense {
    /// Create an expense that happened just now, without a comment.
    pub fn new(amount: i64, category: CategoryId) -> Self {
        Self::build(amount, category).finalize()
    }

    /// Start building an expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(amount: i64, category: CategoryId) -> ExpenseBuilder {
        ExpenseBuilder {
            amount,
            category,
            expense_date: None,
            comment: None,
        }
    }
}

/// A builder for creating [Expense] instances.
///
/// # Examples
///
/// ```
/// use bookkeeper::Expense;
/// use time::macros::datetime;
///
/// let expense = Expense::build(1250, 1)
///     .expense_date(Some(datetime!(2024-05-01 12:30)))
///     .comment(Some("Groceries".to_owned()))
///     .finalize();
///
/// assert_eq!(expense.pk, 0);
/// assert_eq!(expense.expense_date, datetime!(2024-05-01 12:30));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct ExpenseBuilder {
    /// The amount spent, in the smallest unit of the currency.
    pub amount: i64,

    /// The primary key of the category the expense belongs to.
    pub category: CategoryId,

    /// When the money was spent.
    ///
    /// Defaults to the time [ExpenseBuilder::finalize] is called.
    pub expense_date: Option<PrimitiveDateTime>,

    /// An optional note, e.g. where the money was spent.
    pub comment: Option<String>,
}

impl ExpenseBuilder {
    /// Set when the money was spent.
    pub fn expense_date(mut self, expense_date: Option<PrimitiveDateTime>) -> Self {
        self.expense_date = expense_date;
        self
    }

    /// Set the comment for the expense.
    pub fn comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Create the expense, recording the current time as its creation time.
    pub fn finalize(self) -> Expense {
        let added_date = timestamp::now();

        Expense {
            pk: UNSAVED_ID,
            amount: self.amount,
            category: self.category,
            expense_date: self.expense_date.unwrap_or(added_date),
            added_date,
            comment: self.comment,
        }
    }
}

impl Display for Expense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} in category {} on {}",
            self.pk,
            self.amount,
            self.category,
            timestamp::format(&self.expense_date)
        )?;

        match &self.comment {
            Some(comment) => write!(f, " ({comment})"),
            None => Ok(()),
        }
    }
}

/// The fields expenses can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseField {
    /// The amount spent.
    Amount,
    /// The primary key of the category.
    Category,
    /// The comment.
    Comment,
}

impl Field for ExpenseField {
    fn column(self) -> &'static str {
        match self {
            ExpenseField::Amount => "amount",
            ExpenseField::Category => "category",
            ExpenseField::Comment => "comment",
        }
    }

    fn affinity(self) -> Affinity {
        match self {
            ExpenseField::Amount | ExpenseField::Category => Affinity::Integer,
            ExpenseField::Comment => Affinity::Text,
        }
    }
}

impl Record for Expense {
    type Field = ExpenseField;

    const KIND: RecordKind = RecordKind::Expense;

    fn pk(&self) -> DatabaseId {
        self.pk
    }

    fn set_pk(&mut self, pk: DatabaseId) {
        self.pk = pk;
    }

    fn field_value(&self, field: ExpenseField) -> Value {
        match field {
            ExpenseField::Amount => Value::Integer(self.amount),
            ExpenseField::Category => Value::Integer(self.category),
            ExpenseField::Comment => self.comment.clone().map_or(Value::Null, Value::Text),
        }
    }

    fn update_from(&mut self, other: &Self) {
        self.amount = other.amount;
        self.category = other.category;
        self.comment = other.comment.clone();
    }

    fn from_any(record: AnyRecord) -> Result<Self, Error> {
        match record {
            AnyRecord::Expense(expense) => Ok(expense),
            other => Err(other.mismatch(RecordKind::Expense)),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

impl CreateTable for Expense {
    /// Create the expense table, and the category table it refers to.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        Category::create_table(connection)?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS expenses (
                pk INTEGER PRIMARY KEY AUTOINCREMENT,
                amount INTEGER NOT NULL,
                category INTEGER NOT NULL,
                expense_date DATETIME DEFAULT CURRENT_TIMESTAMP,
                added_date DATETIME DEFAULT CURRENT_TIMESTAMP,
                comment TEXT,
                FOREIGN KEY(category) REFERENCES categories(pk) ON DELETE CASCADE
            )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category);",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Expense {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            pk: row.get(offset)?,
            amount: row.get(offset + 1)?,
            category: row.get(offset + 2)?,
            expense_date: row.get(offset + 3)?,
            added_date: row.get(offset + 4)?,
            comment: row.get(offset + 5)?,
        })
    }
}

impl Table for Expense {
    const TABLE_NAME: &'static str = "expenses";
    const COLUMNS: &'static [&'static str] = &[
        "pk",
        "amount",
        "category",
        "expense_date",
        "added_date",
        "comment",
    ];
    const INSERT_COLUMNS: &'static [&'static str] =
        &["amount", "category", "expense_date", "added_date", "comment"];
    const UPDATE_COLUMNS: &'static [&'static str] = &["amount", "category", "comment"];

    fn insert_values(&self) -> Vec<Value> {
        vec![
            self.field_value(ExpenseField::Amount),
            self.field_value(ExpenseField::Category),
            Value::Text(timestamp::format(&self.expense_date)),
            Value::Text(timestamp::format(&self.added_date)),
            self.field_value(ExpenseField::Comment),
        ]
    }

    fn update_values(&self) -> Vec<Value> {
        vec![
            self.field_value(ExpenseField::Amount),
            self.field_value(ExpenseField::Category),
            self.field_value(ExpenseField::Comment),
        ]
    }
}

//! Defines the budget record.
//!
//! A budget is the amount of money the user plans to spend. It has no
//! relation to categories or expenses in the store.

use rusqlite::{Connection, Row, types::Value};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    Error,
    database_id::{DatabaseId, UNSAVED_ID},
    db::{CreateTable, MapRow},
    record::{Affinity, AnyRecord, Field, Record, RecordKind},
    repository::Table,
    timestamp,
};

/// An amount of money set aside for spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// The primary key of the budget, [UNSAVED_ID] until it is stored.
    pub pk: DatabaseId,
    /// The budgeted amount, in the smallest unit of the currency.
    pub amount: i64,
    /// When the budget was recorded (UTC).
    pub added_date: PrimitiveDateTime,
}

impl Budget {
    /// Create a budget that has not been stored yet.
    pub fn new(amount: i64) -> Self {
        Self {
            pk: UNSAVED_ID,
            amount,
            added_date: timestamp::now(),
        }
    }
}

/// The fields budgets can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetField {
    /// The budgeted amount.
    Amount,
}

impl Field for BudgetField {
    fn column(self) -> &'static str {
        match self {
            BudgetField::Amount => "amount",
        }
    }

    fn affinity(self) -> Affinity {
        Affinity::Integer
    }
}

impl Record for Budget {
    type Field = BudgetField;

    const KIND: RecordKind = RecordKind::Budget;

    fn pk(&self) -> DatabaseId {
        self.pk
    }

    fn set_pk(&mut self, pk: DatabaseId) {
        self.pk = pk;
    }

    fn field_value(&self, field: BudgetField) -> Value {
        match field {
            BudgetField::Amount => Value::Integer(self.amount),
        }
    }

    fn update_from(&mut self, other: &Self) {
        self.amount = other.amount;
    }

    fn from_any(record: AnyRecord) -> Result<Self, Error> {
        match record {
            AnyRecord::Budget(budget) => Ok(budget),
            other => Err(other.mismatch(RecordKind::Budget)),
        }
    }
}

impl CreateTable for Budget {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS budgets (
                pk INTEGER PRIMARY KEY AUTOINCREMENT,
                amount INTEGER NOT NULL,
                added_date DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Budget {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            pk: row.get(offset)?,
            amount: row.get(offset + 1)?,
            added_date: row.get(offset + 2)?,
        })
    }
}

impl Table for Budget {
    const TABLE_NAME: &'static str = "budgets";
    const COLUMNS: &'static [&'static str] = &["pk", "amount", "added_date"];
    const INSERT_COLUMNS: &'static [&'static str] = &["amount", "added_date"];
    const UPDATE_COLUMNS: &'static [&'static str] = &["amount"];

    fn insert_values(&self) -> Vec<Value> {
        vec![
            self.field_value(BudgetField::Amount),
            Value::Text(timestamp::format(&self.added_date)),
        ]
    }

    fn update_values(&self) -> Vec<Value> {
        vec![self.field_value(BudgetField::Amount)]
    }
}

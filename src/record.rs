//! Traits and types shared by every record that can be kept in a repository.

use std::fmt::{self, Debug, Display};

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    budget::Budget,
    category::Category,
    database_id::{DatabaseId, UNSAVED_ID},
    expense::Expense,
};

/// The kinds of record the bookkeeper knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A spending category, see [Category].
    Category,
    /// An expense entry, see [Expense].
    Expense,
    /// A budget amount, see [Budget].
    Budget,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Category => write!(f, "category"),
            RecordKind::Expense => write!(f, "expense"),
            RecordKind::Budget => write!(f, "budget"),
        }
    }
}

/// How a column converts the values it is compared against.
///
/// Mirrors SQLite's column affinity so that a [Filter] selects the same
/// records whichever repository evaluates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// Numeric text and whole reals become integers.
    Integer,
    /// Numbers become their text form.
    Text,
}

impl Affinity {
    /// Convert `value` the way SQLite converts a value compared against a
    /// column with this affinity.
    pub fn apply(self, value: Value) -> Value {
        match (self, value) {
            (Affinity::Integer, Value::Text(text)) => {
                if let Ok(integer) = text.trim().parse::<i64>() {
                    Value::Integer(integer)
                } else if let Ok(real) = text.trim().parse::<f64>() {
                    Affinity::Integer.apply(Value::Real(real))
                } else {
                    Value::Text(text)
                }
            }
            (Affinity::Integer, Value::Real(real)) => whole_number(real)
                .map(Value::Integer)
                .unwrap_or(Value::Real(real)),
            (Affinity::Text, Value::Integer(integer)) => Value::Text(integer.to_string()),
            (Affinity::Text, Value::Real(real)) if whole_number(real).is_some() => {
                Value::Text(format!("{real:.1}"))
            }
            (Affinity::Text, Value::Real(real)) => Value::Text(real.to_string()),
            (_, value) => value,
        }
    }
}

/// `real` as an integer, if it has no fractional part and fits in an `i64`.
fn whole_number(real: f64) -> Option<i64> {
    let in_range = real >= i64::MIN as f64 && real < i64::MAX as f64;

    (in_range && real.fract() == 0.0).then_some(real as i64)
}

/// A field of a record that can be used in a [Filter].
///
/// Implementors are small enums so that only known columns can ever end up
/// in a query.
pub trait Field: Copy + Debug + PartialEq + 'static {
    /// The name of the column that stores this field.
    fn column(self) -> &'static str;

    /// The affinity of the column that stores this field.
    fn affinity(self) -> Affinity;
}

/// A typed value with a primary key that a [Repository](crate::Repository)
/// can store.
pub trait Record: Clone + Debug {
    /// The fields that records of this type can be filtered on.
    type Field: Field;

    /// The kind of this record, used for error reporting.
    const KIND: RecordKind;

    /// The primary key of the record, [UNSAVED_ID] if it has not been added
    /// to a repository.
    fn pk(&self) -> DatabaseId;

    /// Set the primary key after the record has been stored.
    fn set_pk(&mut self, pk: DatabaseId);

    /// The current value of `field`, as it would be stored.
    fn field_value(&self, field: Self::Field) -> Value;

    /// Copy the fields that may change after creation from `other`.
    fn update_from(&mut self, other: &Self);

    /// A filter that identifies an existing record equivalent to this one.
    ///
    /// When this returns `Some`, adding the record returns the key of the
    /// first match instead of storing a duplicate.
    fn dedup_key(&self) -> Option<Filter<Self::Field>> {
        None
    }

    /// Extract a record of this type from `record`.
    ///
    /// # Errors
    /// Returns [Error::TypeMismatch] if `record` holds another kind of record.
    fn from_any(record: AnyRecord) -> Result<Self, Error>;

    /// Whether this record refers to the record of the same type with the
    /// primary key `pk`. A referenced record cannot be deleted.
    fn refers_to(&self, _pk: DatabaseId) -> bool {
        false
    }

    /// Whether the record has been stored yet.
    fn is_saved(&self) -> bool {
        self.pk() != UNSAVED_ID
    }
}

/// A record of any kind, for callers that only learn the type at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnyRecord {
    /// Holds a [Category].
    Category(Category),
    /// Holds an [Expense].
    Expense(Expense),
    /// Holds a [Budget].
    Budget(Budget),
}

impl AnyRecord {
    /// The kind of the record held.
    pub fn kind(&self) -> RecordKind {
        match self {
            AnyRecord::Category(_) => RecordKind::Category,
            AnyRecord::Expense(_) => RecordKind::Expense,
            AnyRecord::Budget(_) => RecordKind::Budget,
        }
    }

    pub(crate) fn mismatch(&self, expected: RecordKind) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

impl From<Category> for AnyRecord {
    fn from(value: Category) -> Self {
        AnyRecord::Category(value)
    }
}

impl From<Expense> for AnyRecord {
    fn from(value: Expense) -> Self {
        AnyRecord::Expense(value)
    }
}

impl From<Budget> for AnyRecord {
    fn from(value: Budget) -> Self {
        AnyRecord::Budget(value)
    }
}

/// A conjunction of exact-match conditions on the fields of a record.
///
/// # Examples
/// ```
/// use bookkeeper::{ExpenseField, Filter};
///
/// let filter = Filter::new()
///     .eq(ExpenseField::Category, 1)
///     .eq(ExpenseField::Amount, 250);
///
/// assert_eq!(filter.conditions().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<F> {
    conditions: Vec<(F, Value)>,
}

impl<F: Field> Filter<F> {
    /// Create a filter that matches every record.
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Require `field` to be equal to `value`.
    ///
    /// `value` is converted with the field's [Affinity] first, so `"250"`
    /// and `250.0` both match an integer field holding 250.
    pub fn eq(mut self, field: F, value: impl Into<Value>) -> Self {
        self.conditions.push((field, field.affinity().apply(value.into())));
        self
    }

    /// Require `field` to be absent.
    pub fn is_null(mut self, field: F) -> Self {
        self.conditions.push((field, Value::Null));
        self
    }

    /// The conditions in the order they were added.
    pub fn conditions(&self) -> &[(F, Value)] {
        &self.conditions
    }

    /// Whether `record` satisfies every condition.
    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: Record<Field = F>,
    {
        self.conditions
            .iter()
            .all(|(field, value)| record.field_value(*field) == *value)
    }

    /// Build the `WHERE` clause and its parameters for this filter.
    ///
    /// The clause is empty when there are no conditions. Values are always
    /// bound as parameters, absent values become `IS NULL`.
    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut values = Vec::with_capacity(self.conditions.len());

        for (field, value) in &self.conditions {
            match value {
                Value::Null => clauses.push(format!("{} IS NULL", field.column())),
                value => {
                    clauses.push(format!("{} = ?", field.column()));
                    values.push(value.clone());
                }
            }
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

impl<F: Field> Default for Filter<F> {
    fn default() -> Self {
        Self::new()
    }
}

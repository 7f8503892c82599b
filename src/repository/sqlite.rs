//! Implements a SQLite backed repository.

use std::{marker::PhantomData, path::Path};

use rusqlite::{Connection, OpenFlags, OptionalExtension, params_from_iter, types::Value};

use crate::{
    Error,
    database_id::DatabaseId,
    db::{CreateTable, MapRow, enable_foreign_keys},
    record::{Filter, Record},
};

use super::{Repository, ensure_saved, ensure_unsaved, find_duplicate, missing_record};

/// The name of the primary key column shared by every table.
const PRIMARY_KEY: &str = "pk";

/// Describes how a record type is laid out in its table.
///
/// Together with [CreateTable] and [MapRow] this is everything a
/// [SqliteRepository] needs to store a record type.
pub trait Table: Record + CreateTable + MapRow<ReturnType = Self> {
    /// The name of the table.
    const TABLE_NAME: &'static str;

    /// Every column, in the order [MapRow::map_row] reads them, starting with
    /// the primary key.
    const COLUMNS: &'static [&'static str];

    /// The columns written by an insert, matching [Table::insert_values].
    const INSERT_COLUMNS: &'static [&'static str];

    /// The columns written by an update, matching [Table::update_values].
    const UPDATE_COLUMNS: &'static [&'static str];

    /// The values for [Table::INSERT_COLUMNS].
    fn insert_values(&self) -> Vec<Value>;

    /// The values for [Table::UPDATE_COLUMNS].
    fn update_values(&self) -> Vec<Value>;
}

#[derive(Debug)]
struct Queries {
    select: String,
    insert: String,
    update: String,
    delete: String,
}

impl Queries {
    fn for_table<T: Table>() -> Self {
        let table = T::TABLE_NAME;
        let placeholders = vec!["?"; T::INSERT_COLUMNS.len()].join(", ");
        let assignments = T::UPDATE_COLUMNS
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            select: format!("SELECT {} FROM {table}", T::COLUMNS.join(", ")),
            insert: format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders})",
                T::INSERT_COLUMNS.join(", ")
            ),
            update: format!("UPDATE {table} SET {assignments} WHERE {PRIMARY_KEY} = ?"),
            delete: format!("DELETE FROM {table} WHERE {PRIMARY_KEY} = ?"),
        }
    }
}

/// Creates, retrieves, updates and deletes records of type `T` in a SQLite
/// database.
///
/// The repository owns its connection. Every mutating call is committed on
/// its own. Dropping the repository, or calling [SqliteRepository::close],
/// closes the connection.
#[derive(Debug)]
pub struct SqliteRepository<T> {
    connection: Connection,
    queries: Queries,
    record_type: PhantomData<T>,
}

impl<T: Table> SqliteRepository<T> {
    /// Open the existing database file at `path` and create the table for `T`
    /// if needed.
    ///
    /// # Errors
    /// This function will return an [Error::Configuration] if `path` is not
    /// an existing file or the file cannot be opened as a SQLite database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let configuration_error = |reason: String| Error::Configuration {
            path: path.to_owned(),
            reason,
        };

        if !path.is_file() {
            return Err(configuration_error("the file does not exist".to_owned()));
        }

        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|error| configuration_error(error.to_string()))?;

        let repository = Self::new(connection).map_err(|error| match error {
            Error::SqlError(error) => configuration_error(error.to_string()),
            error => error,
        })?;

        tracing::info!("opened the {} table in {path:?}", T::TABLE_NAME);

        Ok(repository)
    }

    /// Wrap an open connection and create the table for `T` if needed.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if foreign keys cannot
    /// be enabled or the table cannot be created.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        enable_foreign_keys(&connection)?;
        T::create_table(&connection)?;

        Ok(Self {
            connection,
            queries: Queries::for_table::<T>(),
            record_type: PhantomData,
        })
    }

    /// Close the connection to the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if SQLite could not
    /// close the connection cleanly.
    pub fn close(self) -> Result<(), Error> {
        self.connection.close().map_err(|(_, error)| error.into())
    }
}

impl<T: Table> Repository<T> for SqliteRepository<T> {
    /// Insert a record into the table.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::InvalidArgument] if `record` already has a primary key,
    /// - or [Error::SqlError] if a constraint failed (e.g. an unknown
    ///   category) or there is some other SQL error.
    fn add(&mut self, record: &mut T) -> Result<DatabaseId, Error> {
        if let Some(pk) = find_duplicate(&*self, record)? {
            tracing::debug!("{} already stored as {pk}", T::KIND);
            record.set_pk(pk);
            return Ok(pk);
        }

        ensure_unsaved(record)?;

        self.connection
            .execute(&self.queries.insert, params_from_iter(record.insert_values()))?;
        let pk = self.connection.last_insert_rowid();
        record.set_pk(pk);

        tracing::debug!("added {} {pk}", T::KIND);

        Ok(pk)
    }

    fn get(&self, pk: DatabaseId) -> Result<Option<T>, Error> {
        let sql = format!("{} WHERE {PRIMARY_KEY} = ?1", self.queries.select);

        self.connection
            .prepare(&sql)?
            .query_row([pk], T::map_row)
            .optional()
            .map_err(|error| error.into())
    }

    fn get_all(&self, filter: Option<&Filter<T::Field>>) -> Result<Vec<T>, Error> {
        let (clause, values) = filter.map(Filter::to_sql).unwrap_or_default();
        let sql = format!("{} {clause} ORDER BY {PRIMARY_KEY}", self.queries.select);

        let mut statement = self.connection.prepare(&sql)?;
        let records = statement
            .query_map(params_from_iter(values), T::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn update(&mut self, record: &T) -> Result<(), Error> {
        ensure_saved(record)?;

        let mut values = record.update_values();
        values.push(Value::Integer(record.pk()));

        let rows_affected = self
            .connection
            .execute(&self.queries.update, params_from_iter(values))?;

        if rows_affected == 0 {
            return Err(missing_record::<T>(record.pk()));
        }

        tracing::debug!("updated {} {}", T::KIND, record.pk());

        Ok(())
    }

    fn delete(&mut self, pk: DatabaseId) -> Result<(), Error> {
        let rows_affected = self.connection.execute(&self.queries.delete, [pk])?;

        tracing::debug!("deleted {rows_affected} {} with key {pk}", T::KIND);

        Ok(())
    }
}

#[cfg(test)]
mod sqlite_repository_tests {
    use std::path::Path;

    use rusqlite::Connection;
    use tempfile::NamedTempFile;
    use time::macros::datetime;

    use crate::{
        Budget, Category, CategoryField, CategoryName, CategoryRepository, Error, Expense,
        ExpenseField, Filter, Repository, RecordKind,
    };

    use super::SqliteRepository;

    fn get_test_repository<T: super::Table>() -> SqliteRepository<T> {
        let connection = Connection::open_in_memory().unwrap();
        SqliteRepository::new(connection).expect("Could not create repository")
    }

    fn get_test_file() -> NamedTempFile {
        NamedTempFile::new().expect("Could not create temporary database file")
    }

    fn category(name: &str, parent: Option<i64>) -> Category {
        Category::new(CategoryName::new_unchecked(name), parent)
    }

    #[test]
    fn open_fails_on_missing_file() {
        let path = Path::new("/definitely/not/a/real/path/bookkeeper.db");

        let result = SqliteRepository::<Category>::open(path);

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn open_fails_on_file_that_is_not_a_database() {
        let file = get_test_file();
        std::fs::write(
            file.path(),
            "this is not a database, it is a text file\n".repeat(200),
        )
        .unwrap();

        let result = SqliteRepository::<Category>::open(file.path());

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn open_creates_table_in_empty_file() {
        let file = get_test_file();

        let repository = SqliteRepository::<Category>::open(file.path());

        assert!(repository.is_ok());
        assert_eq!(repository.unwrap().get_all(None), Ok(vec![]));
    }

    #[test]
    fn records_persist_after_reopening() {
        let file = get_test_file();
        let mut food = category("Food", None);
        {
            let mut repository = SqliteRepository::<Category>::open(file.path()).unwrap();
            repository.add(&mut food).unwrap();
            repository.close().unwrap();
        }

        let repository = SqliteRepository::<Category>::open(file.path()).unwrap();

        assert_eq!(repository.get(food.pk), Ok(Some(food)));
    }

    #[test]
    fn add_category_then_get_returns_equal_record() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let mut food = category("Food", None);

        let pk = repository.add(&mut food).unwrap();

        assert!(pk > 0);
        assert_eq!(food.pk, pk);
        assert_eq!(repository.get(pk), Ok(Some(food)));
    }

    #[test]
    fn add_category_twice_returns_same_key() {
        let mut repository: SqliteRepository<Category> = get_test_repository();

        let first = repository.add(&mut category("Food", None)).unwrap();
        let second = repository.add(&mut category("Food", None)).unwrap();

        assert_eq!(first, second);
        assert_eq!(repository.get_all(None).unwrap().len(), 1);
    }

    #[test]
    fn add_existing_name_keeps_original_parent() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let food = repository.add(&mut category("Food", None)).unwrap();
        let books = repository.add(&mut category("Books", None)).unwrap();
        let meat = repository.add(&mut category("Meat", Some(food))).unwrap();

        let mut moved = category("Meat", Some(books));
        let pk = repository.add(&mut moved).unwrap();

        assert_eq!(pk, meat);
        let stored = repository.get(meat).unwrap().unwrap();
        assert_eq!(stored.parent, Some(food));
    }

    #[test]
    fn add_category_with_unknown_parent_fails() {
        let mut repository: SqliteRepository<Category> = get_test_repository();

        let result = repository.add(&mut category("Orphan", Some(42)));

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn add_fails_on_preset_key() {
        let mut repository: SqliteRepository<Expense> = get_test_repository();
        let mut expense = Expense::new(100, 1);
        expense.pk = 12;

        let result = repository.add(&mut expense);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn add_category_with_preset_key_and_stored_name_returns_stored_key() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let stored = repository.add(&mut category("Food", None)).unwrap();
        let mut food = category("Food", None);
        food.pk = stored + 10;

        let pk = repository.add(&mut food).unwrap();

        assert_eq!(pk, stored);
        assert_eq!(food.pk, stored);
        assert_eq!(repository.get_all(None).unwrap().len(), 1);
    }

    #[test]
    fn add_category_with_preset_key_and_new_name_fails() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        repository.add(&mut category("Food", None)).unwrap();
        let mut books = category("Books", None);
        books.pk = 5;

        let result = repository.add(&mut books);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(repository.get_all(None).unwrap().len(), 1);
    }

    #[test]
    fn add_expense_with_unknown_category_fails() {
        let mut repository: SqliteRepository<Expense> = get_test_repository();

        let result = repository.add(&mut Expense::new(100, 42));

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn expense_round_trip() {
        let file = get_test_file();
        let mut categories = SqliteRepository::<Category>::open(file.path()).unwrap();
        let mut expenses = SqliteRepository::<Expense>::open(file.path()).unwrap();
        let food = categories.add(&mut category("Food", None)).unwrap();
        let mut expense = Expense::build(1250, food)
            .expense_date(Some(datetime!(2024-05-01 12:30:00)))
            .comment(Some("groceries".to_owned()))
            .finalize();
        expense.added_date = datetime!(2024-05-02 08:00:00);

        let pk = expenses.add(&mut expense).unwrap();

        assert_eq!(expenses.get(pk), Ok(Some(expense)));
    }

    #[test]
    fn expense_with_fractional_seconds_round_trips() {
        let file = get_test_file();
        let mut categories = SqliteRepository::<Category>::open(file.path()).unwrap();
        let mut expenses = SqliteRepository::<Expense>::open(file.path()).unwrap();
        let food = categories.add(&mut category("Food", None)).unwrap();
        let mut expense = Expense::build(1, food)
            .expense_date(Some(datetime!(2024-05-01 12:30:00.5)))
            .finalize();
        expense.added_date = datetime!(2024-05-02 08:00:00.125);

        let pk = expenses.add(&mut expense).unwrap();

        assert_eq!(expenses.get(pk), Ok(Some(expense)));
    }

    #[test]
    fn expense_dates_default_in_the_store() {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).unwrap();
        connection
            .execute("INSERT INTO categories (name) VALUES ('Food')", ())
            .unwrap();
        connection
            .execute("INSERT INTO expenses (amount, category) VALUES (5, 1)", ())
            .unwrap();
        let repository = SqliteRepository::<Expense>::new(connection).unwrap();

        let expense = repository.get(1).unwrap().expect("Expense should exist");

        assert_eq!(expense.amount, 5);
        assert_eq!(expense.comment, None);
        assert_eq!(expense.expense_date, expense.added_date);
    }

    #[test]
    fn get_missing_key_returns_none() {
        let repository: SqliteRepository<Category> = get_test_repository();

        assert_eq!(repository.get(123), Ok(None));
    }

    #[test]
    fn get_all_returns_records_in_insertion_order() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let mut categories = vec![
            category("Zebra food", None),
            category("Apples", None),
            category("Mangoes", None),
        ];
        for category in categories.iter_mut() {
            repository.add(category).unwrap();
        }

        assert_eq!(repository.get_all(None), Ok(categories));
    }

    #[test]
    fn get_all_with_filter_returns_matches_in_insertion_order() {
        let file = get_test_file();
        let mut categories = SqliteRepository::<Category>::open(file.path()).unwrap();
        let mut expenses = SqliteRepository::<Expense>::open(file.path()).unwrap();
        let first = categories.add(&mut category("Food", None)).unwrap();
        let second = categories.add(&mut category("Books", None)).unwrap();
        let mut stored = Vec::new();
        for (amount, category) in [(10, first), (20, first), (30, second)] {
            let mut expense = Expense::new(amount, category);
            expenses.add(&mut expense).unwrap();
            stored.push(expense);
        }

        let filter = Filter::new().eq(ExpenseField::Category, first);
        let got = expenses.get_all(Some(&filter)).unwrap();

        assert_eq!(got, stored[..2].to_vec());
    }

    #[test]
    fn get_all_filters_on_every_field() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let food = repository.add(&mut category("Food", None)).unwrap();
        repository.add(&mut category("Meat", Some(food))).unwrap();
        repository.add(&mut category("Sweets", Some(food))).unwrap();

        let filter = Filter::new()
            .eq(CategoryField::Parent, food)
            .eq(CategoryField::Name, "Sweets".to_owned());
        let got = repository.get_all(Some(&filter)).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name.as_ref(), "Sweets");
    }

    #[test]
    fn get_all_filters_on_missing_parent() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let food = repository.add(&mut category("Food", None)).unwrap();
        repository.add(&mut category("Meat", Some(food))).unwrap();
        repository.add(&mut category("Books", None)).unwrap();

        let filter = Filter::new().is_null(CategoryField::Parent);
        let names: Vec<String> = repository
            .get_all(Some(&filter))
            .unwrap()
            .into_iter()
            .map(|category| category.name.to_string())
            .collect();

        assert_eq!(names, vec!["Food", "Books"]);
    }

    #[test]
    fn update_category_succeeds() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let food = repository.add(&mut category("Food", None)).unwrap();
        let mut sweets = category("Sweets", None);
        repository.add(&mut sweets).unwrap();

        sweets.name = CategoryName::new_unchecked("Candy");
        sweets.parent = Some(food);
        repository.update(&sweets).unwrap();

        assert_eq!(repository.get(sweets.pk), Ok(Some(sweets)));
    }

    #[test]
    fn update_expense_keeps_dates() {
        let file = get_test_file();
        let mut categories = SqliteRepository::<Category>::open(file.path()).unwrap();
        let mut expenses = SqliteRepository::<Expense>::open(file.path()).unwrap();
        let food = categories.add(&mut category("Food", None)).unwrap();
        let books = categories.add(&mut category("Books", None)).unwrap();
        let mut expense = Expense::build(100, food)
            .expense_date(Some(datetime!(2024-01-01 10:00:00)))
            .finalize();
        expenses.add(&mut expense).unwrap();

        let mut changed = expense.clone();
        changed.amount = 300;
        changed.category = books;
        changed.comment = Some("novel".to_owned());
        changed.expense_date = datetime!(1999-12-31 23:59:59);
        expenses.update(&changed).unwrap();

        let stored = expenses.get(expense.pk).unwrap().unwrap();
        assert_eq!(stored.amount, 300);
        assert_eq!(stored.category, books);
        assert_eq!(stored.comment.as_deref(), Some("novel"));
        assert_eq!(stored.expense_date, expense.expense_date);
        assert_eq!(stored.added_date, expense.added_date);
    }

    #[test]
    fn update_fails_on_unsaved_record() {
        let mut repository: SqliteRepository<Category> = get_test_repository();

        let result = repository.update(&category("Food", None));

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn update_fails_on_missing_record() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let mut food = category("Food", None);
        food.pk = 999;

        let result = repository.update(&food);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn delete_removes_record() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let pk = repository.add(&mut category("Food", None)).unwrap();

        repository.delete(pk).unwrap();

        assert_eq!(repository.get(pk), Ok(None));
    }

    #[test]
    fn delete_category_with_children_fails() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let food = repository.add(&mut category("Food", None)).unwrap();
        let mut meat = category("Meat", Some(food));
        repository.add(&mut meat).unwrap();

        let result = repository.delete(food);

        assert!(matches!(
            result,
            Err(Error::SqlError(rusqlite::Error::SqliteFailure(error, _)))
                if error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        ));
        assert!(repository.get(food).unwrap().is_some());
        assert_eq!(repository.get(meat.pk), Ok(Some(meat)));
    }

    #[test]
    fn filter_values_are_converted_to_the_column_type() {
        let file = get_test_file();
        let mut categories = SqliteRepository::<Category>::open(file.path()).unwrap();
        let mut expenses = SqliteRepository::<Expense>::open(file.path()).unwrap();
        let food = categories.add(&mut category("Food", None)).unwrap();
        let mut expense = Expense::new(250, food);
        expenses.add(&mut expense).unwrap();

        let as_text = Filter::new().eq(ExpenseField::Amount, "250".to_owned());
        let as_real = Filter::new().eq(ExpenseField::Amount, 250.0);
        let fractional = Filter::new().eq(ExpenseField::Amount, 250.5);

        assert_eq!(expenses.get_all(Some(&as_text)), Ok(vec![expense.clone()]));
        assert_eq!(expenses.get_all(Some(&as_real)), Ok(vec![expense]));
        assert_eq!(expenses.get_all(Some(&fractional)), Ok(vec![]));
    }

    #[test]
    fn delete_missing_key_is_a_no_op() {
        let mut repository: SqliteRepository<Expense> = get_test_repository();

        assert_eq!(repository.delete(999999), Ok(()));
    }

    #[test]
    fn deleting_category_deletes_its_expenses() {
        let file = get_test_file();
        let mut categories = SqliteRepository::<Category>::open(file.path()).unwrap();
        let mut expenses = SqliteRepository::<Expense>::open(file.path()).unwrap();
        let food = categories.add(&mut category("Food", None)).unwrap();
        let books = categories.add(&mut category("Books", None)).unwrap();
        let mut lunch = Expense::new(100, food);
        let mut novel = Expense::new(200, books);
        expenses.add(&mut lunch).unwrap();
        expenses.add(&mut novel).unwrap();

        categories.delete(food).unwrap();

        assert_eq!(expenses.get(lunch.pk), Ok(None));
        assert_eq!(expenses.get(novel.pk), Ok(Some(novel)));
    }

    #[test]
    fn get_category_by_name() {
        let mut repository: SqliteRepository<Category> = get_test_repository();
        let mut food = category("Food", None);
        repository.add(&mut food).unwrap();

        assert_eq!(repository.get_category_by_name("Food"), Ok(Some(food)));
        assert_eq!(repository.get_category_by_name("Drinks"), Ok(None));
    }

    #[test]
    fn budget_is_stored_without_changes_to_the_repository() {
        let mut repository: SqliteRepository<Budget> = get_test_repository();
        let mut budget = Budget::new(50_000);

        let pk = repository.add(&mut budget).unwrap();
        budget.amount = 60_000;
        repository.update(&budget).unwrap();

        assert_eq!(repository.get(pk), Ok(Some(budget)));
    }

    #[test]
    fn add_record_of_wrong_type_fails() {
        let mut repository: SqliteRepository<Category> = get_test_repository();

        let result = repository.add_record(Expense::new(100, 1).into());

        assert_eq!(
            result,
            Err(Error::TypeMismatch {
                expected: RecordKind::Category,
                found: RecordKind::Expense,
            })
        );
    }

    #[test]
    fn update_record_of_wrong_type_fails() {
        let mut repository: SqliteRepository<Expense> = get_test_repository();

        let result = repository.update_record(Budget::new(10).into());

        assert_eq!(
            result,
            Err(Error::TypeMismatch {
                expected: RecordKind::Expense,
                found: RecordKind::Budget,
            })
        );
    }

    #[test]
    fn add_record_of_matching_type_succeeds() {
        let mut repository: SqliteRepository<Category> = get_test_repository();

        let stored = repository
            .add_record(category("Food", None).into())
            .unwrap();

        assert_eq!(repository.get(stored.pk), Ok(Some(stored)));
    }
}

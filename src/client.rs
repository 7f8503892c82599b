//! A line-oriented client for recording expenses from a terminal.
//!
//! The client only talks to the repositories it is given, so it works the
//! same over SQLite and in-memory repositories.

use std::io::{self, BufRead, Write};

use serde::Serialize;

use crate::{Category, CategoryRepository, Error, Expense, Repository};

/// The prompt printed before each command is read.
pub const PROMPT: &str = "$> ";

const HELP: &str = "commands:
  categories               list all categories
  expenses                 list all expenses
  <amount> <category>      add an expense, e.g. '250 sweets'
  delete <category>        delete a category without subcategories, and its expenses
  export                   print all categories and expenses as JSON
  help                     show this message";

/// A command understood by the [Client].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every category.
    Categories,
    /// List every expense.
    Expenses,
    /// Add an expense of `amount` to the category called `category`.
    AddExpense {
        /// The amount spent, in the smallest unit of the currency.
        amount: i64,
        /// The name of the category.
        category: String,
    },
    /// Delete the category called `category`.
    DeleteCategory {
        /// The name of the category.
        category: String,
    },
    /// Print every record as JSON.
    Export,
    /// Print the list of commands.
    Help,
}

impl Command {
    /// Parse a line of input.
    ///
    /// Returns `Ok(None)` for blank lines and `Err` with a message for
    /// anything that is not a command.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();

        if line.is_empty() {
            return Ok(None);
        }

        if line.starts_with(|c: char| c.is_ascii_digit()) {
            let Some((amount, category)) = line.split_once(char::is_whitespace) else {
                return Err(format!("missing category name after '{line}'"));
            };

            let amount = amount
                .parse()
                .map_err(|_| format!("'{amount}' is not a valid amount"))?;

            return Ok(Some(Command::AddExpense {
                amount,
                category: category.trim().to_owned(),
            }));
        }

        if let Some(category) = line.strip_prefix("delete ") {
            return Ok(Some(Command::DeleteCategory {
                category: category.trim().to_owned(),
            }));
        }

        match line {
            "categories" => Ok(Some(Command::Categories)),
            "expenses" => Ok(Some(Command::Expenses)),
            "export" => Ok(Some(Command::Export)),
            "help" => Ok(Some(Command::Help)),
            other => Err(format!("unknown command '{other}', type 'help' for a list")),
        }
    }
}

#[derive(Serialize)]
struct Export {
    categories: Vec<Category>,
    expenses: Vec<Expense>,
}

/// Runs commands against a category and an expense repository.
pub struct Client<'a> {
    categories: &'a mut dyn Repository<Category>,
    expenses: &'a mut dyn Repository<Expense>,
}

impl<'a> Client<'a> {
    /// Create a client over the given repositories.
    pub fn new(
        categories: &'a mut dyn Repository<Category>,
        expenses: &'a mut dyn Repository<Expense>,
    ) -> Self {
        Self {
            categories,
            expenses,
        }
    }

    /// Run `command` and return the text to show the user.
    ///
    /// # Errors
    /// Returns any error from the repositories.
    pub fn execute(&mut self, command: Command) -> Result<String, Error> {
        match command {
            Command::Categories => Ok(join_lines(self.categories.get_all(None)?)),
            Command::Expenses => Ok(join_lines(self.expenses.get_all(None)?)),
            Command::AddExpense { amount, category } => {
                let Some(category) = self.categories.get_category_by_name(&category)? else {
                    return Ok(format!("category {category} not found"));
                };

                let mut expense = Expense::new(amount, category.pk);
                self.expenses.add(&mut expense)?;

                Ok(expense.to_string())
            }
            Command::DeleteCategory { category } => {
                let Some(category) = self.categories.get_category_by_name(&category)? else {
                    return Ok(format!("category {category} not found"));
                };

                self.categories.delete(category.pk)?;

                Ok(format!("deleted {category}"))
            }
            Command::Export => {
                let export = Export {
                    categories: self.categories.get_all(None)?,
                    expenses: self.expenses.get_all(None)?,
                };

                Ok(serde_json::to_string_pretty(&export)
                    .unwrap_or_else(|error| format!("could not serialize as JSON: {error}")))
            }
            Command::Help => Ok(HELP.to_owned()),
        }
    }

    /// Read commands from `input` until it ends, writing results to `output`.
    ///
    /// Errors from the repositories are written to `output` and do not stop
    /// the loop.
    ///
    /// # Errors
    /// Returns an error if reading `input` or writing `output` fails.
    pub fn run(&mut self, input: impl BufRead, output: &mut impl Write) -> io::Result<()> {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;

            let response = match Command::parse(&line) {
                Ok(Some(command)) => {
                    tracing::debug!("running {command:?}");
                    self.execute(command)
                        .unwrap_or_else(|error| format!("error: {error}"))
                }
                Ok(None) => String::new(),
                Err(message) => message,
            };

            if !response.is_empty() {
                writeln!(output, "{response}")?;
            }

            write!(output, "{PROMPT}")?;
            output.flush()?;
        }

        writeln!(output)?;

        Ok(())
    }
}

fn join_lines<T: ToString>(records: Vec<T>) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

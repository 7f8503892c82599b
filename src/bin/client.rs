use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Parser;

use bookkeeper::{
    Category, Client, DB_PATH_ENV, Expense, MemoryRepository, Repository, SqliteRepository,
    TreeArgs, TreeNode, setup_logging,
};

/// An interactive client for recording expenses.
///
/// Type `help` at the prompt for a list of commands.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to an existing bookkeeper SQLite database. Records are kept
    /// in memory and lost on exit if this is not set.
    #[arg(long, env = DB_PATH_ENV)]
    db_path: Option<PathBuf>,

    #[command(flatten)]
    tree: TreeArgs,
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging("warn");

    let args = Args::parse();
    let forest = args.tree.load()?;

    match &args.db_path {
        Some(db_path) => {
            let mut categories = SqliteRepository::<Category>::open(db_path)?;
            let mut expenses = SqliteRepository::<Expense>::open(db_path)?;

            run(&forest, &mut categories, &mut expenses)?;

            expenses.close()?;
            categories.close()?;
        }
        None => {
            tracing::warn!("no database given, records will not be saved");

            let mut categories: MemoryRepository<Category> = MemoryRepository::new();
            let mut expenses: MemoryRepository<Expense> = MemoryRepository::new();

            run(&forest, &mut categories, &mut expenses)?;
        }
    }

    Ok(())
}

fn run(
    forest: &[TreeNode],
    categories: &mut dyn Repository<Category>,
    expenses: &mut dyn Repository<Expense>,
) -> Result<(), Box<dyn Error>> {
    Category::create_from_tree(forest, categories)?;

    println!("Type 'help' for a list of commands. Quit with Ctrl+D.");

    let mut client = Client::new(categories, expenses);
    client.run(io::stdin().lock(), &mut io::stdout())?;

    Ok(())
}

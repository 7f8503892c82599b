use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use bookkeeper::{Category, SqliteRepository, TreeArgs, initialize_db, setup_logging};

/// A utility for creating a bookkeeper database, optionally with a category tree.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    #[command(flatten)]
    tree: TreeArgs,
}

/// Create a database and store the category tree in it.
fn main() -> Result<(), Box<dyn Error>> {
    setup_logging("info");

    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'expenses.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'expenses.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    // Parse before touching the disk so a bad tree leaves no file behind.
    let forest = match args.tree.categories {
        Some(_) => Some(args.tree.load()?),
        None => None,
    };

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;
    initialize_db(&conn)?;
    conn.close().map_err(|(_, error)| error)?;

    if let Some(forest) = forest {
        println!("Creating categories...");
        let mut categories = SqliteRepository::<Category>::open(output_path)?;
        let created = Category::create_from_tree(&forest, &mut categories)?;
        categories.close()?;

        println!("Created {} categories.", created.len());
    }
    println!("Success!");

    Ok(())
}

//! Command line options shared by the binaries.

use std::{fs, path::PathBuf};

use crate::{Error, IndentPolicy, TreeNode, read_tree};

/// The environment variable the client reads the database path from when
/// `--db-path` is not given.
pub const DB_PATH_ENV: &str = "BOOKKEEPER_DB_PATH";

/// The categories stored when no category file is given.
pub const DEFAULT_CATEGORY_TREE: &str = "food
    meat
        raw meat
        meat products
    sweets
books
clothes
";

/// Options for loading a category tree.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TreeArgs {
    /// File with one category per line, children indented under their parent.
    #[arg(long)]
    pub categories: Option<PathBuf>,

    /// What to do when a line is indented more than one level past its parent.
    #[arg(long, value_enum, default_value_t = IndentPolicy::Reject)]
    pub indent: IndentPolicy,
}

impl TreeArgs {
    /// Read and parse the category file, or [DEFAULT_CATEGORY_TREE] if none
    /// was given.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::Configuration] if the file cannot be read,
    /// - or [Error::MalformedTree] if it cannot be parsed.
    pub fn load(&self) -> Result<Vec<TreeNode>, Error> {
        let Some(path) = &self.categories else {
            return read_tree(DEFAULT_CATEGORY_TREE.lines(), self.indent);
        };

        let text = fs::read_to_string(path).map_err(|error| Error::Configuration {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        tracing::debug!("read categories from {path:?}");

        read_tree(text.lines(), self.indent)
    }
}

//! Parses an indented text description of categories into a tree.
//!
//! Each non-blank line names a category. A line indented one level deeper
//! than the line above it is a child of that line:
//!
//! ```text
//! food
//!     meat
//!     sweets
//! books
//! ```
//!
//! The width of one level is taken from the first indented line, so tabs and
//! any fixed number of spaces both work as long as they are used
//! consistently.

use serde::{Deserialize, Serialize};

use crate::Error;

/// A category name and the categories nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// The category name, without surrounding whitespace.
    pub name: String,
    /// The nested categories, in the order they were written.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a node without children.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            children: Vec::new(),
        }
    }
}

/// What to do with a line indented more than one level deeper than the line
/// it would be nested under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IndentPolicy {
    /// Fail with [Error::MalformedTree].
    #[default]
    Reject,
    /// Nest the line under the nearest shallower line, or make it a root if
    /// there is none.
    Clamp,
}

/// Parse indented `lines` into a forest of [TreeNode]s.
///
/// Blank lines are skipped. Sibling order is preserved.
///
/// # Errors
/// This function will return an [Error::MalformedTree] if:
/// - a line's indentation is not a whole number of levels,
/// - or `policy` is [IndentPolicy::Reject] and a line is more than one level
///   deeper than its parent (or the first line is indented).
pub fn read_tree<I, S>(lines: I, policy: IndentPolicy) -> Result<Vec<TreeNode>, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut roots = Vec::new();
    // The open path from a root down to the previous line, with the level of
    // each node as written.
    let mut open: Vec<(usize, TreeNode)> = Vec::new();
    let mut level_width = None;

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        let name = line.trim();
        if name.is_empty() {
            continue;
        }

        let line_number = index + 1;
        let width = line.chars().take_while(|c| c.is_whitespace()).count();
        let level = match (width, level_width) {
            (0, _) => 0,
            (width, None) => {
                level_width = Some(width);
                1
            }
            (width, Some(level_width)) if width % level_width == 0 => width / level_width,
            (width, Some(level_width)) => {
                return Err(malformed(
                    line_number,
                    format!("indent {width} is not a multiple of the level width {level_width}"),
                ));
            }
        };

        while open.last().is_some_and(|(open_level, _)| *open_level >= level) {
            close_last(&mut open, &mut roots);
        }

        let deepest_allowed = open.last().map_or(0, |(open_level, _)| open_level + 1);
        if level > deepest_allowed && policy == IndentPolicy::Reject {
            return Err(malformed(
                line_number,
                format!("indented to level {level}, deeper than level {deepest_allowed}"),
            ));
        }

        open.push((level, TreeNode::new(name)));
    }

    while !open.is_empty() {
        close_last(&mut open, &mut roots);
    }

    Ok(roots)
}

/// List every node as a (name, parent name) pair, parents before children.
pub fn flatten(forest: &[TreeNode]) -> Vec<(String, Option<String>)> {
    let mut pairs = Vec::new();

    for root in forest {
        push_pairs(root, None, &mut pairs);
    }

    pairs
}

fn push_pairs(node: &TreeNode, parent: Option<&str>, pairs: &mut Vec<(String, Option<String>)>) {
    pairs.push((node.name.clone(), parent.map(str::to_owned)));

    for child in &node.children {
        push_pairs(child, Some(&node.name), pairs);
    }
}

/// Move the last open node into its parent, or into `roots` if it has none.
fn close_last(open: &mut Vec<(usize, TreeNode)>, roots: &mut Vec<TreeNode>) {
    if let Some((_, node)) = open.pop() {
        match open.last_mut() {
            Some((_, parent)) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

fn malformed(line: usize, reason: String) -> Error {
    Error::MalformedTree { line, reason }
}

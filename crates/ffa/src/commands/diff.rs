use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use ffa_format::{Node, ReadOptions, Version};
use miette::{Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};
use tracing::info;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Mode {
    /// Only the dataset listings
    #[default]
    Semantic,
    /// Listings, format versions and every value that differs inline
    Full,
}

#[derive(Debug, Eq, PartialEq)]
enum Change {
    Comparison(String, String, String),
    Added(String),
    Removed(String),
    Context(String),
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Comparison(key, old, new) => {
                write!(f, "* {}: {} vs {}", key, old.red(), new.green())
            }
            Change::Added(line) => write!(f, "+ {}", line.green()),
            Change::Removed(line) => write!(f, "- {}", line.red()),
            Change::Context(line) => write!(f, "  {}", line.dimmed()),
        }
    }
}

#[derive(Args)]
pub struct DiffArgs {
    /// An input FFA file
    #[arg(short, long, value_name = "FILE")]
    left: PathBuf,

    /// An input FFA file
    #[arg(short, long, value_name = "FILE")]
    right: PathBuf,

    /// Comparison mode
    #[arg(short, long, value_enum, default_value_t = Mode::Semantic)]
    mode: Mode,

    /// Unchanged lines shown around each difference
    #[arg(short, long, default_value_t = 2)]
    context: usize,
}

fn open(path: &Path) -> Result<(Version, Node)> {
    let file = File::open(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let version = ffa_format::probe(&mut reader)?;
    let root = ffa_format::read_from(&mut reader, &ReadOptions::default())
        .context(format!("path: {}", path.display()))?;
    Ok((version, root))
}

fn listing(root: &Node) -> Result<String> {
    let mut out = Vec::new();
    root.write_tree(&mut out, None, 3)?;
    String::from_utf8(out).into_diagnostic()
}

impl DiffArgs {
    fn inline<'a>(&self, diff: &'a TextDiff<'a, 'a, 'a, str>) -> Vec<String> {
        let mut lines = Vec::new();
        for group in diff.grouped_ops(self.context) {
            for op in &group {
                for change in diff.iter_inline_changes(op) {
                    let mut line = match change.tag() {
                        ChangeTag::Insert => "+ ".to_owned(),
                        ChangeTag::Delete => "- ".to_owned(),
                        ChangeTag::Equal => "  ".to_owned(),
                    };
                    for (emphasized, value) in change.iter_strings_lossy() {
                        let value = value.trim_end_matches('\n');
                        if !emphasized {
                            line.push_str(&format!("{}", value.dimmed()));
                        } else if change.tag() == ChangeTag::Insert {
                            line.push_str(&format!("{}", value.green().underline()));
                        } else {
                            line.push_str(&format!("{}", value.red().underline()));
                        }
                    }
                    lines.push(line);
                }
            }
        }
        lines
    }

    fn changes(&self, diff: &TextDiff<'_, '_, '_, str>) -> Vec<Change> {
        let mut changes = Vec::new();
        for group in diff.grouped_ops(self.context) {
            for op in &group {
                for change in diff.iter_changes(op) {
                    let line = change.value().trim_end_matches('\n').to_owned();
                    changes.push(match change.tag() {
                        ChangeTag::Insert => Change::Added(line),
                        ChangeTag::Delete => Change::Removed(line),
                        ChangeTag::Equal => Change::Context(line),
                    });
                }
            }
        }
        changes
    }

    pub fn handle(&self) -> Result<()> {
        let (left_version, left) = open(&self.left)?;
        let (right_version, right) = open(&self.right)?;

        if self.mode == Mode::Full && left_version != right_version {
            println!(
                "{}",
                Change::Comparison(
                    "version".into(),
                    left_version.to_string(),
                    right_version.to_string()
                )
            );
        }

        let old = listing(&left)?;
        let new = listing(&right)?;
        let diff = TextDiff::from_lines(old.as_str(), new.as_str());

        if diff.ratio() >= 1.0 {
            info!("{} and {} hold the same datasets", self.left.display(), self.right.display());
            return Ok(());
        }

        match self.mode {
            Mode::Semantic => self.changes(&diff).iter().for_each(|c| println!("{}", c)),
            Mode::Full => self.inline(&diff).iter().for_each(|l| println!("{}", l)),
        }

        Ok(())
    }
}

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use ffa_format::ReadOptions;
use miette::{Context, IntoDiagnostic, Result};
use tracing::info;

#[derive(Args)]
pub struct ListArgs {
    /// An input FFA file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Deepest level to print, the root is level 0
    #[arg(short, long)]
    depth: Option<usize>,

    /// Blanks per level of nesting
    #[arg(long, default_value_t = 3)]
    indent: usize,

    /// Read datasets whose type flags contain any of these characters without their payload
    #[arg(short, long, default_value = "")]
    skip: String,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let options = ReadOptions::builder().skip(self.skip.as_str()).build();
        let root = ffa_format::read(&self.file, &options)
            .context(format!("path: {}", &self.file.display()))?;

        info!(
            "{} holds {} datasets",
            self.file.display(),
            count(&root)
        );

        let mut out = std::io::stdout().lock();
        root.write_tree(&mut out, self.depth, self.indent)?;
        out.flush().into_diagnostic()
    }
}

fn count(node: &ffa_format::Node) -> usize {
    1 + node.children().iter().map(count).sum::<usize>()
}

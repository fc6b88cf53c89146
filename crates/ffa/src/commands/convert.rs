use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Args;
use ffa_format::{ReadOptions, Version, WriteOptions};
use miette::{Context, IntoDiagnostic, Result};
use tracing::info;

#[derive(Args)]
pub struct ConvertArgs {
    /// An input FFA file of any version
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// The converted FFA file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Format version to write: 0 text, 1 records, 2 dense
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=2))]
    version: u8,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ConvertArgs {
    pub fn handle(&self) -> Result<()> {
        let version = Version::try_from(self.version)?;
        let root = ffa_format::read(&self.input, &ReadOptions::default())
            .context(format!("path: {}", &self.input.display()))?;

        info!("writing {} as {}", self.output.display(), version);

        let out = if !self.overwrite {
            File::create_new(&self.output)
                .into_diagnostic()
                .context(format!("creating {}", &self.output.display()))?
        } else {
            File::create(&self.output)
                .into_diagnostic()
                .context(format!("creating {}", &self.output.display()))?
        };

        let mut out = BufWriter::new(out);
        ffa_format::write_to(&root, &mut out, WriteOptions::builder().version(version).build())?;
        out.flush().into_diagnostic()
    }
}

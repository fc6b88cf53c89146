pub mod convert;
pub mod diff;
pub mod list;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Print the dataset tree of an archive
    List(list::ListArgs),
    /// Re-encode an archive in another format version
    Convert(convert::ConvertArgs),
    /// Compare the dataset trees of two archives
    Diff(diff::DiffArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::List(list) => list.handle(),
            Commands::Convert(convert) => convert.handle(),
            Commands::Diff(diff) => diff.handle(),
        }
    }
}

//! Reading archives of any format generation

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bon::Builder;
use tracing::{debug, instrument};

use crate::codec::dense::MAGIC;
use crate::codec::record::DESCRIPTOR_RECORD;
use crate::codec::{read_tree, Ascii, Dense, Record, SkipFilter};
use crate::error::Result;
use crate::node::Node;
use crate::types::Version;

/// Options for how an archive should be read
///
/// ```
/// use ffa_format::read::ReadOptions;
///
/// let options = ReadOptions::builder().skip("X").build();
/// assert!(options.skip.contains(&'X'));
/// ```
#[derive(Debug, Clone, Default, Builder)]
pub struct ReadOptions {
    /// Datasets with any of these type flags keep their shape but are read
    /// without their payload, binary archives only
    #[builder(default, into)]
    pub skip: SkipFilter,
}

/// Guess the format generation from the start of a stream
///
/// The stream is left where it was.
pub fn probe<R: Read + Seek>(reader: &mut R) -> Result<Version> {
    let start = reader.stream_position()?;

    let mut head = Vec::with_capacity(MAGIC.len());
    reader.by_ref().take(MAGIC.len() as u64).read_to_end(&mut head)?;
    reader.seek(SeekFrom::Start(start))?;

    let version = if head.as_slice() == MAGIC {
        Version::Dense
    } else if head.starts_with(&DESCRIPTOR_RECORD.to_be_bytes()) {
        Version::Record
    } else {
        Version::Ascii
    };

    debug!(%version, "probed");
    Ok(version)
}

fn read_version<R: BufRead + Seek>(
    reader: &mut R,
    version: Version,
    options: &ReadOptions,
) -> Result<Node> {
    match version {
        Version::Dense => {
            reader.seek(SeekFrom::Current(MAGIC.len() as i64))?;
            read_tree(&mut Dense::new(reader), &options.skip)
        }
        Version::Record => read_tree(&mut Record::new(reader), &options.skip),
        Version::Ascii => read_tree(&mut Ascii::new(reader), &SkipFilter::default()),
    }
}

/// Read an archive from a stream
///
/// Binary archives are tried first. If that fails the stream is rewound and
/// parsed as text; when both fail the text error is returned.
#[instrument(skip_all, err)]
pub fn read_from<R: BufRead + Seek>(reader: &mut R, options: &ReadOptions) -> Result<Node> {
    let start = reader.stream_position()?;
    let version = probe(reader)?;

    if version != Version::Ascii {
        match read_version(reader, version, options) {
            Ok(node) => return Ok(node),
            Err(error) => {
                debug!(%version, %error, "not a binary archive, retrying as text");
                reader.seek(SeekFrom::Start(start))?;
            }
        }
    }

    read_version(reader, Version::Ascii, options)
}

/// Read an archive from a file
///
/// ```no_run
/// # fn doit() -> ffa_format::error::Result<()>
/// # {
/// use ffa_format::read::ReadOptions;
///
/// let root = ffa_format::read("mesh.ffa", &ReadOptions::default())?;
/// root.print_tree(None, 3)?;
/// # Ok(())
/// # }
/// ```
#[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
pub fn read(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Node> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    read_from(&mut reader, options)
}

impl Node {
    /// Read an archive from a file, see [`read`]
    pub fn read(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Node> {
        read(path, options)
    }
}

//! Writing archives

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use binrw::io::NoSeek;
use bon::Builder;
use tracing::instrument;

use crate::codec::dense::MAGIC;
use crate::codec::ascii::check_strings;
use crate::codec::{find_skipped, write_tree, Ascii, Dense, Record};
use crate::error::{Error, Result};
use crate::node::Node;
use crate::types::Version;

/// Options for how an archive should be written
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct WriteOptions {
    /// Format generation to produce
    #[builder(default)]
    pub version: Version,
}

impl From<Version> for WriteOptions {
    fn from(version: Version) -> Self {
        WriteOptions { version }
    }
}

/// Refuse trees that cannot be written in full as `version`
fn check_writable(node: &Node, version: Version) -> Result<()> {
    if let Some(skipped) = find_skipped(node) {
        return Err(Error::SkippedPayload(skipped.name().to_owned()));
    }
    if version == Version::Ascii {
        check_strings(node)?;
    }
    Ok(())
}

/// Write a dataset tree to a stream
///
/// ```
/// # fn doit() -> ffa_format::error::Result<()>
/// # {
/// use ffa_format::{DataBlock, Node, Version};
///
/// let root = Node::with_data("answer", DataBlock::scalar(42i32), None)?;
///
/// let mut buf = Vec::new();
/// ffa_format::write_to(&root, &mut buf, Version::Ascii)?;
/// assert_eq!(String::from_utf8_lossy(&buf), "answer,I   ,1,1,0\n42\n");
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[instrument(skip_all, fields(name = node.name()), err)]
pub fn write_to<W: Write>(
    node: &Node,
    writer: &mut W,
    options: impl Into<WriteOptions>,
) -> Result<()> {
    let version = options.into().version;
    check_writable(node, version)?;

    match version {
        Version::Dense => {
            writer.write_all(MAGIC)?;
            write_tree(&mut Dense::new(NoSeek::new(writer)), node)
        }
        Version::Record => write_tree(&mut Record::new(NoSeek::new(writer)), node),
        Version::Ascii => write_tree(&mut Ascii::new(writer), node),
    }
}

/// Write a dataset tree to a file, replacing it if it exists
///
/// Nothing is created when the tree holds a dataset that was read without
/// its payload, or a string that the text form cannot quote.
#[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
pub fn write(node: &Node, path: impl AsRef<Path>, options: impl Into<WriteOptions>) -> Result<()> {
    let options = options.into();
    check_writable(node, options.version)?;

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_to(node, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

impl Node {
    /// Write this tree to a file, see [`write`]
    pub fn write(&self, path: impl AsRef<Path>, options: impl Into<WriteOptions>) -> Result<()> {
        write(self, path, options)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::codec::dense::MAGIC;
    use crate::data::DataBlock;
    use crate::error::{Error, Result};
    use crate::node::Node;
    use crate::read::{read_from, ReadOptions};
    use crate::types::Version;
    use crate::write::{write_to, WriteOptions};

    fn tree() -> Result<Node> {
        let mut root = Node::new("root")?;
        root.append(Node::with_data("n", DataBlock::column(vec![1i64, 2, 3]), None)?);
        Ok(root)
    }

    #[test]
    fn dense_starts_with_magic() -> Result<()> {
        let mut buf = Vec::new();
        write_to(&tree()?, &mut buf, WriteOptions::builder().build())?;

        assert_eq!(&buf[..32], MAGIC);
        // two descriptors, one length prefix and three elements
        assert_eq!(buf.len(), 32 + 2 * 44 + 8 + 3 * 8);

        Ok(())
    }

    #[test]
    fn record_has_no_magic() -> Result<()> {
        let mut buf = Vec::new();
        write_to(&tree()?, &mut buf, Version::Record)?;

        assert_eq!(&buf[..4], &[0, 0, 0, 32]);
        assert_eq!(buf.len(), 2 * 40 + 4 + 3 * 8 + 4);

        Ok(())
    }

    #[test]
    fn every_version_reads_back() -> Result<()> {
        let root = tree()?;
        for version in [Version::Ascii, Version::Record, Version::Dense] {
            let mut buf = Vec::new();
            write_to(&root, &mut buf, version)?;

            let read = read_from(&mut Cursor::new(buf), &ReadOptions::default())?;
            assert_eq!(read, root, "{version}");
        }

        Ok(())
    }

    #[test]
    fn skipped_tree_is_rejected_up_front() -> Result<()> {
        let mut buf = Vec::new();
        write_to(&tree()?, &mut buf, Version::Dense)?;
        // flag the child so it gets skipped
        buf[32 + 44 + 17] = b'X';

        let root = read_from(&mut Cursor::new(buf), &ReadOptions::builder().skip("X").build())?;
        let mut out = Vec::new();
        let result = write_to(&root, &mut out, Version::Ascii);

        assert!(matches!(result, Err(Error::SkippedPayload(name)) if name == "n"));
        assert!(out.is_empty());

        Ok(())
    }

    #[test]
    fn apostrophe_is_rejected_before_any_text() -> Result<()> {
        let mut root = tree()?;
        root.append(Node::with_data("s", DataBlock::column(vec!["it's".to_string()]), Some("S"))?);

        let mut out = Vec::new();
        let result = write_to(&root, &mut out, Version::Ascii);
        assert!(matches!(result, Err(Error::InvalidString(v)) if v == "it's"));
        assert!(out.is_empty());

        write_to(&root, &mut out, Version::Dense)?;
        let read = read_from(&mut Cursor::new(out), &ReadOptions::default())?;
        assert_eq!(read, root);

        Ok(())
    }
}

//! Version 2: a big-endian stream behind a 32 byte magic.
//!
//! | Field    | Size    | Description                                   |
//! |----------|---------|-----------------------------------------------|
//! | name     | 16      | ASCII, space padded                           |
//! | tag      | 4       | ASCII type tag                                |
//! | ndim     | 8       | `i64` number of columns                       |
//! | nsiz     | 8       | `i64` number of rows                          |
//! | nsub     | 8       | `i64` number of children                      |
//! | length   | 8       | `i64` payload size in bytes, only with data   |
//! | payload  | length  | elements, column-major                        |

use std::io::{Read, Seek, SeekFrom, Write};

use binrw::{BinRead, BinWrite};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::warn;

use crate::codec::{payload, Descriptor, NodeRead, NodeWrite};
use crate::data::DataBlock;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::types::{Name, TypeTag, NAME_WIDTH, TAG_WIDTH};

/// File magic of version 2 archives
pub const MAGIC: &[u8; 32] = b"FFA-format-v2                   ";

/// Dataset header of a version 2 archive
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(big)]
pub struct DenseDescriptor {
    /// Space padded name
    pub name: [u8; NAME_WIDTH],
    /// Type tag
    pub tag: [u8; TAG_WIDTH],
    /// Number of columns
    pub ndim: i64,
    /// Number of rows
    pub nsiz: i64,
    /// Number of children
    pub nsub: i64,
}

impl DenseDescriptor {
    fn decode(self) -> Result<Descriptor> {
        Descriptor::new(
            Name::from_bytes(&self.name)?,
            TypeTag::from_bytes(&self.tag)?,
            self.ndim,
            self.nsiz,
            self.nsub,
        )
    }
}

impl From<&Node> for DenseDescriptor {
    fn from(node: &Node) -> Self {
        let descriptor = Descriptor::of(node);
        DenseDescriptor {
            name: descriptor.name().to_bytes(),
            tag: descriptor.tag().to_bytes(),
            ndim: descriptor.ndim() as i64,
            nsiz: descriptor.nsiz() as i64,
            nsub: descriptor.nsub() as i64,
        }
    }
}

/// Version 2 codec over a byte stream
///
/// The magic is handled by [`crate::read_from`] and [`crate::write_to`];
/// this type only deals with the dataset records that follow it.
#[derive(Debug)]
pub struct Dense<S> {
    inner: S,
}

impl<S> Dense<S> {
    /// Wrap a stream positioned after the magic
    pub fn new(inner: S) -> Self {
        Dense { inner }
    }

    /// Unwrap the stream
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<R: Read + Seek> Dense<R> {
    fn read_length(&mut self, descriptor: &Descriptor) -> Result<i64> {
        let length = self.inner.read_i64::<BigEndian>()?;
        if length < 0 {
            return Err(Error::InvalidCount(length));
        }

        let expected = payload::byte_length(descriptor.kind(), descriptor.count())?;
        if length as u64 != expected {
            warn!(
                name = descriptor.name().as_str(),
                length, expected, "payload length disagrees with the dataset shape"
            );
        }

        Ok(length)
    }
}

impl<R: Read + Seek> NodeRead for Dense<R> {
    fn read_descriptor(&mut self, _comments: &mut Vec<String>) -> Result<Descriptor> {
        DenseDescriptor::read(&mut self.inner)?.decode()
    }

    fn read_data(&mut self, descriptor: &Descriptor) -> Result<DataBlock> {
        self.read_length(descriptor)?;
        payload::read_block(&mut self.inner, descriptor)
    }

    fn skip_data(&mut self, descriptor: &Descriptor) -> Result<()> {
        let length = self.read_length(descriptor)?;
        self.inner.seek(SeekFrom::Current(length))?;
        Ok(())
    }
}

impl<W: Write + Seek> NodeWrite for Dense<W> {
    fn write_descriptor(&mut self, node: &Node) -> Result<()> {
        DenseDescriptor::from(node).write(&mut self.inner)?;
        Ok(())
    }

    fn write_data(&mut self, data: &DataBlock) -> Result<()> {
        let length = payload::byte_length(data.kind(), data.len())?;
        let length = i64::try_from(length).map_err(|_| Error::InvalidCount(i64::MAX))?;

        self.inner.write_i64::<BigEndian>(length)?;
        payload::write_block(&mut self.inner, data)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinRead;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::codec::dense::{Dense, DenseDescriptor};
    use crate::codec::{read_tree, write_tree, SkipFilter};
    use crate::data::DataBlock;
    use crate::error::Result;
    use crate::node::Node;

    #[rustfmt::skip]
    fn wing() -> Vec<u8> {
        vec![
            b'w', b'i', b'n', b'g', b' ', b' ', b' ', b' ',
            b' ', b' ', b' ', b' ', b' ', b' ', b' ', b' ',
            b'I', b' ', b' ', b' ',
            0, 0, 0, 0, 0, 0, 0, 1, // ndim
            0, 0, 0, 0, 0, 0, 0, 2, // nsiz
            0, 0, 0, 0, 0, 0, 0, 0, // nsub
            0, 0, 0, 0, 0, 0, 0, 8, // length
            0, 0, 0, 7,
            0xff, 0xff, 0xff, 0xfe,
        ]
    }

    #[test]
    fn read_descriptor() -> Result<()> {
        let descriptor = DenseDescriptor::read(&mut Cursor::new(wing()))?;
        assert_eq!(&descriptor.name, b"wing            ");
        assert_eq!(&descriptor.tag, b"I   ");
        assert_eq!((descriptor.ndim, descriptor.nsiz, descriptor.nsub), (1, 2, 0));

        Ok(())
    }

    #[test]
    fn read_node() -> Result<()> {
        let node = read_tree(&mut Dense::new(Cursor::new(wing())), &SkipFilter::default())?;
        assert_eq!(node.name(), "wing");
        assert_eq!(node.data().as_slice::<i32>(), Some(&[7, -2][..]));

        Ok(())
    }

    #[test]
    fn write_node() -> Result<()> {
        let node = Node::with_data("wing", DataBlock::column(vec![7i32, -2]), None)?;
        let mut dense = Dense::new(Cursor::new(Vec::new()));
        write_tree(&mut dense, &node)?;

        assert_eq!(dense.into_inner().into_inner(), wing());

        Ok(())
    }

    #[test]
    fn skipped_payload_is_seeked_over() -> Result<()> {
        let mut input = wing();
        input[17] = b'X';
        input[36..44].copy_from_slice(&1i64.to_be_bytes());
        // nsub = 1, the child follows the skipped payload
        let mut child = wing();
        child[..4].copy_from_slice(b"tail");
        input.extend(child);

        let root = read_tree(&mut Dense::new(Cursor::new(input)), &SkipFilter::from("X"))?;
        assert!(root.data().is_skipped());
        assert_eq!((root.nsiz(), root.ndim()), (2, 1));
        assert_eq!(root.children()[0].name(), "tail");
        assert_eq!(root.children()[0].data().as_slice::<i32>(), Some(&[7, -2][..]));

        Ok(())
    }

    #[traced_test]
    #[test]
    fn length_mismatch_is_tolerated() -> Result<()> {
        let mut input = wing();
        input[51] = 9;

        let node = read_tree(&mut Dense::new(Cursor::new(input)), &SkipFilter::default())?;
        assert_eq!(node.nsiz(), 2);
        assert!(logs_contain("payload length disagrees"));

        Ok(())
    }

    #[test]
    fn negative_count_is_rejected() {
        let mut input = wing();
        input[20..28].copy_from_slice(&(-1i64).to_be_bytes());

        assert!(read_tree(&mut Dense::new(Cursor::new(input)), &SkipFilter::default()).is_err());
    }
}

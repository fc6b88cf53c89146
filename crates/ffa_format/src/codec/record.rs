//! Version 1: Fortran sequential records, big-endian, no magic.
//!
//! Every record is framed by its length in bytes, written in front of and
//! behind the record body.
//!
//! | Field    | Size    | Description                                   |
//! |----------|---------|-----------------------------------------------|
//! | marker   | 4       | `u32` always 32                               |
//! | name     | 16      | ASCII, space padded                           |
//! | tag      | 4       | ASCII type tag                                |
//! | ndim     | 4       | `i32` number of columns                       |
//! | nsiz     | 4       | `i32` number of rows                          |
//! | nsub     | 4       | `i32` number of children                      |
//! | marker   | 4       | `u32` always 32                               |
//! | length   | 4       | `i32` payload size in bytes, only with data   |
//! | payload  | length  | elements, column-major                        |
//! | length   | 4       | `i32` repeated                                |

use std::io::{Read, Seek, SeekFrom, Write};

use binrw::{binrw, BinRead, BinWrite};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::warn;

use crate::codec::{payload, Descriptor, NodeRead, NodeWrite};
use crate::data::DataBlock;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::types::{Name, TypeTag, NAME_WIDTH, TAG_WIDTH};

/// Length of a descriptor record body
pub const DESCRIPTOR_RECORD: u32 = 32;

/// Dataset header of a version 1 archive
#[binrw]
#[brw(big)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RecordDescriptor {
    #[br(temp, assert(head == DESCRIPTOR_RECORD, "descriptor record of {} bytes", head))]
    #[bw(calc = DESCRIPTOR_RECORD)]
    head: u32,

    /// Space padded name
    pub name: [u8; NAME_WIDTH],
    /// Type tag
    pub tag: [u8; TAG_WIDTH],
    /// Number of columns
    pub ndim: i32,
    /// Number of rows
    pub nsiz: i32,
    /// Number of children
    pub nsub: i32,

    #[br(temp, assert(tail == DESCRIPTOR_RECORD, "descriptor record of {} bytes", tail))]
    #[bw(calc = DESCRIPTOR_RECORD)]
    tail: u32,
}

impl RecordDescriptor {
    fn decode(self) -> Result<Descriptor> {
        Descriptor::new(
            Name::from_bytes(&self.name)?,
            TypeTag::from_bytes(&self.tag)?,
            i64::from(self.ndim),
            i64::from(self.nsiz),
            i64::from(self.nsub),
        )
    }

    fn encode(node: &Node) -> Result<Self> {
        let descriptor = Descriptor::of(node);
        let narrow = |value: usize| {
            i32::try_from(value).map_err(|_| Error::InvalidCount(value as i64))
        };

        Ok(RecordDescriptor {
            name: descriptor.name().to_bytes(),
            tag: descriptor.tag().to_bytes(),
            ndim: narrow(descriptor.ndim())?,
            nsiz: narrow(descriptor.nsiz())?,
            nsub: narrow(descriptor.nsub())?,
        })
    }
}

/// Version 1 codec over a byte stream
#[derive(Debug)]
pub struct Record<S> {
    inner: S,
}

impl<S> Record<S> {
    /// Wrap a stream positioned at the first descriptor
    pub fn new(inner: S) -> Self {
        Record { inner }
    }

    /// Unwrap the stream
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<R: Read + Seek> Record<R> {
    fn read_length(&mut self, descriptor: &Descriptor) -> Result<i32> {
        let length = self.inner.read_i32::<BigEndian>()?;
        if length < 0 {
            return Err(Error::InvalidCount(i64::from(length)));
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

    fn read_trailer(&mut self, descriptor: &Descriptor, length: i32) -> Result<()> {
        let trailer = self.inner.read_i32::<BigEndian>()?;
        if trailer != length {
            warn!(
                name = descriptor.name().as_str(),
                length, trailer, "payload record markers differ"
            );
        }
        Ok(())
    }
}

impl<R: Read + Seek> NodeRead for Record<R> {
    fn read_descriptor(&mut self, _comments: &mut Vec<String>) -> Result<Descriptor> {
        RecordDescriptor::read(&mut self.inner)?.decode()
    }

    fn read_data(&mut self, descriptor: &Descriptor) -> Result<DataBlock> {
        let length = self.read_length(descriptor)?;
        let data = payload::read_block(&mut self.inner, descriptor)?;
        self.read_trailer(descriptor, length)?;
        Ok(data)
    }

    fn skip_data(&mut self, descriptor: &Descriptor) -> Result<()> {
        let length = self.read_length(descriptor)?;
        self.inner.seek(SeekFrom::Current(i64::from(length)))?;
        self.read_trailer(descriptor, length)
    }
}

impl<W: Write + Seek> NodeWrite for Record<W> {
    fn write_descriptor(&mut self, node: &Node) -> Result<()> {
        RecordDescriptor::encode(node)?.write(&mut self.inner)?;
        Ok(())
    }

    fn write_data(&mut self, data: &DataBlock) -> Result<()> {
        let length = payload::byte_length(data.kind(), data.len())?;
        let length = i32::try_from(length).map_err(|_| Error::InvalidCount(length as i64))?;

        self.inner.write_i32::<BigEndian>(length)?;
        payload::write_block(&mut self.inner, data)?;
        self.inner.write_i32::<BigEndian>(length)?;
        Ok(())
    }
}

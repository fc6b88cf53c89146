//! Big-endian element streams shared by both binary generations.
//!
//! Elements are stored column-major. Text elements occupy the fixed width of
//! their kind, space padded on write and stripped of trailing spaces and NULs
//! on read. Bytes outside ASCII are rejected.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::codec::{Descriptor, PREALLOCATE_LIMIT};
use crate::data::{fit, DataBlock, Values};
use crate::error::{Error, Result};
use crate::types::{Complex, ElementKind};

/// Size in bytes of `count` elements
pub(crate) fn byte_length(kind: ElementKind, count: usize) -> Result<u64> {
    let count = count as u64;
    count
        .checked_mul(kind.width() as u64)
        .ok_or(Error::InvalidCount(i64::try_from(count).unwrap_or(i64::MAX)))
}

fn decode_text(bytes: &[u8]) -> Result<String> {
    fit(String::from_utf8_lossy(bytes).into_owned(), bytes.len())
}

fn encode_text(text: &str, width: usize, buf: &mut Vec<u8>) {
    buf.clear();
    buf.extend(text.bytes().take(width));
    buf.resize(width, b' ');
}

fn read_texts<R: Read>(reader: &mut R, count: usize, width: usize) -> Result<Vec<String>> {
    let mut buf = vec![0u8; width];
    let mut values = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
    for _ in 0..count {
        reader.read_exact(&mut buf)?;
        values.push(decode_text(&buf)?);
    }
    Ok(values)
}

fn read_many<T>(
    count: usize,
    mut element: impl FnMut() -> std::io::Result<T>,
) -> std::io::Result<Vec<T>> {
    let mut values = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
    for _ in 0..count {
        values.push(element()?);
    }
    Ok(values)
}

/// Decode the elements of a payload, without its length prefix
pub(crate) fn read_block<R: Read>(reader: &mut R, descriptor: &Descriptor) -> Result<DataBlock> {
    let count = descriptor.count();
    let kind = descriptor.kind();

    let values = match kind {
        ElementKind::None => Values::None,
        ElementKind::Char1 => Values::Char1(read_texts(reader, count, kind.width())?),
        ElementKind::Char16 => Values::Char16(read_texts(reader, count, kind.width())?),
        ElementKind::Char72 => Values::Char72(read_texts(reader, count, kind.width())?),
        ElementKind::Int32 => Values::Int32(read_many(count, || reader.read_i32::<BigEndian>())?),
        ElementKind::Int64 => Values::Int64(read_many(count, || reader.read_i64::<BigEndian>())?),
        ElementKind::Float32 => {
            Values::Float32(read_many(count, || reader.read_f32::<BigEndian>())?)
        }
        ElementKind::Float64 => {
            Values::Float64(read_many(count, || reader.read_f64::<BigEndian>())?)
        }
        ElementKind::Complex64 => Values::Complex64(read_many(count, || {
            let re = reader.read_f32::<BigEndian>()?;
            let im = reader.read_f32::<BigEndian>()?;
            Ok(Complex::new(re, im))
        })?),
        ElementKind::Complex128 => Values::Complex128(read_many(count, || {
            let re = reader.read_f64::<BigEndian>()?;
            let im = reader.read_f64::<BigEndian>()?;
            Ok(Complex::new(re, im))
        })?),
    };

    DataBlock::from_columns(values, descriptor.nsiz(), descriptor.ndim())
}

/// Encode the elements of a block column-major, without a length prefix
pub(crate) fn write_block<W: Write>(writer: &mut W, data: &DataBlock) -> Result<()> {
    let width = data.kind().width();
    let mut buf = Vec::with_capacity(width);

    for index in data.column_major() {
        match data.values() {
            Values::None => {}
            Values::Int32(v) => writer.write_i32::<BigEndian>(v[index])?,
            Values::Int64(v) => writer.write_i64::<BigEndian>(v[index])?,
            Values::Float32(v) => writer.write_f32::<BigEndian>(v[index])?,
            Values::Float64(v) => writer.write_f64::<BigEndian>(v[index])?,
            Values::Complex64(v) => {
                writer.write_f32::<BigEndian>(v[index].re)?;
                writer.write_f32::<BigEndian>(v[index].im)?;
            }
            Values::Complex128(v) => {
                writer.write_f64::<BigEndian>(v[index].re)?;
                writer.write_f64::<BigEndian>(v[index].im)?;
            }
            Values::Char1(v) | Values::Char16(v) | Values::Char72(v) => {
                encode_text(&v[index], width, &mut buf);
                writer.write_all(&buf)?;
            }
        }
    }

    Ok(())
}

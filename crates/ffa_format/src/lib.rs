//! This library handles reading from and creating **FFA** dataset archives.
//!
//! # FFA Archive Format Documentation
//!
//! An FFA archive stores a tree of named, typed, two dimensional datasets. Each
//! dataset has a 16 character name, a 4 character type tag, a block of
//! `nsiz` rows by `ndim` columns and any number of child datasets. The tree is
//! written depth-first: a dataset, its payload, then each of its children.
//!
//! Three generations of the format exist and all of them can be read and
//! written by this crate.
//!
//! ## Type Tags
//!
//! The first character of the type tag selects the element kind. The other
//! three characters are free-form flags, which can be used to skip the payload
//! of selected datasets when reading (see [`read::ReadOptions`]).
//!
//! | Code | Element          | Size (bytes) |
//! |------|------------------|--------------|
//! | `N`  | no data          | 0            |
//! | `I`  | 32 bit integer   | 4            |
//! | `J`  | 64 bit integer   | 8            |
//! | `R`  | 32 bit float     | 4            |
//! | `D`  | 64 bit float     | 8            |
//! | `C`  | complex, 2 x R   | 8            |
//! | `Z`  | complex, 2 x D   | 16           |
//! | `A`  | character        | 1            |
//! | `S`  | string           | 16           |
//! | `L`  | string           | 72           |
//!
//! ## Version 2
//!
//! Starts with the 32 byte magic `FFA-format-v2` padded with spaces. Every
//! dataset is then stored as
//!
//! | Offset (bytes) | Field       | Description                                    |
//! |----------------|-------------|------------------------------------------------|
//! | 0x0000         | Name        | 16 bytes: ASCII, space padded                  |
//! | 0x0010         | Type        | 4 bytes: ASCII type tag                        |
//! | 0x0014         | ndim        | 8 bytes: number of columns                     |
//! | 0x001C         | nsiz        | 8 bytes: number of rows                        |
//! | 0x0024         | nsub        | 8 bytes: number of children                    |
//! | 0x002C         | Length      | 8 bytes: payload size, only when there is data |
//! | 0x0034         | Payload     | `ndim * nsiz` elements, column-major           |
//!
//! ## Version 1
//!
//! The same tree as Fortran sequential records without a magic. The
//! descriptor is framed by two 4 byte markers holding 32, the counts are 4
//! bytes wide, and the payload is framed by its length in front and behind.
//!
//! ## Version 0
//!
//! A text rendition meant to be edited by hand:
//!
//! ```text
//! * comments start with an asterisk
//! mesh,N   ,0,0,1
//! coordinates,D   ,2,3,0
//! 0 1 0.5
//! 0 0 1.5
//! ```
//!
//! ## Additional Information
//!
//! - **File Extension**: `.ffa`
//! - **Endianness**: Big-endian for all binary numbers
//! - **Strings**: Space padded to the element width
//!

pub mod codec;
pub mod data;
pub mod error;
mod listing;
pub mod node;
pub mod read;
pub mod types;
pub mod write;

pub use data::{DataBlock, Element, Values};
pub use node::{Node, Removal};
pub use read::{probe, read, read_from, ReadOptions};
pub use types::{Complex, ElementKind, TypeTag, Version};
pub use write::{write, write_to, WriteOptions};

//! Encoding and decoding of dataset trees.
//!
//! Every format generation stores the same pre-order walk of the tree: the
//! descriptor of a dataset, its payload, then each child in turn. The
//! generations only differ in how a descriptor and a payload are laid out,
//! which is what [`NodeRead`] and [`NodeWrite`] abstract over.

use std::collections::BTreeSet;

use derive_more::derive::Deref;
use tracing::trace;

use crate::data::DataBlock;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::types::{ElementKind, Name, TypeTag};

pub mod ascii;
pub(crate) mod payload;
pub mod dense;
pub mod record;

pub use ascii::Ascii;
pub use dense::Dense;
pub use record::Record;

/// Upper bound on capacity reserved up front from counts found in a file
pub(crate) const PREALLOCATE_LIMIT: usize = 1024;

/// Deepest nesting accepted when reading or writing a tree
pub const MAX_DEPTH: usize = 256;

/// The header of one dataset as stored in an archive
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    name: Name,
    tag: TypeTag,
    ndim: usize,
    nsiz: usize,
    nsub: usize,
}

fn count(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::InvalidCount(value))
}

impl Descriptor {
    /// Validate the counts of a header
    pub fn new(name: Name, tag: TypeTag, ndim: i64, nsiz: i64, nsub: i64) -> Result<Self> {
        let descriptor = Descriptor {
            name,
            tag,
            ndim: count(ndim)?,
            nsiz: count(nsiz)?,
            nsub: count(nsub)?,
        };

        if descriptor.ndim.checked_mul(descriptor.nsiz).is_none() {
            return Err(Error::InvalidCount(ndim));
        }

        Ok(descriptor)
    }

    /// Header of an in-memory dataset
    pub fn of(node: &Node) -> Self {
        Descriptor {
            name: node.stored_name().clone(),
            tag: node.tag(),
            ndim: node.ndim(),
            nsiz: node.nsiz(),
            nsub: node.nsub(),
        }
    }

    /// Dataset name
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Type tag
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Element kind selected by the tag
    pub fn kind(&self) -> ElementKind {
        self.tag.kind()
    }

    /// Number of columns
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of rows
    pub fn nsiz(&self) -> usize {
        self.nsiz
    }

    /// Number of children following the payload
    pub fn nsub(&self) -> usize {
        self.nsub
    }

    /// Number of payload elements
    pub fn count(&self) -> usize {
        self.ndim * self.nsiz
    }

    /// Whether a payload follows the descriptor
    pub fn has_payload(&self) -> bool {
        self.kind() != ElementKind::None && self.count() > 0
    }
}

/// Flag characters selecting datasets whose payload is not decoded
///
/// ```
/// use ffa_format::codec::SkipFilter;
///
/// let skip = SkipFilter::from("XY");
/// assert!(skip.matches(&"RX  ".parse().unwrap()));
/// assert!(skip.matches(&"I  Y".parse().unwrap()));
/// assert!(!skip.matches(&"R   ".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct SkipFilter(BTreeSet<char>);

impl SkipFilter {
    /// Whether any non-blank flag of the tag is in the filter
    pub fn matches(&self, tag: &TypeTag) -> bool {
        tag.flags()
            .any(|flag| !flag.is_whitespace() && self.0.contains(&flag))
    }
}

impl From<&str> for SkipFilter {
    fn from(flags: &str) -> Self {
        SkipFilter(flags.chars().filter(|c| !c.is_whitespace()).collect())
    }
}

impl From<String> for SkipFilter {
    fn from(flags: String) -> Self {
        SkipFilter::from(flags.as_str())
    }
}

/// Decoding half of a format generation
pub trait NodeRead {
    /// Read the next descriptor, collecting any comments in front of it
    fn read_descriptor(&mut self, comments: &mut Vec<String>) -> Result<Descriptor>;

    /// Read the payload announced by `descriptor`
    fn read_data(&mut self, descriptor: &Descriptor) -> Result<DataBlock>;

    /// Move past the payload announced by `descriptor` without decoding it
    fn skip_data(&mut self, descriptor: &Descriptor) -> Result<()> {
        self.read_data(descriptor).map(|_| ())
    }
}

/// Encoding half of a format generation
pub trait NodeWrite {
    /// Write the descriptor of `node`
    fn write_descriptor(&mut self, node: &Node) -> Result<()>;

    /// Write a non-empty payload
    fn write_data(&mut self, data: &DataBlock) -> Result<()>;
}

/// Decode a dataset and all of its descendants
///
/// Fails with [`Error::TooDeep`] once datasets nest more than [`MAX_DEPTH`]
/// levels below the root.
pub fn read_tree<R: NodeRead>(reader: &mut R, skip: &SkipFilter) -> Result<Node> {
    read_level(reader, skip, 0)
}

fn read_level<R: NodeRead>(reader: &mut R, skip: &SkipFilter, level: usize) -> Result<Node> {
    if level > MAX_DEPTH {
        return Err(Error::TooDeep(MAX_DEPTH));
    }

    let mut comments = Vec::new();
    let descriptor = reader.read_descriptor(&mut comments)?;
    trace!(
        name = descriptor.name().as_str(),
        tag = %descriptor.tag(),
        ndim = descriptor.ndim(),
        nsiz = descriptor.nsiz(),
        nsub = descriptor.nsub(),
        "descriptor"
    );

    let kind = descriptor.kind();
    let data = if !descriptor.has_payload() {
        DataBlock::empty_of(kind)
    } else if skip.matches(&descriptor.tag()) {
        trace!(name = descriptor.name().as_str(), "skipping payload");
        reader.skip_data(&descriptor)?;
        DataBlock::skipped(kind, descriptor.nsiz(), descriptor.ndim())
    } else {
        reader.read_data(&descriptor)?
    };

    let mut children = Vec::with_capacity(descriptor.nsub().min(PREALLOCATE_LIMIT));
    for _ in 0..descriptor.nsub() {
        children.push(read_level(reader, skip, level + 1)?);
    }

    Ok(Node::from_parts(
        descriptor.name,
        descriptor.tag,
        data,
        children,
        comments,
    ))
}

/// Encode a dataset and all of its descendants
pub fn write_tree<W: NodeWrite>(writer: &mut W, node: &Node) -> Result<()> {
    write_level(writer, node, 0)
}

fn write_level<W: NodeWrite>(writer: &mut W, node: &Node, level: usize) -> Result<()> {
    if level > MAX_DEPTH {
        return Err(Error::TooDeep(MAX_DEPTH));
    }

    if node.data().is_skipped() {
        return Err(Error::SkippedPayload(node.name().to_owned()));
    }

    trace!(name = node.name(), tag = %node.tag(), "writing");
    writer.write_descriptor(node)?;

    if node.tag().kind() != ElementKind::None && !node.data().is_empty() {
        writer.write_data(node.data())?;
    }

    node.children()
        .iter()
        .try_for_each(|child| write_level(writer, child, level + 1))
}

/// First dataset in the tree whose payload was skipped while reading
pub(crate) fn find_skipped(root: &Node) -> Option<&Node> {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if node.data().is_skipped() {
            return Some(node);
        }
        pending.extend(node.children().iter().rev());
    }
    None
}

//! The in-memory dataset tree.

use std::slice;

use crate::data::DataBlock;
use crate::error::{Error, Result};
use crate::types::{Name, TypeTag};

/// One dataset of an archive: a named, typed block of data plus children
///
/// ```
/// # fn doit() -> ffa_format::error::Result<()>
/// # {
/// use ffa_format::{DataBlock, Node};
///
/// let mut root = Node::new("mesh")?;
/// root.append(Node::with_data("coordinates", DataBlock::from_rows(vec![
///     vec![0.0f64, 0.0],
///     vec![1.0, 0.5],
/// ])?, None)?);
///
/// let coordinates = root.get("coordinates").expect("child was appended");
/// assert_eq!(coordinates.nsiz(), 2);
/// assert_eq!(coordinates.ndim(), 2);
/// assert_eq!(coordinates.tag().to_string(), "D   ");
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Node {
    name: Name,
    tag: TypeTag,
    data: DataBlock,
    children: Vec<Node>,
    comments: Vec<String>,
}

/// What to remove with [`Node::delete`]
#[derive(Debug, Clone)]
pub enum Removal {
    /// Nothing, deleting is a no-op
    Nothing,
    /// The first child equal to this node
    Node(Node),
    /// The child at this index
    Index(usize),
    /// Each entry in turn
    Many(Vec<Removal>),
}

impl From<usize> for Removal {
    fn from(index: usize) -> Self {
        Removal::Index(index)
    }
}

impl From<Node> for Removal {
    fn from(node: Node) -> Self {
        Removal::Node(node)
    }
}

impl From<&Node> for Removal {
    fn from(node: &Node) -> Self {
        Removal::Node(node.clone())
    }
}

impl<T: Into<Removal>> From<Vec<T>> for Removal {
    fn from(entries: Vec<T>) -> Self {
        Removal::Many(entries.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Removal>> From<Option<T>> for Removal {
    fn from(entry: Option<T>) -> Self {
        entry.map_or(Removal::Nothing, Into::into)
    }
}

impl Node {
    /// An empty dataset of type `N   `
    pub fn new(name: &str) -> Result<Self> {
        Ok(Node {
            name: Name::new(name)?,
            ..Default::default()
        })
    }

    /// A dataset holding `data`
    ///
    /// Without an explicit `tag` the type is inferred from the kind of the
    /// data, otherwise the data is cast to the kind selected by the tag.
    pub fn with_data(name: &str, data: DataBlock, tag: Option<&str>) -> Result<Self> {
        let mut node = Node::new(name)?;
        node.set_data(data)?;
        if let Some(tag) = tag {
            node.set_type(tag)?;
        }
        Ok(node)
    }

    pub(crate) fn from_parts(
        name: Name,
        tag: TypeTag,
        data: DataBlock,
        children: Vec<Node>,
        comments: Vec<String>,
    ) -> Self {
        Node {
            name,
            tag,
            data,
            children,
            comments,
        }
    }

    /// Name without surrounding blanks
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Name padded to sixteen characters
    pub fn padded_name(&self) -> &str {
        self.name.padded()
    }

    pub(crate) fn stored_name(&self) -> &Name {
        &self.name
    }

    /// Rename, truncating or padding to sixteen characters
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.name = Name::new(name)?;
        Ok(())
    }

    /// The four character type tag
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Change the type tag, casting the data to the new element kind
    pub fn set_type(&mut self, tag: &str) -> Result<()> {
        let tag = tag.parse::<TypeTag>()?;
        self.data = self.data.cast(tag.kind())?;
        self.tag = tag;
        Ok(())
    }

    /// The data block
    pub fn data(&self) -> &DataBlock {
        &self.data
    }

    /// Replace the data block
    ///
    /// The element kind of the tag follows the data, flags are kept. An
    /// empty block keeps the current kind. Strings must be ASCII and are cut
    /// to the width of their kind.
    pub fn set_data(&mut self, data: DataBlock) -> Result<()> {
        if data.is_empty() && !data.is_skipped() {
            self.data = DataBlock::empty_of(self.tag.kind());
            return Ok(());
        }

        let data = data.normalized()?;
        self.tag = self.tag.with_kind(data.kind());
        self.data = data;
        Ok(())
    }

    /// Number of columns
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Number of rows
    pub fn nsiz(&self) -> usize {
        self.data.nsiz()
    }

    /// Number of children
    pub fn nsub(&self) -> usize {
        self.children.len()
    }

    /// Child datasets in order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Mutable access to the child datasets
    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    /// Replace every child with a single node or a list of nodes
    pub fn set_children(&mut self, children: impl Into<Vec<Node>>) {
        self.children = children.into();
    }

    /// Comment lines that preceded this dataset in a text archive
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Attach a comment line, written before the dataset in text archives
    pub fn push_comment(&mut self, comment: impl Into<String>) {
        let comment = comment.into();
        let trimmed = comment.trim_start();
        if trimmed.starts_with('*') {
            self.comments.push(comment);
        } else {
            self.comments.push(format!("* {}", comment));
        }
    }

    /// Add a child at the end, `None` is ignored
    pub fn append(&mut self, child: impl Into<Option<Node>>) {
        if let Some(child) = child.into() {
            self.children.push(child);
        }
    }

    /// Add a child before `index`, `None` is ignored
    ///
    /// An index past the end appends.
    pub fn insert(&mut self, child: impl Into<Option<Node>>, index: usize) {
        if let Some(child) = child.into() {
            let index = index.min(self.children.len());
            self.children.insert(index, child);
        }
    }

    /// Remove children
    ///
    /// A node removes the first equal child and is ignored when absent, an
    /// index must exist, lists are applied one entry after the other.
    pub fn delete(&mut self, target: impl Into<Removal>) -> Result<()> {
        match target.into() {
            Removal::Nothing => Ok(()),
            Removal::Node(node) => {
                if let Some(index) = self.children.iter().position(|child| *child == node) {
                    self.children.remove(index);
                }
                Ok(())
            }
            Removal::Index(index) => {
                if index >= self.children.len() {
                    return Err(Error::IndexOutOfRange(index));
                }
                self.children.remove(index);
                Ok(())
            }
            Removal::Many(entries) => entries
                .into_iter()
                .try_for_each(|entry| self.delete(entry)),
        }
    }

    /// First direct child with this name
    pub fn get(&self, name: &str) -> Option<&Node> {
        let name = name.trim();
        self.children.iter().find(|child| child.name() == name)
    }

    /// First direct child with this name, mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        let name = name.trim();
        self.children.iter_mut().find(|child| child.name() == name)
    }

    /// Every direct child with this name
    pub fn get_all(&self, name: &str) -> Vec<&Node> {
        let name = name.trim();
        self.children
            .iter()
            .filter(|child| child.name() == name)
            .collect()
    }

    /// Every descendant with this name, depth-first in pre-order
    ///
    /// Matching datasets are searched as well, so nested matches are found.
    pub fn find_all(&self, name: &str) -> Vec<&Node> {
        let name = name.trim();
        let mut found = Vec::new();
        let mut pending = self.children.iter().rev().collect::<Vec<_>>();

        while let Some(node) = pending.pop() {
            if node.name() == name {
                found.push(node);
            }
            pending.extend(node.children.iter().rev());
        }

        found
    }
}

/// Datasets are equal when their trimmed names, shapes, elements and children match
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
            && self.ndim() == other.ndim()
            && self.nsiz() == other.nsiz()
            && self.nsub() == other.nsub()
            && self.data == other.data
            && self.children == other.children
    }
}

impl From<Node> for Vec<Node> {
    fn from(node: Node) -> Self {
        vec![node]
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = &'a Node;
    type IntoIter = slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

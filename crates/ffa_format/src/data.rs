//! Rectangular blocks of elements attached to every dataset.
//!
//! A [`DataBlock`] is stored row-major with `nsiz` rows and `ndim` columns.
//! The binary and text codecs move data column-major, the conversion happens
//! in [`DataBlock::from_columns`] and [`DataBlock::column_major`].

use std::{iter, mem};

use crate::error::{Error, Result};
use crate::types::{parse_real, Complex, ElementKind};

/// Element storage, one variant per [`ElementKind`]
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Values {
    /// No elements
    #[default]
    None,
    /// `I` elements
    Int32(Vec<i32>),
    /// `J` elements
    Int64(Vec<i64>),
    /// `R` elements
    Float32(Vec<f32>),
    /// `D` elements
    Float64(Vec<f64>),
    /// `C` elements
    Complex64(Vec<Complex<f32>>),
    /// `Z` elements
    Complex128(Vec<Complex<f64>>),
    /// `A` elements, at most one character each
    Char1(Vec<String>),
    /// `S` elements, at most sixteen characters each
    Char16(Vec<String>),
    /// `L` elements, at most seventy-two characters each
    Char72(Vec<String>),
}

/// Rust types that can be stored in a [`DataBlock`]
pub trait Element: Sized + Clone {
    /// Kind inferred when a block is built from this type
    const KIND: ElementKind;

    /// Wrap a vector of elements
    fn into_values(values: Vec<Self>) -> Values;

    /// Borrow the elements if `values` holds this type
    fn slice(values: &Values) -> Option<&[Self]>;
}

macro_rules! element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::$variant;

            fn into_values(values: Vec<Self>) -> Values {
                Values::$variant(values)
            }

            fn slice(values: &Values) -> Option<&[Self]> {
                match values {
                    Values::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }
        }
    };
}

element!(i32, Int32);
element!(i64, Int64);
element!(f32, Float32);
element!(f64, Float64);
element!(Complex<f32>, Complex64);
element!(Complex<f64>, Complex128);

/// Text defaults to the widest string kind
impl Element for String {
    const KIND: ElementKind = ElementKind::Char72;

    fn into_values(values: Vec<Self>) -> Values {
        Values::Char72(values)
    }

    fn slice(values: &Values) -> Option<&[Self]> {
        match values {
            Values::Char1(v) | Values::Char16(v) | Values::Char72(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl<T: Element> From<Vec<T>> for Values {
    fn from(values: Vec<T>) -> Self {
        T::into_values(values)
    }
}

/// Intermediate representation used when casting between kinds
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Int(i64),
    Real(f64),
    Complex(Complex<f64>),
    Text(String),
}

impl Scalar {
    fn describe(&self) -> String {
        match self {
            Scalar::Int(v) => v.to_string(),
            Scalar::Real(v) => v.to_string(),
            Scalar::Complex(v) => v.to_string(),
            Scalar::Text(v) => v.clone(),
        }
    }

    fn to_int(&self, kind: ElementKind) -> Result<i64> {
        match self {
            Scalar::Int(v) => Ok(*v),
            Scalar::Real(v) => Ok(*v as i64),
            Scalar::Complex(v) => Ok(v.re as i64),
            Scalar::Text(v) => v.trim().parse().map_err(|_| self.cast_error(kind)),
        }
    }

    fn to_real(&self, kind: ElementKind) -> Result<f64> {
        match self {
            Scalar::Int(v) => Ok(*v as f64),
            Scalar::Real(v) => Ok(*v),
            Scalar::Complex(v) => Ok(v.re),
            Scalar::Text(v) => parse_real(v.trim()).ok_or_else(|| self.cast_error(kind)),
        }
    }

    fn to_complex(&self, kind: ElementKind) -> Result<Complex<f64>> {
        match self {
            Scalar::Int(v) => Ok(Complex::new(*v as f64, 0.0)),
            Scalar::Real(v) => Ok(Complex::new(*v, 0.0)),
            Scalar::Complex(v) => Ok(*v),
            Scalar::Text(v) => v.parse().map_err(|_| self.cast_error(kind)),
        }
    }

    fn number(&self) -> Option<Complex<f64>> {
        match self {
            Scalar::Int(v) => Some(Complex::new(*v as f64, 0.0)),
            Scalar::Real(v) => Some(Complex::new(*v, 0.0)),
            Scalar::Complex(v) => Some(*v),
            Scalar::Text(_) => None,
        }
    }

    /// Element-wise equality across kinds, text only equals text
    fn same(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Text(_), _) | (_, Scalar::Text(_)) => false,
            _ => self.number() == other.number(),
        }
    }

    fn cast_error(&self, kind: ElementKind) -> Error {
        Error::Cast {
            value: self.describe(),
            kind,
        }
    }
}

/// Prepare text for a fixed width string kind
///
/// Only ASCII is accepted. The text is cut to `width` characters and loses
/// any trailing blanks or NULs, as the padding of a stored field cannot be
/// told apart from them.
pub(crate) fn fit(mut text: String, width: usize) -> Result<String> {
    if !text.is_ascii() {
        return Err(Error::InvalidString(text));
    }

    text.truncate(width);
    let end = text.trim_end_matches([' ', '\0']).len();
    text.truncate(end);
    Ok(text)
}

fn check_shape(len: usize, nsiz: usize, ndim: usize) -> Result<()> {
    if nsiz.checked_mul(ndim) != Some(len) {
        return Err(Error::ShapeMismatch {
            nsiz,
            ndim,
            actual: len,
        });
    }
    Ok(())
}

fn gather<T: Clone>(values: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|i| values[*i].clone()).collect()
}

impl Values {
    /// An empty vector of the given kind
    pub fn empty(kind: ElementKind) -> Self {
        match kind {
            ElementKind::None => Values::None,
            ElementKind::Int32 => Values::Int32(Vec::new()),
            ElementKind::Int64 => Values::Int64(Vec::new()),
            ElementKind::Float32 => Values::Float32(Vec::new()),
            ElementKind::Float64 => Values::Float64(Vec::new()),
            ElementKind::Complex64 => Values::Complex64(Vec::new()),
            ElementKind::Complex128 => Values::Complex128(Vec::new()),
            ElementKind::Char1 => Values::Char1(Vec::new()),
            ElementKind::Char16 => Values::Char16(Vec::new()),
            ElementKind::Char72 => Values::Char72(Vec::new()),
        }
    }

    /// The element kind held
    pub fn kind(&self) -> ElementKind {
        match self {
            Values::None => ElementKind::None,
            Values::Int32(_) => ElementKind::Int32,
            Values::Int64(_) => ElementKind::Int64,
            Values::Float32(_) => ElementKind::Float32,
            Values::Float64(_) => ElementKind::Float64,
            Values::Complex64(_) => ElementKind::Complex64,
            Values::Complex128(_) => ElementKind::Complex128,
            Values::Char1(_) => ElementKind::Char1,
            Values::Char16(_) => ElementKind::Char16,
            Values::Char72(_) => ElementKind::Char72,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Values::None => 0,
            Values::Int32(v) => v.len(),
            Values::Int64(v) => v.len(),
            Values::Float32(v) => v.len(),
            Values::Float64(v) => v.len(),
            Values::Complex64(v) => v.len(),
            Values::Complex128(v) => v.len(),
            Values::Char1(v) | Values::Char16(v) | Values::Char72(v) => v.len(),
        }
    }

    /// Whether there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text form of one element
    ///
    /// Numbers use their shortest representation that parses back to the same
    /// value, strings are returned as stored.
    pub fn text_at(&self, index: usize) -> Option<String> {
        match self {
            Values::None => None,
            Values::Int32(v) => v.get(index).map(ToString::to_string),
            Values::Int64(v) => v.get(index).map(ToString::to_string),
            Values::Float32(v) => v.get(index).map(ToString::to_string),
            Values::Float64(v) => v.get(index).map(ToString::to_string),
            Values::Complex64(v) => v.get(index).map(ToString::to_string),
            Values::Complex128(v) => v.get(index).map(ToString::to_string),
            Values::Char1(v) | Values::Char16(v) | Values::Char72(v) => v.get(index).cloned(),
        }
    }

    fn scalars(&self) -> Box<dyn Iterator<Item = Scalar> + '_> {
        match self {
            Values::None => Box::new(iter::empty()),
            Values::Int32(v) => Box::new(v.iter().map(|x| Scalar::Int(i64::from(*x)))),
            Values::Int64(v) => Box::new(v.iter().map(|x| Scalar::Int(*x))),
            Values::Float32(v) => Box::new(v.iter().map(|x| Scalar::Real(f64::from(*x)))),
            Values::Float64(v) => Box::new(v.iter().map(|x| Scalar::Real(*x))),
            Values::Complex64(v) => Box::new(
                v.iter()
                    .map(|x| Scalar::Complex(Complex::new(f64::from(x.re), f64::from(x.im)))),
            ),
            Values::Complex128(v) => Box::new(v.iter().map(|x| Scalar::Complex(*x))),
            Values::Char1(v) | Values::Char16(v) | Values::Char72(v) => {
                Box::new(v.iter().map(|x| Scalar::Text(x.clone())))
            }
        }
    }

    fn texts(&self, width: usize) -> Result<Vec<String>> {
        (0..self.len())
            .filter_map(|i| self.text_at(i))
            .map(|text| fit(text, width))
            .collect()
    }

    /// Convert every element to another kind
    ///
    /// Integers must fit the target width, text must parse as a number when
    /// the target is numeric. Reals are truncated towards zero when cast to
    /// integers and complex numbers lose their imaginary part when cast to
    /// reals. Text is cut to the width of the target string kind.
    pub fn cast(&self, kind: ElementKind) -> Result<Values> {
        if kind == self.kind() {
            return Ok(self.clone());
        }

        Ok(match kind {
            ElementKind::None => Values::None,
            ElementKind::Int32 => Values::Int32(
                self.scalars()
                    .map(|s| {
                        let value = s.to_int(kind)?;
                        i32::try_from(value).map_err(|_| s.cast_error(kind))
                    })
                    .collect::<Result<_>>()?,
            ),
            ElementKind::Int64 => Values::Int64(
                self.scalars()
                    .map(|s| s.to_int(kind))
                    .collect::<Result<_>>()?,
            ),
            ElementKind::Float32 => Values::Float32(
                self.scalars()
                    .map(|s| s.to_real(kind).map(|v| v as f32))
                    .collect::<Result<_>>()?,
            ),
            ElementKind::Float64 => Values::Float64(
                self.scalars()
                    .map(|s| s.to_real(kind))
                    .collect::<Result<_>>()?,
            ),
            ElementKind::Complex64 => Values::Complex64(
                self.scalars()
                    .map(|s| {
                        s.to_complex(kind)
                            .map(|c| Complex::new(c.re as f32, c.im as f32))
                    })
                    .collect::<Result<_>>()?,
            ),
            ElementKind::Complex128 => Values::Complex128(
                self.scalars()
                    .map(|s| s.to_complex(kind))
                    .collect::<Result<_>>()?,
            ),
            ElementKind::Char1 => Values::Char1(self.texts(1)?),
            ElementKind::Char16 => Values::Char16(self.texts(16)?),
            ElementKind::Char72 => Values::Char72(self.texts(72)?),
        })
    }

    fn reorder(&self, order: &[usize]) -> Values {
        match self {
            Values::None => Values::None,
            Values::Int32(v) => Values::Int32(gather(v, order)),
            Values::Int64(v) => Values::Int64(gather(v, order)),
            Values::Float32(v) => Values::Float32(gather(v, order)),
            Values::Float64(v) => Values::Float64(gather(v, order)),
            Values::Complex64(v) => Values::Complex64(gather(v, order)),
            Values::Complex128(v) => Values::Complex128(gather(v, order)),
            Values::Char1(v) => Values::Char1(gather(v, order)),
            Values::Char16(v) => Values::Char16(gather(v, order)),
            Values::Char72(v) => Values::Char72(gather(v, order)),
        }
    }
}

/// A row-major block of `nsiz` rows by `ndim` columns
///
/// The shape is always derived from the stored elements: an empty block is
/// `0 x 0`. The only exception is a block whose payload was skipped while
/// reading, which keeps the shape recorded on disk without its elements.
///
/// Blocks compare element by element, so `I` and `J` blocks holding the same
/// numbers are equal, as are `A` and `L` blocks holding the same text.
#[derive(Debug, Clone, Default)]
pub struct DataBlock {
    values: Values,
    nsiz: usize,
    ndim: usize,
    skipped: bool,
}

impl DataBlock {
    /// A `0 x 0` block without a kind
    pub fn empty() -> Self {
        Self::empty_of(ElementKind::None)
    }

    /// A `0 x 0` block of the given kind
    pub fn empty_of(kind: ElementKind) -> Self {
        DataBlock {
            values: Values::empty(kind),
            nsiz: 0,
            ndim: 0,
            skipped: false,
        }
    }

    /// A block of `nsiz` rows and `ndim` columns from row-major elements
    pub fn new(values: impl Into<Values>, nsiz: usize, ndim: usize) -> Result<Self> {
        let values = values.into();
        check_shape(values.len(), nsiz, ndim)?;

        if values.is_empty() {
            return Ok(Self::empty_of(values.kind()));
        }

        Ok(DataBlock {
            values,
            nsiz,
            ndim,
            skipped: false,
        })
    }

    /// A block from column-major elements, as found on disk
    pub fn from_columns(values: impl Into<Values>, nsiz: usize, ndim: usize) -> Result<Self> {
        let values = values.into();
        check_shape(values.len(), nsiz, ndim)?;

        let order = (0..nsiz)
            .flat_map(|row| (0..ndim).map(move |col| col * nsiz + row))
            .collect::<Vec<_>>();

        Self::new(values.reorder(&order), nsiz, ndim)
    }

    /// A single column holding every element
    pub fn column(values: impl Into<Values>) -> Self {
        let values = values.into();
        let nsiz = values.len();
        if nsiz == 0 {
            return Self::empty_of(values.kind());
        }

        DataBlock {
            values,
            nsiz,
            ndim: 1,
            skipped: false,
        }
    }

    /// A `1 x 1` block
    pub fn scalar<T: Element>(value: T) -> Self {
        Self::column(vec![value])
    }

    /// A block from row-major elements and an array shape
    ///
    /// Rank 0 and rank 1 shapes become a single column, rank 2 shapes are
    /// `(nsiz, ndim)`, anything higher is rejected.
    pub fn from_shape(values: impl Into<Values>, shape: &[usize]) -> Result<Self> {
        match *shape {
            [] => Self::new(values, 1, 1),
            [nsiz] => Self::new(values, nsiz, 1),
            [nsiz, ndim] => Self::new(values, nsiz, ndim),
            _ => Err(Error::InvalidRank(shape.len())),
        }
    }

    /// A block from a list of equally long rows
    pub fn from_rows<T: Element>(rows: Vec<Vec<T>>) -> Result<Self> {
        let nsiz = rows.len();
        let ndim = rows.first().map_or(0, Vec::len);
        let actual = rows.iter().map(Vec::len).sum();

        if rows.iter().any(|row| row.len() != ndim) {
            return Err(Error::ShapeMismatch { nsiz, ndim, actual });
        }

        Self::new(rows.into_iter().flatten().collect::<Vec<T>>(), nsiz, ndim)
    }

    /// The same block with every text element passed through [`fit`]
    pub(crate) fn normalized(mut self) -> Result<Self> {
        let width = self.kind().width();
        if let Values::Char1(v) | Values::Char16(v) | Values::Char72(v) = &mut self.values {
            for text in v.iter_mut() {
                *text = fit(mem::take(text), width)?;
            }
        }
        Ok(self)
    }

    /// Placeholder for a payload that was not decoded
    pub(crate) fn skipped(kind: ElementKind, nsiz: usize, ndim: usize) -> Self {
        DataBlock {
            values: Values::empty(kind),
            nsiz,
            ndim,
            skipped: true,
        }
    }

    /// Number of rows
    pub fn nsiz(&self) -> usize {
        self.nsiz
    }

    /// Number of columns
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of stored elements
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no elements are stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the payload was skipped while reading
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Kind of the stored elements
    pub fn kind(&self) -> ElementKind {
        self.values.kind()
    }

    /// The stored elements, row-major
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// The stored elements as a typed slice, row-major
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.values)
    }

    /// One element by row and column
    pub fn get<T: Element>(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.nsiz || col >= self.ndim {
            return None;
        }
        self.as_slice::<T>()?.get(row * self.ndim + col)
    }

    /// Text form of one element by row and column
    pub fn text_at(&self, row: usize, col: usize) -> Option<String> {
        if row >= self.nsiz || col >= self.ndim {
            return None;
        }
        self.values.text_at(row * self.ndim + col)
    }

    /// Row-major indices in column-major order
    pub fn column_major(&self) -> impl Iterator<Item = usize> {
        let (nsiz, ndim) = (self.nsiz, self.ndim);
        (0..ndim).flat_map(move |col| (0..nsiz).map(move |row| row * ndim + col))
    }

    /// The same block converted to another kind, see [`Values::cast`]
    pub fn cast(&self, kind: ElementKind) -> Result<Self> {
        if kind == ElementKind::None {
            return Ok(Self::empty());
        }

        if self.skipped {
            return Ok(Self::skipped(kind, self.nsiz, self.ndim));
        }

        Self::new(self.values.cast(kind)?, self.nsiz, self.ndim)
    }
}

impl PartialEq for DataBlock {
    fn eq(&self, other: &Self) -> bool {
        self.nsiz == other.nsiz
            && self.ndim == other.ndim
            && self.skipped == other.skipped
            && self.len() == other.len()
            && self
                .values
                .scalars()
                .zip(other.values.scalars())
                .all(|(a, b)| a.same(&b))
    }
}

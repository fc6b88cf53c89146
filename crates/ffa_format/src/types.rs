//! Base types shared by the dataset tree and the codecs.

use derive_more::derive::Display;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Width in bytes of a stored dataset name
pub const NAME_WIDTH: usize = 16;

/// Width in bytes of a stored type tag
pub const TAG_WIDTH: usize = 4;

/// Element kind selected by the first character of a type tag
#[derive(Debug, Display, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// No data is attached to the dataset
    #[default]
    #[display("none")]
    None,
    /// 32 bit signed integer
    #[display("int32")]
    Int32,
    /// 64 bit signed integer
    #[display("int64")]
    Int64,
    /// 32 bit float
    #[display("float32")]
    Float32,
    /// 64 bit float
    #[display("float64")]
    Float64,
    /// Pair of 32 bit floats
    #[display("complex64")]
    Complex64,
    /// Pair of 64 bit floats
    #[display("complex128")]
    Complex128,
    /// Single character
    #[display("char*1")]
    Char1,
    /// 16 character string
    #[display("char*16")]
    Char16,
    /// 72 character string
    #[display("char*72")]
    Char72,
}

impl ElementKind {
    /// Every kind, in type tag order
    pub const ALL: [ElementKind; 10] = [
        ElementKind::None,
        ElementKind::Int32,
        ElementKind::Int64,
        ElementKind::Float32,
        ElementKind::Float64,
        ElementKind::Complex64,
        ElementKind::Complex128,
        ElementKind::Char1,
        ElementKind::Char16,
        ElementKind::Char72,
    ];

    /// The type tag character selecting this kind
    pub const fn code(self) -> char {
        match self {
            ElementKind::None => 'N',
            ElementKind::Int32 => 'I',
            ElementKind::Int64 => 'J',
            ElementKind::Float32 => 'R',
            ElementKind::Float64 => 'D',
            ElementKind::Complex64 => 'C',
            ElementKind::Complex128 => 'Z',
            ElementKind::Char1 => 'A',
            ElementKind::Char16 => 'S',
            ElementKind::Char72 => 'L',
        }
    }

    /// Look up the kind for a type tag character
    pub fn from_code(code: char) -> Result<Self> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(Error::UnknownType(code))
    }

    /// Size in bytes of one element in a binary payload
    pub const fn width(self) -> usize {
        match self {
            ElementKind::None => 0,
            ElementKind::Int32 | ElementKind::Float32 => 4,
            ElementKind::Int64 | ElementKind::Float64 | ElementKind::Complex64 => 8,
            ElementKind::Complex128 => 16,
            ElementKind::Char1 => 1,
            ElementKind::Char16 => 16,
            ElementKind::Char72 => 72,
        }
    }

    /// Whether elements of this kind are text
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            ElementKind::Char1 | ElementKind::Char16 | ElementKind::Char72
        )
    }
}

/// A four character type tag
///
/// The first character selects the [`ElementKind`], the remaining three are
/// free-form flags which are only consulted by the skip filter when reading.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TypeTag {
    kind: ElementKind,
    flags: [u8; TAG_WIDTH - 1],
}

impl TypeTag {
    /// Tag of the given kind with blank flags
    pub const fn new(kind: ElementKind) -> Self {
        TypeTag {
            kind,
            flags: [b' '; TAG_WIDTH - 1],
        }
    }

    /// The element kind
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The three flag characters
    pub fn flags(&self) -> impl Iterator<Item = char> + '_ {
        self.flags.iter().map(|f| *f as char)
    }

    /// The same tag with a different kind
    pub const fn with_kind(self, kind: ElementKind) -> Self {
        TypeTag {
            kind,
            flags: self.flags,
        }
    }

    /// The tag as stored on disk
    pub fn to_bytes(&self) -> [u8; TAG_WIDTH] {
        let mut bytes = [b' '; TAG_WIDTH];
        bytes[0] = self.kind.code() as u8;
        bytes[1..].copy_from_slice(&self.flags);
        bytes
    }

    /// Decode a tag as stored on disk
    pub fn from_bytes(bytes: &[u8; TAG_WIDTH]) -> Result<Self> {
        let text = ascii_field(bytes)?;
        text.parse()
    }
}

impl Default for TypeTag {
    fn default() -> Self {
        TypeTag::new(ElementKind::None)
    }
}

impl FromStr for TypeTag {
    type Err = Error;

    /// Pads or truncates to four characters; the first must be a known kind
    fn from_str(s: &str) -> Result<Self> {
        if !s.is_ascii() {
            return Err(Error::InvalidName(s.to_owned()));
        }

        let mut bytes = [b' '; TAG_WIDTH];
        for (slot, byte) in bytes.iter_mut().zip(s.bytes()) {
            *slot = byte;
        }

        let kind = ElementKind::from_code(bytes[0] as char)?;
        let mut flags = [b' '; TAG_WIDTH - 1];
        flags.copy_from_slice(&bytes[1..]);

        Ok(TypeTag { kind, flags })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes();
        // always ASCII, see from_str
        f.pad(&String::from_utf8_lossy(&bytes))
    }
}

/// A dataset name, truncated and padded to sixteen characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(String);

impl Name {
    /// Validate and normalise a name
    pub fn new(name: &str) -> Result<Self> {
        if !name.is_ascii() {
            return Err(Error::InvalidName(name.to_owned()));
        }

        let mut padded = format!("{:<width$}", name, width = NAME_WIDTH);
        padded.truncate(NAME_WIDTH);
        Ok(Name(padded))
    }

    /// The name without surrounding blanks, used for all comparisons
    pub fn as_str(&self) -> &str {
        self.0.trim()
    }

    /// The name padded to its stored width
    pub fn padded(&self) -> &str {
        &self.0
    }

    /// The name as stored on disk
    pub fn to_bytes(&self) -> [u8; NAME_WIDTH] {
        let mut bytes = [b' '; NAME_WIDTH];
        bytes.copy_from_slice(self.0.as_bytes());
        bytes
    }

    /// Decode a name as stored on disk
    pub fn from_bytes(bytes: &[u8; NAME_WIDTH]) -> Result<Self> {
        Name::new(ascii_field(bytes)?)
    }
}

impl Default for Name {
    fn default() -> Self {
        Name(format!("{:<width$}", "Default", width = NAME_WIDTH))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Fixed width text fields may be NUL padded by some writers
fn ascii_field(bytes: &[u8]) -> Result<&str> {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0)
        .map_or(0, |position| position + 1);
    let text = &bytes[..end];

    if !text.is_ascii() {
        return Err(Error::InvalidName(
            String::from_utf8_lossy(text).into_owned(),
        ));
    }

    std::str::from_utf8(text).map_err(|_| Error::InvalidName(String::from_utf8_lossy(text).into()))
}

/// A complex number stored as a real and an imaginary part
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Complex<T> {
    /// Real part
    pub re: T,
    /// Imaginary part
    pub im: T,
}

impl<T> Complex<T> {
    /// Create a complex number from its parts
    pub const fn new(re: T, im: T) -> Self {
        Complex { re, im }
    }
}

impl<T: fmt::Display> fmt::Display for Complex<T> {
    /// Written as `(re+imj)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let im = self.im.to_string();
        let sign = if im.starts_with('-') { "" } else { "+" };
        write!(f, "({}{}{}j)", self.re, sign, im)
    }
}

impl<T: FromStr> FromStr for Complex<T> {
    type Err = Error;

    /// Accepts `(re+imj)`, `re+imj`, `(re,im)` and plain reals
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidNumber(s.to_owned());
        let part = |text: &str| parse_real::<T>(text.trim()).ok_or_else(invalid);

        let body = s.trim();
        let body = body
            .strip_prefix('(')
            .and_then(|b| b.strip_suffix(')'))
            .unwrap_or(body);

        if let Some((re, im)) = body.split_once(',') {
            return Ok(Complex::new(part(re)?, part(im)?));
        }

        let Some(imaginary) = body.strip_suffix(['j', 'J']) else {
            return Ok(Complex::new(part(body)?, part("0")?));
        };

        // Split at the last sign that does not belong to an exponent
        let split = imaginary
            .char_indices()
            .skip(1)
            .filter(|(i, c)| {
                matches!(c, '+' | '-')
                    && !matches!(imaginary.as_bytes()[i - 1], b'e' | b'E' | b'd' | b'D')
            })
            .map(|(i, _)| i)
            .last();

        match split {
            Some(index) => Ok(Complex::new(
                part(&imaginary[..index])?,
                part(&imaginary[index..])?,
            )),
            None => Ok(Complex::new(part("0")?, part(imaginary)?)),
        }
    }
}

/// Parse a real number, accepting Fortran `D` exponents
pub(crate) fn parse_real<T: FromStr>(text: &str) -> Option<T> {
    let text = text.strip_prefix('+').unwrap_or(text);
    text.parse().ok().or_else(|| {
        if text.contains(['d', 'D']) {
            text.replace(['d', 'D'], "e").parse().ok()
        } else {
            None
        }
    })
}

/// FFA format generations
#[derive(Debug, Display, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Version {
    /// Line oriented text
    #[display("v0 (ascii)")]
    Ascii = 0,
    /// Fortran sequential records, no magic
    #[display("v1 (record)")]
    Record = 1,
    /// Big-endian stream with a 32 byte magic
    #[default]
    #[display("v2 (dense)")]
    Dense = 2,
}

impl TryFrom<u8> for Version {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Version::Ascii),
            1 => Ok(Version::Record),
            2 => Ok(Version::Dense),
            _ => Err(Error::UnsupportedVersion(value)),
        }
    }
}

//! Version 0: line oriented text.
//!
//! ```text
//! * comment lines start with an asterisk
//! "wing",R   ,1,3,0
//! 0.5 1.25D+00 -3
//! ```
//!
//! A descriptor line holds `name,type,ndim,nsiz,nsub`, separated by commas
//! and/or blanks, with the name and type optionally quoted. The payload
//! follows with one line per column. String elements are single quoted.

use std::io::{BufRead, Write};
use std::str::FromStr;

use tracing::trace;
use winnow::combinator::{alt, delimited, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::codec::{Descriptor, NodeRead, NodeWrite, PREALLOCATE_LIMIT};
use crate::data::{fit, DataBlock, Values};
use crate::error::{Error, Result};
use crate::node::Node;
use crate::types::{parse_real, Complex, ElementKind, Name, TypeTag};

fn separator(input: &mut &str) -> PResult<()> {
    take_while(0.., |c: char| c == ',' || c.is_whitespace())
        .void()
        .parse_next(input)
}

fn quoted<'s>(input: &mut &'s str) -> PResult<&'s str> {
    delimited('\'', take_till(0.., '\''), '\'').parse_next(input)
}

fn token<'s>(input: &mut &'s str) -> PResult<&'s str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        quoted,
        // complex numbers may be written `(re,im)`
        delimited('(', take_till(0.., ')'), ')'),
        take_till(1.., |c: char| c == ',' || c.is_whitespace()),
    ))
    .parse_next(input)
}

fn tokens<'s>(input: &mut &'s str) -> PResult<Vec<&'s str>> {
    preceded(separator, repeat(0.., terminated(token, separator))).parse_next(input)
}

fn quoted_tokens<'s>(input: &mut &'s str) -> PResult<Vec<&'s str>> {
    preceded(separator, repeat(0.., terminated(quoted, separator))).parse_next(input)
}

/// Split a descriptor or numeric line into its fields, quotes removed
pub(crate) fn tokenize(line: &str) -> Result<Vec<&str>> {
    tokens
        .parse(line)
        .map_err(|_| Error::InvalidString(line.trim().to_owned()))
}

/// Split a line of string elements, everything must be single quoted
fn tokenize_quoted(line: &str) -> Result<Vec<&str>> {
    quoted_tokens
        .parse(line)
        .map_err(|_| Error::InvalidString(line.trim().to_owned()))
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('*')
}

fn integer(field: &str) -> Result<i64> {
    field
        .parse()
        .map_err(|_| Error::InvalidNumber(field.to_owned()))
}

fn parse_descriptor(fields: Vec<&str>) -> Result<Descriptor> {
    let mut fields = fields.into_iter();
    let mut next = |name: &'static str| fields.next().ok_or(Error::MissingField(name));

    let name = Name::new(next("name")?)?;
    let tag = next("type")?.parse::<TypeTag>()?;
    let ndim = integer(next("ndim")?)?;
    let nsiz = integer(next("nsiz")?)?;
    let nsub = integer(next("nsub")?)?;

    if let Some(extra) = fields.next() {
        return Err(Error::TrailingField(extra.to_owned()));
    }

    Descriptor::new(name, tag, ndim, nsiz, nsub)
}

fn numbers<T: FromStr>(fields: &[String]) -> Result<Vec<T>> {
    fields
        .iter()
        .map(|field| parse_real(field).ok_or_else(|| Error::InvalidNumber(field.clone())))
        .collect()
}

fn complexes<T: FromStr>(fields: &[String]) -> Result<Vec<Complex<T>>> {
    fields.iter().map(|field| field.parse()).collect()
}

fn texts(fields: Vec<String>, kind: ElementKind) -> Result<Vec<String>> {
    fields
        .into_iter()
        .map(|field| fit(field, kind.width()))
        .collect()
}

fn values(kind: ElementKind, fields: Vec<String>) -> Result<Values> {
    Ok(match kind {
        ElementKind::None => Values::None,
        ElementKind::Int32 => Values::Int32(numbers(&fields)?),
        ElementKind::Int64 => Values::Int64(numbers(&fields)?),
        ElementKind::Float32 => Values::Float32(numbers(&fields)?),
        ElementKind::Float64 => Values::Float64(numbers(&fields)?),
        ElementKind::Complex64 => Values::Complex64(complexes(&fields)?),
        ElementKind::Complex128 => Values::Complex128(complexes(&fields)?),
        ElementKind::Char1 => Values::Char1(texts(fields, kind)?),
        ElementKind::Char16 => Values::Char16(texts(fields, kind)?),
        ElementKind::Char72 => Values::Char72(texts(fields, kind)?),
    })
}

/// Quote a name when it would not survive tokenizing as a bare field
fn name_field(name: &str) -> String {
    let bare = !name.is_empty()
        && !name.contains(|c: char| c == ',' || c.is_whitespace())
        && !name.starts_with(['*', '"', '\'', '(']);

    if bare {
        name.to_owned()
    } else if name.contains('"') {
        format!("'{}'", name)
    } else {
        format!("\"{}\"", name)
    }
}

fn tag_field(tag: TypeTag) -> String {
    let tag = tag.to_string();
    if tag.trim_end().contains([' ', ',']) {
        format!("'{}'", tag)
    } else {
        tag
    }
}

/// Find the first string in the tree that cannot be single quoted
pub(crate) fn check_strings(root: &Node) -> Result<()> {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        let quoted = node.data().as_slice::<String>().unwrap_or_default();
        if let Some(value) = quoted.iter().find(|value| value.contains('\'')) {
            return Err(Error::InvalidString(value.clone()));
        }
        pending.extend(node.children());
    }
    Ok(())
}

/// Version 0 codec over a text stream
#[derive(Debug)]
pub struct Ascii<S> {
    inner: S,
    line: String,
}

impl<S> Ascii<S> {
    /// Wrap a text stream
    pub fn new(inner: S) -> Self {
        Ascii {
            inner,
            line: String::new(),
        }
    }

    /// Unwrap the stream
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<R: BufRead> Ascii<R> {
    /// Load the next line without its line ending
    fn next_line(&mut self) -> Result<&str> {
        self.line.clear();
        if self.inner.read_line(&mut self.line)? == 0 {
            return Err(Error::UnexpectedEof);
        }

        Ok(self.line.trim_end_matches(['\n', '\r']))
    }
}

impl<R: BufRead> NodeRead for Ascii<R> {
    fn read_descriptor(&mut self, comments: &mut Vec<String>) -> Result<Descriptor> {
        loop {
            let line = self.next_line()?;
            if is_comment(line) {
                comments.push(line.to_owned());
                continue;
            }

            let fields = tokenize(line)?;
            if !fields.is_empty() {
                return parse_descriptor(fields);
            }
        }
    }

    fn read_data(&mut self, descriptor: &Descriptor) -> Result<DataBlock> {
        let count = descriptor.count();
        let kind = descriptor.kind();

        let mut fields = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
        while fields.len() < count {
            let line = self.next_line()?;
            let found = if kind.is_text() {
                tokenize_quoted(line)?
            } else {
                tokenize(line)?
            };

            let room = count - fields.len();
            if let Some(extra) = found.get(room) {
                return Err(Error::TrailingField((*extra).to_owned()));
            }

            fields.extend(found.into_iter().map(str::to_owned));
        }

        trace!(count, "read text payload");
        DataBlock::from_columns(
            values(kind, fields)?,
            descriptor.nsiz(),
            descriptor.ndim(),
        )
    }
}

impl<W: Write> NodeWrite for Ascii<W> {
    fn write_descriptor(&mut self, node: &Node) -> Result<()> {
        for comment in node.comments() {
            writeln!(self.inner, "{}", comment)?;
        }

        writeln!(
            self.inner,
            "{},{},{},{},{}",
            name_field(node.name()),
            tag_field(node.tag()),
            node.ndim(),
            node.nsiz(),
            node.nsub()
        )?;

        Ok(())
    }

    fn write_data(&mut self, data: &DataBlock) -> Result<()> {
        let text = data.kind().is_text();
        let mut fields = Vec::with_capacity(data.nsiz());

        for col in 0..data.ndim() {
            fields.clear();
            for row in 0..data.nsiz() {
                let value = data.text_at(row, col).unwrap_or_default();
                if !text {
                    fields.push(value);
                } else if value.contains('\'') {
                    return Err(Error::InvalidString(value));
                } else {
                    fields.push(format!("'{}'", value));
                }
            }

            writeln!(self.inner, "{}", fields.join(" "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::codec::ascii::{check_strings, tokenize, Ascii};
    use crate::codec::{read_tree, write_tree, SkipFilter};
    use crate::data::DataBlock;
    use crate::error::{Error, Result};
    use crate::node::Node;
    use crate::types::Complex;

    fn parse(text: &str) -> Result<Node> {
        read_tree(&mut Ascii::new(Cursor::new(text)), &SkipFilter::default())
    }

    fn render(node: &Node) -> Result<String> {
        let mut ascii = Ascii::new(Vec::new());
        write_tree(&mut ascii, node)?;
        Ok(String::from_utf8_lossy(&ascii.into_inner()).into_owned())
    }

    #[test]
    fn tokenizer_handles_quotes_and_separators() -> Result<()> {
        assert_eq!(tokenize("\"wing\",R   ,3,10,0")?, vec!["wing", "R", "3", "10", "0"]);
        assert_eq!(tokenize("  'a b' , \"c,d\"  e\t")?, vec!["a b", "c,d", "e"]);
        assert_eq!(tokenize("")?, Vec::<&str>::new());
        assert_eq!(tokenize("\"open")?, vec!["\"open"]);
        assert_eq!(tokenize("(1,2) (3+4j),5")?, vec!["1,2", "3+4j", "5"]);

        Ok(())
    }

    #[test]
    fn descriptor_fields() -> Result<()> {
        let node = parse("\"wing\",R   ,3,10,0\n1 2 3 4 5 6 7 8 9 10\n1 2 3 4 5 6 7 8 9 10\n1 2 3 4 5 6 7 8 9 10\n")?;
        assert_eq!(node.name(), "wing");
        assert_eq!(node.tag().to_string(), "R   ");
        assert_eq!((node.ndim(), node.nsiz(), node.nsub()), (3, 10, 0));

        Ok(())
    }

    #[test]
    fn descriptor_errors() {
        assert!(matches!(parse("wing,R,1,1,0,extra\n"), Err(Error::TrailingField(f)) if f == "extra"));
        assert!(matches!(parse("wing,R,1\n"), Err(Error::MissingField("nsiz"))));
        assert!(matches!(parse("wing,R,x,1,0\n"), Err(Error::InvalidNumber(_))));
        assert!(matches!(parse("wing,Q,1,1,0\n"), Err(Error::UnknownType('Q'))));
        assert!(matches!(parse("* only a comment\n"), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn comments_attach_to_the_following_node() -> Result<()> {
        let node = parse("* first\n\n   * second\nroot,N,0,0,1\n* child note\nleaf,N,0,0,0\n")?;
        assert_eq!(node.comments(), &["* first".to_string(), "   * second".to_string()]);
        assert_eq!(node.children()[0].comments(), &["* child note".to_string()]);

        Ok(())
    }

    #[test]
    fn payload_is_column_major() -> Result<()> {
        let node = parse("grid,I,2,3,0\n1 2 3\n4,5,6\n")?;
        assert_eq!(node.data().get::<i32>(0, 1), Some(&4));
        assert_eq!(node.data().get::<i32>(2, 0), Some(&3));

        Ok(())
    }

    #[test]
    fn payload_may_span_lines() -> Result<()> {
        let node = parse("v,D,1,4,0\n1.0 2.5D+01\n\n-3e-1 4\n")?;
        assert_eq!(node.data().as_slice::<f64>(), Some(&[1.0, 25.0, -0.3, 4.0][..]));

        Ok(())
    }

    #[test]
    fn payload_errors() {
        assert!(matches!(parse("v,I,1,2,0\n1 2 3\n"), Err(Error::TrailingField(f)) if f == "3"));
        assert!(matches!(parse("v,I,1,3,0\n1 2\n"), Err(Error::UnexpectedEof)));
        assert!(matches!(parse("v,I,1,1,0\n1.5\n"), Err(Error::InvalidNumber(f)) if f == "1.5"));
        assert!(matches!(parse("s,S,1,1,0\n'open\n"), Err(Error::InvalidString(_))));
        assert!(matches!(parse("s,S,1,1,0\nbare\n"), Err(Error::InvalidString(_))));
    }

    #[test]
    fn strings_keep_inner_blanks() -> Result<()> {
        let node = parse("title,L,1,2,0\n'wing section' 'b,c'\n")?;
        assert_eq!(node.data().text_at(0, 0).as_deref(), Some("wing section"));
        assert_eq!(node.data().text_at(1, 0).as_deref(), Some("b,c"));

        Ok(())
    }

    #[test]
    fn complex_values() -> Result<()> {
        let node = parse("z,Z,1,2,0\n(1+2j) (0.5,-1)\n")?;
        assert_eq!(
            node.data().as_slice::<Complex<f64>>(),
            Some(&[Complex::new(1.0, 2.0), Complex::new(0.5, -1.0)][..])
        );

        Ok(())
    }

    #[test]
    fn none_kind_has_no_payload() -> Result<()> {
        let node = parse("root,N,4,4,1\nleaf,N,0,0,0\n")?;
        assert_eq!((node.ndim(), node.nsiz()), (0, 0));
        assert_eq!(node.nsub(), 1);

        Ok(())
    }

    #[test]
    fn write_layout() -> Result<()> {
        let mut root = Node::new("my root")?;
        root.push_comment("generated");
        root.append(Node::with_data(
            "grid",
            DataBlock::from_rows(vec![vec![1i32, 4], vec![2, 5], vec![3, 6]])?,
            Some("IX"),
        )?);
        root.append(Node::with_data(
            "names",
            DataBlock::column(vec!["a b".to_string(), "c".to_string()]),
            Some("S"),
        )?);

        let expected = [
            "* generated",
            "\"my root\",N   ,0,0,2",
            "grid,IX  ,2,3,0",
            "1 2 3",
            "4 5 6",
            "names,S   ,1,2,0",
            "'a b' 'c'",
            "",
        ]
        .join("\n");

        assert_eq!(render(&root)?, expected);
        assert_eq!(parse(&expected)?, root);

        Ok(())
    }

    #[test]
    fn tags_with_inner_blanks_are_quoted() -> Result<()> {
        let node = Node::with_data("v", DataBlock::scalar(1.0f64), Some("D X"))?;
        let text = render(&node)?;
        assert_eq!(text.lines().next(), Some("v,'D X ',1,1,0"));
        assert_eq!(parse(&text)?.tag().to_string(), "D X ");

        Ok(())
    }

    #[test]
    fn apostrophes_cannot_be_written() -> Result<()> {
        let node = Node::with_data("s", DataBlock::column(vec!["it's".to_string()]), Some("S"))?;

        assert!(matches!(render(&node), Err(Error::InvalidString(v)) if v == "it's"));
        assert!(matches!(check_strings(&node), Err(Error::InvalidString(_))));

        Ok(())
    }

    #[test]
    fn trailing_blanks_are_padding() -> Result<()> {
        let node = parse("s,S,1,2,0
'ab  ' '  c'
")?;
        assert_eq!(node.data().text_at(0, 0).as_deref(), Some("ab"));
        assert_eq!(node.data().text_at(1, 0).as_deref(), Some("  c"));
        assert_eq!(parse(&render(&node)?)?, node);

        Ok(())
    }

    #[test]
    fn names_starting_with_a_paren_are_quoted() -> Result<()> {
        let node = Node::new("(a)")?;
        let text = render(&node)?;
        assert_eq!(text, "\"(a)\",N   ,0,0,0\n");
        assert_eq!(parse(&text)?.name(), "(a)");

        Ok(())
    }
}

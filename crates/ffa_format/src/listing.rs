//! Human readable one-line summaries of datasets.
//!
//! The column layout is the classic FFA listing: type tag, shape, number of
//! children, the indented name and a preview of the first values.
//!
//! ```text
//! N            0 x 0        2/ root
//! D            3 x 2              coordinates       =            0               1             0.5
//! L            1 x 1              title             = "wing section"
//! ```

use std::fmt;
use std::io::{self, Write};

use crate::data::Values;
use crate::error::Result;
use crate::node::Node;

const PREVIEW_WIDTH: usize = 12;
const PREVIEW_COUNT: usize = 3;

/// Format a real number like C's `%g`: six significant digits, trailing
/// zeros removed, scientific notation outside `1e-4 ..< 1e6`
pub(crate) fn general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string().to_lowercase();
    }

    let scientific = format!("{:.5e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent = exponent.parse::<i32>().unwrap_or_default();

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        );
    }

    let decimals = (5 - exponent) as usize;
    trim_fraction(&format!("{:.*}", decimals, value)).to_owned()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Right align in the preview column, leaving a blank where a sign would be
fn signed(text: String) -> String {
    let text = if text.starts_with('-') {
        text
    } else {
        format!(" {}", text)
    };
    format!("{:>width$}", text, width = PREVIEW_WIDTH)
}

fn preview(node: &Node) -> Option<String> {
    let data = node.data();
    if data.is_empty() {
        return None;
    }

    if data.kind().is_text() {
        let first = data.text_at(0, 0).unwrap_or_default();
        return Some(format!(" = \"{}\"", first.trim()));
    }

    let count = if data.len() >= PREVIEW_COUNT {
        PREVIEW_COUNT
    } else {
        1
    };

    let values = data.values();
    let cells = data
        .column_major()
        .take(count)
        .filter_map(|index| match values {
            Values::Int32(v) => v.get(index).map(|x| signed(x.to_string())),
            Values::Int64(v) => v.get(index).map(|x| signed(x.to_string())),
            Values::Float32(v) => v.get(index).map(|x| signed(general(f64::from(*x)))),
            Values::Float64(v) => v.get(index).map(|x| signed(general(*x))),
            Values::Complex64(v) => v.get(index).map(|x| {
                signed(format!(
                    "({},{})",
                    general(f64::from(x.re)),
                    general(f64::from(x.im))
                ))
            }),
            Values::Complex128(v) => v
                .get(index)
                .map(|x| signed(format!("({},{})", general(x.re), general(x.im)))),
            _ => None,
        })
        .collect::<Vec<_>>();

    if cells.is_empty() {
        return None;
    }

    Some(format!(" = {}", cells.join("    ")))
}

impl Node {
    /// One line describing this dataset at the given nesting level
    pub fn summary(&self, indent: usize, level: usize) -> String {
        let mut line = format!(
            "{:<4} {:>9} x {:<6} ",
            self.tag(),
            self.nsiz(),
            self.ndim()
        );

        if self.nsub() == 0 {
            line.push_str("     ");
        } else {
            line.push_str(&format!("{:>3}/ ", self.nsub()));
        }

        line.push_str(&" ".repeat(indent * level));
        line.push_str(&format!("{:<16} ", self.padded_name()));

        if let Some(preview) = preview(self) {
            line.push_str(&preview);
        }

        line
    }

    /// Print the summary of this dataset and its descendants to stdout
    ///
    /// Children are listed while the nesting level is below `depth`, or
    /// always when no depth is given.
    pub fn print_tree(&self, depth: Option<usize>, indent: usize) -> Result<()> {
        let stdout = io::stdout();
        self.write_tree(&mut stdout.lock(), depth, indent)
    }

    /// Write the summary of this dataset and its descendants, see
    /// [`Node::print_tree`]
    pub fn write_tree(&self, out: &mut impl Write, depth: Option<usize>, indent: usize) -> Result<()> {
        self.write_level(out, depth, indent, 0)
    }

    fn write_level(
        &self,
        out: &mut impl Write,
        depth: Option<usize>,
        indent: usize,
        level: usize,
    ) -> Result<()> {
        writeln!(out, "{}", self.summary(indent, level))?;

        if depth.map_or(true, |depth| level < depth) {
            for child in self.children() {
                child.write_level(out, depth, indent, level + 1)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary(0, 0))
    }
}

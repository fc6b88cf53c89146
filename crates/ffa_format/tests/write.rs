use std::fs;
use std::io::Cursor;
use std::path::Path;

use ffa_format::error::Error;
use ffa_format::{
    probe, read, read_from, write, write_to, Complex, DataBlock, Node, ReadOptions, Removal,
    Version, WriteOptions,
};
use miette::{IntoDiagnostic, Result};
use pretty_assertions::assert_eq;
use tracing::{info, instrument};
use tracing_test::traced_test;

fn build_tree() -> Result<Node> {
    let mut root = Node::new("flow")?;
    root.push_comment("solution written by the test suite");

    let mut region = Node::new("region")?;
    region.append(Node::with_data(
        "density",
        DataBlock::from_rows(vec![vec![1.0f64, 1.1], vec![1.2, 1.3], vec![1.4, 1.5]])?,
        Some("DS"),
    )?);
    region.append(Node::with_data(
        "boundary",
        DataBlock::column(vec!["inlet".to_owned(), "outlet".to_owned()]),
        Some("S"),
    )?);
    region.append(Node::with_data(
        "mode",
        DataBlock::scalar(Complex::new(0.25f32, -1.0)),
        None,
    )?);

    root.append(Node::with_data("step", DataBlock::scalar(1200i32), None)?);
    root.append(region);
    root.append(Node::with_data("title", DataBlock::scalar("a long title".to_owned()), Some("L"))?);
    Ok(root)
}

#[instrument(skip(root, dir))]
fn validate_file_round_trip(root: &Node, dir: &Path, version: Version) -> Result<()> {
    let path = dir.join(format!("flow-{}.ffa", version as u8));
    write(root, &path, version)?;

    let mut bytes = Cursor::new(fs::read(&path).into_diagnostic()?);
    assert_eq!(probe(&mut bytes)?, version);

    let actual = read(&path, &ReadOptions::default())?;
    info!("read back {} datasets", actual.find_all("density").len());
    assert_eq!(root, &actual);

    Ok(())
}

#[traced_test]
#[test]
fn write_every_version() -> Result<()> {
    let root = build_tree()?;
    let dir = tempfile::tempdir().into_diagnostic()?;

    for version in [Version::Ascii, Version::Record, Version::Dense] {
        validate_file_round_trip(&root, dir.path(), version)?;
    }

    assert!(logs_contain("read back 1 datasets"));
    Ok(())
}

#[test]
fn write_replaces_existing_file() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let path = dir.path().join("replaced.ffa");
    fs::write(&path, vec![b'#'; 4096]).into_diagnostic()?;

    let root = Node::with_data("small", DataBlock::scalar(1i64), None)?;
    root.write(&path, WriteOptions::builder().version(Version::Record).build())?;

    assert_eq!(fs::metadata(&path).into_diagnostic()?.len(), 40 + 4 + 8 + 4);
    assert_eq!(Node::read(&path, &ReadOptions::default())?, root);

    Ok(())
}

#[test]
fn skipped_payload_creates_no_file() -> Result<()> {
    let root = build_tree()?;
    let mut buffer = Vec::new();
    write_to(&root, &mut buffer, Version::Dense)?;

    let options = ReadOptions::builder().skip("S").build();
    let partial = read_from(&mut Cursor::new(buffer), &options)?;
    let density = partial
        .get("region")
        .and_then(|region| region.get("density"))
        .ok_or(Error::MissingField("density"))?;
    assert!(density.data().is_skipped());
    assert_eq!((density.nsiz(), density.ndim()), (3, 2));

    let dir = tempfile::tempdir().into_diagnostic()?;
    let path = dir.path().join("partial.ffa");
    let result = write(&partial, &path, Version::Dense);

    assert!(matches!(result, Err(Error::SkippedPayload(name)) if name == "density"));
    assert!(!path.exists());

    Ok(())
}

#[test]
fn edit_then_write() -> Result<()> {
    let mut root = build_tree()?;

    let step = root.get_mut("step").ok_or(Error::MissingField("step"))?;
    step.set_type("J")?;
    assert_eq!(step.data().get::<i64>(0, 0), Some(&1200));

    root.delete(Removal::from(vec![2usize, 0]))?;
    assert_eq!(root.nsub(), 1);

    root.insert(Node::with_data("time", DataBlock::scalar(0.5f64), None)?, 0);
    root.set_name("renamed")?;

    let mut buffer = Vec::new();
    write_to(&root, &mut buffer, Version::Ascii)?;
    let text = String::from_utf8(buffer).into_diagnostic()?;

    assert!(text.starts_with("* solution written by the test suite\nrenamed,N   ,0,0,2\ntime,D   ,1,1,0\n0.5\n"));
    assert!(text.contains("'inlet' 'outlet'"));

    let actual = read_from(&mut Cursor::new(text), &ReadOptions::default())?;
    assert_eq!(actual, root);

    Ok(())
}

#[test]
fn strings_survive_every_version() -> Result<()> {
    let mut root = Node::new("strings")?;
    root.append(Node::with_data("long", DataBlock::column(vec!["x".repeat(80)]), None)?);
    root.append(Node::with_data("padded", DataBlock::column(vec!["ab  ".to_owned()]), Some("S"))?);
    root.append(Node::with_data("code", DataBlock::column(vec!["q".to_owned(), "".to_owned()]), Some("A"))?);

    let long = root.get("long").ok_or(Error::MissingField("long"))?;
    assert_eq!(long.data().text_at(0, 0), Some("x".repeat(72)));

    for version in [Version::Ascii, Version::Record, Version::Dense] {
        let mut buffer = Vec::new();
        write_to(&root, &mut buffer, version)?;

        let actual = read_from(&mut Cursor::new(buffer), &ReadOptions::default())?;
        assert_eq!(actual, root, "{version}");
        let padded = actual.get("padded").ok_or(Error::MissingField("padded"))?;
        assert_eq!(padded.data().text_at(0, 0).as_deref(), Some("ab"));
    }

    Ok(())
}

#[test]
fn non_ascii_strings_are_refused() -> Result<()> {
    let result = Node::with_data("name", DataBlock::column(vec!["ü".repeat(10)]), Some("S"));
    assert!(matches!(result, Err(Error::InvalidString(_))));

    let mut node = Node::with_data("name", DataBlock::column(vec!["plain".to_owned()]), Some("S"))?;
    node.set_data(DataBlock::column(vec!["naïve".to_owned()]))
        .expect_err("non-ASCII text is refused");
    assert_eq!(node.data().text_at(0, 0).as_deref(), Some("plain"));

    Ok(())
}

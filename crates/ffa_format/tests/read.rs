use std::io::Cursor;
use std::path::{Path, PathBuf};

use ffa_format::error::Error;
use ffa_format::{read, read_from, write_to, ElementKind, Node, ReadOptions, Version};
use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;
use walkdir::WalkDir;

fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("resources")
        .join(name)
}

fn validate_ffa(path: &Path) -> Result<(), Error> {
    info!("testing {}", path.display());

    let expected = read(path, &ReadOptions::default())?;

    for version in [Version::Ascii, Version::Record, Version::Dense] {
        info!("converting to {}", version);

        let mut buffer = Vec::new();
        write_to(&expected, &mut buffer, version)?;

        let actual = read_from(&mut Cursor::new(buffer), &ReadOptions::default())?;
        assert_eq!(expected, actual, "{} as {}", path.display(), version);
    }

    Ok(())
}

#[traced_test]
#[test]
fn validate_ffa_parsing() -> Result<(), Error> {
    let to_test = WalkDir::new(format!("{}/resources/", env!("CARGO_MANIFEST_DIR")))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "ffa"));

    let mut count = 0;
    for path in to_test {
        validate_ffa(&path)?;
        count += 1;
    }

    assert!(count >= 3);
    assert!(logs_contain("converting to v1 (record)"));
    Ok(())
}

#[test]
fn mesh_layout() -> Result<(), Error> {
    let mesh = Node::read(resource("mesh.ffa"), &ReadOptions::default())?;

    assert_eq!(mesh.name(), "mesh");
    assert_eq!(
        mesh.comments(),
        ["* FFA test archive", "* written by hand, children are indented for readability only"]
    );
    assert_eq!(
        mesh.children().iter().map(Node::name).collect::<Vec<_>>(),
        ["x", "coordinates", "elements", "section"]
    );

    let coordinates = mesh.get("coordinates").ok_or(Error::MissingField("coordinates"))?;
    assert_eq!(coordinates.comments(), ["* node coordinates, one column per axis"]);
    assert_eq!((coordinates.nsiz(), coordinates.ndim()), (3, 2));
    assert_eq!(coordinates.data().get::<f64>(2, 0), Some(&0.5));
    assert_eq!(coordinates.data().get::<f64>(2, 1), Some(&1.5));

    let elements = mesh.get("elements").ok_or(Error::MissingField("elements"))?;
    assert_eq!(elements.data().kind(), ElementKind::Int32);
    assert_eq!(elements.data().get::<i32>(1, 2), Some(&1));

    let title = mesh
        .get("section")
        .and_then(|section| section.get("title"))
        .ok_or(Error::MissingField("title"))?;
    assert_eq!(title.data().text_at(0, 0).as_deref(), Some("wing section"));

    Ok(())
}

#[test]
fn find_all_walks_every_depth() -> Result<(), Error> {
    let mesh = read(resource("mesh.ffa"), &ReadOptions::default())?;

    let found = mesh.find_all("x");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].data().kind(), ElementKind::Float32);
    assert_eq!(found[1].data().as_slice::<i64>(), Some(&[7, -7][..]));

    assert_eq!(mesh.get_all("x").len(), 1);
    assert!(mesh.find_all("missing").is_empty());

    Ok(())
}

#[test]
fn quoted_name_and_fortran_exponents() -> Result<(), Error> {
    let wing = read(resource("wing.ffa"), &ReadOptions::default())?;

    assert_eq!(wing.name(), "wing");
    assert_eq!(wing.tag().to_string(), "R   ");
    assert_eq!((wing.nsiz(), wing.ndim(), wing.nsub()), (10, 3, 0));
    assert_eq!(wing.data().get::<f32>(9, 1), Some(&1.9));
    assert_eq!(wing.data().get::<f32>(0, 2), Some(&-1e-3));

    Ok(())
}

#[test]
fn strings_and_complex() -> Result<(), Error> {
    let labels = read(resource("labels.ffa"), &ReadOptions::default())?;

    let codes = labels.get("codes").ok_or(Error::MissingField("codes"))?;
    assert_eq!(codes.data().text_at(2, 0).as_deref(), Some("z"));

    let tags = labels.get("tags").ok_or(Error::MissingField("tags"))?;
    assert_eq!(tags.data().text_at(1, 0).as_deref(), Some("right"));
    assert_eq!(tags.data().text_at(0, 1).as_deref(), Some("upper"));

    let impedance = labels.get("impedance").ok_or(Error::MissingField("impedance"))?;
    assert_eq!(impedance.data().kind(), ElementKind::Complex128);
    assert_eq!(
        impedance.data().get(1, 0),
        Some(&ffa_format::Complex::new(0.5f64, -0.25))
    );

    Ok(())
}

#[test]
fn skip_filter_on_converted_archive() -> Result<(), Error> {
    let mesh = read(resource("mesh.ffa"), &ReadOptions::default())?;
    let mut buffer = Vec::new();
    write_to(&mesh, &mut buffer, Version::Record)?;

    let options = ReadOptions::builder().skip("A").build();
    let skipped = read_from(&mut Cursor::new(buffer), &options)?;

    let x = skipped.get("x").ok_or(Error::MissingField("x"))?;
    assert!(x.data().is_skipped());
    assert_eq!((x.nsiz(), x.ndim()), (1, 1));
    assert_eq!(skipped.get("elements"), mesh.get("elements"));

    Ok(())
}

use std::path::PathBuf;

use nodebox::{Document, Grob, NodeLibrary, Rect, Value};

fn fixture(name: &str) -> Document {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name);
    let s = std::fs::read_to_string(&path).unwrap();
    Document::from_json_str(&s).unwrap()
}

fn group(values: &[Value]) -> &nodebox::Group {
    match values {
        [Value::Grob(Grob::Group(g))] => g,
        other => panic!("expected one group, got {other:?}"),
    }
}

#[test]
fn copy_fixture_renders_a_column_of_rects() {
    let mut lib = NodeLibrary::from_document(&fixture("copy_rects.json")).unwrap();
    let out = lib.render().unwrap();
    let g = group(&out);
    assert_eq!(g.len(), 5);
    assert_eq!(g.bounds(), Rect::new(0.0, 0.0, 100.0, 500.0));
}

#[test]
fn nested_fixture_merges_subnetwork_and_animated_ellipse() {
    let mut lib = NodeLibrary::from_document(&fixture("nested.json")).unwrap();
    assert_eq!(lib.frame(), 4.0);
    let out = lib.render().unwrap();
    let g = group(&out);
    assert_eq!(g.len(), 2);
    assert!((g.bounds().max_x() - 110.0).abs() < 1e-6);

    lib.set_frame(2.0);
    assert!(lib.node("/shapes").is_ok_and(|n| !n.is_dirty()));
    assert!(lib.node("/ellipse1").is_ok_and(|n| n.is_dirty()));
    let out = lib.render().unwrap();
    assert!((group(&out).bounds().max_x() - 60.0).abs() < 1e-6);
}

#[test]
fn saved_documents_load_back() {
    let lib = NodeLibrary::from_document(&fixture("nested.json")).unwrap();
    let json = lib.to_document().unwrap().to_json_string_pretty().unwrap();
    let mut again = NodeLibrary::from_document(&Document::from_json_str(&json).unwrap()).unwrap();
    let sub = again.network("/shapes").unwrap();
    assert_eq!(sub.rendered(), Some("star1"));
    assert_eq!(
        again.node("/ellipse1").unwrap().parameter("x").unwrap().expression().map(|e| e.source()),
        Some("FRAME * 25")
    );
    assert_eq!(group(&again.render().unwrap()).len(), 2);
}

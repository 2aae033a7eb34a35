use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nodebox::{
    FunctionRepository, Grob, NodeBoxError, NodeEvent, NodeLibrary, NodeRepository, NodeState,
    NodeType, ParameterType, Rect, Value, ValueType,
};

fn bounds(values: &[Value]) -> Rect {
    values
        .iter()
        .filter_map(Value::as_grob)
        .map(Grob::bounds)
        .reduce(Rect::union_strict)
        .unwrap_or(Rect::ZERO)
}

fn assert_rect_near(actual: Rect, expected: Rect) {
    let close = |a: f64, b: f64| (a - b).abs() < 1e-6;
    assert!(
        close(actual.x, expected.x)
            && close(actual.y, expected.y)
            && close(actual.width, expected.width)
            && close(actual.height, expected.height),
        "{actual:?} != {expected:?}"
    );
}

/// Library whose `count` nodes bump a shared counter every time they are processed.
fn counting_library() -> (NodeLibrary, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let mut repo = NodeRepository::with_builtins();
    repo.register(
        NodeType::pure("count", ValueType::Float, move |input, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Float(input.float("value")? + 1.0))
        })
        .param(ParameterType::new("value", ValueType::Float, 0.0)),
    );
    let lib = NodeLibrary::new("counting", repo, FunctionRepository::with_builtins());
    (lib, counter)
}

#[test]
fn rendering_twice_processes_once() {
    let (mut lib, counter) = counting_library();
    lib.add_node("/", "a", "count").unwrap();
    lib.add_node("/", "b", "count").unwrap();
    lib.connect("/", "a", "b", "value").unwrap();

    assert_eq!(lib.render_node("/b").unwrap(), [Value::Float(2.0)]);
    assert_eq!(lib.render_node("/b").unwrap(), [Value::Float(2.0)]);
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    lib.set_value("/a", "value", Value::Float(10.0)).unwrap();
    assert_eq!(lib.render_node("/b").unwrap(), [Value::Float(12.0)]);
    assert_eq!(counter.load(Ordering::SeqCst), 4);
}

#[test]
fn dirty_marks_reach_the_whole_downstream_closure() {
    let (mut lib, _) = counting_library();
    for name in ["a", "b", "c", "side"] {
        lib.add_node("/", name, "count").unwrap();
    }
    lib.connect("/", "a", "b", "value").unwrap();
    lib.connect("/", "b", "c", "value").unwrap();
    lib.render_node("/c").unwrap();
    lib.render_node("/side").unwrap();
    lib.drain_events();

    lib.set_value("/a", "value", Value::Float(1.0)).unwrap();
    for name in ["/a", "/b", "/c"] {
        assert_eq!(lib.node(name).unwrap().state(), NodeState::Dirty, "{name}");
    }
    assert_eq!(lib.node("/side").unwrap().state(), NodeState::Clean);
    let dirty: Vec<_> = lib
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            NodeEvent::NodeDirty { path } => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(dirty, ["/a", "/b", "/c"]);
}

#[test]
fn silent_set_does_not_dirty() {
    let (mut lib, counter) = counting_library();
    lib.add_node("/", "a", "count").unwrap();
    lib.render_node("/a").unwrap();
    lib.drain_events();

    lib.silent_set("/a", "value", Value::Float(5.0)).unwrap();
    assert!(!lib.node("/a").unwrap().is_dirty());
    assert!(lib.drain_events().is_empty());
    assert_eq!(lib.render_node("/a").unwrap(), [Value::Float(1.0)]);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn rejected_cycles_leave_the_graph_unchanged() {
    let (mut lib, _) = counting_library();
    for name in ["a", "b", "c"] {
        lib.add_node("/", name, "count").unwrap();
    }
    lib.connect("/", "a", "b", "value").unwrap();
    lib.connect("/", "b", "c", "value").unwrap();

    let err = lib.connect("/", "c", "a", "value").unwrap_err();
    assert!(matches!(err, NodeBoxError::Connection(_)));
    let a = lib.node("/a").unwrap().parameter("value").unwrap();
    assert!(!a.is_connected());
    assert_eq!(a.value(), Some(&Value::Float(0.0)));

    let err = lib.set_expression("/a", "value", "c + 1").unwrap_err();
    assert!(matches!(err, NodeBoxError::Expression(_)));
    assert!(lib.node("/a").unwrap().parameter("value").unwrap().expression().is_none());
}

#[test]
fn connections_respect_types_and_cardinality() {
    let mut lib = NodeLibrary::with_builtins("types");
    lib.add_node("/", "n", "number").unwrap();
    lib.add_node("/", "r1", "rect").unwrap();
    lib.add_node("/", "r2", "ellipse").unwrap();
    lib.add_node("/", "m", "merge").unwrap();
    lib.add_node("/", "t", "transform").unwrap();

    assert!(matches!(
        lib.connect("/", "n", "t", "shape"),
        Err(NodeBoxError::Connection(_))
    ));

    lib.connect("/", "r1", "m", "shapes").unwrap();
    lib.connect("/", "r2", "m", "shapes").unwrap();
    lib.connect("/", "r1", "m", "shapes").unwrap();
    let shapes = lib.node("/m").unwrap().parameter("shapes").unwrap();
    assert_eq!(shapes.connections(), ["r1", "r2"]);

    lib.connect("/", "r1", "t", "shape").unwrap();
    lib.connect("/", "r2", "t", "shape").unwrap();
    assert_eq!(
        lib.node("/t").unwrap().parameter("shape").unwrap().connections(),
        ["r2"]
    );

    let out = lib.render_node("/m").unwrap();
    let Some(Grob::Group(g)) = out[0].as_grob() else {
        panic!("merge should produce a group");
    };
    assert_eq!(g.len(), 2);
}

#[test]
fn failures_are_retained_and_propagate() {
    let mut lib = NodeLibrary::with_builtins("errors");
    lib.add_node("/", "r", "resample").unwrap();
    lib.add_node("/", "src", "rect").unwrap();
    lib.add_node("/", "t", "transform").unwrap();
    lib.connect("/", "src", "r", "shape").unwrap();
    lib.connect("/", "r", "t", "shape").unwrap();
    lib.set_value("/r", "length", Value::Float(0.0)).unwrap();

    let err = lib.render_node("/t").unwrap_err();
    assert!(err.to_string().contains("depends on node 'r'"));
    assert!(lib.node("/r").unwrap().has_error());
    assert!(lib.node("/src").unwrap().state() == NodeState::Clean);
    let errors: Vec<_> = lib
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, NodeEvent::NodeError { .. }))
        .map(|e| e.path().to_owned())
        .collect();
    assert_eq!(errors, ["/r", "/t"]);

    // Rendering again reports the same error without new events.
    assert!(lib.render_node("/r").is_err());
    assert!(lib.drain_events().is_empty());

    lib.set_value("/r", "length", Value::Float(50.0)).unwrap();
    let out = lib.render_node("/t").unwrap();
    assert_rect_near(bounds(&out), Rect::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn cloned_networks_are_isolated() {
    let mut lib = NodeLibrary::with_builtins("clone");
    lib.add_node("/", "r", "rect").unwrap();
    let snapshot = lib.network("/").unwrap().clone();
    lib.set_value("/r", "width", Value::Float(5.0)).unwrap();
    assert_eq!(
        snapshot.node("r").unwrap().parameter("width").unwrap().value(),
        Some(&Value::Float(100.0))
    );
}

#[test]
fn copy_repeats_along_a_step() {
    let mut lib = NodeLibrary::with_builtins("copy");
    lib.add_node("/", "rect1", "rect").unwrap();
    lib.add_node("/", "copy1", "copy").unwrap();
    lib.connect("/", "rect1", "copy1", "shape").unwrap();
    lib.set_value("/copy1", "copies", Value::Int(5)).unwrap();
    lib.set_value("/copy1", "ty", Value::Float(100.0)).unwrap();
    lib.set_rendered("/", Some("copy1")).unwrap();
    assert_eq!(bounds(&lib.render().unwrap()), Rect::new(0.0, 0.0, 100.0, 500.0));

    assert!(matches!(
        lib.set_value("/copy1", "copies", Value::Float(2.5)),
        Err(NodeBoxError::Type(_))
    ));
    assert!(matches!(
        lib.set_value("/copy1", "copies", Value::Int(-1)),
        Err(NodeBoxError::Type(_))
    ));
}

#[test]
fn copy_follows_template_points() {
    let mut lib = NodeLibrary::with_builtins("template");
    lib.add_node("/", "dot", "ellipse").unwrap();
    lib.set_value("/dot", "width", Value::Float(2.0)).unwrap();
    lib.set_value("/dot", "height", Value::Float(2.0)).unwrap();
    lib.add_node("/", "grid", "rect").unwrap();
    lib.add_node("/", "copy1", "copy").unwrap();
    lib.connect("/", "dot", "copy1", "shape").unwrap();
    lib.connect("/", "grid", "copy1", "template").unwrap();

    let out = lib.render_node("/copy1").unwrap();
    let Some(Grob::Group(g)) = out[0].as_grob() else {
        panic!("copy should produce a group");
    };
    assert_eq!(g.len(), 4);
    assert_rect_near(g.bounds(), Rect::new(0.0, 0.0, 102.0, 102.0));
}

#[test]
fn copy_expression_varies_each_copy() {
    let mut lib = NodeLibrary::with_builtins("variants");
    lib.add_node("/", "rect1", "rect").unwrap();
    lib.add_node("/", "copy1", "copy").unwrap();
    lib.connect("/", "rect1", "copy1", "shape").unwrap();
    lib.set_value("/copy1", "copies", Value::Int(3)).unwrap();
    lib.set_value(
        "/copy1",
        "expression",
        Value::from("rect1.width = (COPY + 1) * 10"),
    )
    .unwrap();

    let out = lib.render_node("/copy1").unwrap();
    assert_eq!(bounds(&out), Rect::new(0.0, 0.0, 30.0, 100.0));
    assert_eq!(
        lib.node("/rect1").unwrap().parameter("width").unwrap().value(),
        Some(&Value::Float(100.0))
    );
}

#[test]
fn frame_only_reaches_time_dependent_nodes() {
    let (mut lib, counter) = counting_library();
    lib.add_node("/", "still", "count").unwrap();
    lib.add_node("/", "moving", "count").unwrap();
    lib.set_expression("/moving", "value", "FRAME * 2").unwrap();
    lib.render_node("/still").unwrap();
    assert_eq!(lib.render_node("/moving").unwrap(), [Value::Float(3.0)]);

    lib.set_frame(10.0);
    assert!(!lib.node("/still").unwrap().is_dirty());
    assert_eq!(lib.render_node("/moving").unwrap(), [Value::Float(21.0)]);
    lib.render_node("/still").unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn failed_nodes_keep_their_last_output() {
    let mut lib = NodeLibrary::with_builtins("retained");
    lib.add_node("/", "src", "rect").unwrap();
    lib.add_node("/", "r", "resample").unwrap();
    lib.connect("/", "src", "r", "shape").unwrap();
    let good = lib.render_node("/r").unwrap();
    assert_eq!(good.len(), 1);

    lib.set_value("/r", "length", Value::Float(0.0)).unwrap();
    assert!(lib.render_node("/r").is_err());
    let node = lib.node("/r").unwrap();
    assert!(node.has_error());
    assert_eq!(node.output(), Some(&good[0]));
}

#[test]
fn connected_values_respect_hard_bounds() {
    let mut lib = NodeLibrary::with_builtins("bounds");
    lib.add_node("/", "n", "number").unwrap();
    lib.add_node("/", "s", "star").unwrap();
    lib.set_value("/n", "value", Value::Float(0.0)).unwrap();
    lib.connect("/", "n", "s", "points").unwrap();

    assert!(matches!(
        lib.set_value("/s", "points", Value::Int(0)),
        Err(NodeBoxError::Type(_))
    ));
    lib.connect("/", "n", "s", "points").unwrap();
    let err = lib.render_node("/s").unwrap_err();
    assert!(err.to_string().contains("minimum"), "{err}");
    assert!(lib.node("/s").unwrap().has_error());

    lib.set_value("/n", "value", Value::Float(5.0)).unwrap();
    let out = lib.render_node("/s").unwrap();
    let Some(Grob::Path(p)) = out[0].as_grob() else {
        panic!("star should produce a path");
    };
    assert_eq!(p.contours[0].point_count(), 10);
}

#[test]
fn wide_randint_ranges_render() {
    let (mut lib, _) = counting_library();
    lib.add_node("/", "n", "count").unwrap();
    lib.set_expression(
        "/n",
        "value",
        "randint(1, -6000000000000000000, 6000000000000000000)",
    )
    .unwrap();
    assert!(lib.render_node("/n").is_ok());
}

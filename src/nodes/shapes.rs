use std::f64::consts::PI;

use crate::eval::NodeInput;
use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::graphics::{Color, Path};
use crate::node::node_type::NodeType;
use crate::node::parameter::{BoundingMethod, ParameterType};
use crate::node::value::{Value, ValueType};

fn float(name: &str, default: f64) -> ParameterType {
    ParameterType::new(name, ValueType::Float, default)
}

fn size(name: &str, default: f64) -> ParameterType {
    float(name, default).bounded(Some(0.0), None, BoundingMethod::Soft)
}

/// Fill, stroke and stroke width parameters shared by all generators.
fn with_style(ty: NodeType, fill: Option<Color>, stroke: Option<Color>) -> NodeType {
    let color = |name: &str, default: Option<Color>| {
        ParameterType::new(name, ValueType::Color, default.map_or(Value::Null, Value::Color))
            .nullable()
    };
    ty.param(color("fill", fill))
        .param(color("stroke", stroke))
        .param(size("stroke_width", 1.0))
}

fn styled(path: Path, input: &NodeInput) -> NodeBoxResult<Value> {
    let path = path
        .with_fill(input.color("fill")?)
        .with_stroke(input.color("stroke")?, input.float("stroke_width")?);
    Ok(Value::from(path))
}

pub fn rect() -> NodeType {
    let ty = NodeType::pure("rect", ValueType::GrobPath, |input, _| {
        let mut p = Path::new();
        p.rect(
            input.float("x")?,
            input.float("y")?,
            input.float("width")?,
            input.float("height")?,
        );
        styled(p, input)
    })
    .describe("Rectangle with (x, y) as its top-left corner")
    .param(float("x", 0.0))
    .param(float("y", 0.0))
    .param(size("width", 100.0))
    .param(size("height", 100.0));
    with_style(ty, Some(Color::BLACK), None)
}

pub fn ellipse() -> NodeType {
    let ty = NodeType::pure("ellipse", ValueType::GrobPath, |input, _| {
        let mut p = Path::new();
        p.ellipse(
            input.float("x")?,
            input.float("y")?,
            input.float("width")?,
            input.float("height")?,
        );
        styled(p, input)
    })
    .describe("Ellipse inscribed in the rect (x, y, width, height)")
    .param(float("x", 0.0))
    .param(float("y", 0.0))
    .param(size("width", 100.0))
    .param(size("height", 100.0));
    with_style(ty, Some(Color::BLACK), None)
}

const MAX_STAR_POINTS: i64 = 10_000;

pub fn star() -> NodeType {
    let ty = NodeType::pure("star", ValueType::GrobPath, |input, _| {
        let (x, y) = (input.float("x")?, input.float("y")?);
        let points = input.int("points")?;
        let outer = input.float("outer")? / 2.0;
        let inner = input.float("inner")? / 2.0;
        let mut p = Path::new();
        p.move_to(x, y + outer);
        if points > MAX_STAR_POINTS {
            return Err(NodeBoxError::type_error(format!(
                "star: {points} points is above the maximum {MAX_STAR_POINTS}"
            )));
        }
        for i in 1..points * 2 {
            let angle = i as f64 * PI / points as f64;
            let r = if i % 2 == 1 { inner } else { outer };
            p.line_to(x + r * angle.sin(), y + r * angle.cos());
        }
        p.close();
        styled(p, input)
    })
    .describe("Star centered on (x, y)")
    .param(float("x", 0.0))
    .param(float("y", 0.0))
    .param(
        ParameterType::new("points", ValueType::Int, 20_i64).bounded(
            Some(1.0),
            Some(MAX_STAR_POINTS as f64),
            BoundingMethod::Hard,
        ),
    )
    .param(size("outer", 200.0))
    .param(size("inner", 100.0));
    with_style(ty, Some(Color::BLACK), None)
}

pub fn line() -> NodeType {
    let ty = NodeType::pure("line", ValueType::GrobPath, |input, _| {
        let mut p = Path::new();
        p.line(
            input.float("x1")?,
            input.float("y1")?,
            input.float("x2")?,
            input.float("y2")?,
        );
        styled(p, input)
    })
    .describe("Open line segment")
    .param(float("x1", 0.0))
    .param(float("y1", 0.0))
    .param(float("x2", 100.0))
    .param(float("y2", 100.0));
    with_style(ty, None, Some(Color::BLACK))
}

pub fn number() -> NodeType {
    NodeType::pure("number", ValueType::Float, |input, _| {
        Ok(Value::Float(input.float("value")?))
    })
    .describe("Constant number")
    .param(float("value", 0.0))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::eval::{NodeContext, ProcessingContext};
    use crate::expression::FunctionRepository;
    use crate::graphics::{Grob, Rect};
    use crate::node::network::Network;

    fn render(ty: NodeType, values: &[(&str, Value)]) -> Value {
        let mut net = Network::new();
        let name = net.create_node(&Arc::new(ty)).unwrap();
        for (param, v) in values {
            net.set_value(&name, param, v.clone()).unwrap();
        }
        let functions = FunctionRepository::with_builtins();
        let ctx = ProcessingContext::default();
        NodeContext::new(&functions, &ctx)
            .render_child(&mut net, &name)
            .unwrap()
    }

    fn path(v: Value) -> Path {
        match v {
            Value::Grob(Grob::Path(p)) => p,
            other => panic!("expected a path, got {other:?}"),
        }
    }

    #[test]
    fn rect_uses_top_left_corner() {
        let p = path(render(rect(), &[("x", Value::Float(10.0))]));
        assert_eq!(p.bounds(), Rect::new(10.0, 0.0, 100.0, 100.0));
        assert_eq!(p.fill, Some(Color::BLACK));
        assert_eq!(p.stroke, None);
    }

    #[test]
    fn star_alternates_radii() {
        let p = path(render(star(), &[("points", Value::Int(5))]));
        assert_eq!(p.contours.len(), 1);
        assert_eq!(p.contours[0].point_count(), 10);
        assert!(p.contours[0].is_closed());
        let b = p.bounds();
        assert!((b.max_y() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn star_points_are_capped() {
        let mut net = Network::new();
        let name = net.create_node(&Arc::new(star())).unwrap();
        assert!(matches!(
            net.set_value(&name, "points", Value::Int(i64::MAX)),
            Err(NodeBoxError::Type(_))
        ));
        net.set_value(&name, "points", Value::Int(MAX_STAR_POINTS)).unwrap();
    }

    #[test]
    fn line_is_stroked_and_open() {
        let p = path(render(line(), &[]));
        assert_eq!(p.fill, None);
        assert_eq!(p.stroke, Some(Color::BLACK));
        assert!(!p.contours[0].is_closed());
        assert!((p.length() - 100.0 * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn stroke_can_be_set_from_hex() {
        let p = path(render(
            ellipse(),
            &[("stroke", Value::String("#ff0000".to_owned()))],
        ));
        assert_eq!(p.stroke, Some(Color::rgb(1.0, 0.0, 0.0)));
    }
}

use crate::eval::{NodeInput, UpstreamScope};
use crate::expression::{AssignmentProgram, COPY_VAR};
use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::graphics::{Grob, Group, Point, Transform};
use crate::node::node_type::{NodeType, StatefulProcessor};
use crate::node::parameter::{BoundingMethod, ParameterType};
use crate::node::value::{Value, ValueType};

fn float(name: &str, default: f64) -> ParameterType {
    ParameterType::new(name, ValueType::Float, default)
}

/// Translate, rotate and scale parameters; scaling applies first, translation last.
fn step_params(ty: NodeType) -> NodeType {
    ty.param(float("tx", 0.0))
        .param(float("ty", 0.0))
        .param(float("r", 0.0))
        .param(float("sx", 1.0))
        .param(float("sy", 1.0))
}

fn step(input: &NodeInput) -> NodeBoxResult<Transform> {
    let mut t = Transform::identity();
    t.translate(input.float("tx")?, input.float("ty")?)
        .rotate(input.float("r")?)
        .scale_xy(input.float("sx")?, input.float("sy")?);
    Ok(t)
}

pub fn transform() -> NodeType {
    let ty = NodeType::pure("transform", ValueType::Grob, |input, _| {
        let mut shape = input.grob("shape")?.clone();
        shape.append_transform(&step(input)?);
        Ok(Value::Grob(shape))
    })
    .describe("Move, rotate and scale a shape")
    .param(ParameterType::new("shape", ValueType::Grob, Value::Null));
    step_params(ty)
}

/// Repeats a shape, accumulating the step transform per copy.
///
/// With an expression such as `rect1.width = (COPY + 1) * 10` the upstream shape is rendered
/// again for every copy with `COPY` bound to the copy index.
struct CopyProcessor;

impl StatefulProcessor for CopyProcessor {
    fn process(&self, input: &NodeInput, scope: &mut UpstreamScope<'_>) -> NodeBoxResult<Value> {
        let copies = input.int("copies")?;
        if copies < 0 {
            return Err(NodeBoxError::type_error(format!(
                "copies must not be negative, got {copies}"
            )));
        }
        let program = AssignmentProgram::parse(input.string("expression")?)?;
        let step = step(input)?;
        let origins = match input.grob_opt("template")? {
            Some(template) => template.points(),
            None => vec![Point::ZERO],
        };

        let mut group = Group::new();
        for origin in origins {
            let mut t = Transform::translated(origin.x, origin.y);
            for i in 0..copies {
                let mut shape = if program.is_empty() {
                    input.grob("shape")?.clone()
                } else {
                    variant(input, scope, &program, i)?
                };
                shape.append_transform(&t);
                group.add(shape);
                t.prepend(&step);
            }
        }
        Ok(Value::from(group))
    }
}

fn variant(
    input: &NodeInput,
    scope: &UpstreamScope<'_>,
    program: &AssignmentProgram,
    index: i64,
) -> NodeBoxResult<Grob> {
    let rendered = scope.render_variant("shape", program, &[(COPY_VAR, Value::Int(index))])?;
    match rendered {
        Some(v) => match v.coerce(ValueType::Grob)? {
            Value::Grob(g) => Ok(g),
            other => Err(NodeBoxError::type_error(format!(
                "{}.shape: expected a shape, got {}",
                input.node(),
                other.type_name()
            ))),
        },
        None => Ok(input.grob("shape")?.clone()),
    }
}

pub fn copy() -> NodeType {
    let ty = NodeType::stateful("copy", ValueType::GrobGroup, CopyProcessor)
        .describe("Repeat a shape, optionally along the points of a template")
        .param(ParameterType::new("shape", ValueType::Grob, Value::Null))
        .param(ParameterType::new("template", ValueType::Grob, Value::Null).nullable())
        .param(
            ParameterType::new("copies", ValueType::Int, 1_i64).bounded(
                Some(0.0),
                None,
                BoundingMethod::Hard,
            ),
        );
    step_params(ty).param(ParameterType::new("expression", ValueType::String, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{Path, Rect};

    #[test]
    fn step_order_is_scale_rotate_translate() {
        let mut input = NodeInput::new("t");
        for (name, v) in [("tx", 10.0), ("ty", 0.0), ("r", 90.0), ("sx", 2.0), ("sy", 2.0)] {
            input.push(std::sync::Arc::new(float(name, 0.0)), Value::Float(v), false);
        }
        let t = step(&input).unwrap();
        let p = t.map_point(Point::new(1.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn accumulated_steps_translate_each_copy() {
        let mut rect = Path::new();
        rect.rect(0.0, 0.0, 100.0, 100.0);
        let step = Transform::translated(0.0, 100.0);
        let mut t = Transform::identity();
        let mut group = Group::new();
        for _ in 0..3 {
            let mut g = Grob::from(rect.clone());
            g.append_transform(&t);
            group.add(g);
            t.prepend(&step);
        }
        assert_eq!(group.bounds(), Rect::new(0.0, 0.0, 100.0, 300.0));
    }
}

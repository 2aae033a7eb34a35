use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::graphics::{Grob, Group, Path};
use crate::node::node_type::NodeType;
use crate::node::parameter::{BoundingMethod, ParameterType};
use crate::node::value::{Value, ValueType};

pub fn merge() -> NodeType {
    NodeType::pure("merge", ValueType::GrobGroup, |input, _| {
        let group = Group::from_grobs(input.grobs("shapes")?.into_iter().cloned());
        Ok(Value::from(group))
    })
    .describe("Combine shapes into one group, in connection order")
    .param(ParameterType::new("shapes", ValueType::Grob, Value::Null).multiple())
}

/// Apply `f` to every path inside `grob`, keeping group structure and transforms.
fn map_paths(grob: &Grob, f: &impl Fn(&Path) -> NodeBoxResult<Path>) -> NodeBoxResult<Grob> {
    match grob {
        Grob::Path(p) => Ok(Grob::Path(f(p)?)),
        Grob::Group(g) => {
            let grobs = g
                .grobs
                .iter()
                .map(|child| map_paths(child, f))
                .collect::<NodeBoxResult<Vec<_>>>()?;
            Ok(Grob::Group(Group {
                grobs,
                transform: g.transform,
            }))
        }
    }
}

pub fn resample() -> NodeType {
    NodeType::pure("resample", ValueType::Grob, |input, _| {
        let shape = input.grob("shape")?;
        let out = match input.string("method")? {
            "length" => {
                let length = input.float("length")?;
                map_paths(shape, &|p| p.resample_by_length(length))?
            }
            "amount" => {
                let points = usize::try_from(input.int("points")?)
                    .map_err(|_| NodeBoxError::type_error("points must not be negative"))?;
                map_paths(shape, &|p| p.resample_by_amount(points))?
            }
            other => {
                return Err(NodeBoxError::type_error(format!(
                    "unknown resample method '{other}', expected 'length' or 'amount'"
                )));
            }
        };
        Ok(Value::Grob(out))
    })
    .describe("Redistribute the points of every contour evenly")
    .param(ParameterType::new("shape", ValueType::Grob, Value::Null))
    .param(ParameterType::new("method", ValueType::String, "length"))
    .param(ParameterType::new("length", ValueType::Float, 10.0).bounded(
        Some(0.0),
        None,
        BoundingMethod::Soft,
    ))
    .param(ParameterType::new("points", ValueType::Int, 20_i64).bounded(
        Some(1.0),
        None,
        BoundingMethod::Hard,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Transform;

    #[test]
    fn map_paths_keeps_group_transforms() {
        let mut square = Path::new();
        square.rect(0.0, 0.0, 40.0, 40.0);
        let mut group = Group::from_grobs([Grob::from(square)]);
        group.transform = Transform::translated(5.0, 0.0);

        let out = map_paths(&Grob::from(group), &|p| p.resample_by_length(10.0)).unwrap();
        let Grob::Group(g) = out else {
            panic!("expected a group");
        };
        assert_eq!(g.transform, Transform::translated(5.0, 0.0));
        let Grob::Path(p) = &g.grobs[0] else {
            panic!("expected a path");
        };
        assert_eq!(p.contours[0].point_count(), 16);
    }
}

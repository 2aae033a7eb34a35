use std::collections::BTreeMap;
use std::sync::Arc;

use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::node::node_type::NodeType;

/// Node types by id. Owned by a library; there is no global registry.
#[derive(Clone, Debug, Default)]
pub struct NodeRepository {
    types: BTreeMap<String, Arc<NodeType>>,
}

impl NodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in types plus the subnetwork type.
    pub fn with_builtins() -> Self {
        let mut repo = Self::new();
        crate::nodes::register_builtins(&mut repo);
        repo.register(NodeType::network());
        repo
    }

    /// Register a type, replacing any previous type with the same id.
    pub fn register(&mut self, ty: NodeType) -> Arc<NodeType> {
        let ty = Arc::new(ty);
        self.types.insert(ty.id.clone(), ty.clone());
        ty
    }

    pub fn get(&self, id: &str) -> NodeBoxResult<Arc<NodeType>> {
        self.types
            .get(id)
            .cloned()
            .ok_or_else(|| NodeBoxError::not_found(format!("unknown node type '{id}'")))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<NodeType>> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let repo = NodeRepository::with_builtins();
        let ids: Vec<&str> = repo.ids().collect();
        for id in ["copy", "ellipse", "line", "merge", "network", "number", "rect", "resample", "star", "transform"] {
            assert!(ids.contains(&id), "missing {id}");
        }
        assert!(repo.get("network").unwrap().is_network());
        assert!(matches!(repo.get("nope"), Err(NodeBoxError::NotFound(_))));
    }
}

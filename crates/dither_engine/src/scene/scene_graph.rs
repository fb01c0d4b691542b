//! Scene container

use crate::foundation::collections::{new_key_type, NamedSlotMap};
use crate::render::RenderResult;
use crate::scene::node::SceneNode;
use crate::scene::visitor::SceneVisitor;

new_key_type! {
    /// Stable handle to a scene node
    pub struct NodeKey;
}

/// Flat scene of named nodes visited in insertion order
#[derive(Debug, Default)]
pub struct Scene {
    nodes: NamedSlotMap<NodeKey, SceneNode>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; a node with the same name is shadowed in name lookups
    pub fn add_node(&mut self, node: SceneNode) -> NodeKey {
        log::debug!("Adding scene node '{}'", node.name);
        let name = node.name.clone();
        self.nodes.insert(name, node)
    }

    /// Remove a node
    pub fn remove_node(&mut self, key: NodeKey) -> Option<SceneNode> {
        self.nodes.remove(key)
    }

    /// Node of a key
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Mutable node of a key
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// Key of a named node
    pub fn find(&self, name: &str) -> Option<NodeKey> {
        self.nodes.find(name)
    }

    /// Named node
    pub fn node_by_name(&self, name: &str) -> Option<&SceneNode> {
        self.find(name).and_then(|key| self.node(key))
    }

    /// Mutable named node
    pub fn node_by_name_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        self.find(name).and_then(move |key| self.nodes.get_mut(key))
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &SceneNode)> {
        self.nodes.iter()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visit every node in insertion order, stopping at the first error
    pub fn accept_visitor(&self, visitor: &mut dyn SceneVisitor) -> RenderResult<()> {
        for (_, node) in self.nodes.iter() {
            node.accept(visitor)?;
        }
        Ok(())
    }
}

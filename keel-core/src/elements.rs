//! Element tree nodes and their context-menu operations

use crate::context::Context;
use crate::error::Result;
use std::sync::Arc;

/// Handler invoked when a tree operation runs on a node
pub type TreeHandler = Arc<dyn Fn(&Node, &mut Context) -> Result<()> + Send + Sync>;

/// Node identifier within the element tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An element tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Node type, e.g. `op cut`
    pub node_type: String,
    pub label: String,
}

/// A context-menu action for some node types
#[derive(Clone)]
pub struct TreeOperation {
    pub label: String,
    pub node_types: Vec<String>,
    pub help: String,
    handler: TreeHandler,
}

impl std::fmt::Debug for TreeOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeOperation")
            .field("label", &self.label)
            .field("node_types", &self.node_types)
            .finish()
    }
}

impl TreeOperation {
    pub fn applies_to(&self, node_type: &str) -> bool {
        self.node_types.iter().any(|t| t == node_type)
    }

    pub(crate) fn handler(&self) -> TreeHandler {
        self.handler.clone()
    }
}

/// Element tree and registered tree operations
#[derive(Debug, Default)]
pub struct Elements {
    operations: Vec<TreeOperation>,
    nodes: Vec<Node>,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tree operation for the given node types
    ///
    /// Registering a label again replaces the earlier operation in place.
    pub fn tree_operation<F>(&mut self, label: impl Into<String>, node_types: &[&str], help: impl Into<String>, handler: F)
    where
        F: Fn(&Node, &mut Context) -> Result<()> + Send + Sync + 'static,
    {
        let operation = TreeOperation {
            label: label.into(),
            node_types: node_types.iter().map(|t| t.to_string()).collect(),
            help: help.into(),
            handler: Arc::new(handler),
        };
        tracing::debug!("🌳 Tree operation '{}' for {:?}", operation.label, operation.node_types);

        match self.operations.iter_mut().find(|op| op.label == operation.label) {
            Some(existing) => *existing = operation,
            None => self.operations.push(operation),
        }
    }

    pub fn operation(&self, label: &str) -> Option<&TreeOperation> {
        self.operations.iter().find(|op| op.label == label)
    }

    /// Operations that apply to `node_type`, in registration order
    pub fn operations_for(&self, node_type: &str) -> Vec<&TreeOperation> {
        self.operations
            .iter()
            .filter(|op| op.applies_to(node_type))
            .collect()
    }

    pub fn operations(&self) -> &[TreeOperation] {
        &self.operations
    }

    /// Append a node to the tree
    pub fn add_node(&mut self, node_type: impl Into<String>, label: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            node_type: node_type.into(),
            label: label.into(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

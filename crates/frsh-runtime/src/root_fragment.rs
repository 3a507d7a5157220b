//! Root Fragment
//!
//! Presents a run of siblings bounded by an end marker as if it were a
//! parent node of its own, so a renderer can mount into the middle of a
//! real parent without disturbing the siblings around it.

use frsh_dom::{DomError, DomResult, DomTree, NodeId};

/// Parent-node surface a renderer mounts into
pub trait FragmentParent {
    /// Insert `node` before `reference`, or before the end marker when `None`
    fn insert_before(&mut self, node: NodeId, reference: Option<NodeId>) -> DomResult<()>;

    fn append_child(&mut self, node: NodeId) -> DomResult<()>;

    fn remove_child(&mut self, node: NodeId) -> DomResult<()>;

    /// The nodes currently inside the range, in order
    fn child_nodes(&self) -> &[NodeId];

    fn first_child(&self) -> Option<NodeId> {
        self.child_nodes().first().copied()
    }

    /// The real parent the range lives in
    fn parent_node(&self) -> NodeId;
}

/// Where an activation mounts: a parent, the nodes it adopts, and the
/// marker that stays after them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTarget {
    pub parent: NodeId,
    pub children: Vec<NodeId>,
    pub end_marker: NodeId,
}

/// Virtual parent over `target.children` inside the live tree
pub struct RootFragment<'a> {
    tree: &'a mut DomTree,
    target: FragmentTarget,
}

impl<'a> RootFragment<'a> {
    pub fn new(tree: &'a mut DomTree, target: FragmentTarget) -> Self {
        Self { tree, target }
    }

    pub fn end_marker(&self) -> NodeId {
        self.target.end_marker
    }

    /// The live tree, for reading and for mutating nodes inside the range
    pub fn tree(&self) -> &DomTree {
        &*self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut *self.tree
    }
}

impl FragmentParent for RootFragment<'_> {
    fn insert_before(&mut self, node: NodeId, reference: Option<NodeId>) -> DomResult<()> {
        let end = self.target.end_marker;
        if node == end {
            return Err(DomError::AnchorRemoval(end));
        }
        let reference = reference.unwrap_or(end);
        self.tree.insert_before(self.target.parent, node, Some(reference))?;

        let children = &mut self.target.children;
        children.retain(|&c| c != node);
        let position = children.iter().position(|&c| c == reference).unwrap_or(children.len());
        children.insert(position, node);
        Ok(())
    }

    fn append_child(&mut self, node: NodeId) -> DomResult<()> {
        self.insert_before(node, None)
    }

    fn remove_child(&mut self, node: NodeId) -> DomResult<()> {
        if node == self.target.end_marker {
            return Err(DomError::AnchorRemoval(node));
        }
        self.tree.remove_child(self.target.parent, node)?;
        self.target.children.retain(|&c| c != node);
        Ok(())
    }

    fn child_nodes(&self) -> &[NodeId] {
        &self.target.children
    }

    fn parent_node(&self) -> NodeId {
        self.target.parent
    }
}

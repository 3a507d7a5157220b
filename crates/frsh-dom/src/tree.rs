//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: removing a node only unlinks it, so ids held by
//! marker stacks and registries stay valid (if detached) for the lifetime of
//! the tree.

use crate::{DomError, DomResult, Node, NodeData, NodeId};

/// Where a copied node attaches during a subtree copy
#[derive(Debug, Clone, Copy)]
enum CopySlot {
    Detached,
    ChildOf(NodeId),
    TemplateOf(NodeId),
}

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree holding only a document root
    pub fn new() -> Self {
        Self { nodes: vec![Node::document()] }
    }

    /// The document root
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds nothing but its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached element with attributes
    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut node = Node::element(tag);
        if let Some(elem) = node.as_element_mut() {
            for (name, value) in attrs {
                elem.set_attr(name, *value);
            }
        }
        self.push(node)
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text.to_string()))
    }

    /// Create an empty detached fragment
    pub fn create_fragment(&mut self) -> NodeId {
        self.push(Node::fragment())
    }

    /// Create a doctype node
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.push(Node::doctype(name.to_string(), public_id.to_string(), system_id.to_string()))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.some())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.some())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.some())
    }

    /// Iterate over the direct children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Direct children as a list of ids
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(child, _)| child).collect()
    }

    /// Number of direct children
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Inclusive ancestor check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.contains(NodeId::ROOT, id)
    }

    /// All descendants in document order (excluding `id` itself)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_ids(id).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.child_ids(node).into_iter().rev());
        }
        out
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Unlink a node from its parent and siblings
    fn unlink(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if let Some(p) = prev.some().and_then(|p| self.get_mut(p)) {
            p.next_sibling = next;
        } else if let Some(par) = parent.some().and_then(|p| self.get_mut(p)) {
            par.first_child = next;
        }

        if let Some(n) = next.some().and_then(|n| self.get_mut(n)) {
            n.prev_sibling = prev;
        } else if let Some(par) = parent.some().and_then(|p| self.get_mut(p)) {
            par.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is `None`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.node(parent)?;
        self.node(child)?;
        if self.contains(child, parent) {
            tracing::warn!("Refusing to insert {} into its own descendant {}", child, parent);
            return Err(DomError::HierarchyRequest { parent, child });
        }

        let mut reference = reference;
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
            // Inserting a node before itself keeps its position
            if r == child {
                reference = self.next_sibling(child);
            }
        }

        self.unlink(child);

        match reference {
            Some(r) => {
                let prev = self.node(r)?.prev_sibling;
                {
                    let node = self.node_mut(child)?;
                    node.parent = parent;
                    node.prev_sibling = prev;
                    node.next_sibling = r;
                }
                self.node_mut(r)?.prev_sibling = child;
                if prev.is_valid() {
                    self.node_mut(prev)?.next_sibling = child;
                } else {
                    self.node_mut(parent)?.first_child = child;
                }
            }
            None => {
                let last = self.node(parent)?.last_child;
                {
                    let node = self.node_mut(child)?;
                    node.parent = parent;
                    node.prev_sibling = last;
                    node.next_sibling = NodeId::NONE;
                }
                if last.is_valid() {
                    self.node_mut(last)?.next_sibling = child;
                } else {
                    self.node_mut(parent)?.first_child = child;
                }
                self.node_mut(parent)?.last_child = child;
            }
        }

        Ok(child)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.node(child)?;
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.unlink(child);
        Ok(child)
    }

    /// Detach a node from wherever it currently lives
    pub fn remove(&mut self, id: NodeId) {
        self.unlink(id);
    }

    /// Put `new` where `old` is and detach `old`
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) -> DomResult<()> {
        let parent = self.parent(old).ok_or(DomError::NotFound(old))?;
        self.insert_before(parent, new, Some(old))?;
        self.remove_child(parent, old)?;
        Ok(())
    }

    /// Deep-clone a subtree (template content included). The copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> DomResult<NodeId> {
        self.copy_node(None, id)
    }

    /// Deep-copy a subtree from another tree into this one. The copy is detached.
    pub fn import_subtree(&mut self, source: &DomTree, id: NodeId) -> DomResult<NodeId> {
        self.copy_node(Some(source), id)
    }

    fn copy_node(&mut self, source: Option<&DomTree>, id: NodeId) -> DomResult<NodeId> {
        let mut copy_root = None;
        let mut work = vec![(id, CopySlot::Detached)];

        while let Some((original, slot)) = work.pop() {
            let (mut data, children) = {
                let tree = source.unwrap_or(&*self);
                (tree.node(original)?.data.clone(), tree.child_ids(original))
            };
            let template = match &mut data {
                NodeData::Element(elem) => elem.template_content.take(),
                _ => None,
            };

            let copy = self.push(Node {
                parent: NodeId::NONE,
                first_child: NodeId::NONE,
                last_child: NodeId::NONE,
                prev_sibling: NodeId::NONE,
                next_sibling: NodeId::NONE,
                data,
            });

            match slot {
                CopySlot::Detached => copy_root = Some(copy),
                CopySlot::ChildOf(parent) => {
                    self.append_child(parent, copy)?;
                }
                CopySlot::TemplateOf(owner) => {
                    if let Some(elem) = self.node_mut(owner)?.as_element_mut() {
                        elem.template_content = Some(copy);
                    }
                }
            }

            // Popped in document order, so siblings keep their order
            work.extend(children.into_iter().rev().map(|child| (child, CopySlot::ChildOf(copy))));
            if let Some(content) = template {
                work.push((content, CopySlot::TemplateOf(copy)));
            }
        }

        copy_root.ok_or(DomError::NotFound(id))
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Lowercase tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.name.as_str())
    }

    /// Attribute value of an element
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let elem = self.node_mut(id)?.as_element_mut().ok_or(DomError::NotFound(id))?;
        elem.set_attr(name, value);
        Ok(())
    }

    /// Replace the data of a text or comment node
    pub fn set_text(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(t) => t.content = text.to_string(),
            NodeData::Comment(c) => *c = text.to_string(),
            _ => return Err(DomError::NotFound(id)),
        }
        Ok(())
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.get(id).and_then(|n| n.as_text()) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.get(d).and_then(|n| n.as_text()))
            .collect()
    }

    /// Content fragment of a `<template>` element
    pub fn template_content(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.as_element()?.template_content
    }

    /// Attach a content fragment to a `<template>` element
    pub fn set_template_content(&mut self, id: NodeId, fragment: NodeId) -> DomResult<()> {
        let elem = self.node_mut(id)?.as_element_mut().ok_or(DomError::NotFound(id))?;
        elem.template_content = Some(fragment);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First element below `root` with the given id (template contents are not searched)
    pub fn get_element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|&n| {
            self.get(n)
                .and_then(|node| node.as_element())
                .and_then(|e| e.id())
                == Some(id)
        })
    }

    /// All elements below `root` with the given tag name
    pub fn get_elements_by_tag_name(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| self.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// Closest inclusive ancestor element with the given tag name
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.tag_name(node).is_some_and(|t| t.eq_ignore_ascii_case(tag)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.some()?;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

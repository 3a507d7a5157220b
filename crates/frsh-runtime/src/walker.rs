//! Island Revival Walker
//!
//! Single depth-first pass over the server-rendered DOM. Marker comments
//! drive two stacks: open markers, and the virtual nodes being filled.
//! Slot and partial content is captured into the virtual tree; page-level
//! islands and partials are handed to the activation queue once closed.

use crate::activator::ActivationQueue;
use crate::island::{IslandCatalog, IslandProps};
use crate::marker::{self, IslandRef, Marker, MarkerKind, MarkerToken};
use crate::registry::RegionRegistry;
use crate::root_fragment::FragmentTarget;
use crate::vnode::{AttrValue, Children, VChild, VNodeId, VNodeKind, VTree};
use crate::RuntimeResult;
use frsh_dom::{is_boolean_attribute, DomError, DomResult, DomTree, NodeId};

/// Outcome of a revival scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviveReport {
    /// Fragment holding every page-level island and partial
    pub root: VNodeId,
    pub islands_scheduled: usize,
    pub partials_scheduled: usize,
    /// Islands with no registered component
    pub unresolved_islands: usize,
    /// Partial regions registered
    pub regions: usize,
    /// Open markers discarded because their close never arrived
    pub dropped_markers: usize,
}

enum NodeClass {
    Comment(String),
    Text(String),
    Element,
    Other,
}

pub(crate) struct Walker<'a> {
    tree: &'a mut DomTree,
    islands: &'a IslandCatalog,
    props: &'a IslandProps,
    registry: &'a mut RegionRegistry,
    vtree: &'a mut VTree,
    queue: &'a mut ActivationQueue,
    keep_comments: bool,
    /// Walking a detached copy of template content
    recovering: bool,
    markers: Vec<Marker>,
    vnodes: Vec<VNodeId>,
    report: ReviveReport,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        tree: &'a mut DomTree,
        islands: &'a IslandCatalog,
        props: &'a IslandProps,
        registry: &'a mut RegionRegistry,
        vtree: &'a mut VTree,
        queue: &'a mut ActivationQueue,
        keep_comments: bool,
    ) -> Self {
        let root = vtree.alloc(VNodeKind::Fragment);
        Self {
            tree,
            islands,
            props,
            registry,
            vtree,
            queue,
            keep_comments,
            recovering: false,
            markers: Vec::new(),
            vnodes: vec![root],
            report: ReviveReport {
                root,
                islands_scheduled: 0,
                partials_scheduled: 0,
                unresolved_islands: 0,
                regions: 0,
                dropped_markers: 0,
            },
        }
    }

    /// Walk `first` and its following siblings (and their descendants)
    pub(crate) fn revive(mut self, first: Option<NodeId>) -> RuntimeResult<ReviveReport> {
        self.walk_siblings(first)?;
        self.restore_depth(0, 1);

        tracing::info!(
            "Revived page: {} islands, {} partials scheduled, {} regions",
            self.report.islands_scheduled,
            self.report.partials_scheduled,
            self.report.regions
        );
        Ok(self.report)
    }

    fn walk_siblings(&mut self, first: Option<NodeId>) -> RuntimeResult<()> {
        let mut current = first;
        while let Some(node) = current {
            current = match self.classify_node(node) {
                NodeClass::Comment(text) => self.visit_comment(node, &text)?,
                NodeClass::Text(text) => {
                    if self.capturing() {
                        self.push_child(VChild::Text(text));
                    }
                    self.tree.next_sibling(node)
                }
                NodeClass::Element => {
                    self.visit_element(node)?;
                    self.tree.next_sibling(node)
                }
                NodeClass::Other => self.tree.next_sibling(node),
            };
        }
        Ok(())
    }

    fn classify_node(&self, node: NodeId) -> NodeClass {
        let Some(data) = self.tree.get(node) else {
            return NodeClass::Other;
        };
        if let Some(text) = data.as_comment() {
            NodeClass::Comment(text.to_string())
        } else if let Some(text) = data.as_text() {
            NodeClass::Text(text.to_string())
        } else if data.is_element() {
            NodeClass::Element
        } else {
            NodeClass::Other
        }
    }

    /// Slot and partial content is mirrored into the virtual tree
    fn capturing(&self) -> bool {
        matches!(
            self.markers.last().map(|m| m.kind),
            Some(MarkerKind::Slot | MarkerKind::Partial)
        )
    }

    fn push_child(&mut self, child: VChild) {
        if let Some(&top) = self.vnodes.last() {
            self.vtree.push_child(top, child);
        }
    }

    fn visit_element(&mut self, node: NodeId) -> RuntimeResult<()> {
        let Some(element) = self.tree.get(node).and_then(|n| n.as_element()) else {
            return Ok(());
        };
        let tag = element.name.clone();
        let (markers, vnodes) = (self.markers.len(), self.vnodes.len());

        if self.capturing() {
            let attrs = element
                .attrs
                .iter()
                .map(|attr| {
                    let value = if is_boolean_attribute(&attr.name) {
                        AttrValue::Bool(true)
                    } else {
                        AttrValue::Str(attr.value.clone())
                    };
                    (attr.name.clone(), value)
                })
                .collect();
            let children = Children::for_dom_children(self.tree.child_count(node));
            let vnode = self.vtree.alloc_with(VNodeKind::Element { tag: tag.clone(), attrs }, None, children);
            self.push_child(VChild::Node(vnode));
            self.vnodes.push(vnode);
        }

        // Script bodies never carry markers
        if tag != "script" {
            let first = self.tree.first_child(node);
            self.walk_siblings(first)?;
        }

        self.restore_depth(markers, vnodes);
        Ok(())
    }

    /// Drop markers opened below the current element that never closed
    fn restore_depth(&mut self, markers: usize, vnodes: usize) {
        if self.markers.len() > markers {
            for marker in self.markers.drain(markers..) {
                tracing::warn!("Dropping unterminated marker <!--{}-->", marker.text);
                self.report.dropped_markers += 1;
            }
        }
        self.vnodes.truncate(vnodes);
    }

    fn open_marker(&mut self, kind: MarkerKind, text: &str, start: Option<NodeId>, vnode: VNodeId) {
        self.vnodes.push(vnode);
        self.markers.push(Marker::new(kind, text, start, self.vnodes.len() - 1));
    }

    /// Handle a comment; returns the node to continue with
    fn visit_comment(&mut self, node: NodeId, text: &str) -> RuntimeResult<Option<NodeId>> {
        let next = self.tree.next_sibling(node);
        let token = marker::classify(text, self.markers.last());
        tracing::trace!("{} <!--{}--> {:?}", node, text, token);

        match token {
            MarkerToken::NotAMarker => Ok(next),
            MarkerToken::OpenSlot(_) => {
                let key = marker::normalize(text);
                let vnode = self.vtree.alloc_with(VNodeKind::ServerContent, Some(key.to_string()), Children::Empty);
                self.open_marker(MarkerKind::Slot, key, Some(node), vnode);
                Ok(next)
            }
            MarkerToken::Island(island) => {
                let component = self.islands.resolve(&island);
                if component.is_none() {
                    tracing::warn!("No component registered for island {}", island);
                    self.report.unresolved_islands += 1;
                }
                let props = match self.props.get(island.props_index) {
                    Some(props) => props.clone(),
                    None => {
                        tracing::warn!("No props at index {} for island {}", island.props_index, island);
                        serde_json::Value::Null
                    }
                };
                let vnode = self.vtree.alloc(VNodeKind::Island { island, component, props });
                self.open_marker(MarkerKind::Island, marker::normalize(text), Some(node), vnode);
                Ok(next)
            }
            MarkerToken::OpenPartial(name) => {
                // Regions only exist in the live document
                let node = if self.recovering {
                    node
                } else {
                    let node = self.hide(node)?;
                    self.registry.open(&name, node);
                    self.report.regions += 1;
                    node
                };
                let vnode = self.vtree.alloc(VNodeKind::PartialSlot { name });
                self.open_marker(MarkerKind::Partial, marker::normalize(text), Some(node), vnode);
                Ok(next)
            }
            MarkerToken::ClosePartial(name) => {
                let matches_top = self.markers.last().and_then(Marker::partial_name) == Some(name.as_str());
                if self.recovering {
                    return if matches_top && self.closes_top(node) { self.close_marker(node) } else { Ok(next) };
                }

                let Some(start) = self.registry.get(&name).map(|region| region.start_marker) else {
                    tracing::debug!("Close marker for unknown partial \"{}\" ignored", name);
                    return Ok(next);
                };
                if self.tree.parent(start) != self.tree.parent(node) {
                    tracing::debug!("Close marker for partial \"{}\" is not a sibling of its open marker", name);
                    return Ok(next);
                }
                let node = self.hide(node)?;
                self.registry.close(&name, node);

                if matches_top {
                    self.close_marker(node)
                } else {
                    tracing::debug!("Close marker for partial \"{}\" does not match the open marker", name);
                    Ok(next)
                }
            }
            MarkerToken::Close => {
                if !self.closes_top(node) {
                    tracing::debug!("Close marker <!--{}--> is not a sibling of its open marker", text);
                    return Ok(next);
                }
                self.close_marker(node)
            }
        }
    }

    /// A close only matches the top marker when both comments share a parent
    fn closes_top(&self, end: NodeId) -> bool {
        self.markers
            .last()
            .and_then(|m| m.start_node)
            .is_some_and(|start| self.tree.parent(start) == self.tree.parent(end))
    }

    fn close_marker(&mut self, end: NodeId) -> RuntimeResult<Option<NodeId>> {
        let next = self.tree.next_sibling(end);
        let Some(mut marker) = self.markers.pop() else {
            return Ok(next);
        };
        marker.end_node = Some(end);

        self.vnodes.truncate(marker.vnode_depth + 1);
        let Some(vnode) = self.vnodes.pop() else {
            return Ok(next);
        };
        let parent = self.markers.last().map(|m| (m.kind, m.vnode_depth));

        match (marker.kind, parent) {
            (MarkerKind::Slot, Some((MarkerKind::Island, depth))) => {
                if let Some(&island) = self.vnodes.get(depth) {
                    self.vtree.set_children(island, Children::Single(VChild::Node(vnode)));
                }
                self.hide_pair(&marker)?;
            }
            (MarkerKind::Slot, Some(_)) => {
                self.push_child(VChild::Node(vnode));
                self.hide_pair(&marker)?;
            }
            (MarkerKind::Slot, None) => {
                tracing::debug!("Slot <!--{}--> outside any island", marker.text);
                self.hide_pair(&marker)?;
            }
            (_, None) => self.activate_root(&marker, vnode)?,
            (MarkerKind::Island, Some((MarkerKind::Island, _))) => {
                // Rendered by the enclosing island, not activated on its own
                tracing::debug!("Island <!--{}--> directly inside another island", marker.text);
            }
            (_, Some(_)) => self.push_child(VChild::Node(vnode)),
        }
        Ok(next)
    }

    /// Schedule a page-level island or partial for activation
    fn activate_root(&mut self, marker: &Marker, vnode: VNodeId) -> RuntimeResult<()> {
        let (Some(start), Some(end)) = (marker.start_node, marker.end_node) else {
            return Ok(());
        };
        let parent = self.tree.parent(start).ok_or(DomError::NotFound(start))?;
        let Some(children) = self.collect_between(start, end) else {
            tracing::warn!("Close marker of <!--{}--> does not follow its open marker", marker.text);
            return Ok(());
        };

        let (label, island, resolved) = match self.vtree.get(vnode).map(|n| &n.kind) {
            Some(VNodeKind::Island { island, component, .. }) => {
                (format!("island {island}"), Some(island.clone()), component.is_some())
            }
            Some(VNodeKind::PartialSlot { name }) => (format!("partial \"{name}\""), None, true),
            _ => return Ok(()),
        };

        if let Some(island) = &island {
            if self.vtree.children(vnode).is_unset() {
                self.recover_children(vnode, island)?;
            }
        }

        let end = self.hide_pair(marker)?.unwrap_or(end);
        self.vtree.push_child(self.report.root, VChild::Node(vnode));

        if !resolved {
            tracing::warn!("Leaving {} as static HTML", label);
            return Ok(());
        }

        self.queue.schedule(vnode, FragmentTarget { parent, children, end_marker: end }, label);
        match island {
            Some(_) => self.report.islands_scheduled += 1,
            None => self.report.partials_scheduled += 1,
        }
        Ok(())
    }

    /// Siblings strictly between `start` and `end`; `None` when `end` is
    /// not a later sibling of `start`
    fn collect_between(&self, start: NodeId, end: NodeId) -> Option<Vec<NodeId>> {
        let mut nodes = Vec::new();
        let mut current = self.tree.next_sibling(start);
        while let Some(node) = current {
            if node == end {
                return Some(nodes);
            }
            nodes.push(node);
            current = self.tree.next_sibling(node);
        }
        None
    }

    /// Read an island's children from its out-of-band `<template>`
    fn recover_children(&mut self, vnode: VNodeId, island: &IslandRef) -> RuntimeResult<()> {
        let template_id = island.template_id();
        let root = self.tree.root();
        let Some(content) = self
            .tree
            .get_element_by_id(root, &template_id)
            .and_then(|template| self.tree.template_content(template))
        else {
            return Ok(());
        };

        tracing::debug!("Reading children of island {} from #{}", island, template_id);
        let copy = self.tree.clone_subtree(content)?;
        let (markers, vnodes) = (self.markers.len(), self.vnodes.len());

        // Capture straight into the island node under a synthetic slot
        self.open_marker(MarkerKind::Slot, &template_id, None, vnode);
        self.recovering = true;
        let first = self.tree.first_child(copy);
        let walked = self.walk_siblings(first);
        self.recovering = false;
        walked?;

        self.restore_depth(markers + 1, vnodes + 1);
        self.markers.truncate(markers);
        self.vnodes.truncate(vnodes);
        Ok(())
    }

    /// Replace both boundary comments of a marker; returns the new end node
    fn hide_pair(&mut self, marker: &Marker) -> RuntimeResult<Option<NodeId>> {
        if let Some(start) = marker.start_node {
            self.hide(start)?;
        }
        marker.end_node.map(|end| self.hide(end)).transpose()
    }

    fn hide(&mut self, node: NodeId) -> RuntimeResult<NodeId> {
        Ok(hide_marker(self.tree, node, self.keep_comments)?)
    }
}

/// Swap a marker comment for an empty text node; returns the node now in
/// its place. Non-comments and detached nodes are left alone.
pub(crate) fn hide_marker(tree: &mut DomTree, node: NodeId, keep_comments: bool) -> DomResult<NodeId> {
    let is_attached_comment = tree.get(node).is_some_and(|n| n.is_comment()) && tree.parent(node).is_some();
    if keep_comments || !is_attached_comment {
        return Ok(node);
    }
    let text = tree.create_text("");
    tree.replace_with(node, text)?;
    Ok(text)
}

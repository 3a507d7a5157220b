//! Virtual Node Tree
//!
//! Arena of virtual nodes built while walking the server-rendered DOM.
//! Island roots reference their subtree by `VNodeId`; renderers read the
//! arena but never mutate it.

use crate::island::IslandComponent;
use crate::marker::IslandRef;
use std::fmt::Write;
use std::rc::Rc;

/// Index into a `VTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VNodeId(u32);

impl VNodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Attribute value on a virtual element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Boolean attribute present in the markup
    Bool(bool),
    Str(String),
}

/// A single child of a virtual node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VChild {
    Text(String),
    Node(VNodeId),
}

/// Child storage: absent, a single child, or a list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Children {
    #[default]
    Empty,
    Single(VChild),
    Many(Vec<VChild>),
}

impl Children {
    /// Initial storage for an element with `count` DOM children
    pub fn for_dom_children(count: usize) -> Self {
        if count <= 1 {
            Children::Empty
        } else {
            Children::Many(Vec::new())
        }
    }

    /// Append a child, promoting `Empty` -> `Single` -> `Many`
    pub fn push(&mut self, child: VChild) {
        *self = match std::mem::take(self) {
            Children::Empty => Children::Single(child),
            Children::Single(first) => Children::Many(vec![first, child]),
            Children::Many(mut list) => {
                list.push(child);
                Children::Many(list)
            }
        };
    }

    /// No children were ever assigned
    pub fn is_unset(&self) -> bool {
        matches!(self, Children::Empty)
    }

    pub fn len(&self) -> usize {
        match self {
            Children::Empty => 0,
            Children::Single(_) => 1,
            Children::Many(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VChild> {
        match self {
            Children::Empty => <&[VChild]>::default().iter(),
            Children::Single(child) => std::slice::from_ref(child).iter(),
            Children::Many(list) => list.iter(),
        }
    }
}

/// What a virtual node stands for
#[derive(Debug, Clone)]
pub enum VNodeKind {
    /// Top-level container
    Fragment,
    /// Interactive island; `component` is `None` when the catalog has no entry
    Island {
        island: IslandRef,
        component: Option<Rc<dyn IslandComponent>>,
        props: serde_json::Value,
    },
    /// Server-rendered slot content
    ServerContent,
    /// Partial region placeholder
    PartialSlot { name: String },
    /// Plain element captured inside a slot or partial
    Element {
        tag: String,
        attrs: Vec<(String, AttrValue)>,
    },
}

#[derive(Debug, Clone)]
pub struct VNode {
    pub kind: VNodeKind,
    pub key: Option<String>,
    pub children: Children,
}

/// Arena of virtual nodes
#[derive(Debug, Default)]
pub struct VTree {
    nodes: Vec<VNode>,
}

impl VTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node with no children
    pub fn alloc(&mut self, kind: VNodeKind) -> VNodeId {
        self.alloc_with(kind, None, Children::Empty)
    }

    pub fn alloc_with(&mut self, kind: VNodeKind, key: Option<String>, children: Children) -> VNodeId {
        let id = VNodeId(self.nodes.len() as u32);
        self.nodes.push(VNode { kind, key, children });
        id
    }

    pub fn get(&self, id: VNodeId) -> Option<&VNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push_child(&mut self, parent: VNodeId, child: VChild) {
        if let Some(node) = self.nodes.get_mut(parent.index()) {
            node.children.push(child);
        }
    }

    pub fn set_children(&mut self, parent: VNodeId, children: Children) {
        if let Some(node) = self.nodes.get_mut(parent.index()) {
            node.children = children;
        }
    }

    /// Children of a node (empty for unknown ids)
    pub fn children(&self, id: VNodeId) -> &Children {
        const NONE: &Children = &Children::Empty;
        self.get(id).map(|n| &n.children).unwrap_or(NONE)
    }

    /// Island nodes in allocation order
    pub fn islands(&self) -> impl Iterator<Item = (VNodeId, &IslandRef)> {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match &n.kind {
            VNodeKind::Island { island, .. } => Some((VNodeId(i as u32), island)),
            _ => None,
        })
    }

    /// Indented dump of a subtree, one node per line
    pub fn dump(&self, id: VNodeId) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, &VChild::Node(id), 0);
        out
    }

    fn dump_into(&self, out: &mut String, child: &VChild, depth: usize) {
        let indent = "  ".repeat(depth);
        let id = match child {
            VChild::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    let _ = writeln!(out, "{indent}{text:?}");
                }
                return;
            }
            VChild::Node(id) => *id,
        };
        let Some(node) = self.get(id) else {
            return;
        };

        let _ = match &node.kind {
            VNodeKind::Fragment => writeln!(out, "{indent}Fragment"),
            VNodeKind::Island { island, component, props } => {
                let name = component.as_ref().map(|c| c.name()).unwrap_or("?");
                writeln!(out, "{indent}Island {name} ({island}) props={props}")
            }
            VNodeKind::ServerContent => {
                writeln!(out, "{indent}ServerContent {}", node.key.as_deref().unwrap_or(""))
            }
            VNodeKind::PartialSlot { name } => writeln!(out, "{indent}Partial {name}"),
            VNodeKind::Element { tag, attrs } => {
                let _ = write!(out, "{indent}<{tag}");
                for (name, value) in attrs {
                    let _ = match value {
                        AttrValue::Bool(_) => write!(out, " {name}"),
                        AttrValue::Str(v) => write!(out, " {name}=\"{v}\""),
                    };
                }
                writeln!(out, ">")
            }
        };

        for child in node.children.iter() {
            self.dump_into(out, child, depth + 1);
        }
    }
}

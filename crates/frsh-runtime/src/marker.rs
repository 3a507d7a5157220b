//! Marker Grammar
//!
//! The server encodes island, slot and partial boundaries as comment pairs:
//!
//! ```text
//! <!--frsh-counter:default:0-->        open island (id, export, props index)
//! <!--/frsh-counter:default:0-->       close island
//! <!--frsh-slot:children-->            open slot, closed by any `/frsh` comment
//! <!--frsh-partial:slot-1-->           open partial region
//! <!--/frsh-partial:slot-1-->          close partial region
//! ```
//!
//! Older renderers emitted `<!--!--frsh-...---->` (the text keeps a stray
//! `!--` / `--`) and closed markers by repeating the open text verbatim.
//! Both forms are still accepted.

use frsh_dom::NodeId;

pub const MARKER_PREFIX: &str = "frsh-";
pub const CLOSE_PREFIX: &str = "/frsh";
pub const SLOT_PREFIX: &str = "frsh-slot";
pub const PARTIAL_OPEN_PREFIX: &str = "frsh-partial:";
pub const PARTIAL_CLOSE_PREFIX: &str = "/frsh-partial:";

/// Kind of an open marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Island,
    Slot,
    Partial,
}

/// Island reference carried by an island marker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IslandRef {
    pub id: String,
    pub export_name: String,
    pub props_index: usize,
}

impl IslandRef {
    /// Parse `<id>:<exportName>:<propsIndex>`
    pub fn parse(payload: &str) -> Option<Self> {
        let mut parts = payload.split(':');
        let id = parts.next().filter(|s| !s.is_empty())?;
        let export_name = parts.next().filter(|s| !s.is_empty())?;
        let props_index = parts.next()?.parse().ok()?;
        Some(Self {
            id: id.to_string(),
            export_name: export_name.to_string(),
            props_index,
        })
    }

    /// Id of the `<template>` holding out-of-band children for this island
    pub fn template_id(&self) -> String {
        format!("frsh-slot-{}-{}-{}-children", self.id, self.export_name, self.props_index)
    }
}

impl std::fmt::Display for IslandRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.id, self.export_name, self.props_index)
    }
}

/// An open (or just closed) marker on the walker's stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    /// Normalized comment text of the open marker
    pub text: String,
    pub start_node: Option<NodeId>,
    pub end_node: Option<NodeId>,
    /// Index of this marker's entry on the virtual-node stack
    pub(crate) vnode_depth: usize,
}

impl Marker {
    pub(crate) fn new(kind: MarkerKind, text: &str, start_node: Option<NodeId>, vnode_depth: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            start_node,
            end_node: None,
            vnode_depth,
        }
    }

    /// Region name for partial markers
    pub fn partial_name(&self) -> Option<&str> {
        match self.kind {
            MarkerKind::Partial => self.text.strip_prefix(PARTIAL_OPEN_PREFIX),
            _ => None,
        }
    }
}

/// Classification of a single comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerToken {
    Island(IslandRef),
    OpenSlot(String),
    OpenPartial(String),
    ClosePartial(String),
    /// Closes whatever marker is on top of the stack
    Close,
    NotAMarker,
}

/// Strip the legacy `!--` ... `--` wrapping
pub fn normalize(text: &str) -> &str {
    match text.strip_prefix("!--") {
        Some(rest) => rest.strip_suffix("--").unwrap_or(rest),
        None => text,
    }
}

/// Classify comment text against the currently open marker
pub fn classify(text: &str, open: Option<&Marker>) -> MarkerToken {
    let text = normalize(text);

    if let Some(rest) = text.strip_prefix(SLOT_PREFIX) {
        // Slots never nest, so the open text repeated is the legacy close
        if open.is_some_and(|m| m.kind == MarkerKind::Slot && m.text == text) {
            return MarkerToken::Close;
        }
        let name = rest.strip_prefix(':')
            .or_else(|| rest.strip_prefix('-'))
            .unwrap_or(rest);
        return MarkerToken::OpenSlot(name.to_string());
    }

    if let Some(name) = text.strip_prefix(PARTIAL_OPEN_PREFIX) {
        return MarkerToken::OpenPartial(name.to_string());
    }

    if let Some(name) = text.strip_prefix(PARTIAL_CLOSE_PREFIX) {
        return MarkerToken::ClosePartial(name.to_string());
    }

    if let Some(marker) = open {
        if text.starts_with(CLOSE_PREFIX) || marker.text == text {
            return MarkerToken::Close;
        }
    }

    match text.strip_prefix(MARKER_PREFIX).and_then(IslandRef::parse) {
        Some(island) => MarkerToken::Island(island),
        None => MarkerToken::NotAMarker,
    }
}

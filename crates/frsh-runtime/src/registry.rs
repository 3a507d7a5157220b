//! Region Registry
//!
//! Named partial regions and their current boundary nodes. Boundaries are
//! re-pointed whenever a swap imports fresh markers.

use frsh_dom::{DomTree, NodeId};
use std::collections::HashMap;

/// A named, swappable range of siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub start_marker: NodeId,
    pub end_marker: NodeId,
    closed: bool,
}

impl Region {
    /// Whether a close marker has been seen for this region
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current boundaries, if both are still siblings in the live tree
    pub fn live_boundaries(&self, tree: &DomTree) -> Option<(NodeId, NodeId)> {
        if !self.closed {
            return None;
        }
        let parent = tree.parent(self.start_marker)?;
        let connected = tree.is_connected(self.start_marker) && tree.is_connected(self.end_marker);
        (connected && tree.parent(self.end_marker) == Some(parent))
            .then_some((self.start_marker, self.end_marker))
    }
}

/// Map from region name to its boundaries
#[derive(Debug, Default)]
pub struct RegionRegistry {
    regions: HashMap<String, Region>,
    by_marker: HashMap<NodeId, String>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region at its open marker. Both boundaries point at the
    /// open marker until `close` is seen.
    pub fn open(&mut self, name: &str, marker: NodeId) {
        if let Some(previous) = self.regions.get(name) {
            tracing::warn!("Duplicate partial region \"{}\", keeping the later one", name);
            self.by_marker.remove(&previous.start_marker);
            self.by_marker.remove(&previous.end_marker);
        }
        self.by_marker.insert(marker, name.to_string());
        self.regions.insert(
            name.to_string(),
            Region {
                name: name.to_string(),
                start_marker: marker,
                end_marker: marker,
                closed: false,
            },
        );
    }

    /// Record the end marker of an open region. Returns false for unknown names.
    pub fn close(&mut self, name: &str, marker: NodeId) -> bool {
        let Some(region) = self.regions.get_mut(name) else {
            tracing::debug!("Close marker for unknown partial \"{}\"", name);
            return false;
        };
        region.end_marker = marker;
        region.closed = true;
        self.by_marker.insert(marker, name.to_string());
        true
    }

    /// Point a region at new boundaries (after a swap imported them)
    pub fn rebind(&mut self, name: &str, start: NodeId, end: NodeId) {
        self.open(name, start);
        self.close(name, end);
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    /// Region whose start or end marker is `node`
    pub fn by_marker(&self, node: NodeId) -> Option<&Region> {
        self.by_marker.get(&node).and_then(|name| self.regions.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions sorted by name
    pub fn regions(&self) -> Vec<&Region> {
        let mut regions: Vec<_> = self.regions.values().collect();
        regions.sort_by(|a, b| a.name.cmp(&b.name));
        regions
    }
}

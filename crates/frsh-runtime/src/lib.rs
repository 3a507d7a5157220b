//! frsh Runtime
//!
//! Client runtime for server-rendered frsh pages:
//! - Revival: one walk over the server DOM that reads marker comments,
//!   builds virtual nodes for islands, slots and partial regions, and
//!   queues page-level islands for activation
//! - Root fragments: mount a renderer into a run of siblings
//! - Partial navigation: intercept links, fetch a fragment and swap the
//!   named regions in place
//!
//! A `PageSession` owns all state for one page.

mod activator;
mod config;
mod error;
mod events;
mod history;
mod island;
pub mod marker;
mod navigator;
mod registry;
mod root_fragment;
mod session;
mod vnode;
mod walker;

pub use activator::{ActivationQueue, ActivationTask, Renderer};
pub use config::RuntimeConfig;
pub use error::{RuntimeError, RuntimeResult};
pub use events::{ClickEvent, MouseButton};
pub use history::{History, HistoryEntry, HistoryState};
pub use island::{IslandCatalog, IslandComponent, IslandProps, NamedComponent};
pub use marker::{IslandRef, MarkerKind};
pub use navigator::{
    apply_regions, collect_regions, intercept, parse_partial, FallbackReason, FragmentRegion, Interception,
    NavState, NavigationOutcome, SkipReason, SwapReport,
};
pub use registry::{Region, RegionRegistry};
pub use root_fragment::{FragmentParent, FragmentTarget, RootFragment};
pub use session::PageSession;
pub use vnode::{AttrValue, Children, VChild, VNode, VNodeId, VNodeKind, VTree};
pub use walker::ReviveReport;

/// Runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

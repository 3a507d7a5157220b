//! Page Session
//!
//! Everything one loaded page owns: its document, the region registry,
//! the virtual tree, pending activations and session history. Sessions
//! share nothing, so several pages can be driven side by side.

use crate::activator::{ActivationQueue, Renderer};
use crate::config::RuntimeConfig;
use crate::events::ClickEvent;
use crate::history::History;
use crate::island::{IslandCatalog, IslandProps};
use crate::navigator::{self, NavState, NavigationOutcome};
use crate::registry::RegionRegistry;
use crate::vnode::VTree;
use crate::walker::{ReviveReport, Walker};
use crate::{RuntimeError, RuntimeResult};
use frsh_dom::Document;
use frsh_html::{HtmlParser, HtmlSerializer};
use frsh_net::Fetch;
use url::Url;

/// A live page
pub struct PageSession {
    pub(crate) document: Document,
    pub(crate) location: Url,
    pub(crate) config: RuntimeConfig,
    islands: IslandCatalog,
    props: IslandProps,
    pub(crate) registry: RegionRegistry,
    vtree: VTree,
    activations: ActivationQueue,
    pub(crate) history: History,
    state: NavState,
    pub(crate) pending_navigation: Option<Url>,
}

impl PageSession {
    /// Wrap an already parsed document; its URL becomes the location
    pub fn new(document: Document, config: RuntimeConfig) -> RuntimeResult<Self> {
        let location = Url::parse(document.url()).map_err(|source| RuntimeError::InvalidUrl {
            url: document.url().to_string(),
            source,
        })?;

        Ok(Self {
            document,
            history: History::new(location.clone()),
            location,
            config,
            islands: IslandCatalog::new(),
            props: IslandProps::default(),
            registry: RegionRegistry::new(),
            vtree: VTree::new(),
            activations: ActivationQueue::new(),
            state: NavState::Idle,
            pending_navigation: None,
        })
    }

    /// Parse server HTML served from `url`
    pub fn from_html(html: &str, url: &str, config: RuntimeConfig) -> RuntimeResult<Self> {
        let document = HtmlParser::new().parse_with_url(html, url)?;
        Self::new(document, config)
    }

    pub fn with_islands(mut self, islands: IslandCatalog) -> Self {
        self.islands = islands;
        self
    }

    pub fn with_props(mut self, props: IslandProps) -> Self {
        self.props = props;
        self
    }

    /// Scan the body, build virtual nodes and schedule activations
    pub fn revive(&mut self) -> RuntimeResult<ReviveReport> {
        let body = self.document.body();
        let first = self.document.tree.first_child(body);
        Walker::new(
            &mut self.document.tree,
            &self.islands,
            &self.props,
            &mut self.registry,
            &mut self.vtree,
            &mut self.activations,
            self.config.keep_comments,
        )
        .revive(first)
    }

    /// Run every pending activation with `renderer`
    pub fn run_activations<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> usize {
        self.activations.run_pending(&mut self.document.tree, &self.vtree, renderer)
    }

    /// Run one pending activation; false when none are left
    pub fn run_next_activation<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> bool {
        self.activations.run_next(&mut self.document.tree, &self.vtree, renderer)
    }

    pub fn pending_activations(&self) -> usize {
        self.activations.pending()
    }

    /// Feed a click to the partial navigator
    pub async fn handle_click<F: Fetch>(&mut self, event: &mut ClickEvent, fetcher: &F) -> RuntimeResult<NavigationOutcome> {
        navigator::navigate(self, event, fetcher).await
    }

    pub(crate) fn transition(&mut self, to: NavState) {
        tracing::debug!("Navigation state {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    pub fn nav_state(&self) -> NavState {
        self.state
    }

    /// URL of a full navigation the host still has to perform
    pub fn take_full_navigation(&mut self) -> Option<Url> {
        let url = self.pending_navigation.take();
        if url.is_some() {
            self.transition(NavState::Idle);
        }
        url
    }

    /// Serialized content currently inside a region
    pub fn region_html(&self, name: &str) -> Option<String> {
        let tree = &self.document.tree;
        let (start, end) = self.registry.get(name)?.live_boundaries(tree)?;
        Some(HtmlSerializer::new().serialize_between(tree, start, end))
    }

    /// Text content currently inside a region
    pub fn region_text(&self, name: &str) -> Option<String> {
        let tree = &self.document.tree;
        let (start, end) = self.registry.get(name)?.live_boundaries(tree)?;

        let mut text = String::new();
        let mut current = tree.next_sibling(start);
        while let Some(node) = current {
            if node == end {
                break;
            }
            text.push_str(&tree.text_content(node));
            current = tree.next_sibling(node);
        }
        Some(text)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn vtree(&self) -> &VTree {
        &self.vtree
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

//! Partial Navigator
//!
//! Turns clicks on partial-enabled anchors into a history push, a fetch of
//! the partial URL, and an in-place swap of every named region the
//! response carries. Anything unexpected about the response falls back to
//! an ordinary full navigation.

use crate::config::RuntimeConfig;
use crate::events::{ClickEvent, MouseButton};
use crate::marker::{self, MarkerToken};
use crate::registry::RegionRegistry;
use crate::session::PageSession;
use crate::walker::hide_marker;
use crate::RuntimeResult;
use frsh_dom::{Document, DomError, DomTree, NodeId};
use frsh_html::HtmlParser;
use frsh_net::{Fetch, FetchResponse, Request};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Navigation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    #[default]
    Idle,
    Intercepted,
    Fetching,
    Applying,
    FallbackNavigating,
}

/// Why a partial navigation became a full one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Network(String),
    Status(u16),
    ContentType(Option<String>),
    Body(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Network(e) => write!(f, "network error: {}", e),
            FallbackReason::Status(status) => write!(f, "status {}", status),
            FallbackReason::ContentType(Some(ct)) => write!(f, "unexpected content type {:?}", ct),
            FallbackReason::ContentType(None) => write!(f, "missing content type"),
            FallbackReason::Body(e) => write!(f, "unreadable body: {}", e),
        }
    }
}

/// Why a region in the response was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownRegion,
    MissingBoundary,
}

/// What a swap did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapReport {
    /// Regions replaced, in response order
    pub applied: Vec<String>,
    /// Regions nested inside an applied region, re-registered as they came in
    pub carried: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    /// Regions removed along with an enclosing region that the response
    /// did not bring back
    pub orphaned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Not a partial navigation; the host handles the click as usual
    Ignored,
    Applied(SwapReport),
    /// The host must load `url` as a normal page
    FullNavigation { url: Url, reason: FallbackReason },
}

/// An intercepted click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interception {
    /// Destination shown in the address bar
    pub href: Url,
    /// Where the fragment is fetched from
    pub partial_url: Url,
}

/// A region found in a partial response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRegion {
    pub name: String,
    pub start: NodeId,
    pub end: NodeId,
}

/// Decide whether a click starts a partial navigation
pub fn intercept(document: &Document, location: &Url, config: &RuntimeConfig, event: &ClickEvent) -> Option<Interception> {
    if event.default_prevented() || event.button != MouseButton::Primary || event.any_modifier() {
        return None;
    }

    let tree = document.tree();
    let anchor = tree.closest(event.target, "a")?;
    let partial = tree.get_attribute(anchor, &config.partial_attribute).filter(|p| !p.is_empty())?;
    let href = tree.get_attribute(anchor, "href").filter(|h| !h.is_empty())?;

    let target = tree.get_attribute(anchor, "target").unwrap_or("");
    if !target.is_empty() && !target.eq_ignore_ascii_case("_self") {
        return None;
    }

    let href = location.join(href).ok()?;
    if href.origin() != location.origin() {
        tracing::debug!("Not intercepting cross-origin link to {}", href);
        return None;
    }

    let origin = Url::parse(&location.origin().ascii_serialization()).ok()?;
    let mut partial_url = origin.join(partial).ok()?;
    set_query_param(&mut partial_url, &config.partial_query_param, "true");

    Some(Interception { href, partial_url })
}

fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs).append_pair(key, value);
}

/// Validate a partial response and parse it
pub fn parse_partial(response: &FetchResponse, url: &Url, config: &RuntimeConfig) -> Result<Document, FallbackReason> {
    if !response.ok() {
        return Err(FallbackReason::Status(response.status()));
    }

    let content_type = response.header("content-type");
    if content_type != Some(config.fragment_content_type.as_str()) {
        return Err(FallbackReason::ContentType(content_type.map(str::to_string)));
    }

    let body = response.text().map_err(|e| FallbackReason::Body(e.to_string()))?;
    HtmlParser::new()
        .parse_with_url(body, url.as_str())
        .map_err(|e| FallbackReason::Body(e.to_string()))
}

/// Partial regions of a response body in document order (outer before inner)
pub fn collect_regions(fragment: &Document) -> Vec<FragmentRegion> {
    let tree = fragment.tree();
    let mut open: Vec<(String, NodeId, usize)> = Vec::new();
    let mut found: Vec<Option<FragmentRegion>> = Vec::new();

    for node in tree.descendants(fragment.body()) {
        let Some(text) = tree.get(node).and_then(|n| n.as_comment()) else {
            continue;
        };
        match marker::classify(text, None) {
            MarkerToken::OpenPartial(name) => {
                open.push((name, node, found.len()));
                found.push(None);
            }
            MarkerToken::ClosePartial(name) => {
                let Some(position) = open.iter().rposition(|(n, _, _)| *n == name) else {
                    tracing::debug!("Unmatched close for partial \"{}\" in response", name);
                    continue;
                };
                let (name, start, slot) = open.remove(position);
                if tree.parent(start) != tree.parent(node) {
                    tracing::warn!("Partial \"{}\" boundaries are not siblings in response", name);
                    continue;
                }
                found[slot] = Some(FragmentRegion { name, start, end: node });
            }
            _ => {}
        }
    }

    found.into_iter().flatten().collect()
}

/// Swap every region of `fragment` into the live tree
pub fn apply_regions(
    tree: &mut DomTree,
    registry: &mut RegionRegistry,
    fragment: &Document,
    keep_comments: bool,
) -> RuntimeResult<SwapReport> {
    let source = fragment.tree();
    let mut imported: HashMap<NodeId, NodeId> = HashMap::new();
    let mut removed_regions: Vec<String> = Vec::new();
    let mut report = SwapReport::default();

    for region in collect_regions(fragment) {
        // Already inserted along with an enclosing region
        if let (Some(&start), Some(&end)) = (imported.get(&region.start), imported.get(&region.end)) {
            let start = hide_marker(tree, start, keep_comments)?;
            let end = hide_marker(tree, end, keep_comments)?;
            registry.rebind(&region.name, start, end);
            report.carried.push(region.name);
            continue;
        }

        let Some(known) = registry.get(&region.name) else {
            tracing::error!("Unknown partial \"{}\"", region.name);
            report.skipped.push((region.name, SkipReason::UnknownRegion));
            continue;
        };
        let Some((start, end)) = known.live_boundaries(tree) else {
            tracing::error!("Partial \"{}\" has no live boundaries", region.name);
            report.skipped.push((region.name, SkipReason::MissingBoundary));
            continue;
        };
        let parent = tree.parent(start).ok_or(DomError::NotFound(start))?;

        let mut current = tree.next_sibling(start);
        while let Some(node) = current {
            if node == end {
                break;
            }
            current = tree.next_sibling(node);
            for removed in std::iter::once(node).chain(tree.descendants(node)) {
                if let Some(nested) = registry.by_marker(removed) {
                    removed_regions.push(nested.name.clone());
                }
            }
            tree.remove(node);
        }

        let mut current = source.next_sibling(region.start);
        while let Some(node) = current {
            if node == region.end {
                break;
            }
            let copy = tree.import_subtree(source, node)?;
            tree.insert_before(parent, copy, Some(end))?;
            imported.insert(node, copy);
            imported.extend(source.descendants(node).into_iter().zip(tree.descendants(copy)));
            current = source.next_sibling(node);
        }

        tracing::debug!("Swapped partial \"{}\"", region.name);
        report.applied.push(region.name);
    }

    for name in removed_regions {
        let live = registry.get(&name).is_some_and(|r| r.live_boundaries(tree).is_some());
        if !live && !report.orphaned.contains(&name) {
            tracing::warn!("Partial \"{}\" was removed with its enclosing region", name);
            report.orphaned.push(name);
        }
    }

    Ok(report)
}

/// Run a click through the partial navigation state machine
pub(crate) async fn navigate<F: Fetch>(
    session: &mut PageSession,
    event: &mut ClickEvent,
    fetcher: &F,
) -> RuntimeResult<NavigationOutcome> {
    let Some(Interception { href, partial_url }) =
        intercept(&session.document, &session.location, &session.config, event)
    else {
        return Ok(NavigationOutcome::Ignored);
    };

    session.transition(NavState::Intercepted);
    event.prevent_default();
    let state = session.history.push_state(href.clone());
    session.location = href.clone();
    tracing::info!("Partial navigation to {} (history index {})", href, state.index);

    session.transition(NavState::Fetching);
    let request = Request::get(partial_url.as_str()).with_header("Accept", "text/html");
    let fragment = match fetcher.fetch(request).await {
        Ok(response) => parse_partial(&response, &partial_url, &session.config),
        Err(e) => Err(FallbackReason::Network(e.to_string())),
    };

    let fragment = match fragment {
        Ok(fragment) => fragment,
        Err(reason) => {
            tracing::warn!("Partial request {} failed ({}), loading {} instead", partial_url, reason, href);
            session.transition(NavState::FallbackNavigating);
            session.pending_navigation = Some(href.clone());
            return Ok(NavigationOutcome::FullNavigation { url: href, reason });
        }
    };

    session.transition(NavState::Applying);
    let result = apply_regions(
        &mut session.document.tree,
        &mut session.registry,
        &fragment,
        session.config.keep_comments,
    );
    session.transition(NavState::Idle);

    let report = result?;
    tracing::info!(
        "Applied {} partial regions ({} carried, {} skipped)",
        report.applied.len(),
        report.carried.len(),
        report.skipped.len()
    );
    Ok(NavigationOutcome::Applied(report))
}

//! Integration tests - server HTML to revived islands and partial swaps
//!
//! Pages are parsed, revived, activated with a small counter renderer,
//! then navigated through a stub fetcher.

use frsh_dom::{DomTree, NodeId};
use frsh_net::{Fetch, FetchResponse, NetError, Request, Url};
use frsh_runtime::{
    ClickEvent, FragmentParent, IslandCatalog, IslandProps, NamedComponent, NavState, NavigationOutcome,
    PageSession, Renderer, RootFragment, RuntimeConfig, RuntimeError, RuntimeResult, SkipReason, VNodeId,
    VNodeKind, VTree,
};
use std::cell::RefCell;
use std::collections::HashMap;

// ============================================================================
// HELPERS
// ============================================================================

const ORIGIN: &str = "http://localhost:8000";

/// Answers requests by path; unknown paths get a 404
#[derive(Default)]
struct StubFetch {
    routes: HashMap<String, FetchResponse>,
    requests: RefCell<Vec<String>>,
    accepts: RefCell<Vec<Option<String>>>,
}

impl StubFetch {
    fn route(mut self, path: &str, response: FetchResponse) -> Self {
        self.routes.insert(path.to_string(), response);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetch for StubFetch {
    async fn fetch(&self, request: Request) -> Result<FetchResponse, NetError> {
        self.requests.borrow_mut().push(request.url.clone());
        self.accepts.borrow_mut().push(request.headers.get("Accept").cloned());
        let url = Url::parse(&request.url).map_err(|e| NetError::InvalidUrl(e.to_string()))?;
        Ok(self
            .routes
            .get(url.path())
            .cloned()
            .unwrap_or_else(|| FetchResponse::new(404, vec![], "not found")))
    }
}

/// Always fails at the transport level
struct OfflineFetch;

impl Fetch for OfflineFetch {
    async fn fetch(&self, _request: Request) -> Result<FetchResponse, NetError> {
        Err(NetError::Network("connection refused".into()))
    }
}

fn html(body: &str) -> FetchResponse {
    FetchResponse::new(200, vec![("Content-Type".into(), "text/html; charset=utf-8".into())], body)
}

struct Counter {
    button: NodeId,
    output_text: NodeId,
    count: i64,
}

/// Hydrates `Counter` islands in place: adopts the server `<button>` and
/// `#output`, and keeps the count on the renderer side
#[derive(Default)]
struct CounterRenderer {
    counters: Vec<Counter>,
    rendered: Vec<String>,
}

impl Renderer for CounterRenderer {
    fn render(&mut self, vtree: &VTree, vnode: VNodeId, root: &mut RootFragment<'_>) -> RuntimeResult<()> {
        let Some(VNodeKind::Island { component: Some(component), props, .. }) = vtree.get(vnode).map(|n| &n.kind)
        else {
            self.rendered.push("partial".into());
            return Ok(());
        };
        self.rendered.push(component.name().to_string());
        if component.name() != "Counter" {
            return Ok(());
        }

        let tree = root.tree();
        let mut button = None;
        let mut output = None;
        for &child in root.child_nodes() {
            for node in std::iter::once(child).chain(tree.descendants(child)) {
                if button.is_none() && tree.tag_name(node) == Some("button") {
                    button = Some(node);
                }
                if output.is_none() && tree.get_attribute(node, "id") == Some("output") {
                    output = tree.first_child(node);
                }
            }
        }
        let (Some(button), Some(output_text)) = (button, output) else {
            return Err(RuntimeError::Render("counter markup missing".into()));
        };

        let count = props.get("count").and_then(|c| c.as_i64()).unwrap_or(0);
        root.tree_mut().set_text(output_text, &count.to_string())?;
        self.counters.push(Counter { button, output_text, count });
        Ok(())
    }
}

impl CounterRenderer {
    /// Dispatch a click to the counter owning `target`
    fn click(&mut self, tree: &mut DomTree, target: NodeId) -> bool {
        for counter in &mut self.counters {
            if tree.contains(counter.button, target) {
                counter.count += 1;
                let _ = tree.set_text(counter.output_text, &counter.count.to_string());
                return true;
            }
        }
        false
    }
}

fn catalog() -> IslandCatalog {
    IslandCatalog::new().with("counter", "default", NamedComponent::new("Counter"))
}

fn session(page: &str, path: &str) -> PageSession {
    let url = format!("{ORIGIN}{path}");
    let mut session = PageSession::from_html(page, &url, RuntimeConfig::default())
        .unwrap()
        .with_islands(catalog())
        .with_props(IslandProps::from_json(r#"[{"count": 0}]"#).unwrap());
    session.revive().unwrap();
    session
}

fn first_tag(session: &PageSession, tag: &str) -> NodeId {
    let tree = session.document().tree();
    tree.get_elements_by_tag_name(tree.root(), tag)[0]
}

fn output_text(session: &PageSession) -> String {
    let output = session.document().get_element_by_id("output").unwrap();
    session.document().tree().text_content(output)
}

fn click_link(session: &mut PageSession, fetch: &impl Fetch) -> (NavigationOutcome, ClickEvent) {
    let link = first_tag(session, "a");
    let mut event = ClickEvent::new(link);
    let outcome = smol::block_on(session.handle_click(&mut event, fetch)).unwrap();
    (outcome, event)
}

const NO_ISLANDS: &str = r#"<!DOCTYPE html>
<html><head><title>No islands</title></head><body>
<a href="/no_islands/injected" fh-partial="/no_islands/injected">update</a>
<!--frsh-partial:slot-1--><p class="output">Default content</p><!--/frsh-partial:slot-1-->
</body></html>"#;

const NO_ISLANDS_INJECTED: &str = r#"<!DOCTYPE html>
<html><head><title>No islands</title></head><body>
<!--frsh-partial:slot-1--><p class="output">it works</p><!--/frsh-partial:slot-1-->
</body></html>"#;

const ISLAND_STATE: &str = r#"<!DOCTYPE html>
<html><head><title>Island state</title></head><body>
<!--frsh-counter:default:0--><div class="island"><p id="output">0</p><button>update</button></div><!--/frsh-counter:default:0-->
<a href="/island_state/injected" fh-partial="/island_state/injected">swap</a>
<!--frsh-partial:slot-1--><p>Default content</p><!--/frsh-partial:slot-1-->
</body></html>"#;

const ISLAND_STATE_INJECTED: &str = r#"<html><body>
<!--frsh-partial:slot-1--><p>it works</p><!--/frsh-partial:slot-1-->
</body></html>"#;

// ============================================================================
// SWAP SCENARIOS
// ============================================================================

#[test]
fn test_swap_without_islands() {
    let mut session = session(NO_ISLANDS, "/no_islands");
    assert_eq!(session.region_text("slot-1").as_deref(), Some("Default content"));

    let fetch = StubFetch::default().route("/no_islands/injected", html(NO_ISLANDS_INJECTED));
    let (outcome, event) = click_link(&mut session, &fetch);

    let NavigationOutcome::Applied(report) = outcome else {
        panic!("expected a swap, got {outcome:?}");
    };
    assert_eq!(report.applied, vec!["slot-1"]);
    assert!(event.default_prevented());
    assert_eq!(session.region_text("slot-1").as_deref(), Some("it works"));

    let expected = format!("{ORIGIN}/no_islands/injected");
    assert_eq!(session.location().as_str(), expected);
    assert_eq!(session.history().current().url.as_str(), expected);
    assert_eq!(session.history().current().state.map(|s| s.index), Some(1));
    assert_eq!(fetch.requests(), vec![format!("{expected}?fresh-partial=true")]);
    assert_eq!(*fetch.accepts.borrow(), vec![Some("text/html".to_string())]);
    assert_eq!(session.nav_state(), NavState::Idle);
}

#[test]
fn test_island_state_survives_swap() {
    let mut session = session(ISLAND_STATE, "/island_state");
    let mut renderer = CounterRenderer::default();
    assert_eq!(session.run_activations(&mut renderer), 2);
    assert_eq!(renderer.rendered, vec!["Counter", "partial"]);
    assert_eq!(output_text(&session), "0");

    let button = first_tag(&session, "button");
    assert!(renderer.click(session.document_mut().tree_mut(), button));
    assert_eq!(output_text(&session), "1");

    let fetch = StubFetch::default().route("/island_state/injected", html(ISLAND_STATE_INJECTED));
    let (outcome, _) = click_link(&mut session, &fetch);
    assert!(matches!(outcome, NavigationOutcome::Applied(_)));

    assert_eq!(session.region_text("slot-1").as_deref(), Some("it works"));
    assert_eq!(output_text(&session), "1");
    assert!(session.document().tree().is_connected(button));

    // The adopted button still drives the same counter
    assert!(renderer.click(session.document_mut().tree_mut(), button));
    assert_eq!(output_text(&session), "2");
}

#[test]
fn test_swap_preserves_region_order() {
    let page = r#"<html><body>
        <a href="/next" fh-partial="/next">go</a>
        <!--frsh-partial:a--><p>a0</p><!--/frsh-partial:a-->
        <!--frsh-partial:b--><p>b0</p><!--/frsh-partial:b-->
        <!--frsh-partial:c--><p>c0</p><!--/frsh-partial:c-->
    </body></html>"#;
    let response = r#"<html><body>
        <!--frsh-partial:c--><p>c1</p><!--/frsh-partial:c-->
        <!--frsh-partial:zzz--><p>?</p><!--/frsh-partial:zzz-->
        <!--frsh-partial:a--><p>a1</p><!--/frsh-partial:a-->
    </body></html>"#;

    let mut session = session(page, "/");
    let fetch = StubFetch::default().route("/next", html(response));
    let (outcome, _) = click_link(&mut session, &fetch);

    let NavigationOutcome::Applied(report) = outcome else {
        panic!("expected a swap, got {outcome:?}");
    };
    assert_eq!(report.applied, vec!["c", "a"]);
    assert_eq!(report.skipped, vec![("zzz".to_string(), SkipReason::UnknownRegion)]);

    let body = session.document().body();
    let text: String = session.document().tree().text_content(body).split_whitespace().collect();
    assert_eq!(text, "goa1b0c1");
}

#[test]
fn test_reapplying_same_content_is_stable() {
    let mut session = session(NO_ISLANDS, "/no_islands");
    let before = session.region_html("slot-1").unwrap();

    let same = NO_ISLANDS.replace("<a href=\"/no_islands/injected\" fh-partial=\"/no_islands/injected\">update</a>", "");
    let fetch = StubFetch::default().route("/no_islands/injected", html(&same));

    click_link(&mut session, &fetch);
    assert_eq!(session.region_html("slot-1").unwrap(), before);
    click_link(&mut session, &fetch);
    assert_eq!(session.region_html("slot-1").unwrap(), before);
    assert_eq!(session.history().length(), 3);
}

#[test]
fn test_nested_region_is_carried_and_rebound() {
    let page = r#"<html><body>
        <a href="/next" fh-partial="/next">go</a>
        <!--frsh-partial:outer--><div><!--frsh-partial:inner--><p>old inner</p><!--/frsh-partial:inner--></div><!--/frsh-partial:outer-->
    </body></html>"#;
    let response = r#"<html><body>
        <!--frsh-partial:outer--><div><!--frsh-partial:inner--><p>new inner</p><!--/frsh-partial:inner--></div><!--/frsh-partial:outer-->
    </body></html>"#;
    let inner_only = r#"<html><body><!--frsh-partial:inner--><p>third</p><!--/frsh-partial:inner--></body></html>"#;

    let mut session = session(page, "/");
    let fetch = StubFetch::default().route("/next", html(response));
    let (outcome, _) = click_link(&mut session, &fetch);

    let NavigationOutcome::Applied(report) = outcome else {
        panic!("expected a swap, got {outcome:?}");
    };
    assert_eq!(report.applied, vec!["outer"]);
    assert_eq!(report.carried, vec!["inner"]);
    assert!(report.orphaned.is_empty());
    assert_eq!(session.region_text("inner").as_deref(), Some("new inner"));

    let fetch = StubFetch::default().route("/next", html(inner_only));
    click_link(&mut session, &fetch);
    assert_eq!(session.region_text("inner").as_deref(), Some("third"));
    assert_eq!(session.region_text("outer").as_deref(), Some("third"));
}

#[test]
fn test_nested_region_missing_from_response_is_orphaned() {
    let page = r#"<html><body>
        <a href="/next" fh-partial="/next">go</a>
        <!--frsh-partial:outer--><div><!--frsh-partial:inner--><p>old inner</p><!--/frsh-partial:inner--></div><!--/frsh-partial:outer-->
    </body></html>"#;
    let response = r#"<html><body><!--frsh-partial:outer--><p>flat</p><!--/frsh-partial:outer--></body></html>"#;

    let mut session = session(page, "/");
    let fetch = StubFetch::default().route("/next", html(response));
    let (outcome, _) = click_link(&mut session, &fetch);

    let NavigationOutcome::Applied(report) = outcome else {
        panic!("expected a swap, got {outcome:?}");
    };
    assert_eq!(report.applied, vec!["outer"]);
    assert_eq!(report.orphaned, vec!["inner"]);
    assert_eq!(session.region_text("outer").as_deref(), Some("flat"));
    assert!(session.region_text("inner").is_none());
}

// ============================================================================
// FALLBACKS
// ============================================================================

#[test]
fn test_not_found_falls_back() {
    let mut session = session(NO_ISLANDS, "/no_islands");
    let (outcome, event) = click_link(&mut session, &StubFetch::default());

    let expected = Url::parse(&format!("{ORIGIN}/no_islands/injected")).unwrap();
    assert!(event.default_prevented());
    match outcome {
        NavigationOutcome::FullNavigation { url, reason } => {
            assert_eq!(url, expected);
            assert_eq!(reason.to_string(), "status 404");
        }
        other => panic!("expected fallback, got {other:?}"),
    }

    assert_eq!(session.region_text("slot-1").as_deref(), Some("Default content"));
    assert_eq!(session.nav_state(), NavState::FallbackNavigating);
    assert_eq!(session.take_full_navigation(), Some(expected));
    assert_eq!(session.nav_state(), NavState::Idle);
    assert_eq!(session.take_full_navigation(), None);
}

#[test]
fn test_wrong_content_type_falls_back() {
    let mut session = session(NO_ISLANDS, "/no_islands");
    let json = FetchResponse::new(200, vec![("content-type".into(), "application/json".into())], "{}");
    let fetch = StubFetch::default().route("/no_islands/injected", json);

    let (outcome, _) = click_link(&mut session, &fetch);
    assert!(matches!(outcome, NavigationOutcome::FullNavigation { .. }));
    assert_eq!(session.region_text("slot-1").as_deref(), Some("Default content"));
}

#[test]
fn test_network_error_falls_back() {
    let mut session = session(NO_ISLANDS, "/no_islands");
    let (outcome, _) = click_link(&mut session, &OfflineFetch);
    let NavigationOutcome::FullNavigation { reason, .. } = outcome else {
        panic!("expected fallback, got {outcome:?}");
    };
    assert!(reason.to_string().contains("connection refused"));
}

#[test]
fn test_missing_live_boundary_skips_region() {
    let mut session = session(NO_ISLANDS, "/no_islands");
    let end = session.registry().get("slot-1").unwrap().end_marker;
    session.document_mut().tree_mut().remove(end);

    let fetch = StubFetch::default().route("/no_islands/injected", html(NO_ISLANDS_INJECTED));
    let (outcome, _) = click_link(&mut session, &fetch);
    let NavigationOutcome::Applied(report) = outcome else {
        panic!("expected a swap, got {outcome:?}");
    };
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, vec![("slot-1".to_string(), SkipReason::MissingBoundary)]);
}

#[test]
fn test_plain_click_is_ignored() {
    let mut session = session(ISLAND_STATE, "/island_state");
    let button = first_tag(&session, "button");
    let mut event = ClickEvent::new(button);
    let fetch = StubFetch::default();

    let outcome = smol::block_on(session.handle_click(&mut event, &fetch)).unwrap();
    assert_eq!(outcome, NavigationOutcome::Ignored);
    assert!(!event.default_prevented());
    assert!(fetch.requests().is_empty());
    assert_eq!(session.history().length(), 1);
}

// ============================================================================
// SESSIONS AND ROOT FRAGMENTS
// ============================================================================

#[test]
fn test_sessions_are_independent() {
    let mut first = session(NO_ISLANDS, "/no_islands");
    let second = session(NO_ISLANDS, "/no_islands");

    let fetch = StubFetch::default().route("/no_islands/injected", html(NO_ISLANDS_INJECTED));
    click_link(&mut first, &fetch);

    assert_eq!(first.region_text("slot-1").as_deref(), Some("it works"));
    assert_eq!(second.region_text("slot-1").as_deref(), Some("Default content"));
    assert_eq!(second.history().length(), 1);
}

/// Replaces whatever the server rendered with its own markup
struct ReplacingRenderer;

impl Renderer for ReplacingRenderer {
    fn render(&mut self, _vtree: &VTree, _vnode: VNodeId, root: &mut RootFragment<'_>) -> RuntimeResult<()> {
        for node in root.child_nodes().to_vec() {
            root.remove_child(node)?;
        }
        let em = root.tree_mut().create_element("em");
        let text = root.tree_mut().create_text("client");
        root.tree_mut().append_child(em, text)?;
        root.append_child(em)?;
        Ok(())
    }
}

#[test]
fn test_renderer_stays_inside_its_range() {
    let page = r#"<html><body><p>before</p><!--frsh-counter:default:0--><b>server</b><!--/frsh-counter:default:0--><p>after</p></body></html>"#;
    let mut session = session(page, "/");
    session.run_activations(&mut ReplacingRenderer);

    let body = session.document().body();
    let text = session.document().tree().text_content(body);
    assert_eq!(text, "beforeclientafter");
}

//! Edge case tests for revival
//!
//! Malformed, legacy and unusual marker layouts.

use frsh_runtime::{
    IslandCatalog, IslandProps, NamedComponent, PageSession, Renderer, RootFragment, RuntimeConfig, RuntimeResult,
    VChild, VNodeId, VNodeKind, VTree,
};

fn session_with(body: &str, config: RuntimeConfig) -> PageSession {
    let page = format!("<html><head></head><body>{body}</body></html>");
    PageSession::from_html(&page, "http://localhost:8000/", config)
        .unwrap()
        .with_islands(
            IslandCatalog::new()
                .with("counter", "default", NamedComponent::new("Counter"))
                .with("panel", "default", NamedComponent::new("Panel")),
        )
        .with_props(IslandProps::from_json(r#"[{"count": 0}, {"title": "p"}]"#).unwrap())
}

fn session(body: &str) -> PageSession {
    session_with(body, RuntimeConfig::default())
}

fn comment_count(session: &PageSession) -> usize {
    let tree = session.document().tree();
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&n| tree.get(n).is_some_and(|node| node.is_comment()))
        .count()
}

/// Records the island names it is asked to render
#[derive(Default)]
struct NameRecorder(Vec<String>);

impl Renderer for NameRecorder {
    fn render(&mut self, vtree: &VTree, vnode: VNodeId, _root: &mut RootFragment<'_>) -> RuntimeResult<()> {
        let name = match vtree.get(vnode).map(|n| &n.kind) {
            Some(VNodeKind::Island { component: Some(c), .. }) => c.name().to_string(),
            Some(VNodeKind::PartialSlot { name }) => format!("partial:{name}"),
            _ => "?".to_string(),
        };
        self.0.push(name);
        Ok(())
    }
}

// ============================================================================
// EMPTY AND PLAIN PAGES
// ============================================================================

#[test]
fn test_empty_body() {
    let mut s = session("");
    let report = s.revive().unwrap();
    assert_eq!(report.islands_scheduled, 0);
    assert_eq!(report.regions, 0);
    assert_eq!(s.pending_activations(), 0);
}

#[test]
fn test_page_without_markers() {
    let mut s = session("<div><p>Hello <b>world</b></p><!-- build 42 --></div>");
    let report = s.revive().unwrap();
    assert_eq!(report.dropped_markers, 0);
    assert_eq!(comment_count(&s), 1);
    assert!(s.vtree().children(report.root).is_unset());
}

#[test]
fn test_revive_twice_is_harmless() {
    let mut s = session("<!--frsh-counter:default:0--><p>x</p><!--/frsh-counter:default:0-->");
    assert_eq!(s.revive().unwrap().islands_scheduled, 1);
    // Markers are hidden after the first scan
    assert_eq!(s.revive().unwrap().islands_scheduled, 0);
    assert_eq!(s.pending_activations(), 1);
}

// ============================================================================
// MARKER BALANCE
// ============================================================================

#[test]
fn test_stray_close_markers() {
    let mut s = session("<!--/frsh-counter:default:0--><p>a</p><!--/frsh-partial:nowhere--><p>b</p>");
    let report = s.revive().unwrap();
    assert_eq!(report.islands_scheduled, 0);
    assert_eq!(report.dropped_markers, 0);
    assert!(s.registry().is_empty());
    assert_eq!(comment_count(&s), 2);
}

#[test]
fn test_unclosed_island_at_top_level() {
    let mut s = session("<!--frsh-counter:default:0--><p>a</p>");
    let report = s.revive().unwrap();
    assert_eq!(report.dropped_markers, 1);
    assert_eq!(s.pending_activations(), 0);
}

#[test]
fn test_marker_split_across_elements() {
    // Open inside one element, close inside a sibling: never balanced
    let mut s = session("<div><!--frsh-counter:default:0--></div><div><!--/frsh-counter:default:0--></div>");
    let report = s.revive().unwrap();
    assert_eq!(report.dropped_markers, 1);
    assert_eq!(report.islands_scheduled, 0);
}

#[test]
fn test_close_marker_inside_deeper_element() {
    let mut s = session("<!--frsh-counter:default:0--><div><b>island</b><!--/frsh-counter:default:0--></div><p>after</p>");
    let report = s.revive().unwrap();
    assert_eq!(report.islands_scheduled, 0);
    assert_eq!(report.dropped_markers, 1);
    assert_eq!(s.pending_activations(), 0);
    // Neither comment is treated as a marker boundary, so both stay
    assert_eq!(comment_count(&s), 2);
}

#[test]
fn test_partial_close_inside_deeper_element() {
    let mut s = session("<!--frsh-partial:main--><div><p>a</p><!--/frsh-partial:main--></div><p>after</p>");
    let report = s.revive().unwrap();
    assert_eq!(report.partials_scheduled, 0);
    assert_eq!(report.dropped_markers, 1);
    assert!(!s.registry().get("main").unwrap().is_closed());
    assert!(s.region_text("main").is_none());
}

#[test]
fn test_island_without_children_or_template() {
    let mut s = session("<!--frsh-counter:default:0--><!--/frsh-counter:default:0--><p>after</p>");
    let report = s.revive().unwrap();
    assert_eq!(report.islands_scheduled, 1);

    let island = s
        .vtree()
        .children(report.root)
        .iter()
        .find_map(|child| match child {
            VChild::Node(id) => Some(*id),
            VChild::Text(_) => None,
        })
        .unwrap();
    assert!(s.vtree().children(island).is_empty());

    let mut recorder = NameRecorder::default();
    assert_eq!(s.run_activations(&mut recorder), 1);
    assert_eq!(recorder.0, vec!["Counter"]);
}

#[test]
fn test_deeply_nested_slots() {
    let mut body = String::new();
    for _ in 0..20 {
        body.push_str("<div>");
    }
    body.push_str("<span>deep</span>");
    for _ in 0..20 {
        body.push_str("</div>");
    }
    let page = format!(
        "<!--frsh-panel:default:1--><!--frsh-slot:children-->{body}<!--/frsh-slot:children--><!--/frsh-panel:default:1-->"
    );

    let mut s = session(&page);
    let report = s.revive().unwrap();
    assert_eq!(report.islands_scheduled, 1);
    let dump = s.vtree().dump(report.root);
    assert_eq!(dump.matches("<div>").count(), 20);
    assert!(dump.contains("\"deep\""));
}

#[test]
fn test_activation_order_follows_document_order() {
    let mut s = session(
        "<!--frsh-partial:top--><p>t</p><!--/frsh-partial:top-->\
         <section><!--frsh-counter:default:0--><b>1</b><!--/frsh-counter:default:0--></section>\
         <!--frsh-panel:default:1--><i>2</i><!--/frsh-panel:default:1-->",
    );
    s.revive().unwrap();

    let mut recorder = NameRecorder::default();
    s.run_activations(&mut recorder);
    assert_eq!(recorder.0, vec!["partial:top", "Counter", "Panel"]);
}

#[test]
fn test_pump_one_at_a_time() {
    let mut s = session(
        "<!--frsh-counter:default:0--><b>1</b><!--/frsh-counter:default:0-->\
         <!--frsh-panel:default:1--><i>2</i><!--/frsh-panel:default:1-->",
    );
    s.revive().unwrap();

    let mut recorder = NameRecorder::default();
    assert!(s.run_next_activation(&mut recorder));
    assert_eq!(recorder.0, vec!["Counter"]);
    assert_eq!(s.pending_activations(), 1);
    assert!(s.run_next_activation(&mut recorder));
    assert!(!s.run_next_activation(&mut recorder));
}

// ============================================================================
// REGIONS
// ============================================================================

#[test]
fn test_duplicate_region_names_keep_last() {
    let mut s = session(
        "<!--frsh-partial:main--><p>first</p><!--/frsh-partial:main-->\
         <!--frsh-partial:main--><p>second</p><!--/frsh-partial:main-->",
    );
    s.revive().unwrap();
    assert_eq!(s.registry().len(), 1);
    assert_eq!(s.region_text("main").as_deref(), Some("second"));
}

#[test]
fn test_unclosed_region_has_no_boundaries() {
    let mut s = session("<!--frsh-partial:main--><p>open</p>");
    let report = s.revive().unwrap();
    assert_eq!(report.dropped_markers, 1);
    assert!(!s.registry().get("main").unwrap().is_closed());
    assert!(s.region_text("main").is_none());
}

#[test]
fn test_empty_region() {
    let mut s = session("<!--frsh-partial:empty--><!--/frsh-partial:empty-->");
    s.revive().unwrap();
    assert_eq!(s.region_text("empty").as_deref(), Some(""));
    assert_eq!(s.region_html("empty").as_deref(), Some(""));
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_keep_comments_from_config() {
    let config = RuntimeConfig::from_json(r#"{"keep_comments": true}"#).unwrap();
    let mut s = session_with("<!--frsh-partial:main--><p>a</p><!--/frsh-partial:main-->", config);
    s.revive().unwrap();
    assert_eq!(comment_count(&s), 2);
    assert_eq!(s.region_text("main").as_deref(), Some("a"));
}

#[test]
fn test_custom_partial_attribute() {
    let config = RuntimeConfig::from_json(r#"{"partial_attribute": "data-partial"}"#).unwrap();
    let s = session_with(r#"<a href="/x" data-partial="/x">x</a>"#, config);
    let tree = s.document().tree();
    let a = tree.get_elements_by_tag_name(tree.root(), "a")[0];

    let hit = frsh_runtime::intercept(s.document(), s.location(), s.config(), &frsh_runtime::ClickEvent::new(a));
    assert!(hit.is_some());
}

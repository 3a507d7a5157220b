//! frsh Inspect - Main Entry Point
//!
//! Revives a server-rendered page and prints the virtual tree, the partial
//! regions and, with `--follow`, the result of a partial navigation.
//!
//! ```text
//! frsh-inspect <page.html | http(s)://url> [props.json] [--follow <href>]
//! ```
//!
//! Environment:
//! - `RUST_LOG`: log filter (default `info`)
//! - `FRSH_CONFIG`: path to a JSON runtime config
//! - `FRSH_KEEP_COMMENTS`: keep marker comments in the DOM
//! - `FRSH_BASE_URL`: page URL for local files (default `http://localhost:8000/`)

use anyhow::{Context, Result, bail};
use frsh_dom::Document;
use frsh_net::{Fetch, HttpFetcher, Request};
use frsh_runtime::marker::{self, MarkerToken};
use frsh_runtime::{
    ClickEvent, FragmentParent, IslandCatalog, IslandProps, NamedComponent, NavigationOutcome, PageSession,
    Renderer, RootFragment, RuntimeConfig, RuntimeResult, VNodeId, VNodeKind, VTree,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

struct Args {
    source: String,
    props: Option<String>,
    follow: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut source = None;
    let mut props = None;
    let mut follow = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--follow" {
            follow = Some(args.next().context("--follow needs an href")?);
        } else if source.is_none() {
            source = Some(arg);
        } else if props.is_none() {
            props = Some(arg);
        } else {
            bail!("unexpected argument: {}", arg);
        }
    }

    let Some(source) = source else {
        bail!("usage: frsh-inspect <page.html | url> [props.json] [--follow <href>]");
    };
    Ok(Args { source, props, follow })
}

fn load_config() -> Result<RuntimeConfig> {
    let mut config = match std::env::var("FRSH_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading config {}", path))?;
            RuntimeConfig::from_json(&json)?
        }
        Err(_) => RuntimeConfig::default(),
    };
    if std::env::var_os("FRSH_KEEP_COMMENTS").is_some() {
        config.keep_comments = true;
    }
    Ok(config)
}

/// Read a page from disk or over HTTP; returns the HTML and its URL
fn load_page(source: &str, fetcher: &HttpFetcher) -> Result<(String, String)> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = smol::block_on(fetcher.fetch(Request::get(source)))?;
        if !response.ok() {
            bail!("{} returned status {}", source, response.status());
        }
        return Ok((response.text()?.to_string(), source.to_string()));
    }

    let html = std::fs::read_to_string(source).with_context(|| format!("reading {}", source))?;
    let url = std::env::var("FRSH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    Ok((html, url))
}

/// Register a placeholder component for every island marker on the page
fn discover_islands(document: &Document) -> IslandCatalog {
    let tree = document.tree();
    let mut catalog = IslandCatalog::new();
    for node in tree.descendants(tree.root()) {
        let Some(text) = tree.get(node).and_then(|n| n.as_comment()) else {
            continue;
        };
        if let MarkerToken::Island(island) = marker::classify(text, None) {
            let name = format!("{}/{}", island.id, island.export_name);
            catalog.register(&island.id, &island.export_name, NamedComponent::new(&name));
        }
    }
    catalog
}

/// Logs activations without touching the DOM
#[derive(Default)]
struct InspectRenderer {
    activated: usize,
}

impl Renderer for InspectRenderer {
    fn render(&mut self, vtree: &VTree, vnode: VNodeId, root: &mut RootFragment<'_>) -> RuntimeResult<()> {
        let what = match vtree.get(vnode).map(|n| &n.kind) {
            Some(VNodeKind::Island { island, .. }) => format!("island {}", island),
            Some(VNodeKind::PartialSlot { name }) => format!("partial \"{}\"", name),
            _ => "fragment".to_string(),
        };
        tracing::info!("Activating {} over {} server nodes", what, root.child_nodes().len());
        self.activated += 1;
        Ok(())
    }
}

fn print_regions(session: &PageSession) {
    println!("Regions:");
    for region in session.registry().regions() {
        let html = session.region_html(&region.name);
        match html {
            Some(html) => println!("  {:<20} {} bytes", region.name, html.len()),
            None => println!("  {:<20} (no live boundaries)", region.name),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args()?;
    let config = load_config()?;
    let fetcher = HttpFetcher::new(&config.user_agent)?;

    let (html, url) = load_page(&args.source, &fetcher)?;
    let document = frsh_html::HtmlParser::new().parse_with_url(&html, &url)?;
    let islands = discover_islands(&document);
    let props = match &args.props {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading props {}", path))?;
            IslandProps::from_json(&json)?
        }
        None => IslandProps::default(),
    };
    tracing::info!("Loaded {} ({} island components, {} props)", url, islands.len(), props.len());

    let mut session = PageSession::new(document, config)?.with_islands(islands).with_props(props);
    let report = session.revive()?;

    let mut renderer = InspectRenderer::default();
    session.run_activations(&mut renderer);

    println!("Virtual tree:");
    print!("{}", session.vtree().dump(report.root));
    println!(
        "Islands: {} scheduled, {} unresolved; partials: {}; dropped markers: {}; activated: {}",
        report.islands_scheduled,
        report.unresolved_islands,
        report.partials_scheduled,
        report.dropped_markers,
        renderer.activated
    );
    print_regions(&session);

    let Some(href) = args.follow else {
        return Ok(());
    };

    let tree = session.document().tree();
    let anchor = tree
        .get_elements_by_tag_name(tree.root(), "a")
        .into_iter()
        .find(|&a| tree.get_attribute(a, "href") == Some(href.as_str()))
        .with_context(|| format!("no link with href {}", href))?;

    let mut event = ClickEvent::new(anchor);
    match smol::block_on(session.handle_click(&mut event, &fetcher))? {
        NavigationOutcome::Ignored => println!("Link {} is not a partial link", href),
        NavigationOutcome::Applied(swap) => {
            println!(
                "Swapped: {:?}; carried: {:?}; skipped: {:?}; orphaned: {:?}",
                swap.applied, swap.carried, swap.skipped, swap.orphaned
            );
            print_regions(&session);
        }
        NavigationOutcome::FullNavigation { url, reason } => {
            println!("Full navigation to {} ({})", url, reason);
        }
    }

    let history = session.history().current();
    println!("History: {} {}", history.url, serde_json::to_string(&history.state)?);
    Ok(())
}

//! frsh HTML Parser
//!
//! HTML5 parsing built on html5ever, producing `frsh-dom` documents that
//! keep every comment and whitespace text node: marker comments are the
//! only place the server encodes island and region nesting.

mod parser;
mod serializer;

pub use parser::HtmlParser;
pub use serializer::{HtmlSerializer, inner_html, outer_html};
pub use frsh_dom::{Document, DomTree, NodeId};

/// Parse an HTML string into a document
pub fn parse(html: &str) -> Result<Document, ParseError> {
    HtmlParser::new().parse(html)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error("DOM construction failed: {0}")]
    Dom(#[from] frsh_dom::DomError),
}

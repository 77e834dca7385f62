//! Documentation corpus loading
//!
//! The corpus is the crawled documentation site: a JSON array of pages, each
//! with a title, a URL and its text content. Page content carries inline
//! anchor markers of the form `[ANCHOR: #name] text [/ANCHOR]` naming the
//! linkable subsections of the page.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;

/// Separator placed between pages in the flattened corpus
const PAGE_SEPARATOR: &str = "\n\n---\n\n";

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[ANCHOR: #([^\]\s]+)\]\s*(.*?)\s*\[/ANCHOR\]").expect("anchor regex is valid")
});

/// Inline Markdown link targets: `[text](target)`
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\(([^)\s]+)\)").expect("link regex is valid"));

/// One crawled documentation page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocPage {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// A linkable subsection found in page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub page_url: String,
    pub name: String,
    pub text: String,
}

impl Anchor {
    /// Link target combining the page URL with the anchor
    pub fn href(&self) -> String {
        format!("{}#{}", self.page_url, self.name)
    }
}

/// The flattened, immutable documentation corpus
#[derive(Debug, Clone)]
pub struct Corpus {
    text: String,
    page_count: usize,
    anchors: Vec<Anchor>,
    /// Page URLs and anchor hrefs a reply may link to
    targets: HashSet<String>,
}

impl Corpus {
    pub fn from_pages(pages: &[DocPage]) -> Self {
        let text = pages
            .iter()
            .map(|p| format!("Page: {}\nURL: {}\nContent:\n{}", p.title, p.url, p.content))
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);

        let anchors: Vec<Anchor> = pages.iter().flat_map(parse_anchors).collect();
        let targets = pages
            .iter()
            .map(|p| p.url.clone())
            .chain(anchors.iter().map(Anchor::href))
            .collect();

        Self {
            text,
            page_count: pages.len(),
            anchors,
            targets,
        }
    }

    /// The corpus as embedded in the system instruction
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Link targets in `markdown` that name neither a page nor an anchor.
    /// External links are not checked.
    pub fn unknown_links(&self, markdown: &str) -> Vec<String> {
        LINK_RE
            .captures_iter(markdown)
            .map(|caps| caps[1].to_string())
            .filter(|target| !self.targets.contains(target) && !is_external(target))
            .collect()
    }
}

fn is_external(target: &str) -> bool {
    target.contains("://") || target.starts_with("mailto:")
}

fn parse_anchors(page: &DocPage) -> Vec<Anchor> {
    ANCHOR_RE
        .captures_iter(&page.content)
        .map(|caps| Anchor {
            page_url: page.url.clone(),
            name: caps[1].to_string(),
            text: caps[2].to_string(),
        })
        .collect()
}

/// Corpus loading errors
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to fetch documentation: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to load documentation content (HTTP {0})")]
    Status(u16),
    #[error("Malformed documentation content: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the corpus comes from
#[async_trait]
pub trait CorpusSource: Send + Sync {
    async fn load(&self) -> Result<Corpus, CorpusError>;
}

#[async_trait]
impl<T: CorpusSource + ?Sized> CorpusSource for Arc<T> {
    async fn load(&self) -> Result<Corpus, CorpusError> {
        (**self).load().await
    }
}

/// Fetches the crawled content JSON over HTTP
pub struct HttpCorpusSource {
    client: Client,
    url: String,
}

impl HttpCorpusSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CorpusError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CorpusSource for HttpCorpusSource {
    async fn load(&self) -> Result<Corpus, CorpusError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CorpusError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let pages: Vec<DocPage> = serde_json::from_slice(&body)?;
        let corpus = Corpus::from_pages(&pages);

        tracing::info!(
            url = %self.url,
            pages = corpus.page_count(),
            anchors = corpus.anchors().len(),
            bytes = corpus.text().len(),
            "Documentation corpus loaded"
        );

        Ok(corpus)
    }
}

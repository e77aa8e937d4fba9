//! URL fetching, page body extraction, and social post metadata.
//!
//! The orchestrator talks to the network through the [`PageFetcher`] trait
//! so tests can substitute a canned implementation. The production
//! [`HttpFetcher`] wraps a shared `reqwest` client with a per-request
//! timeout and a configurable `User-Agent`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};

/// Hosts whose pages get the publication-timestamp probe.
const SOCIAL_DOMAINS: [&str; 5] = [
    "twitter.com",
    "facebook.com",
    "instagram.com",
    "linkedin.com",
    "tiktok.com",
];

/// Fetches the raw markup of a web page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body as text.
    ///
    /// Fails on network errors, timeouts, and non-2xx statuses. A timed-out
    /// fetch is an ordinary per-source failure for the caller.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .with_context(|| "Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status from {}", url))?;
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?;
        Ok(body)
    }
}

/// Visible text of the page `<body>`.
///
/// Script, style, and noscript subtrees are skipped; whitespace runs
/// collapse to single spaces. Matching is substring-based downstream, so
/// only word adjacency matters, not layout.
pub fn body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = match Selector::parse("body") {
        Ok(selector) => document
            .select(&selector)
            .map(|body| element_text(&body))
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => String::new(),
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Recursive text collection, skipping non-visible subtrees and breaking
/// at block-level boundaries.
fn element_text(element: &scraper::ElementRef) -> String {
    const SKIP_TAGS: [&str; 3] = ["script", "style", "noscript"];

    let mut text = String::new();
    for child in element.children() {
        if let Some(el) = child.value().as_element() {
            if SKIP_TAGS.contains(&el.name()) {
                continue;
            }
            if let Some(child_ref) = scraper::ElementRef::wrap(child) {
                text.push_str(&element_text(&child_ref));
                text.push(' ');
            }
        } else if let Some(text_node) = child.value().as_text() {
            text.push_str(text_node);
        }
    }
    text
}

/// True when the URL's host is one of the known social-media domains
/// (exact host or subdomain).
pub fn is_social_url(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    SOCIAL_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

/// Publication timestamp of a social post, if the page carries one.
///
/// Reads the first `<time datetime="…">` attribute and passes the value
/// through verbatim. Absence is not an error; this never affects scoring.
pub fn social_media_date(html: &str, url: &str) -> Option<String> {
    if !is_social_url(url) {
        return None;
    }
    let document = Html::parse_document(html);
    let selector = Selector::parse("time").ok()?;
    document
        .select(&selector)
        .find_map(|el| el.value().attr("datetime").map(|v| v.to_string()))
}

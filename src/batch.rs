//! Batch orchestration: score many sources with per-source isolation.
//!
//! Each source (an uploaded file or a URL) runs the extract → mask → match →
//! aggregate pipeline independently. Sources fan out onto bounded concurrent
//! tasks — the bound protects remote servers and local file handles — and
//! fan back in by input index, so results always enumerate in input order no
//! matter which source finishes first.
//!
//! Failures never escalate: an unreadable file, an unsupported extension, or
//! a dead URL becomes that source's error-only result while the rest of the
//! batch proceeds. The batch itself always completes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::extract::{extract_sections, ExtractError, FileFormat};
use crate::fetch::{body_text, social_media_date, PageFetcher};
use crate::glossary::Glossary;
use crate::matcher::{KeywordMatcher, MatchMode};
use crate::score::{aggregate, round2, score_section, DocumentKind, DocumentResult};

/// One unit of work for the batch.
#[derive(Debug, Clone)]
pub enum Source {
    /// A file on local disk, read at scoring time.
    File { name: String, path: PathBuf },
    /// An already-uploaded file body (HTTP multipart surface).
    Blob { name: String, bytes: Vec<u8> },
    /// A web page.
    Url { url: String },
}

impl Source {
    /// The name the source is reported under in the batch result.
    pub fn display_name(&self) -> &str {
        match self {
            Source::File { name, .. } | Source::Blob { name, .. } => name,
            Source::Url { url } => url,
        }
    }
}

/// Result of one batch run: per-source documents in input order plus the
/// batch-level average (failed sources contribute 0 to the numerator but
/// still count in the denominator).
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub documents: Vec<DocumentResult>,
    pub overall_average_score: f64,
}

/// Split a comma- and/or newline-delimited URL block into individual URLs.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(|u| u.to_string())
        .collect()
}

/// The scoring engine: compiled glossary matcher, page fetcher, and the
/// concurrency bound. Cheap to clone; all heavy state is shared.
#[derive(Clone)]
pub struct Engine {
    matcher: Arc<KeywordMatcher>,
    fetcher: Arc<dyn PageFetcher>,
    max_concurrency: usize,
}

impl Engine {
    pub fn new(
        glossary: &Glossary,
        mode: MatchMode,
        fetcher: Arc<dyn PageFetcher>,
        max_concurrency: usize,
    ) -> Result<Self> {
        Ok(Self {
            matcher: Arc::new(KeywordMatcher::new(glossary, mode)?),
            fetcher,
            max_concurrency: max_concurrency.max(1),
        })
    }

    /// Score a batch of sources.
    ///
    /// An empty batch returns an empty result with average 0 — not an error
    /// at this layer; request surfaces reject empty input before calling in.
    pub async fn run(&self, sources: Vec<Source>, ignore_phrases: Vec<String>) -> BatchResult {
        if sources.is_empty() {
            return BatchResult::default();
        }

        let count = sources.len();
        let names: Vec<String> = sources
            .iter()
            .map(|s| s.display_name().to_string())
            .collect();
        let ignore = Arc::new(ignore_phrases);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let mut handles = Vec::with_capacity(count);
        for source in sources {
            let engine = self.clone();
            let ignore = Arc::clone(&ignore);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                engine.process_source(source, &ignore).await
            }));
        }

        // Fan-in by input index: awaiting handles in spawn order keeps the
        // result sequence aligned with the request regardless of completion
        // order.
        let mut documents = Vec::with_capacity(count);
        for (handle, name) in handles.into_iter().zip(names) {
            let doc = match handle.await {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(source = %name, error = %e, "scoring task aborted");
                    DocumentResult::failed(name, format!("Internal error: {}", e))
                }
            };
            documents.push(doc);
        }

        let total: f64 = documents.iter().map(|d| d.document_score).sum();
        BatchResult {
            overall_average_score: round2(total / count as f64),
            documents,
        }
    }

    async fn process_source(&self, source: Source, ignore: &[String]) -> DocumentResult {
        match source {
            Source::File { name, path } => match tokio::fs::read(&path).await {
                Ok(bytes) => self.score_file(&name, &bytes, ignore),
                Err(e) => {
                    warn!(source = %name, error = %e, "file read failed");
                    DocumentResult::failed(name, ExtractError::Io(e.to_string()).to_string())
                }
            },
            Source::Blob { name, bytes } => self.score_file(&name, &bytes, ignore),
            Source::Url { url } => self.score_url(&url, ignore).await,
        }
    }

    fn score_file(&self, name: &str, bytes: &[u8], ignore: &[String]) -> DocumentResult {
        let Some(format) = FileFormat::from_name(name) else {
            return DocumentResult::failed(
                name,
                ExtractError::Unsupported(name.to_string()).to_string(),
            );
        };
        let extracted = match extract_sections(bytes, format) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(source = %name, error = %e, "extraction failed");
                return DocumentResult::failed(name, e.to_string());
            }
        };
        let kind = extracted.kind;
        let sections = extracted
            .sections
            .into_iter()
            .map(|(label, text)| score_section(label, &text, &self.matcher, ignore))
            .collect();
        aggregate(name, sections, kind)
    }

    async fn score_url(&self, url: &str, ignore: &[String]) -> DocumentResult {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(source = %url, error = %e, "fetch failed");
                return DocumentResult::failed(url, format!("{:#}", e));
            }
        };
        let text = body_text(&html);
        let section = score_section("body", &text, &self.matcher, ignore);
        let mut doc = aggregate(url, vec![section], DocumentKind::MultiSection);
        doc.social_media_date = social_media_date(&html, url);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::KeywordEntry;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Canned fetcher: maps URLs to HTML bodies, errors on anything else.
    /// The first request sleeps so completion order differs from input order.
    struct StubFetcher {
        pages: HashMap<String, String>,
        delay_first: bool,
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            if self.delay_first && url.ends_with("first") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("connection refused"))
        }
    }

    fn engine_with(pages: &[(&str, &str)], delay_first: bool) -> Engine {
        let glossary = Glossary::from_entries(vec![
            KeywordEntry {
                term: "alpha".to_string(),
                weight: 5.0,
            },
            KeywordEntry {
                term: "beta".to_string(),
                weight: 2.0,
            },
        ])
        .unwrap();
        let fetcher = Arc::new(StubFetcher {
            pages: pages
                .iter()
                .map(|(u, h)| (u.to_string(), h.to_string()))
                .collect(),
            delay_first,
        });
        Engine::new(&glossary, MatchMode::Substring, fetcher, 4).unwrap()
    }

    fn url(u: &str) -> Source {
        Source::Url { url: u.to_string() }
    }

    #[tokio::test]
    async fn empty_batch_returns_zero_without_error() {
        let engine = engine_with(&[], false);
        let result = engine.run(Vec::new(), Vec::new()).await;
        assert!(result.documents.is_empty());
        assert_eq!(result.overall_average_score, 0.0);
    }

    #[tokio::test]
    async fn url_scoring_and_average() {
        let engine = engine_with(
            &[
                ("https://a.example/one", "<body>alpha and beta here</body>"),
                ("https://a.example/two", "<body>nothing relevant</body>"),
            ],
            false,
        );
        let result = engine
            .run(
                vec![url("https://a.example/one"), url("https://a.example/two")],
                Vec::new(),
            )
            .await;
        assert_eq!(result.documents[0].document_score, 7.0);
        assert_eq!(result.documents[1].document_score, 0.0);
        assert_eq!(result.overall_average_score, 3.5);
    }

    #[tokio::test]
    async fn failed_source_is_isolated_and_counted_in_average() {
        let engine = engine_with(
            &[
                ("https://a.example/ok1", "<body>alpha</body>"),
                ("https://a.example/ok2", "<body>alpha</body>"),
            ],
            false,
        );
        let result = engine
            .run(
                vec![
                    url("https://a.example/ok1"),
                    url("https://a.example/down"),
                    url("https://a.example/ok2"),
                ],
                Vec::new(),
            )
            .await;
        assert_eq!(result.documents.len(), 3);
        assert!(result.documents[1].sections[0].error.is_some());
        assert_eq!(result.documents[1].document_score, 0.0);
        assert_eq!(result.documents[0].document_score, 5.0);
        assert_eq!(result.documents[2].document_score, 5.0);
        // (5 + 0 + 5) / 3
        assert_eq!(result.overall_average_score, 3.33);
    }

    #[tokio::test]
    async fn result_order_matches_input_order() {
        let engine = engine_with(
            &[
                ("https://a.example/first", "<body>alpha</body>"),
                ("https://a.example/second", "<body>beta</body>"),
            ],
            true,
        );
        let result = engine
            .run(
                vec![url("https://a.example/first"), url("https://a.example/second")],
                Vec::new(),
            )
            .await;
        assert_eq!(result.documents[0].source_name, "https://a.example/first");
        assert_eq!(result.documents[1].source_name, "https://a.example/second");
    }

    #[tokio::test]
    async fn ignore_phrases_suppress_url_scoring() {
        let engine = engine_with(&[("https://a.example/one", "<body>alpha beta</body>")], false);
        let result = engine
            .run(
                vec![url("https://a.example/one")],
                vec!["alpha".to_string()],
            )
            .await;
        // beta still scores; alpha is masked away.
        assert_eq!(result.documents[0].document_score, 2.0);
    }

    #[tokio::test]
    async fn social_timestamp_attached_without_affecting_score() {
        let engine = engine_with(
            &[(
                "https://twitter.com/x/status/1",
                r#"<body>alpha <time datetime="2024-03-01T12:00:00Z">then</time></body>"#,
            )],
            false,
        );
        let result = engine
            .run(vec![url("https://twitter.com/x/status/1")], Vec::new())
            .await;
        assert_eq!(
            result.documents[0].social_media_date.as_deref(),
            Some("2024-03-01T12:00:00Z")
        );
        assert_eq!(result.documents[0].document_score, 5.0);
    }

    #[tokio::test]
    async fn unsupported_blob_is_per_source_error() {
        let engine = engine_with(&[], false);
        let result = engine
            .run(
                vec![
                    Source::Blob {
                        name: "notes.txt".to_string(),
                        bytes: b"alpha".to_vec(),
                    },
                    Source::Blob {
                        name: "weird.bin".to_string(),
                        bytes: vec![0, 1, 2],
                    },
                ],
                Vec::new(),
            )
            .await;
        assert_eq!(result.documents[0].document_score, 5.0);
        let err = result.documents[1].sections[0].error.as_deref().unwrap();
        assert!(err.contains("Unsupported file type"));
        assert_eq!(result.overall_average_score, 2.5);
    }

    #[test]
    fn url_list_parsing() {
        let urls = parse_url_list("https://a.example, https://b.example\nhttps://c.example,\n");
        assert_eq!(
            urls,
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }
}

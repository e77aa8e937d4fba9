//! End-to-end batch scoring tests.
//!
//! Exercises the full pipeline — glossary load, file extraction, masking,
//! matching, aggregation, and batch fan-out — over real temp files, and the
//! URL pipeline through a canned fetcher.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tempfile::TempDir;

use sensiscan::batch::{Engine, Source};
use sensiscan::fetch::PageFetcher;
use sensiscan::glossary::Glossary;
use sensiscan::matcher::MatchMode;

/// Canned fetcher for URL tests; errors on unknown URLs.
struct StubFetcher {
    pages: HashMap<String, String>,
}

impl StubFetcher {
    fn empty() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    fn with(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(u, h)| (u.to_string(), h.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("request to {} timed out", url))
    }
}

/// Glossary file mixing every accepted entry shape.
fn write_glossary(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("glossary.json");
    fs::write(
        &path,
        r#"["inclusion", {"term": "diversity", "weight": 5}, {"keyword": "equity", "score": 2}]"#,
    )
    .unwrap();
    path
}

fn engine(dir: &TempDir, fetcher: StubFetcher) -> Engine {
    let glossary = Glossary::load(&write_glossary(dir)).unwrap();
    Engine::new(&glossary, MatchMode::Substring, Arc::new(fetcher), 4).unwrap()
}

fn minimal_docx(paragraphs: &[&str]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut archive = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        archive
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        archive.write_all(xml.as_bytes()).unwrap();
        archive.finish().unwrap();
    }
    buf
}

fn minimal_xlsx(sheets: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut archive = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        let opts = zip::write::SimpleFileOptions::default();

        let sst: String = sheets
            .iter()
            .map(|(_, text)| format!("<si><t>{}</t></si>", text))
            .collect();
        archive.start_file("xl/sharedStrings.xml", opts).unwrap();
        archive
            .write_all(format!("<?xml version=\"1.0\"?><sst>{}</sst>", sst).as_bytes())
            .unwrap();

        let workbook: String = sheets
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("<sheet name=\"{}\" sheetId=\"{}\"/>", name, i + 1))
            .collect();
        archive.start_file("xl/workbook.xml", opts).unwrap();
        archive
            .write_all(
                format!(
                    "<?xml version=\"1.0\"?><workbook><sheets>{}</sheets></workbook>",
                    workbook
                )
                .as_bytes(),
            )
            .unwrap();

        for (i, _) in sheets.iter().enumerate() {
            archive
                .start_file(format!("xl/worksheets/sheet{}.xml", i + 1), opts)
                .unwrap();
            archive
                .write_all(
                    format!(
                        "<?xml version=\"1.0\"?><worksheet><sheetData><row><c t=\"s\"><v>{}</v></c></row></sheetData></worksheet>",
                        i
                    )
                    .as_bytes(),
                )
                .unwrap();
        }
        archive.finish().unwrap();
    }
    buf
}

fn file_source(dir: &TempDir, name: &str, bytes: &[u8]) -> Source {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    Source::File {
        name: name.to_string(),
        path,
    }
}

#[tokio::test]
async fn mixed_file_batch_scores_in_input_order() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, StubFetcher::empty());

    let sources = vec![
        file_source(&dir, "memo.txt", b"a diversity statement"),
        file_source(&dir, "notes.docx", &minimal_docx(&["focus on equity"])),
        file_source(&dir, "weird.bin", b"\x00\x01\x02"),
    ];
    let result = engine.run(sources, Vec::new()).await;

    assert_eq!(result.documents.len(), 3);
    assert_eq!(result.documents[0].source_name, "memo.txt");
    assert_eq!(result.documents[1].source_name, "notes.docx");
    assert_eq!(result.documents[2].source_name, "weird.bin");

    assert_eq!(result.documents[0].document_score, 5.0);
    assert_eq!(
        result.documents[0].sections[0].matched_terms,
        vec!["diversity"]
    );
    assert_eq!(result.documents[1].document_score, 2.0);
    assert!(result.documents[2].sections[0]
        .error
        .as_deref()
        .unwrap()
        .contains("Unsupported file type"));

    // (5 + 2 + 0) / 3, failed source still in the denominator.
    assert_eq!(result.overall_average_score, 2.33);
}

#[tokio::test]
async fn xlsx_sheets_sum_into_document_score() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, StubFetcher::empty());

    let bytes = minimal_xlsx(&[
        ("Plans", "diversity goals"),
        ("Budget", "nothing here"),
        ("Notes", "equity and inclusion"),
    ]);
    let sources = vec![file_source(&dir, "book.xlsx", &bytes)];
    let result = engine.run(sources, Vec::new()).await;

    let doc = &result.documents[0];
    // 5 + 0 + (2 + 1), quiet sheet dropped from the listing.
    assert_eq!(doc.document_score, 8.0);
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.sections[0].label, "Plans");
    assert_eq!(doc.sections[1].label, "Notes");
}

#[tokio::test]
async fn ignore_phrases_flow_through_file_pipeline() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, StubFetcher::empty());

    let sources = vec![file_source(&dir, "memo.txt", b"diversity and equity")];
    let result = engine
        .run(sources, vec!["diversity".to_string()])
        .await;

    assert_eq!(result.documents[0].document_score, 2.0);
    assert_eq!(result.documents[0].sections[0].matched_terms, vec!["equity"]);
}

#[tokio::test]
async fn missing_file_is_isolated() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, StubFetcher::empty());

    let sources = vec![
        Source::File {
            name: "gone.txt".to_string(),
            path: dir.path().join("does-not-exist.txt"),
        },
        file_source(&dir, "memo.txt", b"inclusion"),
    ];
    let result = engine.run(sources, Vec::new()).await;

    assert!(result.documents[0].sections[0].error.is_some());
    assert_eq!(result.documents[1].document_score, 1.0);
    assert_eq!(result.overall_average_score, 0.5);
}

#[tokio::test]
async fn empty_batch_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, StubFetcher::empty());

    let result = engine.run(Vec::new(), Vec::new()).await;
    assert!(result.documents.is_empty());
    assert_eq!(result.overall_average_score, 0.0);
}

#[tokio::test]
async fn url_batch_mixes_success_failure_and_social_metadata() {
    let dir = TempDir::new().unwrap();
    let engine = engine(
        &dir,
        StubFetcher::with(&[
            (
                "https://news.example/story",
                "<body>a diversity initiative</body>",
            ),
            (
                "https://twitter.com/org/status/9",
                r#"<body>equity <time datetime="2024-05-04T09:30:00Z">May 4</time></body>"#,
            ),
        ]),
    );

    let sources = vec![
        Source::Url {
            url: "https://news.example/story".to_string(),
        },
        Source::Url {
            url: "https://dead.example/".to_string(),
        },
        Source::Url {
            url: "https://twitter.com/org/status/9".to_string(),
        },
    ];
    let result = engine.run(sources, Vec::new()).await;

    assert_eq!(result.documents[0].document_score, 5.0);
    assert!(result.documents[0].social_media_date.is_none());

    let failed = &result.documents[1];
    assert_eq!(failed.document_score, 0.0);
    assert!(failed.sections[0].error.as_deref().unwrap().contains("timed out"));

    let social = &result.documents[2];
    assert_eq!(social.document_score, 2.0);
    assert_eq!(
        social.social_media_date.as_deref(),
        Some("2024-05-04T09:30:00Z")
    );

    // (5 + 0 + 2) / 3
    assert_eq!(result.overall_average_score, 2.33);
}

#[tokio::test]
async fn batch_result_serializes_rounded_scores_in_order() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, StubFetcher::empty());

    let sources = vec![
        file_source(&dir, "a.txt", b"inclusion"),
        file_source(&dir, "b.txt", b"diversity"),
    ];
    let result = engine.run(sources, Vec::new()).await;
    let json = serde_json::to_value(&result).unwrap();

    let docs = json["documents"].as_array().unwrap();
    assert_eq!(docs[0]["source_name"], "a.txt");
    assert_eq!(docs[1]["source_name"], "b.txt");
    assert_eq!(json["overall_average_score"], 3.0);
    // Error-free sections do not carry an error field.
    assert!(docs[0]["sections"][0].get("error").is_none());
}

//! Multi-format section extraction for uploaded documents.
//!
//! Given raw bytes and a file-extension-derived [`FileFormat`], this module
//! returns the source's scoring sections: one per PDF page, one per
//! spreadsheet sheet, one per slide, or a single whole-document section.
//! Page-split sources also report the total page count, including pages that
//! yielded no text, so the aggregator can dilute scores across the whole
//! document.

use std::io::Read;

use crate::score::DocumentKind;

/// Maximum sheets to process in an xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells to process per sheet (avoids unbounded memory).
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;
/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Supported upload formats, discriminated by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Txt,
}

impl FileFormat {
    /// Map a file name to its format via the extension, case-insensitively.
    /// Legacy `doc`/`xls` extensions route to their OOXML handlers.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next().unwrap_or_default().to_lowercase();
        if !name.contains('.') {
            return None;
        }
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Docx),
            "xlsx" | "xls" => Some(Self::Xlsx),
            "pptx" => Some(Self::Pptx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }
}

/// Extraction error. Never panics; the orchestrator records the error against
/// the failing source and continues with the rest of the batch.
#[derive(Debug)]
pub enum ExtractError {
    Unsupported(String),
    Pdf(String),
    Ooxml(String),
    Io(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Unsupported(name) => write!(f, "Unsupported file type: {}", name),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Ooxml(e) => write!(f, "OOXML extraction failed: {}", e),
            ExtractError::Io(e) => write!(f, "Read failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Sections extracted from one source, plus how they aggregate.
#[derive(Debug)]
pub struct ExtractedDoc {
    /// `(label, text)` pairs in document order.
    pub sections: Vec<(String, String)>,
    pub kind: DocumentKind,
}

/// Extract scoring sections from a document's raw bytes.
pub fn extract_sections(bytes: &[u8], format: FileFormat) -> Result<ExtractedDoc, ExtractError> {
    match format {
        FileFormat::Pdf => extract_pdf(bytes),
        FileFormat::Docx => extract_docx(bytes),
        FileFormat::Xlsx => extract_xlsx(bytes),
        FileFormat::Pptx => extract_pptx(bytes),
        FileFormat::Txt => Ok(ExtractedDoc {
            sections: vec![(
                "document".to_string(),
                String::from_utf8_lossy(bytes).into_owned(),
            )],
            kind: DocumentKind::MultiSection,
        }),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<ExtractedDoc, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let page_count = pages.len();
    let sections = pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| (format!("page {}", i + 1), text))
        .collect();
    Ok(ExtractedDoc {
        sections,
        kind: DocumentKind::Paged { page_count },
    })
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, ExtractError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<ExtractedDoc, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let doc_xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    let text = collect_text_runs(&doc_xml)?;
    Ok(ExtractedDoc {
        sections: vec![("document".to_string(), text)],
        kind: DocumentKind::MultiSection,
    })
}

fn extract_pptx(bytes: &[u8]) -> Result<ExtractedDoc, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let slide_names = numbered_entries(&archive, "ppt/slides/slide");
    let mut sections = Vec::with_capacity(slide_names.len());
    for (idx, name) in slide_names.iter().enumerate() {
        let xml = read_zip_entry_bounded(&mut archive, name, MAX_XML_ENTRY_BYTES)?;
        let text = collect_text_runs(&xml)?;
        sections.push((format!("slide {}", idx + 1), text));
    }
    Ok(ExtractedDoc {
        sections,
        kind: DocumentKind::MultiSection,
    })
}

fn extract_xlsx(bytes: &[u8]) -> Result<ExtractedDoc, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_titles = read_workbook_sheet_names(&mut archive);
    let sheet_files = numbered_entries(&archive, "xl/worksheets/sheet");

    let mut sections = Vec::new();
    for (idx, name) in sheet_files.iter().take(XLSX_MAX_SHEETS).enumerate() {
        let sheet_xml = read_zip_entry_bounded(&mut archive, name, MAX_XML_ENTRY_BYTES)?;
        let cell_text = extract_sheet_cells(&sheet_xml, &shared_strings)?;
        // TODO: map sheet display names through xl/_rels instead of pairing
        // workbook.xml order with the sheetN file order.
        let label = sheet_titles
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("Sheet {}", idx + 1));
        sections.push((label, cell_text));
    }
    Ok(ExtractedDoc {
        sections,
        kind: DocumentKind::MultiSection,
    })
}

/// List archive entries named `<prefix>N.xml`, sorted by N.
fn numbered_entries(
    archive: &zip::ZipArchive<std::io::Cursor<&[u8]>>,
    prefix: &str,
) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches(prefix)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

/// Collect the text runs of an OOXML body (`<w:t>`/`<a:t>` elements),
/// inserting a newline at each paragraph end so words from adjacent
/// paragraphs cannot fuse into spurious matches.
fn collect_text_runs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Read the shared-string table. A workbook with no string cells has no
/// `sharedStrings.xml`; that is not an error.
fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, ExtractError> {
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(te)) if in_t => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"si" => {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Sheet display names from `xl/workbook.xml`, in document order.
/// Best-effort: on any parse trouble the caller falls back to `Sheet N`.
fn read_workbook_sheet_names(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Vec<String> {
    let xml = match read_zip_entry_bounded(archive, "xl/workbook.xml", MAX_XML_ENTRY_BYTES) {
        Ok(xml) => xml,
        Err(_) => return Vec::new(),
    };
    let mut names = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"name" {
                            names.push(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    names
}

/// Cell texts of one worksheet, joined with spaces. Shared-string cells are
/// resolved through the table; other `<v>` values are taken verbatim.
fn extract_sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<String, ExtractError> {
    let mut cells: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_v = false;
    let mut cell_is_shared_str = false;
    loop {
        if cells.len() >= XLSX_MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = e.attributes().any(|a| {
                        a.as_ref()
                            .map(|a| a.key.as_ref() == b"t" && a.value.as_ref() == b"s")
                            .unwrap_or(false)
                    });
                } else if e.local_name().as_ref() == b"v" {
                    in_v = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_v => {
                let v = te.unescape().unwrap_or_default();
                let s = v.trim();
                if !s.is_empty() {
                    if cell_is_shared_str {
                        if let Ok(i) = s.parse::<usize>() {
                            if let Some(text) = shared_strings.get(i) {
                                cells.push(text.clone());
                            }
                        }
                    } else {
                        cells.push(s.to_string());
                    }
                }
                in_v = false;
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"v" {
                    in_v = false;
                } else if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells.join(" "))
}

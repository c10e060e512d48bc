use crate::error::QcError;
use crate::extraction::{BBox, LineSpan, PageContent, PdfExtractor};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` so that title-block and equipment-table lines keep
/// their print order.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, QcError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| QcError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| QcError::Extraction(e.to_string()))?;
        let tmp_path = tmpfile.path().to_path_buf();

        let stdout = run_pdftotext(&["-layout"], &tmp_path)?;
        let text = String::from_utf8_lossy(&stdout);
        if text.trim().is_empty() {
            tracing::warn!("pdftotext returned no text; the plan set may be scanned images");
        }

        let bbox_lines = extract_bbox_lines(&tmp_path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "line bounding boxes unavailable");
            Vec::new()
        });

        // Pages are addressed by position, so blank pages are kept.
        let mut pages: Vec<PageContent> = text
            .split('\x0c')
            .enumerate()
            .map(|(i, page_text)| {
                let lines: Vec<String> = page_text.lines().map(|l| l.to_string()).collect();
                let line_spans = match_layout_lines_to_bbox(i + 1, &lines, &bbox_lines);
                PageContent {
                    page_number: i + 1,
                    lines,
                    line_spans,
                }
            })
            .collect();

        // pdftotext terminates the last page with a form feed as well.
        if pages.len() > 1 && pages.last().is_some_and(|p| p.lines.is_empty()) {
            pages.pop();
        }

        tracing::debug!(pages = pages.len(), "pdftotext extraction finished");
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn run_pdftotext(args: &[&str], pdf_path: &std::path::Path) -> Result<Vec<u8>, QcError> {
    let output = Command::new("pdftotext")
        .args(args)
        .arg(pdf_path)
        .arg("-")
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QcError::PdftotextNotFound
            } else {
                QcError::Extraction(format!("pdftotext {} failed: {}", args.join(" "), e))
            }
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(QcError::PdftotextFailed { code, stderr });
    }

    Ok(output.stdout)
}

#[derive(Debug, Clone)]
struct BBoxLine {
    page_number: usize,
    text: String,
    bbox: BBox,
}

fn extract_bbox_lines(pdf_path: &std::path::Path) -> Result<Vec<BBoxLine>, QcError> {
    let stdout = run_pdftotext(&["-bbox-layout"], pdf_path)?;
    let xml = String::from_utf8_lossy(&stdout);
    parse_bbox_xml(&xml)
}

/// Parse the XHTML written by `pdftotext -bbox-layout` into text lines with boxes.
///
/// Pages carry no number attribute, so they are counted in document order.
fn parse_bbox_xml(xml: &str) -> Result<Vec<BBoxLine>, QcError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut out = Vec::new();
    let mut page_number = 0usize;
    let mut current_bbox: Option<BBox> = None;
    let mut current_words: Vec<String> = Vec::new();
    let mut in_word = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => page_number += 1,
                b"line" => {
                    current_bbox = parse_bbox(&e);
                    current_words.clear();
                }
                b"word" => in_word = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_word => {
                let word = t
                    .unescape()
                    .map_err(|e| QcError::Extraction(format!("malformed bbox layout: {e}")))?;
                let word = word.trim();
                if !word.is_empty() {
                    current_words.push(word.to_string());
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"word" => in_word = false,
                b"line" => {
                    if let Some(bbox) = current_bbox.take() {
                        let text = current_words.join(" ");
                        if !text.is_empty() && page_number > 0 {
                            out.push(BBoxLine {
                                page_number,
                                text,
                                bbox,
                            });
                        }
                    }
                    current_words.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(QcError::Extraction(format!(
                    "malformed bbox layout at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(out)
}

fn match_layout_lines_to_bbox(
    page_number: usize,
    lines: &[String],
    bbox_lines: &[BBoxLine],
) -> Vec<LineSpan> {
    let mut spans = Vec::new();
    let mut used = vec![false; bbox_lines.len()];

    for (line_index, line) in lines.iter().enumerate() {
        let norm = normalize_ws(line);
        if norm.is_empty() {
            continue;
        }

        if let Some((i, b)) = bbox_lines.iter().enumerate().find(|(i, b)| {
            !used[*i] && b.page_number == page_number && normalize_ws(&b.text) == norm
        }) {
            used[i] = true;
            spans.push(LineSpan {
                page_number,
                line_index,
                text: line.clone(),
                bbox: b.bbox.clone(),
            });
        }
    }

    spans
}

fn parse_bbox(tag: &BytesStart<'_>) -> Option<BBox> {
    Some(BBox {
        x_min: attr_f32(tag, b"xMin")?,
        y_min: attr_f32(tag, b"yMin")?,
        x_max: attr_f32(tag, b"xMax")?,
        y_max: attr_f32(tag, b"yMax")?,
    })
}

fn attr_f32(tag: &BytesStart<'_>, name: &[u8]) -> Option<f32> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok()?.parse().ok())
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

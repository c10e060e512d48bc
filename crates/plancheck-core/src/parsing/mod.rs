pub mod address;
pub mod aliases;
pub mod lines;
pub mod normalize;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::model::DocumentText;
use normalize::normalize_text;

static RE_PAREN_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)").expect("valid count regex"));

/// A line of the document, addressed by 1-based page and 0-based line index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRef {
    pub page_number: usize,
    pub line_index: usize,
    pub text: String,
}

/// A count read from a parenthesised value, e.g. `(24) REC ALPHA 410`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCount {
    pub value: String,
    pub line: LineRef,
}

/// Positional values pulled out of the cover sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedValues {
    pub module_quantity: Option<ExtractedCount>,
    pub inverter_quantity: Option<ExtractedCount>,
    /// Cover-sheet line that carries the contractor name, as printed.
    pub contractor_line: Option<String>,
    /// Text of the supplementary pages; pages past the end contribute nothing.
    pub supplementary_text: String,
}

/// Scan page 1 for the equipment counts and the contractor name line, and
/// collect the supplementary pages searched alongside page 1.
///
/// A line containing `module:` (or `inverter:`) announces that the next line
/// holds the count in parentheses. A line whose normalized form contains the
/// normalized `contractor_name` is captured verbatim. When a marker occurs
/// more than once the last occurrence wins. Nothing here fails: values that
/// are not found stay `None`.
pub fn extract_document_values(
    doc: &DocumentText,
    contractor_name: &str,
    supplementary_pages: &[usize],
) -> ExtractedValues {
    let first_page = doc.page(1);
    let lines: Vec<&str> = first_page.lines().collect();
    let contractor_norm = normalize_text(contractor_name);

    let mut values = ExtractedValues {
        supplementary_text: doc.supplementary_text(supplementary_pages),
        ..Default::default()
    };

    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();

        if lower.contains("module:") {
            if let Some(count) = count_on_line(&lines, i + 1) {
                values.module_quantity = Some(count);
            }
        }

        if lower.contains("inverter:") {
            if let Some(count) = count_on_line(&lines, i + 1) {
                values.inverter_quantity = Some(count);
            }
        }

        if !contractor_norm.is_empty() && normalize_text(line).contains(&contractor_norm) {
            values.contractor_line = Some(line.trim().to_string());
        }
    }

    tracing::debug!(
        module_quantity = values.module_quantity.as_ref().map(|c| c.value.as_str()),
        inverter_quantity = values.inverter_quantity.as_ref().map(|c| c.value.as_str()),
        contractor_found = values.contractor_line.is_some(),
        "extracted cover sheet values"
    );

    values
}

fn count_on_line(lines: &[&str], index: usize) -> Option<ExtractedCount> {
    let line = lines.get(index)?;
    let caps = RE_PAREN_COUNT.captures(line)?;
    Some(ExtractedCount {
        value: caps[1].to_string(),
        line: LineRef {
            page_number: 1,
            line_index: index,
            text: line.trim().to_string(),
        },
    })
}

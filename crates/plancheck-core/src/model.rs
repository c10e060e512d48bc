use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::extraction::{LineSpan, PageContent};

/// Reserved record key for the compiled installation address.
pub const COMPILED_PROJECT_ADDRESS: &str = "Compiled_Project_Address";
/// Reserved record key for the compiled contractor (customer) address.
pub const COMPILED_CUSTOMER_ADDRESS: &str = "Compiled_Customer_Address";
/// Reserved record key for the wattage parsed from the module part number.
pub const DERIVED_MODULE_WATTAGE: &str = "Derived_Module_Wattage";
/// Reserved record key for the computed DC system size in kW.
pub const DERIVED_DC_SIZE_KW: &str = "Derived_DC_Size_kW";

/// Key/value view of the project record export.
///
/// Original entries are loaded once. Derived entries (compiled addresses,
/// computed metrics) may be added afterwards but never replace a value that
/// is already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    fields: BTreeMap<String, String>,
}

impl StructuredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from (key, value) pairs. The first occurrence of a key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.insert_original(k, v);
        }
        record
    }

    /// Insert a value read from the tabular input. Returns false for duplicate keys.
    pub fn insert_original(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.fields.contains_key(&key) {
            tracing::warn!(key = %key, "duplicate field in project record, keeping first value");
            return false;
        }
        self.fields.insert(key, value.into());
        true
    }

    /// Insert a value computed during the run. Existing entries are never overwritten.
    pub fn insert_derived(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.fields.contains_key(key) {
            tracing::warn!(key, "refusing to overwrite existing record entry with derived value");
            return false;
        }
        self.fields.insert(key.to_string(), value.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|s| s.as_str())
    }

    /// Trimmed value for `key`, or "" when absent.
    pub fn value(&self, key: &str) -> &str {
        self.get(key).map(str::trim).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Page-indexed text of the reviewed plan set.
#[derive(Debug, Clone)]
pub struct DocumentText {
    pages: Vec<PageContent>,
    page_texts: Vec<String>,
    full_text: String,
}

impl DocumentText {
    pub fn new(pages: Vec<PageContent>) -> Self {
        let page_texts: Vec<String> = pages.iter().map(|p| p.lines.join("\n")).collect();
        let full_text = page_texts.join("\n");
        Self {
            pages,
            page_texts,
            full_text,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[PageContent] {
        &self.pages
    }

    /// Text of the 1-based page `number`, or "" if the document is shorter.
    pub fn page(&self, number: usize) -> &str {
        number
            .checked_sub(1)
            .and_then(|i| self.page_texts.get(i))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// All pages joined with newlines.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// The given supplementary pages (1-based, by position), joined with newlines.
    pub fn supplementary_text(&self, supplementary_pages: &[usize]) -> String {
        let mut parts = Vec::new();
        for &n in supplementary_pages {
            if n > self.page_count() {
                tracing::warn!(page = n, pages = self.page_count(), "supplementary page not present in document");
                continue;
            }
            parts.push(self.page(n));
        }
        parts.join("\n")
    }

    /// Bounding box span for a line, when the extraction backend provided one.
    pub fn line_span(&self, page_number: usize, line_index: usize) -> Option<&LineSpan> {
        self.pages
            .iter()
            .find(|p| p.page_number == page_number)?
            .line_spans
            .iter()
            .find(|s| s.line_index == line_index)
    }

    pub fn is_blank(&self) -> bool {
        self.page_texts.iter().all(|t| t.trim().is_empty())
    }
}

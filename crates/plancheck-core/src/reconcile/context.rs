use std::collections::HashMap;

use crate::model::DocumentText;
use crate::parsing::address::AddressParts;
use crate::parsing::normalize::{normalize_phone, normalize_text};
use crate::parsing::ExtractedValues;
use crate::profile::schema::AddressMode;

/// Everything matchers read from the document, computed once per run.
#[derive(Debug)]
pub struct DocumentContext<'a> {
    pub doc: &'a DocumentText,
    /// Page 1 followed by the supplementary pages.
    pub relevant_text: String,
    pub relevant_normalized: String,
    pub full_normalized: String,
    /// Every digit of the document, in order.
    pub full_digits: String,
    pub extracted: ExtractedValues,
    /// Components of each compiled address, keyed by its record key.
    pub addresses: HashMap<String, AddressParts>,
    pub address_mode: AddressMode,
}

impl<'a> DocumentContext<'a> {
    pub fn new(
        doc: &'a DocumentText,
        extracted: ExtractedValues,
        addresses: HashMap<String, AddressParts>,
        address_mode: AddressMode,
    ) -> Self {
        let relevant_text = if extracted.supplementary_text.is_empty() {
            doc.page(1).to_string()
        } else {
            format!("{}\n{}", doc.page(1), extracted.supplementary_text)
        };
        Self {
            relevant_normalized: normalize_text(&relevant_text),
            full_normalized: normalize_text(doc.full_text()),
            full_digits: normalize_phone(doc.full_text()),
            relevant_text,
            doc,
            extracted,
            addresses,
            address_mode,
        }
    }

    pub fn full_text(&self) -> &str {
        self.doc.full_text()
    }
}

/// The record key being evaluated together with the shared document view.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub key: &'a str,
    pub document: &'a DocumentContext<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::pages_from_text;
    use crate::parsing::extract_document_values;

    #[test]
    fn test_relevant_text_is_cover_plus_supplementary_pages() {
        let doc = DocumentText::new(pages_from_text("cover\x0csite\x0cstructural\x0cnotes"));
        let extracted = extract_document_values(&doc, "", &[3, 4]);
        let ctx = DocumentContext::new(&doc, extracted, HashMap::new(), AddressMode::Strict);
        assert_eq!(ctx.relevant_text, "cover\nstructural\nnotes");
        assert!(!ctx.relevant_normalized.contains("site"));
        assert!(ctx.full_normalized.contains("site"));
    }

    #[test]
    fn test_relevant_text_short_document() {
        let doc = DocumentText::new(pages_from_text("cover\x0csite"));
        let extracted = extract_document_values(&doc, "", &[3, 4]);
        let ctx = DocumentContext::new(&doc, extracted, HashMap::new(), AddressMode::Strict);
        assert_eq!(ctx.relevant_text, "cover");
    }
}

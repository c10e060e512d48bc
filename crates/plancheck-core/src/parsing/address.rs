use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::model::StructuredRecord;
use crate::parsing::lines::TextIndex;
use crate::parsing::normalize::{
    normalize_state, normalize_states_in_text, normalize_text, state_abbreviation, states_in_text,
    words,
};

/// Address lines wrap across at most this many printed lines.
pub const MAX_ADDRESS_BLOCK_LINES: usize = 3;

static RE_STATE_ZIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z]{2})(\d{5}(?:-\d{4})?)\b").expect("valid state/zip regex")
});

/// Record keys holding the parts of one structured address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub street_1: String,
    pub street_2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Components of a structured address, as written in the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParts {
    pub street: String,
    pub street_2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl AddressParts {
    pub fn from_record(record: &StructuredRecord, fields: &AddressFields) -> Self {
        Self {
            street: record.value(&fields.street_1).to_string(),
            street_2: record.value(&fields.street_2).to_string(),
            city: record.value(&fields.city).to_string(),
            state: record.value(&fields.state).to_string(),
            postal_code: record.value(&fields.postal_code).to_string(),
        }
    }

    /// Decompose a comma-joined address ("street, [street 2,] city, state, zip").
    ///
    /// A trailing "CA 92805" segment is split into state and postal code.
    pub fn parse(compiled: &str) -> Self {
        let mut parts: Vec<String> = compiled
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if let Some(last) = parts.last().cloned() {
            let tokens: Vec<&str> = last.split_whitespace().collect();
            if tokens.len() >= 2 && tokens[tokens.len() - 1].chars().all(|c| c.is_ascii_digit() || c == '-') {
                let (state, zip) = tokens.split_at(tokens.len() - 1);
                parts.pop();
                parts.push(state.join(" "));
                parts.push(zip[0].to_string());
            }
        }

        let mut out = AddressParts::default();
        match parts.len() {
            0 => {}
            1 => out.street = parts.remove(0),
            2 => {
                out.street = parts.remove(0);
                out.city = parts.remove(0);
            }
            3 => {
                out.street = parts.remove(0);
                out.city = parts.remove(0);
                out.state = parts.remove(0);
            }
            n => {
                out.postal_code = parts.remove(n - 1);
                out.state = parts.remove(n - 2);
                out.city = parts.remove(n - 3);
                out.street = parts.remove(0);
                out.street_2 = parts.join(", ");
            }
        }
        out
    }

    /// Normalized street, city and postal code, which must all appear in one
    /// text block. The state is compared separately on whole words.
    ///
    /// Street and city go through the same state-abbreviation substitution as
    /// the document text so tokens like "Ct" compare equal on both sides.
    pub fn required_components(&self) -> Vec<String> {
        let mut out = Vec::new();
        for part in [&self.street, &self.city] {
            let n = normalize_text(&normalize_states_in_text(part));
            if !n.is_empty() {
                out.push(n);
            }
        }
        let zip = normalize_text(&self.postal_code);
        if !zip.is_empty() {
            out.push(zip);
        }
        out
    }
}

/// Join street 1, street 2 (when present), city, state and postal code with ", ".
///
/// Empty parts are skipped. Returns the joined text together with the parts.
pub fn compile_address(record: &StructuredRecord, fields: &AddressFields) -> (String, AddressParts) {
    let parts = AddressParts::from_record(record, fields);
    let joined = [
        parts.street.as_str(),
        parts.street_2.as_str(),
        parts.city.as_str(),
        parts.state.as_str(),
        parts.postal_code.as_str(),
    ]
    .iter()
    .filter(|p| !p.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(", ");
    (joined, parts)
}

/// Split glued state/zip tokens and spell out state abbreviations.
fn expand_block(block: &str) -> String {
    let separated = RE_STATE_ZIP.replace_all(block, "$1 $2");
    normalize_states_in_text(&separated)
}

/// Whole-word check for `state` in text whose abbreviations are already spelled out.
fn names_state(expanded: &str, state: &str) -> bool {
    let target = normalize_state(state);
    if state_abbreviation(state).is_some() {
        return states_in_text(expanded)
            .iter()
            .any(|s| s.eq_ignore_ascii_case(target.trim()));
    }
    // Not a US state: match its words in sequence.
    let target = words(&target);
    !target.is_empty() && words(expanded).windows(target.len()).any(|w| w == target.as_slice())
}

/// First 1–3 line block of `text` containing every address component.
pub fn find_address_block(text: &str, parts: &AddressParts) -> Option<String> {
    let wanted = parts.required_components();
    let has_state = !parts.state.trim().is_empty();
    if wanted.is_empty() && !has_state {
        return None;
    }
    TextIndex::new(text)
        .blocks(MAX_ADDRESS_BLOCK_LINES)
        .into_iter()
        .find(|block| {
            let expanded = expand_block(block);
            let norm = normalize_text(&expanded);
            wanted.iter().all(|c| norm.contains(c.as_str()))
                && (!has_state || names_state(&expanded, &parts.state))
        })
}

/// Looser check: the state's full name or its abbreviation appears anywhere.
///
/// Abbreviations are matched in any case.
pub fn state_mentioned(text: &str, state: &str) -> bool {
    !state.trim().is_empty() && names_state(&normalize_states_in_text(text), state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_fields() -> AddressFields {
        AddressFields {
            street_1: "S1".into(),
            street_2: "S2".into(),
            city: "C".into(),
            state: "ST".into(),
            postal_code: "Z".into(),
        }
    }

    #[test]
    fn test_compile_address_skips_empty_street_2() {
        let record = StructuredRecord::from_pairs([
            ("S1", "123 Main St"),
            ("C", "Anaheim"),
            ("ST", "California"),
            ("Z", "92805"),
        ]);
        let (text, parts) = compile_address(&record, &project_fields());
        assert_eq!(text, "123 Main St, Anaheim, California, 92805");
        assert_eq!(parts.city, "Anaheim");
    }

    #[test]
    fn test_compile_address_with_street_2() {
        let record = StructuredRecord::from_pairs([
            ("S1", "123 Main St"),
            ("S2", "Unit 4"),
            ("C", "Anaheim"),
            ("ST", "CA"),
            ("Z", "92805"),
        ]);
        let (text, _) = compile_address(&record, &project_fields());
        assert_eq!(text, "123 Main St, Unit 4, Anaheim, CA, 92805");
    }

    #[test]
    fn test_parse_compiled_address() {
        let parts = AddressParts::parse("123 Main St, Unit 4, Anaheim, California, 92805");
        assert_eq!(parts.street, "123 Main St");
        assert_eq!(parts.street_2, "Unit 4");
        assert_eq!(parts.city, "Anaheim");
        assert_eq!(parts.state, "California");
        assert_eq!(parts.postal_code, "92805");
    }

    #[test]
    fn test_parse_state_zip_segment() {
        let parts = AddressParts::parse("123 Main St, Anaheim, CA 92805");
        assert_eq!(parts.state, "CA");
        assert_eq!(parts.postal_code, "92805");
    }

    #[test]
    fn test_block_match_via_abbreviation() {
        let parts = AddressParts::parse("123 Main St, Anaheim, California, 92805");
        let text = "PROJECT ADDRESS\n123 MAIN ST\nANAHEIM, CA 92805\nSHEET PV-1";
        let block = find_address_block(text, &parts).unwrap();
        assert_eq!(block, "123 MAIN ST ANAHEIM, CA 92805");
    }

    #[test]
    fn test_block_match_glued_state_zip() {
        let parts = AddressParts::parse("9 Elm Ct, Hartford, CT, 06103");
        let text = "9 ELM CT HARTFORD CT06103";
        assert!(find_address_block(text, &parts).is_some());
    }

    #[test]
    fn test_block_requires_all_components() {
        let parts = AddressParts::parse("123 Main St, Anaheim, California, 92805");
        let text = "123 MAIN ST\nANAHEIM, CA 92806";
        assert!(find_address_block(text, &parts).is_none());
    }

    #[test]
    fn test_components_too_far_apart() {
        let parts = AddressParts::parse("123 Main St, Anaheim, California, 92805");
        let text = "123 MAIN ST\nline\nline\nline\nANAHEIM, CA 92805";
        assert!(find_address_block(text, &parts).is_none());
    }

    #[test]
    fn test_state_mentioned() {
        assert!(state_mentioned("ANAHEIM, CA 92805", "California"));
        assert!(state_mentioned("State of California", "CA"));
        assert!(!state_mentioned("CALIFORNIA-ISH", "TX"));
        assert!(!state_mentioned("Cancel", "CA"));
        assert!(state_mentioned("anaheim, ca 92805", "California"));
    }

    #[test]
    fn test_state_mentioned_whole_words() {
        assert!(!state_mentioned("Little Rock, Arkansas 72201", "Kansas"));
        assert!(!state_mentioned("Little Rock, AR 72201", "KS"));
        assert!(!state_mentioned("Charleston, WV 25301", "Virginia"));
        assert!(state_mentioned("Richmond, VA 23219", "Virginia"));
        assert!(state_mentioned("Charleston, WV 25301", "West Virginia"));
    }

    #[test]
    fn test_block_rejects_state_inside_longer_name() {
        let parts = AddressParts::parse("1 Oak St, Springfield, Kansas, 72201");
        assert!(find_address_block("1 OAK ST\nSPRINGFIELD, ARKANSAS 72201", &parts).is_none());

        let parts = AddressParts::parse("1 Oak St, Bluefield, Virginia, 24701");
        assert!(find_address_block("1 OAK ST\nBLUEFIELD, WV 24701", &parts).is_none());
        assert!(find_address_block("1 OAK ST\nBLUEFIELD, VA 24701", &parts).is_some());
    }
}

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static RE_TWO_LETTER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z]{2}\b").expect("valid token regex"));

/// Canonicalize a string for containment comparison.
///
/// Steps:
/// 1. Strip angle-bracket tags (`<b>`, `</span>`)
/// 2. Drop whitespace, commas, periods and quote characters
/// 3. Lowercase
pub fn normalize_text(s: &str) -> String {
    let stripped = RE_TAG.replace_all(s, "");
    stripped
        .chars()
        .filter(|c| !c.is_whitespace() && !is_dropped_punctuation(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_dropped_punctuation(c: char) -> bool {
    matches!(
        c,
        ',' | '.' | '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}'
    )
}

/// Keep only ASCII digits.
pub fn normalize_phone(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Reduce a lumber dimension to digits and `x`, so `2" X 4"`, `2 x 4` and
/// `2x4` all become `2x4`.
pub fn normalize_dimension(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'x')
        .collect()
}

/// Map a state name or two-letter abbreviation to its lowercase full name.
///
/// Unknown input is returned unchanged.
pub fn normalize_state(s: &str) -> String {
    let key = s.trim().to_lowercase();
    if let Some(full) = STATES_BY_NAME.get(key.as_str()) {
        return full.to_lowercase();
    }
    if let Some(full) = STATES_BY_ABBR.get(key.to_uppercase().as_str()) {
        return full.to_lowercase();
    }
    s.to_string()
}

/// Two-letter postal abbreviation for a state name or abbreviation.
pub fn state_abbreviation(s: &str) -> Option<&'static str> {
    let key = s.trim().to_lowercase();
    if let Some((abbr, _)) = STATE_TABLE.iter().find(|(abbr, _)| abbr.eq_ignore_ascii_case(&key)) {
        return Some(*abbr);
    }
    STATE_TABLE
        .iter()
        .find(|(_, full)| full.to_lowercase() == key)
        .map(|(abbr, _)| *abbr)
}

/// Replace standalone two-letter state abbreviations with full state names.
///
/// Matching is case-insensitive and word-boundary safe: `CA` and `ca` become
/// `California`, while `CAL` or `SCA` are left alone.
pub fn normalize_states_in_text(text: &str) -> String {
    RE_TWO_LETTER_TOKEN
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            match STATES_BY_ABBR.get(token.to_uppercase().as_str()) {
                Some(full) => full.to_string(),
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// The 50 states plus the District of Columbia.
pub static STATE_TABLE: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

static STATES_BY_ABBR: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| STATE_TABLE.iter().copied().collect());

static STATES_BY_NAME: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    STATE_TABLE
        .iter()
        .map(|(_, full)| (full.to_lowercase(), *full))
        .collect()
});

/// State names as word sequences, longest first.
static STATE_WORDS: LazyLock<Vec<(Vec<String>, &'static str)>> = LazyLock::new(|| {
    let mut names: Vec<(Vec<String>, &'static str)> =
        STATE_TABLE.iter().map(|(_, full)| (words(full), *full)).collect();
    names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    names
});

/// Lowercased alphanumeric words of `text`.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Full state names written out in `text`, matched on whole words.
///
/// Multi-word names are tried first, so "West Virginia" does not also count
/// as "Virginia".
pub fn states_in_text(text: &str) -> Vec<&'static str> {
    let tokens = words(text);
    let mut found = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match STATE_WORDS.iter().find(|(name, _)| tokens[i..].starts_with(name)) {
            Some((name, full)) => {
                found.push(*full);
                i += name.len();
            }
            None => i += 1,
        }
    }
    found
}

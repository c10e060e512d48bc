pub mod builtin;
pub mod schema;

use crate::error::QcError;
use schema::{ProfileDef, StrategyDef};
use std::collections::HashSet;
use std::path::Path;

/// Load a profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<ProfileDef, QcError> {
    let content = std::fs::read_to_string(path).map_err(|e| QcError::ProfileLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_profile(&content, path)
}

/// Parse a profile from a JSON string read from `source`.
pub fn parse_profile(json: &str, source: &Path) -> Result<ProfileDef, QcError> {
    let profile: ProfileDef = serde_json::from_str(json).map_err(|e| QcError::ProfileLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Parse a profile from a JSON string (no file path context).
pub fn parse_profile_str(json: &str) -> Result<ProfileDef, QcError> {
    let profile: ProfileDef = serde_json::from_str(json).map_err(QcError::Json)?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Validate that a profile is well-formed.
pub fn validate_profile(profile: &ProfileDef) -> Result<(), QcError> {
    if profile.fields.is_empty() {
        return Err(QcError::ProfileInvalid("fields must not be empty".into()));
    }

    if let Some(page) = profile.supplementary_pages.iter().find(|&&p| p < 2) {
        return Err(QcError::ProfileInvalid(format!(
            "supplementary page {page} is invalid (page 1 is always searched; pages are 1-based)"
        )));
    }

    let mut labels = HashSet::new();
    for field in &profile.fields {
        if field.label.trim().is_empty() {
            return Err(QcError::ProfileInvalid("field label must not be empty".into()));
        }

        if field.key.trim().is_empty() {
            return Err(QcError::ProfileInvalid(format!(
                "field '{}' has an empty record key",
                field.label
            )));
        }

        if !labels.insert(field.label.as_str()) {
            return Err(QcError::ProfileInvalid(format!(
                "duplicate field label '{}'",
                field.label
            )));
        }

        if !profile.categories.contains(&field.category) {
            return Err(QcError::ProfileInvalid(format!(
                "field '{}' references unknown category '{}'",
                field.label, field.category
            )));
        }

        let keyword = match &field.strategy {
            Some(StrategyDef::KeywordLine { keyword }) | Some(StrategyDef::Roofing { keyword }) => {
                Some(keyword.as_str())
            }
            Some(StrategyDef::Dimension { keyword: Some(k) })
            | Some(StrategyDef::Aliased { keyword: Some(k), .. }) => Some(k.as_str()),
            _ => None,
        };
        if keyword.is_some_and(|k| k.trim().is_empty()) {
            return Err(QcError::ProfileInvalid(format!(
                "field '{}' has an empty keyword",
                field.label
            )));
        }
    }

    for address in &profile.addresses {
        if address.target_key.trim().is_empty() {
            return Err(QcError::ProfileInvalid(
                "address target key must not be empty".into(),
            ));
        }
    }

    Ok(())
}

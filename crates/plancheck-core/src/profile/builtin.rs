use crate::error::QcError;
use crate::profile::schema::ProfileDef;
use crate::profile::validate_profile;

const PLAN_SET_JSON: &str = include_str!("../../../../profiles/plan-set.json");

/// Available predefined profiles.
pub const PRESETS: &[&str] = &["plan-set"];

/// Profile used when none is given.
pub const DEFAULT_PRESET: &str = "plan-set";

/// Load a predefined profile by name.
pub fn load_preset(name: &str) -> Result<ProfileDef, QcError> {
    match name {
        "plan-set" => {
            let profile: ProfileDef = serde_json::from_str(PLAN_SET_JSON)?;
            validate_profile(&profile)?;
            Ok(profile)
        }
        _ => Err(QcError::ProfileInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

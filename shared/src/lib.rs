use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

/// Language used for user-facing messages and result placeholders.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    Id,
    En,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub mode: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub detected: bool,
    pub confidence: f32,
    /// Raw class name predicted by the model, absent for low-confidence results.
    pub label: Option<String>,
    pub banana_type: String,
    pub ripeness: String,
    pub quality: String,
    pub recommendations: Vec<String>,
    pub image_info: ImageInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DetectResponse {
    pub results: DetectionResult,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LabelEntry {
    pub index: usize,
    pub label: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_locale_parses_case_insensitively() {
        assert_eq!(Locale::from_str("id"), Ok(Locale::Id));
        assert_eq!(Locale::from_str("EN"), Ok(Locale::En));
        assert!(Locale::from_str("fr").is_err());
        assert_eq!(Locale::default(), Locale::Id);
    }
}

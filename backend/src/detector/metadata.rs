use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Failed to read banana metadata {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse banana metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Usage advice, stored either as one sentence or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Recommendation {
    One(String),
    Many(Vec<String>),
}

impl Recommendation {
    pub fn items(&self) -> Vec<String> {
        let items: Vec<&String> = match self {
            Recommendation::One(text) => vec![text],
            Recommendation::Many(texts) => texts.iter().collect(),
        };
        items
            .into_iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BananaInfo {
    #[serde(default, rename = "asal", alias = "origin")]
    pub origin: Option<String>,
    #[serde(default, rename = "khasiat", alias = "benefit")]
    pub benefit: Option<String>,
    #[serde(default, rename = "manfaat", alias = "usage")]
    pub usage: Option<Recommendation>,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    entries: HashMap<String, BananaInfo>,
}

impl MetadataTable {
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let raw = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, MetadataError> {
        let entries: HashMap<String, BananaInfo> = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    pub fn get(&self, label: &str) -> Option<&BananaInfo> {
        self.entries.get(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "cavendish_matang": {
            "asal": "Kalimantan",
            "khasiat": "Baik",
            "manfaat": "Dimakan langsung"
        },
        "raja_mentah": {
            "origin": "Jawa",
            "usage": ["Digoreng", "  ", "Dikukus"]
        },
        "kepok_busuk": {}
    }"#;

    #[test]
    fn test_parse_indonesian_keys() {
        let table = MetadataTable::from_json_str(TABLE).unwrap();
        let info = table.get("cavendish_matang").unwrap();

        assert_eq!(info.origin.as_deref(), Some("Kalimantan"));
        assert_eq!(info.benefit.as_deref(), Some("Baik"));
        assert_eq!(
            info.usage.as_ref().map(Recommendation::items),
            Some(vec!["Dimakan langsung".to_string()])
        );
    }

    #[test]
    fn test_parse_english_aliases_and_list() {
        let table = MetadataTable::from_json_str(TABLE).unwrap();
        let info = table.get("raja_mentah").unwrap();

        assert_eq!(info.origin.as_deref(), Some("Jawa"));
        assert_eq!(info.benefit, None);
        assert_eq!(
            info.usage.as_ref().unwrap().items(),
            vec!["Digoreng".to_string(), "Dikukus".to_string()]
        );
    }

    #[test]
    fn test_empty_entry_and_missing_label() {
        let table = MetadataTable::from_json_str(TABLE).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("kepok_busuk"), Some(&BananaInfo::default()));
        assert!(table.get("tanduk").is_none());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            MetadataTable::from_json_str(r#"{"a": 1}"#),
            Err(MetadataError::Parse(_))
        ));
    }
}

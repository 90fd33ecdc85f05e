use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("Failed to read label mapping {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse label mapping: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Label mapping is empty")]
    Empty,
    #[error("Labels {first:?} and {second:?} share index {index}")]
    DuplicateIndex {
        index: usize,
        first: String,
        second: String,
    },
    #[error("No label for index {index} (mapping has {len} labels)")]
    MissingIndex { index: usize, len: usize },
}

/// Dense mapping between class indices `0..K` and class names.
#[derive(Debug, Clone)]
pub struct LabelIndex {
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl LabelIndex {
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses a `{"label": index}` object and inverts it.
    pub fn from_json_str(raw: &str) -> Result<Self, LabelError> {
        let mapping: HashMap<String, usize> = serde_json::from_str(raw)?;
        Self::from_mapping(mapping)
    }

    pub fn from_mapping(mapping: HashMap<String, usize>) -> Result<Self, LabelError> {
        if mapping.is_empty() {
            return Err(LabelError::Empty);
        }

        let len = mapping.len();
        let mut slots: Vec<Option<String>> = vec![None; len];
        for (name, index) in &mapping {
            let slot = slots
                .get_mut(*index)
                .ok_or(LabelError::MissingIndex { index: *index, len })?;
            if let Some(existing) = slot {
                let (first, second) = if existing.as_str() < name.as_str() {
                    (existing.clone(), name.clone())
                } else {
                    (name.clone(), existing.clone())
                };
                return Err(LabelError::DuplicateIndex {
                    index: *index,
                    first,
                    second,
                });
            }
            *slot = Some(name.clone());
        }

        let names = slots
            .into_iter()
            .enumerate()
            .map(|(index, name)| name.ok_or(LabelError::MissingIndex { index, len }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            names,
            indices: mapping,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(String::as_str).enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_inverts_mapping() {
        let labels =
            LabelIndex::from_json_str(r#"{"raja_mentah": 1, "cavendish_matang": 0, "ambon": 2}"#)
                .unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.name(0), Some("cavendish_matang"));
        assert_eq!(labels.name(2), Some("ambon"));
        assert_eq!(labels.name(3), None);
        assert_eq!(labels.index_of("raja_mentah"), Some(1));
        assert_eq!(
            labels.iter().map(|(_, n)| n).collect::<Vec<_>>(),
            vec!["cavendish_matang", "raja_mentah", "ambon"]
        );
    }

    #[test]
    fn test_rejects_gap() {
        let err = LabelIndex::from_json_str(r#"{"a": 0, "b": 2}"#).unwrap_err();
        assert!(matches!(err, LabelError::MissingIndex { .. }));
    }

    #[test]
    fn test_rejects_duplicate_index() {
        let err = LabelIndex::from_json_str(r#"{"a": 0, "b": 0}"#).unwrap_err();
        match err {
            LabelError::DuplicateIndex { index, first, second } => {
                assert_eq!(index, 0);
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            LabelIndex::from_json_str("{}"),
            Err(LabelError::Empty)
        ));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            LabelIndex::from_json_str(r#"["a", "b"]"#),
            Err(LabelError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"pisang_kepok": 0}}"#).unwrap();

        let labels = LabelIndex::load(file.path()).unwrap();
        assert_eq!(labels.name(0), Some("pisang_kepok"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            LabelIndex::load(Path::new("/nonexistent/labels.json")),
            Err(LabelError::Io { .. })
        ));
    }
}

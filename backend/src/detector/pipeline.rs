use std::path::Path;

use shared::{DetectionResult, Locale};

use super::classifier::{Classifier, ClassifierError, top_prediction};
use super::enrich;
use super::intake::{self, IntakeError};
use super::labels::{LabelError, LabelIndex};
use super::metadata::{MetadataError, MetadataTable};
use super::preprocess::{self, InputSpec, PreprocessError};
use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("Preprocessing error: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Labels(#[from] LabelError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("Label mapping has {labels} labels but the model produces {outputs} scores")]
    LabelMismatch { labels: usize, outputs: usize },
}

impl PipelineError {
    pub fn is_invalid_image(&self) -> bool {
        matches!(self, PipelineError::Intake(IntakeError::InvalidImage(_)))
    }
}

/// Model, label mapping and metadata, loaded once and shared read-only.
pub struct Pipeline {
    classifier: Box<dyn Classifier>,
    labels: LabelIndex,
    metadata: MetadataTable,
    input: InputSpec,
    threshold: f32,
}

impl Pipeline {
    pub fn new(
        classifier: Box<dyn Classifier>,
        labels: LabelIndex,
        metadata: MetadataTable,
        input: InputSpec,
        threshold: f32,
    ) -> Result<Self, PipelineError> {
        if let Some(outputs) = classifier.output_len() {
            if outputs != labels.len() {
                return Err(PipelineError::LabelMismatch {
                    labels: labels.len(),
                    outputs,
                });
            }
        }

        for label in metadata.labels() {
            if labels.index_of(label).is_none() {
                log::warn!("Metadata entry {:?} does not match any model label", label);
            }
        }

        Ok(Self {
            classifier,
            labels,
            metadata,
            input,
            threshold,
        })
    }

    pub fn load(config: &AppConfig) -> Result<Self, PipelineError> {
        let labels = LabelIndex::load(Path::new(&config.model.labels_path))?;
        log::info!(
            "Loaded {} labels from {}",
            labels.len(),
            config.model.labels_path
        );
        let metadata = MetadataTable::load(Path::new(&config.model.metadata_path))?;
        log::info!(
            "Loaded {} metadata entries from {}",
            metadata.len(),
            config.model.metadata_path
        );

        let classifier = load_classifier(config)?;
        Self::new(
            classifier,
            labels,
            metadata,
            config.image,
            config.detection.confidence_threshold,
        )
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    /// Runs intake, preprocessing, inference and enrichment for one upload.
    pub fn detect(&self, path: &Path, locale: Locale) -> Result<DetectionResult, PipelineError> {
        let (image, image_info) = intake::inspect(path)?;
        let input = preprocess::to_input(&image, &self.input)?;
        let scores = self.classifier.predict(&input)?;
        if scores.len() != self.labels.len() {
            return Err(ClassifierError::Shape {
                expected: self.labels.len(),
                actual: scores.len(),
            }
            .into());
        }

        let (index, confidence) = top_prediction(&scores)?;
        let label = self.labels.name(index).ok_or(LabelError::MissingIndex {
            index,
            len: self.labels.len(),
        })?;
        log::debug!(
            "Predicted {} ({:.4}) for {}",
            label,
            confidence,
            path.display()
        );

        Ok(enrich::build_result(
            label,
            confidence,
            self.threshold,
            self.metadata.get(label),
            image_info,
            locale,
        ))
    }
}

#[cfg(feature = "torch")]
fn load_classifier(config: &AppConfig) -> Result<Box<dyn Classifier>, PipelineError> {
    let classifier = super::classifier::TorchClassifier::load(
        &config.model.path,
        config.image.shape(),
        config.model.apply_softmax,
    )?;
    Ok(Box::new(classifier))
}

#[cfg(not(feature = "torch"))]
fn load_classifier(_config: &AppConfig) -> Result<Box<dyn Classifier>, PipelineError> {
    Err(ClassifierError::Unavailable.into())
}

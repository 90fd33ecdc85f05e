use ndarray::Array4;

#[cfg(feature = "torch")]
use std::sync::Mutex;
#[cfg(feature = "torch")]
use tch::{CModule, Device, Kind, Tensor};

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("Model inference error: {0}")]
    Forward(String),
    #[error("Model returned {actual} scores, expected {expected}")]
    Shape { expected: usize, actual: usize },
    #[error("Model returned no usable scores")]
    EmptyOutput,
    #[error("Backend was built without a model runtime")]
    Unavailable,
}

/// A loaded image classifier producing one probability per class.
pub trait Classifier: Send + Sync {
    /// Length of the output vector, when the runtime can report it up front.
    fn output_len(&self) -> Option<usize> {
        None
    }

    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError>;
}

/// Index and score of the highest-scoring class. Ties go to the lower index.
pub fn top_prediction(scores: &[f32]) -> Result<(usize, f32), ClassifierError> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (index, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((index, score)),
        })
        .ok_or(ClassifierError::EmptyOutput)
}

#[cfg(feature = "torch")]
pub struct TorchClassifier {
    model: Mutex<CModule>,
    device: Device,
    apply_softmax: bool,
    output_len: usize,
}

#[cfg(feature = "torch")]
impl TorchClassifier {
    /// Loads a TorchScript module and runs one pass on zeros to learn its output width.
    pub fn load(
        model_path: &str,
        input_shape: [usize; 4],
        apply_softmax: bool,
    ) -> Result<Self, ClassifierError> {
        let device = Device::cuda_if_available();
        log::info!("Loading model {} on {:?}", model_path, device);

        let mut module =
            CModule::load_on_device(model_path, device).map_err(|e| ClassifierError::Load {
                path: model_path.to_string(),
                reason: e.to_string(),
            })?;
        module.set_eval();

        let mut classifier = Self {
            model: Mutex::new(module),
            device,
            apply_softmax,
            output_len: 0,
        };
        let zeros = Array4::<f32>::zeros(input_shape);
        classifier.output_len = classifier.predict(&zeros)?.len();
        Ok(classifier)
    }

    fn forward(&self, input: &Array4<f32>) -> Result<Tensor, ClassifierError> {
        let shape: Vec<i64> = input.shape().iter().map(|d| *d as i64).collect();
        let data = input
            .as_slice()
            .ok_or_else(|| ClassifierError::Forward("input tensor is not contiguous".into()))?;
        let tensor = Tensor::from_slice(data).view(shape.as_slice()).to_device(self.device);

        let model = self
            .model
            .lock()
            .map_err(|_| ClassifierError::Forward("model lock poisoned".into()))?;
        tch::no_grad(|| model.forward_ts(&[tensor]))
            .map_err(|e| ClassifierError::Forward(e.to_string()))
    }
}

#[cfg(feature = "torch")]
impl Classifier for TorchClassifier {
    fn output_len(&self) -> Option<usize> {
        Some(self.output_len)
    }

    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let output = self.forward(input)?;
        let output = if self.apply_softmax {
            output.softmax(-1, Kind::Float)
        } else {
            output.to_kind(Kind::Float)
        };
        let output_flat = output
            .to_device(Device::Cpu)
            .f_reshape([-1])
            .map_err(|e| ClassifierError::Forward(e.to_string()))?;
        let scores = Vec::<f32>::try_from(&output_flat)
            .map_err(|e| ClassifierError::Forward(e.to_string()))?;
        if scores.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }
        Ok(scores)
    }
}

/// Returns the same scores for every input.
#[cfg(test)]
pub(crate) struct FixedClassifier {
    pub scores: Vec<f32>,
}

#[cfg(test)]
impl Classifier for FixedClassifier {
    fn output_len(&self) -> Option<usize> {
        Some(self.scores.len())
    }

    fn predict(&self, _input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        Ok(self.scores.clone())
    }
}

/// Fails every forward pass.
#[cfg(test)]
pub(crate) struct BrokenClassifier;

#[cfg(test)]
impl Classifier for BrokenClassifier {
    fn predict(&self, _input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        Err(ClassifierError::Forward("simulated runtime failure".into()))
    }
}

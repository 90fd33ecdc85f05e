use image::DynamicImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Invalid input size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Memory layout expected by the exported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    #[default]
    Nchw,
    Nhwc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
    pub filter: ResizeFilter,
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            width: 224,
            height: 224,
            layout: TensorLayout::default(),
            filter: ResizeFilter::default(),
        }
    }
}

impl InputSpec {
    pub fn shape(&self) -> [usize; 4] {
        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            TensorLayout::Nchw => [1, 3, h, w],
            TensorLayout::Nhwc => [1, h, w, 3],
        }
    }
}

/// Resizes to the model input size, scales to [0, 1] and adds the batch axis.
pub fn to_input(image: &DynamicImage, spec: &InputSpec) -> Result<Array4<f32>, PreprocessError> {
    if spec.width == 0 || spec.height == 0 {
        return Err(PreprocessError::InvalidSize {
            width: spec.width,
            height: spec.height,
        });
    }

    let rgb = image.to_rgb8();
    let resized = if rgb.dimensions() == (spec.width, spec.height) {
        rgb
    } else {
        imageops::resize(&rgb, spec.width, spec.height, spec.filter.into())
    };

    let mut input = Array4::<f32>::zeros(spec.shape());
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for (c, value) in pixel.0.iter().enumerate() {
            let value = *value as f32 / 255.0;
            match spec.layout {
                TensorLayout::Nchw => input[[0, c, y, x]] = value,
                TensorLayout::Nhwc => input[[0, y, x, c]] = value,
            }
        }
    }
    Ok(input)
}

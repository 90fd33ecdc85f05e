use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use shared::ImageInfo;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Failed to read upload {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// Opens and fully decodes the image at `path`.
///
/// Decoding the pixel data rather than only sniffing the header is what
/// rejects truncated uploads.
pub fn inspect(path: &Path) -> Result<(DynamicImage, ImageInfo), IntakeError> {
    let reader = ImageReader::open(path)
        .map_err(|source| IntakeError::Io {
            path: path.display().to_string(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| IntakeError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let format = reader
        .format()
        .ok_or_else(|| IntakeError::InvalidImage("unrecognized image encoding".into()))?;

    let image = reader
        .decode()
        .map_err(|e| IntakeError::InvalidImage(e.to_string()))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(IntakeError::InvalidImage("image has no pixels".into()));
    }

    let info = ImageInfo {
        width: image.width(),
        height: image.height(),
        format: format_name(format).to_string(),
        mode: color_mode(image.color()).to_string(),
    };
    log::debug!(
        "Decoded {} as {} {}x{} ({})",
        path.display(),
        info.format,
        info.width,
        info.height,
        info.mode
    );

    Ok((image, info))
}

pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Ico => "ICO",
        ImageFormat::Tga => "TGA",
        ImageFormat::Pnm => "PPM",
        ImageFormat::Avif => "AVIF",
        ImageFormat::Qoi => "QOI",
        ImageFormat::Hdr => "HDR",
        ImageFormat::OpenExr => "EXR",
        ImageFormat::Farbfeld => "FARBFELD",
        _ => "UNKNOWN",
    }
}

/// Mode names follow the conventions of common imaging libraries.
pub fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage};
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn encoded(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn write_temp(bytes: &[u8], suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_inspect_png() {
        let bytes = encoded(DynamicImage::ImageRgb8(RgbImage::new(12, 7)), ImageFormat::Png);
        let file = write_temp(&bytes, ".png");

        let (image, info) = inspect(file.path()).unwrap();
        assert_eq!(image.width(), 12);
        assert_eq!(
            info,
            ImageInfo {
                width: 12,
                height: 7,
                format: "PNG".into(),
                mode: "RGB".into(),
            }
        );
    }

    #[test]
    fn test_inspect_grayscale_jpeg() {
        let bytes = encoded(DynamicImage::ImageLuma8(GrayImage::new(16, 16)), ImageFormat::Jpeg);
        let file = write_temp(&bytes, ".jpg");

        let (_, info) = inspect(file.path()).unwrap();
        assert_eq!(info.format, "JPEG");
        assert_eq!(info.mode, "L");
    }

    #[test]
    fn test_format_detected_from_content_not_extension() {
        let bytes = encoded(DynamicImage::ImageRgb8(RgbImage::new(4, 4)), ImageFormat::Png);
        let file = write_temp(&bytes, ".jpg");

        let (_, info) = inspect(file.path()).unwrap();
        assert_eq!(info.format, "PNG");
    }

    #[test]
    fn test_zero_byte_file_is_invalid() {
        let file = write_temp(&[], ".png");
        assert!(matches!(
            inspect(file.path()),
            Err(IntakeError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_garbage_bytes_are_invalid() {
        let file = write_temp(b"definitely not an image", ".png");
        assert!(matches!(
            inspect(file.path()),
            Err(IntakeError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_truncated_png_is_invalid() {
        let noisy = RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 31 + y) as u8, (y * 17) as u8, (x ^ y) as u8])
        });
        let bytes = encoded(DynamicImage::ImageRgb8(noisy), ImageFormat::Png);
        let file = write_temp(&bytes[..bytes.len() / 2], ".png");
        assert!(matches!(
            inspect(file.path()),
            Err(IntakeError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = inspect(Path::new("/nonexistent/upload.png"));
        assert!(matches!(result, Err(IntakeError::Io { .. })));
    }
}

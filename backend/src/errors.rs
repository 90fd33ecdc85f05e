use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use shared::{ErrorResponse, Locale};

use crate::detector::PipelineError;
use crate::i18n::Message;

/// Failures surfaced to the client. Internal detail stays in the logs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file submitted")]
    NoFile,
    #[error("Unsupported file type: {0:?}")]
    UnsupportedFormat(String),
    #[error("Upload exceeds {max_bytes} bytes")]
    FileTooLarge { max_bytes: usize },
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Processing failed: {0}")]
    Processing(String),
    #[error("Not found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFile => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NoFile => "no_file",
            ApiError::UnsupportedFormat(_) => "unsupported_format",
            ApiError::FileTooLarge { .. } => "file_too_large",
            ApiError::InvalidImage(_) => "invalid_image",
            ApiError::Processing(_) => "processing_failed",
            ApiError::NotFound => "not_found",
        }
    }

    fn message(&self) -> Message {
        match self {
            ApiError::NoFile => Message::NoFile,
            ApiError::UnsupportedFormat(_) => Message::UnsupportedFormat,
            ApiError::FileTooLarge { max_bytes } => Message::FileTooLarge {
                max_bytes: *max_bytes,
            },
            ApiError::InvalidImage(_) => Message::InvalidImage,
            ApiError::Processing(_) => Message::ProcessingFailed,
            ApiError::NotFound => Message::NotFound,
        }
    }

    pub fn error_response(&self, locale: Locale) -> HttpResponse {
        match self {
            ApiError::Processing(detail) => log::error!("Detection failed: {}", detail),
            ApiError::NotFound => {}
            other => log::warn!("Rejected upload: {}", other),
        }

        HttpResponse::build(self.status()).json(ErrorResponse {
            error: self.message().text(locale),
            code: self.code().to_string(),
        })
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        if err.is_invalid_image() {
            ApiError::InvalidImage(err.to_string())
        } else {
            ApiError::Processing(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Processing(format!("I/O error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::classifier::ClassifierError;
    use crate::detector::intake::IntakeError;

    #[test]
    fn test_pipeline_error_mapping() {
        let invalid: ApiError =
            PipelineError::Intake(IntakeError::InvalidImage("truncated".into())).into();
        assert!(matches!(invalid, ApiError::InvalidImage(_)));
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let failed: ApiError =
            PipelineError::Classifier(ClassifierError::Forward("boom".into())).into();
        assert!(matches!(failed, ApiError::Processing(_)));
        assert_eq!(failed.code(), "processing_failed");
    }

    #[test]
    fn test_codes_and_statuses() {
        assert_eq!(ApiError::NoFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::UnsupportedFormat("a.txt".into()).code(),
            "unsupported_format"
        );
        assert_eq!(
            ApiError::FileTooLarge { max_bytes: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_processing_error_is_internal() {
        let response =
            ApiError::Processing("CUDA out of memory".into()).error_response(Locale::En);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

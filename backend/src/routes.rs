use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::dev::{ServiceRequest, ServiceResponse, fn_service};
use actix_web::{HttpRequest, HttpResponse, web};
use futures::TryStreamExt;
use log::{info, warn};
use serde_json::json;
use shared::{DetectResponse, LabelEntry, Locale};
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, Retention};
use crate::detector::Pipeline;
use crate::detector::enrich::display_name;
use crate::errors::ApiError;
use crate::i18n::request_locale;
use crate::upload::{TempUpload, allowed_extension};

pub fn configure_routes(cfg: &mut web::ServiceConfig, config: &AppConfig) {
    cfg.service(web::resource("/api/detect").route(web::post().to(handle_detect)))
        .service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/labels").route(web::get().to(list_labels)));

    if config.upload.retention == Retention::Public {
        cfg.service(Files::new("/uploads", &config.upload.dir));
    }

    let frontend_dir = Path::new(&config.server.frontend_dir);
    if frontend_dir.is_dir() {
        cfg.service(
            Files::new("/", frontend_dir)
                .index_file("index.html")
                .default_handler(fn_service(|req: ServiceRequest| async move {
                    let (req, _) = req.into_parts();
                    let response = not_found_response(&req);
                    Ok::<_, actix_web::Error>(ServiceResponse::new(req, response))
                })),
        );
    } else {
        warn!(
            "Frontend directory {} not found, serving the API only",
            frontend_dir.display()
        );
    }

    cfg.default_service(web::to(not_found));
}

fn default_locale(req: &HttpRequest) -> Locale {
    req.app_data::<web::Data<AppConfig>>()
        .map(|config| config.locale.default)
        .unwrap_or_default()
}

fn not_found_response(req: &HttpRequest) -> HttpResponse {
    let locale = request_locale(req, default_locale(req));
    ApiError::NotFound.error_response(locale)
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    not_found_response(&req)
}

async fn handle_detect(
    req: HttpRequest,
    pipeline: web::Data<Pipeline>,
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> HttpResponse {
    let locale = request_locale(&req, config.locale.default);
    match detect_upload(pipeline, config, payload, locale).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(locale),
    }
}

async fn detect_upload(
    pipeline: web::Data<Pipeline>,
    config: web::Data<AppConfig>,
    mut payload: Multipart,
    locale: Locale,
) -> Result<DetectResponse, ApiError> {
    let (filename, bytes) = read_upload(&mut payload, config.upload.max_bytes).await?;

    let upload_dir = PathBuf::from(&config.upload.dir);
    let retention = config.upload.retention;
    let original = filename.clone();
    let (results, stored) = web::block(move || -> Result<_, ApiError> {
        let upload = TempUpload::persist(&upload_dir, &original, &bytes)?;
        log::debug!("Running detection on {}", upload.file_name());
        let results = pipeline.detect(upload.path(), locale)?;
        let stored = match retention {
            Retention::Public => Some(upload.keep()),
            Retention::Delete => None,
        };
        Ok((results, stored))
    })
    .await
    .map_err(|e| ApiError::Processing(format!("Detection task failed: {}", e)))??;

    info!(
        "Processed {}: detected={} confidence={:.4}",
        filename, results.detected, results.confidence
    );

    Ok(DetectResponse {
        results,
        filename,
        image_url: stored.map(|name| format!("/uploads/{}", name)),
    })
}

/// Reads the `file` field, enforcing the name and extension rules. `max_bytes`
/// caps every field of the body together.
async fn read_upload(
    payload: &mut Multipart,
    max_bytes: usize,
) -> Result<(String, Vec<u8>), ApiError> {
    let malformed = |e: actix_multipart::MultipartError| {
        warn!("Malformed multipart body: {}", e);
        ApiError::NoFile
    };
    let mut received = 0usize;
    let mut count = |len: usize| {
        received += len;
        if received > max_bytes {
            Err(ApiError::FileTooLarge { max_bytes })
        } else {
            Ok(())
        }
    };

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        if field.name() != Some("file") {
            while let Some(chunk) = field.try_next().await.map_err(malformed)? {
                count(chunk.len())?;
            }
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        if filename.trim().is_empty() {
            return Err(ApiError::NoFile);
        }
        if allowed_extension(&filename).is_none() {
            return Err(ApiError::UnsupportedFormat(filename));
        }

        let mut image_data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            count(chunk.len())?;
            image_data.extend_from_slice(&chunk);
        }
        return Ok((filename, image_data));
    }

    Err(ApiError::NoFile)
}

async fn health(pipeline: web::Data<Pipeline>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "labels": pipeline.labels().len(),
    }))
}

async fn list_labels(pipeline: web::Data<Pipeline>) -> HttpResponse {
    let labels: Vec<LabelEntry> = pipeline
        .labels()
        .iter()
        .map(|(index, label)| LabelEntry {
            index,
            label: label.to_string(),
            display_name: display_name(label),
        })
        .collect();
    HttpResponse::Ok().json(labels)
}

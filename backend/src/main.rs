mod config;
mod detector;
mod errors;
mod i18n;
mod routes;
mod upload;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use config::AppConfig;
use detector::Pipeline;
use routes::configure_routes;
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Configuration error: {}", e),
        )
    })?;

    std::fs::create_dir_all(&config.upload.dir)?;
    log::info!(
        "Uploads go to {} (retention: {:?}, max {} bytes)",
        config.upload.dir,
        config.upload.retention,
        config.upload.max_bytes
    );

    let pipeline = Pipeline::load(&config).map_err(|e| {
        log::error!("Failed to load model at startup: {}", e);
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Model loading failed: {}", e),
        )
    })?;
    log::info!(
        "Model ready with {} labels, confidence threshold {}",
        pipeline.labels().len(),
        config.detection.confidence_threshold
    );

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let pipeline = web::Data::new(pipeline);
    let config = web::Data::new(config);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        let route_config = config.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::ACCEPT_LANGUAGE,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(pipeline.clone())
            .app_data(config.clone())
            .configure(move |cfg| configure_routes(cfg, &route_config))
    })
    .bind(&bind_address)?
    .run()
    .await
}

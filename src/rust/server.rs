use crate::classifier::{ClassifierError, TransactionClassifier};
use crate::io_struct::{ClassifyRequest, ErrorDetail, HealthStatus, ServiceInfo};
use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpRequest, HttpResponse, HttpServer, ResponseError};
use std::sync::Arc;

/// Largest `/classify` body accepted; bigger requests get 413.
pub const MAX_PAYLOAD_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of HTTP worker threads; 0 lets actix pick one per core
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: 0,
        }
    }
}

/// Read-only state shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub classifier: Arc<TransactionClassifier>,
}

impl AppState {
    pub fn new(classifier: TransactionClassifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Classification(#[from] ClassifierError),
    #[error("{0}")]
    Blocking(#[from] actix_web::error::BlockingError),
    #[error("{0}")]
    InvalidPayload(String),
    #[error("{0}")]
    PayloadTooLarge(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorDetail {
            detail: self.to_string(),
        })
    }
}

#[get("/")]
pub async fn root(_req: HttpRequest, app_state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ServiceInfo::running(app_state.classifier.categories()))
}

#[post("/classify")]
pub async fn classify(
    _req: HttpRequest,
    req: web::Json<ClassifyRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let classifier = Arc::clone(&app_state.classifier);
    let description = req.into_inner().description;

    // Forward pass is CPU-bound, keep it off the async workers
    let result = web::block(move || classifier.classify(&description))
        .await?
        .map_err(|e| {
            log::error!("Classification failed: {}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(result))
}

#[get("/health")]
pub async fn health(_req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus::healthy())
}

/// Registers the routes and the JSON payload error handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(MAX_PAYLOAD_SIZE)
        .error_handler(|err, _req| {
            let message = err.to_string();
            match err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    ApiError::PayloadTooLarge(message).into()
                }
                _ => ApiError::InvalidPayload(message).into(),
            }
        });

    cfg.app_data(json_config)
        .service(root)
        .service(classify)
        .service(health);
}

pub async fn startup(config: ServerConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    log::info!(
        "Starting server at {}:{} with {} categories",
        config.host,
        config.port,
        app_state.classifier.categories().len()
    );

    let mut server = HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    });
    if config.workers > 0 {
        server = server.workers(config.workers);
    }

    server.bind((config.host, config.port))?.run().await
}

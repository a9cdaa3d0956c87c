//! HTTP surface: `POST /analyze`, `POST /enrich`, `POST` anywhere else to
//! generate an image, `OPTIONS` anywhere for CORS pre-flight, 405 otherwise.

pub mod handlers;

use crate::{
    config::Config,
    error::{RelayError, Result},
    logger,
    models::ErrorEnvelope,
    orchestrator::PromptOrchestrator,
    services::InferenceClient,
};
use actix_web::{
    http::{header, Method, StatusCode},
    middleware, web, App, HttpResponse, HttpServer, ResponseError,
};

pub const MAX_BODY_BYTES: usize = 1 << 20;

pub struct AppState {
    pub orchestrator: PromptOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: PromptOrchestrator) -> Self {
        Self { orchestrator }
    }
}

/// Every failure leaves the server as a 500 carrying the error's message.
impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorEnvelope {
            error: self.to_string(),
        })
    }
}

pub fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new().add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .content_type_required(false)
        .error_handler(|err, _req| RelayError::RequestError(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::resource("/analyze")
                .route(web::post().to(handlers::analyze))
                .route(web::method(Method::OPTIONS).to(handlers::preflight))
                .default_service(web::to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/enrich")
                .route(web::post().to(handlers::enrich))
                .route(web::method(Method::OPTIONS).to(handlers::preflight))
                .default_service(web::to(handlers::method_not_allowed)),
        )
        .default_service(web::to(handlers::fallback));
}

pub async fn serve(config: Config) -> Result<()> {
    let services = InferenceClient::from_config(&config).await?;
    let state = web::Data::new(AppState::new(PromptOrchestrator::new(
        services,
        config.orchestrator.clone(),
    )));

    let (host, port) = config.bind_address();
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &host, port);
    logger::log_config_info(&config);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_headers())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((host.as_str(), port))
    .map_err(|e| RelayError::ServerError(format!("cannot bind {}:{}: {}", host, port, e)))?
    .run()
    .await
    .map_err(|e| RelayError::ServerError(e.to_string()))
}

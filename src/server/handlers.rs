use crate::{
    error::{RelayError, Result},
    logger,
    models::{AnalyzeResponse, EnrichResponse, PromptRequest},
    orchestrator::EnrichInput,
};
use actix_web::{
    http::{header, Method},
    web, HttpRequest, HttpResponse,
};
use futures::StreamExt;

use super::{AppState, MAX_BODY_BYTES};

pub async fn analyze(
    state: web::Data<AppState>,
    body: web::Json<PromptRequest>,
) -> Result<HttpResponse> {
    let request_id = logger::request_id();
    let prompt = body.require_prompt()?;
    log::info!("[{}] analyze: {}", request_id, prompt);

    let analysis = state
        .orchestrator
        .analyze(prompt)
        .await
        .map_err(|e| failed(&request_id, "analyze", e))?;

    Ok(HttpResponse::Ok().json(AnalyzeResponse {
        analysis: analysis.elements,
        parse_error: analysis.fallback,
    }))
}

pub async fn enrich(
    state: web::Data<AppState>,
    body: web::Json<PromptRequest>,
) -> Result<HttpResponse> {
    let request_id = logger::request_id();
    let input = EnrichInput::from_request(body.into_inner())?;
    match &input {
        EnrichInput::Structure(elements) => {
            log::info!("[{}] enrich (two-pass): {:?}", request_id, elements.subjects)
        }
        EnrichInput::Prompt { prompt, .. } => {
            log::info!("[{}] enrich (single-pass): {}", request_id, prompt)
        }
    }

    let enriched = state
        .orchestrator
        .enrich(input)
        .await
        .map_err(|e| failed(&request_id, "enrich", e))?;

    Ok(HttpResponse::Ok().json(EnrichResponse { enriched }))
}

/// Anything not routed above: pre-flight, image generation, or 405.
pub async fn fallback(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if *req.method() == Method::OPTIONS {
        Ok(preflight().await)
    } else if *req.method() == Method::POST {
        generate(state, payload).await
    } else {
        Ok(method_not_allowed().await)
    }
}

async fn generate(state: web::Data<AppState>, payload: web::Payload) -> Result<HttpResponse> {
    let request_id = logger::request_id();
    let body = read_body(payload).await?;
    let request: PromptRequest = serde_json::from_slice(&body)?;
    let prompt = request.require_prompt()?;
    log::info!("[{}] generate: {}", request_id, prompt);

    let image = state
        .orchestrator
        .generate(prompt, request.steps)
        .await
        .map_err(|e| failed(&request_id, "generate", e))?;

    log::info!("[{}] returning {} image bytes", request_id, image.len());
    Ok(HttpResponse::Ok().content_type("image/png").body(image))
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
        .finish()
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().body("Method not allowed")
}

async fn read_body(mut payload: web::Payload) -> Result<web::BytesMut> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| RelayError::RequestError(e.to_string()))?;
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(RelayError::RequestError("request body too large".into()));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn failed(request_id: &str, operation: &str, error: RelayError) -> RelayError {
    log::error!("[{}] {} failed: {}", request_id, operation, error);
    error
}

use crate::error::{AppError, Result};
use crate::models::{HandlerIdRequest, RegisterResponse, Specification, UpdateRequest};
use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{
        multipart::MultipartRejection,
        rejection::{BytesRejection, QueryRejection},
        Multipart, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

const USE_TEXT_FIELDS: [&str; 3] = ["handler_id", "path", "method"];
const USE_BODY_FIELD: &str = "body";

// Connection-scoped headers that must not be relayed
const HOP_BY_HOP_HEADERS: [header::HeaderName; 6] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
];

type BodyResult = std::result::Result<Bytes, BytesRejection>;

// Extractor rejections (oversized or unreadable bodies) keep the JSON error envelope
fn parse_json<T: DeserializeOwned>(body: BodyResult) -> Result<T> {
    let body = body.map_err(|e| AppError::Parse(e.body_text()))?;
    serde_json::from_slice(&body).map_err(|e| AppError::Parse(e.to_string()))
}

fn require_handler_id(handler_id: &str) -> Result<()> {
    if handler_id.is_empty() {
        return Err(AppError::Validation("handler_id is required".to_string()));
    }
    Ok(())
}

fn validate_specification(specification: &Specification) -> Result<()> {
    specification
        .validate()
        .map_err(|errors| AppError::Validation(errors.join("; ")))
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// GET /handlers/get-spec - Stored specification of a handler
///
/// The id comes from `?handler_id=` or a JSON body `{"handler_id": ...}`.
pub async fn get_spec_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<HashMap<String, String>>, QueryRejection>,
    body: BodyResult,
) -> Result<Json<Specification>> {
    tracing::info!("/handlers/get-spec request received");

    let Query(query) = query.map_err(|e| AppError::Parse(e.body_text()))?;
    let handler_id = match query.get("handler_id") {
        Some(id) => id.clone(),
        None => parse_json::<HandlerIdRequest>(body)?.handler_id,
    };
    require_handler_id(&handler_id)?;

    let specification = state.registry_service.get_specification(&handler_id).await?;
    Ok(Json(specification))
}

/// POST /handlers/register - Register a new handler
pub async fn register_handler(
    State(state): State<AppState>,
    body: BodyResult,
) -> Result<Json<RegisterResponse>> {
    tracing::info!("/handlers/register request received");

    let specification: Specification = parse_json(body)?;
    validate_specification(&specification)?;

    let handler_id = state.registry_service.register(specification).await?;
    Ok(Json(RegisterResponse { handler_id }))
}

/// DELETE /handlers/unregister - Remove a handler, if present
pub async fn unregister_handler(
    State(state): State<AppState>,
    body: BodyResult,
) -> Result<StatusCode> {
    tracing::info!("/handlers/unregister request received");

    let request: HandlerIdRequest = parse_json(body)?;
    require_handler_id(&request.handler_id)?;

    state.registry_service.unregister(&request.handler_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /handlers/update - Replace a handler's whole specification
pub async fn update_handler(
    State(state): State<AppState>,
    body: BodyResult,
) -> Result<StatusCode> {
    tracing::info!("/handlers/update request received");

    let request: UpdateRequest = parse_json(body)?;
    require_handler_id(&request.handler_id)?;
    validate_specification(&request.specification)?;

    state
        .registry_service
        .update(&request.handler_id, request.specification)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fields of a `/handlers/use` multipart form.
#[derive(Debug, Default)]
struct UseForm {
    values: HashMap<String, Vec<String>>,
    body: Option<Vec<u8>>,
}

impl UseForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = UseForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Parse(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            // File parts and text values are separate namespaces: a text
            // `body` is not a payload and a file `handler_id` is not an id
            if field.file_name().is_some() {
                if name != USE_BODY_FIELD {
                    continue;
                }
                if form.body.is_some() {
                    return Err(AppError::FileAttachment(
                        "several inclusions of request body, one expected".to_string(),
                    ));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::FileAttachment(e.to_string()))?;
                form.body = Some(bytes.to_vec());
            } else if USE_TEXT_FIELDS.contains(&name.as_str()) {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Parse(e.to_string()))?;
                form.values.entry(name).or_default().push(text);
            }
        }

        Ok(form)
    }

    fn take_one(&mut self, key: &str) -> Result<String> {
        let mut values = self
            .values
            .remove(key)
            .ok_or_else(|| AppError::Parse(format!("{} value must be provided", key)))?;

        if values.len() != 1 {
            return Err(AppError::Parse(format!(
                "{} value must be provided exactly once",
                key
            )));
        }

        let value = values.remove(0);
        if value.is_empty() {
            return Err(AppError::Validation(format!("{} is required", key)));
        }
        Ok(value)
    }
}

/// POST /handlers/use - Dispatch a call to a registered handler
///
/// Multipart form with `handler_id`, `path` and `method` text fields and an
/// optional single `body` file part (one carrying a filename). The upstream status, headers and body are
/// relayed as-is, with the body streamed.
pub async fn use_handler(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    tracing::info!("/handlers/use request received");

    let multipart = multipart.map_err(|e| AppError::Parse(e.body_text()))?;
    let mut form = UseForm::read(multipart).await?;

    let handler_id = form.take_one("handler_id")?;
    let path = form.take_one("path")?;
    let method = form.take_one("method")?;

    let upstream = state
        .registry_service
        .use_handler(&handler_id, &path, &method, form.body)
        .await?;

    Ok(relay_response(upstream))
}

fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers: HeaderMap = upstream.headers().clone();
    for name in HOP_BY_HOP_HEADERS.iter() {
        headers.remove(name);
    }

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

// HTTP boundary: decodes the query, runs the pipeline, wraps the result
//
// Every response is `{"status": 0|-1, "content": ...}`:
// - 400 for a query that cannot be understood
// - 500 for any resolution failure
// - 200 with the media url list, or base64 media bytes in direct mode

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::resolver::{ResolutionPipeline, Resolved};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("missing `url` parameter")]
    MissingUrl,

    #[error("`url` is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("`url` does not decode to UTF-8 text")]
    NotUtf8,

    #[error("unrecognized `download_video_directly` value `{0}`")]
    InvalidFlag(String),

    #[error("{0}")]
    Malformed(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveParams {
    pub url: Option<String>,
    pub download_video_directly: Option<String>,
}

/// Decoded inputs handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub share_url: String,
    pub want_bytes: bool,
}

impl TryFrom<ResolveParams> for ResolveRequest {
    type Error = QueryError;

    fn try_from(params: ResolveParams) -> Result<Self, Self::Error> {
        let encoded = params
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(QueryError::MissingUrl)?;

        let want_bytes = match params.download_video_directly {
            Some(value) => parse_flag(&value)?,
            None => false,
        };

        Ok(Self {
            share_url: decode_share_url(&encoded)?,
            want_bytes,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub status: i32,
    pub content: Value,
}

impl Envelope {
    fn ok(content: Value) -> Response {
        (StatusCode::OK, Json(Self { status: 0, content })).into_response()
    }

    fn failure(code: StatusCode, message: String) -> Response {
        let body = Self {
            status: -1,
            content: Value::String(message),
        };
        (code, Json(body)).into_response()
    }
}

/// Pad to a multiple of four with `=`
pub fn restore_padding(encoded: &str) -> String {
    let mut padded = encoded.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    padded
}

/// base64 (standard or url-safe, padding optional) -> share url
pub fn decode_share_url(encoded: &str) -> Result<String, QueryError> {
    // Form decoding turns a literal `+` into a space
    let cleaned = encoded.trim().replace(' ', "+");
    let padded = restore_padding(&cleaned);

    let bytes = STANDARD
        .decode(&padded)
        .or_else(|_| URL_SAFE.decode(&padded))
        .map_err(|e| QueryError::InvalidBase64(e.to_string()))?;

    String::from_utf8(bytes).map_err(|_| QueryError::NotUtf8)
}

/// Present without a value counts as set
pub fn parse_flag(value: &str) -> Result<bool, QueryError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(QueryError::InvalidFlag(value.to_string())),
    }
}

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<ResolutionPipeline>,
}

/// Any path answers; only the query matters
pub fn router(pipeline: Arc<ResolutionPipeline>) -> Router {
    Router::new()
        .route("/", get(resolve))
        .route("/*path", get(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

async fn resolve(
    State(state): State<AppState>,
    params: Result<Query<ResolveParams>, QueryRejection>,
) -> Response {
    let request = match params
        .map_err(|e| QueryError::Malformed(e.body_text()))
        .and_then(|Query(params)| ResolveRequest::try_from(params))
    {
        Ok(request) => request,
        Err(e) => {
            info!("[Server] Rejected query: {}", e);
            return Envelope::failure(StatusCode::BAD_REQUEST, format!("Bad query: {}", e));
        }
    };

    info!(
        "[Server] Resolving {} (direct: {})",
        request.share_url, request.want_bytes
    );

    match state
        .pipeline
        .resolve_and_fetch(&request.share_url, request.want_bytes)
        .await
    {
        Ok(Resolved::Urls(result)) => Envelope::ok(Value::from(result.media_urls)),
        Ok(Resolved::Bytes(bytes)) => Envelope::ok(Value::String(STANDARD.encode(bytes))),
        Err(e) => {
            error!("[Server] {} failed: {}", request.share_url, e);
            Envelope::failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

//! Request utilities for HTTP endpoints.

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::Request;
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time;

use crate::router::{AppState, RouterError};
use desa_tables_core::TableError;
use desa_tables_runtime::{ApiRequest, ResponseSender};

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout<B>(
    req: Request<B>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.into_body().collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Reads the body and parses it as JSON.
pub async fn read_json_body<T, B>(req: Request<B>, state: &AppState) -> Result<T, RouterError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: std::fmt::Display,
{
    let body_bytes = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    serde_json::from_slice(&body_bytes)
        .map_err(|e| RouterError::BadRequest(format!("Failed to parse request: {}", e)))
}

/// Helper function to wait for response with timeout
pub async fn wait_for_response_with_timeout<T>(
    rx: oneshot::Receiver<T>,
    timeout_ms: u64,
) -> Result<T, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    time::timeout(timeout_duration, rx)
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Response channel closed: {}", e)))
}

/// Sends a request to the runtime and waits for its answer.
pub async fn dispatch<F>(state: &AppState, make_request: F) -> Result<Value, RouterError>
where
    F: FnOnce(ResponseSender) -> ApiRequest,
{
    let (tx, rx) = oneshot::channel();
    state
        .api_tx
        .send(make_request(tx))
        .await
        .map_err(|e| RouterError::InternalError(format!("Channel closed: {}", e)))?;

    let result = wait_for_response_with_timeout(rx, state.config.response_timeout_ms).await?;
    result.map_err(map_table_error_to_router_error)
}

/// Map TableError to appropriate RouterError
pub fn map_table_error_to_router_error(e: TableError) -> RouterError {
    match e {
        e if e.is_not_found() => RouterError::NotFound(e.to_string()),
        TableError::DuplicateStorageName(_) | TableError::ColumnInUse { .. } => {
            RouterError::Conflict(e.to_string())
        }
        e if e.is_validation() => RouterError::BadRequest(e.to_string()),
        _ => RouterError::InternalError(format!("Runtime error: {}", e)),
    }
}

/// Parses a numeric route parameter.
pub fn parse_id(params: &MatchitParams<'_, '_>, name: &str) -> Result<u64, RouterError> {
    let raw = params
        .get(name)
        .ok_or_else(|| RouterError::BadRequest(format!("Missing parameter '{}'", name)))?;
    raw.parse()
        .map_err(|_| RouterError::BadRequest(format!("Invalid {} '{}'", name, raw)))
}

/// Returns a route parameter with percent-encoding removed.
pub fn decoded_param(params: &MatchitParams<'_, '_>, name: &str) -> Result<String, RouterError> {
    let raw = params
        .get(name)
        .ok_or_else(|| RouterError::BadRequest(format!("Missing parameter '{}'", name)))?;
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| RouterError::BadRequest(format!("Invalid {} '{}': {}", name, raw, e)))
}

/// Page selection from a listing query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<usize>,
    /// Rows per page
    pub page_size: Option<usize>,
}

/// Parse `page` and `page_size` from a URL query string. Other keys are ignored.
pub fn parse_page_params(query_str: Option<&str>) -> Result<PageParams, RouterError> {
    let mut params = PageParams::default();

    let Some(query_str) = query_str else {
        return Ok(params);
    };
    for pair in query_str.split('&') {
        let Some((key, encoded_value)) = pair.split_once('=') else {
            continue;
        };
        let decoded_value = percent_decode_str(encoded_value).decode_utf8_lossy();
        let slot = match key {
            "page" => &mut params.page,
            "page_size" | "pageSize" => &mut params.page_size,
            _ => continue,
        };
        *slot = Some(decoded_value.parse().map_err(|e| {
            RouterError::BadRequest(format!("Invalid {} value '{}': {}", key, decoded_value, e))
        })?);
    }

    Ok(params)
}

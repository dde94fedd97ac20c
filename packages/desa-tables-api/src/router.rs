//! Matchit routing configuration.

use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use matchit::Router as MatchitRouter;
use tokio::sync::mpsc;

use crate::handlers;
use desa_tables_core::config::TablesConfig;
use desa_tables_runtime::ApiRequest;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Table store configuration
    pub config: Arc<TablesConfig>,
    /// API request sender to runtime
    pub api_tx: mpsc::Sender<ApiRequest>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

const ROUTES: [(&str, RouteHandler); 8] = [
    ("/schemas", RouteHandler::Schemas),
    ("/schemas/by-name/{storage_name}", RouteHandler::SchemaByName),
    ("/schemas/{id}", RouteHandler::Schema),
    ("/schemas/{id}/rows", RouteHandler::SchemaRows),
    ("/schemas/{id}/totals", RouteHandler::SchemaTotals),
    ("/schemas/{id}/charts", RouteHandler::SchemaCharts),
    ("/schemas/{id}/aggregate", RouteHandler::SchemaAggregate),
    ("/rows/{id}", RouteHandler::Row),
];

impl Router {
    /// Creates a new router with the table routes.
    pub fn new(config: Arc<TablesConfig>, api_tx: mpsc::Sender<ApiRequest>) -> Self {
        let mut router = MatchitRouter::new();
        for (path, handler) in ROUTES {
            if let Err(e) = router.insert(path, handler) {
                // Route table is static; a conflict is a programming error.
                tracing::error!("Failed to insert route {}: {}", path, e);
            }
        }

        Self {
            inner: router,
            state: AppState { config, api_tx },
        }
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// # Arguments
    /// * `req` - HTTP request
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route<B>(&self, req: Request<B>) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let path = req.uri().path().to_string();

        match self.inner.at(&path) {
            Ok(matched) => {
                let handler = *matched.value;
                handler.handle(req, matched.params, self.state.clone()).await
            }
            Err(_) => Err(RouterError::NotFound(format!(
                "No route found for {}",
                path
            ))),
        }
    }
}

/// Route handler function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteHandler {
    Schemas,
    Schema,
    SchemaByName,
    SchemaRows,
    SchemaTotals,
    SchemaCharts,
    SchemaAggregate,
    Row,
}

impl RouteHandler {
    /// Handles a request with the given route parameters.
    async fn handle<B>(
        &self,
        req: Request<B>,
        params: matchit::Params<'_, '_>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let method = req.method().clone();
        match (self, method) {
            (RouteHandler::Schemas, Method::GET) => handlers::list_schemas(state).await,
            (RouteHandler::Schemas, Method::POST) => handlers::create_schema(req, state).await,
            (RouteHandler::Schema, Method::GET) => handlers::get_schema(params, state).await,
            (RouteHandler::Schema, Method::PATCH) => {
                handlers::update_schema(req, params, state).await
            }
            (RouteHandler::Schema, Method::DELETE) => handlers::delete_schema(params, state).await,
            (RouteHandler::SchemaByName, Method::GET) => {
                handlers::get_schema_by_storage_name(params, state).await
            }
            (RouteHandler::SchemaRows, Method::GET) => handlers::list_rows(req, params, state).await,
            (RouteHandler::SchemaRows, Method::POST) => {
                handlers::insert_row(req, params, state).await
            }
            (RouteHandler::SchemaTotals, Method::GET) => {
                handlers::column_totals(params, state).await
            }
            (RouteHandler::SchemaCharts, Method::GET) => handlers::chart_series(params, state).await,
            (RouteHandler::SchemaAggregate, Method::POST) => {
                handlers::aggregate(req, params, state).await
            }
            (RouteHandler::Row, Method::GET) => handlers::get_row(params, state).await,
            (RouteHandler::Row, Method::PUT) => handlers::update_row(req, params, state).await,
            (RouteHandler::Row, Method::DELETE) => handlers::delete_row(params, state).await,
            _ => Err(RouterError::MethodNotAllowed),
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl RouterError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RouterError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RouterError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RouterError::Timeout => StatusCode::REQUEST_TIMEOUT,
            RouterError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RouterError::NotFound(_) => StatusCode::NOT_FOUND,
            RouterError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RouterError::Conflict(msg) => write!(f, "Conflict: {}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let message = match &err {
            RouterError::MethodNotAllowed => "Method Not Allowed".to_string(),
            RouterError::Timeout => "Request Timeout".to_string(),
            RouterError::InternalError(msg)
            | RouterError::BadRequest(msg)
            | RouterError::NotFound(msg)
            | RouterError::Conflict(msg) => msg.clone(),
        };

        let error_response = handlers::error_response(status.as_u16(), message, None);
        let body = serde_json::to_vec(&error_response).unwrap_or_else(|e| {
            format!(
                "{{\"success\":false,\"error\":{{\"code\":\"500\",\"message\":\"Failed to serialize error: {}\"}}}}",
                e
            )
            .into_bytes()
        });

        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

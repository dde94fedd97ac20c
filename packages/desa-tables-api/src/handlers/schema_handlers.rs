//! Schema definition handlers and derived schema views.

use hyper::body::{Body, Bytes};
use hyper::{Request, Response};

use crate::router::{AppState, RouterError};
use desa_tables_core::schema::{ChartDefinition, NewSchema, SchemaPatch};
use desa_tables_runtime::ApiRequest;

use super::request_utils::{decoded_param, dispatch, parse_id, read_json_body, MatchitParams};
use super::response::{build_empty_response, envelope_response};

/// Lists all schemas.
///
/// # Endpoint
/// `GET /schemas`
///
/// # Response
/// - **200 OK**: Array of schemas in creation order
pub async fn list_schemas(state: AppState) -> Result<Response<Bytes>, RouterError> {
    let schemas = dispatch(&state, |response| ApiRequest::ListSchemas { response }).await?;
    envelope_response(200, schemas)
}

/// Creates a new schema.
///
/// # Endpoint
/// `POST /schemas`
///
/// # Request Body
/// ```json
/// {
///   "displayName": "Penduduk per Dusun",
///   "storageName": "penduduk_dusun",
///   "columns": [
///     {"key": "dusun", "label": "Dusun", "type": "category", "required": true},
///     {"key": "jumlah_l", "label": "Laki-laki", "type": "number", "required": true}
///   ],
///   "hasRowTotal": true,
///   "charts": [{"type": "bar", "columnKey": "dusun", "label": "Per Dusun"}]
/// }
/// ```
///
/// # Response
/// - **201 Created**: The stored schema with its assigned ID
///
/// # Errors
/// - **400 Bad Request**: Malformed body or invalid definition
/// - **409 Conflict**: Storage name already in use
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:8080/schemas \
///   -H "Content-Type: application/json" \
///   -d @penduduk_dusun.json
/// ```
pub async fn create_schema<B>(req: Request<B>, state: AppState) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let schema: NewSchema = read_json_body(req, &state).await?;
    let created = dispatch(&state, |response| ApiRequest::CreateSchema { schema, response }).await?;
    envelope_response(201, created)
}

/// Gets a schema by ID.
///
/// # Endpoint
/// `GET /schemas/{id}`
pub async fn get_schema(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    let schema = dispatch(&state, |response| ApiRequest::GetSchema { id, response }).await?;
    envelope_response(200, schema)
}

/// Gets a schema by its storage name.
///
/// # Endpoint
/// `GET /schemas/by-name/{storage_name}`
pub async fn get_schema_by_storage_name(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let storage_name = decoded_param(&params, "storage_name")?;
    let schema = dispatch(&state, |response| ApiRequest::GetSchemaByStorageName {
        storage_name,
        response,
    })
    .await?;
    envelope_response(200, schema)
}

/// Patches a schema definition.
///
/// # Endpoint
/// `PATCH /schemas/{id}`
///
/// # Request Body
/// Any of `displayName`, `description`, `columns`, `hasRowTotal`, `charts`.
/// `storageName` is immutable and rejected.
///
/// # Errors
/// - **400 Bad Request**: Invalid merged definition or a stored row that
///   violates it
/// - **404 Not Found**: Schema does not exist
/// - **409 Conflict**: A removed column still holds values
pub async fn update_schema<B>(
    req: Request<B>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let id = parse_id(&params, "id")?;
    let patch: SchemaPatch = read_json_body(req, &state).await?;
    let schema = dispatch(&state, |response| ApiRequest::UpdateSchema {
        id,
        patch,
        response,
    })
    .await?;
    envelope_response(200, schema)
}

/// Deletes a schema and all of its rows.
///
/// # Endpoint
/// `DELETE /schemas/{id}`
///
/// # Response
/// - **204 No Content**
pub async fn delete_schema(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    dispatch(&state, |response| ApiRequest::DeleteSchema { id, response }).await?;
    build_empty_response(204)
}

/// Column sums and grand total of a schema.
///
/// # Endpoint
/// `GET /schemas/{id}/totals`
pub async fn column_totals(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let schema_id = parse_id(&params, "id")?;
    let totals = dispatch(&state, |response| ApiRequest::ColumnTotals {
        schema_id,
        response,
    })
    .await?;
    envelope_response(200, totals)
}

/// Series of every chart stored on a schema.
///
/// # Endpoint
/// `GET /schemas/{id}/charts`
pub async fn chart_series(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let schema_id = parse_id(&params, "id")?;
    let series = dispatch(&state, |response| ApiRequest::ChartSeries {
        schema_id,
        response,
    })
    .await?;
    envelope_response(200, series)
}

/// Computes an ad-hoc chart over a schema's rows.
///
/// # Endpoint
/// `POST /schemas/{id}/aggregate`
///
/// # Request Body
/// ```json
/// {"type": "pie", "columnKey": "anggaran", "groupBy": "bidang"}
/// ```
///
/// # Response
/// - **200 OK**: Array of `{"label", "value"}` points
pub async fn aggregate<B>(
    req: Request<B>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let schema_id = parse_id(&params, "id")?;
    let chart: ChartDefinition = read_json_body(req, &state).await?;
    let points = dispatch(&state, |response| ApiRequest::Aggregate {
        schema_id,
        chart,
        response,
    })
    .await?;
    envelope_response(200, points)
}

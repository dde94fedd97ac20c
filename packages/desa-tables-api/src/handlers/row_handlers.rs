//! Row entry handlers.

use hyper::body::{Body, Bytes};
use hyper::{Request, Response};

use crate::router::{AppState, RouterError};
use desa_tables_core::row::RowData;
use desa_tables_runtime::ApiRequest;

use super::request_utils::{dispatch, parse_id, parse_page_params, read_json_body, MatchitParams};
use super::response::{build_empty_response, envelope_response};

/// Lists one page of a schema's rows in creation order.
///
/// # Endpoint
/// `GET /schemas/{id}/rows?page=1&page_size=20`
///
/// # Response
/// - **200 OK**
/// ```json
/// {
///   "rows": [{"id": 1, "schemaId": 1, "data": {"dusun": "Krajan"}, "rowTotal": 251.0}],
///   "page": 1, "pageSize": 20, "totalRows": 1, "totalPages": 1
/// }
/// ```
///
/// # Errors
/// - **400 Bad Request**: Non-numeric or zero page parameters
/// - **404 Not Found**: Schema does not exist
pub async fn list_rows<B>(
    req: Request<B>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
{
    let schema_id = parse_id(&params, "id")?;
    let page_params = parse_page_params(req.uri().query())?;
    let page = dispatch(&state, |response| ApiRequest::ListRows {
        schema_id,
        page: page_params.page,
        page_size: page_params.page_size,
        response,
    })
    .await?;
    envelope_response(200, page)
}

/// Inserts a row. The body is the row data keyed by column.
///
/// # Endpoint
/// `POST /schemas/{id}/rows`
///
/// # Request Body
/// ```json
/// {"dusun": "Krajan", "jumlah_l": 120, "jumlah_p": 131}
/// ```
///
/// # Response
/// - **201 Created**: The stored row, with `rowTotal` when the schema has row totals
///
/// # Errors
/// - **400 Bad Request**: Unknown column, missing required column, or type mismatch
/// - **404 Not Found**: Schema does not exist
pub async fn insert_row<B>(
    req: Request<B>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let schema_id = parse_id(&params, "id")?;
    let data: RowData = read_json_body(req, &state).await?;
    let row = dispatch(&state, |response| ApiRequest::InsertRow {
        schema_id,
        data,
        response,
    })
    .await?;
    envelope_response(201, row)
}

/// Gets a row by ID.
///
/// # Endpoint
/// `GET /rows/{id}`
pub async fn get_row(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    let row = dispatch(&state, |response| ApiRequest::GetRow { id, response }).await?;
    envelope_response(200, row)
}

/// Replaces a row's data wholesale.
///
/// # Endpoint
/// `PUT /rows/{id}`
pub async fn update_row<B>(
    req: Request<B>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let id = parse_id(&params, "id")?;
    let data: RowData = read_json_body(req, &state).await?;
    let row = dispatch(&state, |response| ApiRequest::UpdateRow { id, data, response }).await?;
    envelope_response(200, row)
}

/// Deletes a row.
///
/// # Endpoint
/// `DELETE /rows/{id}`
///
/// # Response
/// - **204 No Content**
pub async fn delete_row(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    dispatch(&state, |response| ApiRequest::DeleteRow { id, response }).await?;
    build_empty_response(204)
}

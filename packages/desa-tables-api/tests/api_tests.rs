//! HTTP routing tests against a live runtime thread.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

use desa_tables_api::router::Router;
use desa_tables_api::server::Server;
use desa_tables_core::config::TablesConfig;
use desa_tables_core::persistence::PersistenceManager;
use desa_tables_core::Catalog;
use desa_tables_runtime::Runtime;

struct TestApp {
    router: Router,
    _data_dir: TempDir,
}

fn start() -> TestApp {
    let (router, data_dir) = spawn_runtime();
    TestApp {
        router,
        _data_dir: data_dir,
    }
}

fn spawn_runtime() -> (Router, TempDir) {
    let data_dir = tempdir().unwrap();
    let config = TablesConfig {
        tickrate: 120,
        data_dir: data_dir.path().to_path_buf(),
        response_timeout_ms: 2000,
        ..Default::default()
    };

    let catalog = Arc::new(Catalog::new());
    let persistence = Arc::new(PersistenceManager::new(&config));
    let (api_tx, api_rx) = mpsc::channel(1000);
    let mut runtime = Runtime::new(catalog, config.clone(), api_rx, persistence);
    // Exits once the router (the only sender) is dropped.
    thread::spawn(move || runtime.run());

    (Router::new(Arc::new(config), api_tx), data_dir)
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body
            .map(|v| Bytes::from(serde_json::to_vec(&v).unwrap()))
            .unwrap_or_default();
        self.call_raw(method, uri, body).await
    }

    async fn call_raw(&self, method: Method, uri: &str, body: Bytes) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(body))
            .unwrap();
        let response = match self.router.route(req).await {
            Ok(response) => response,
            Err(err) => Response::from(err),
        };
        let status = response.status();
        let body = response.into_body();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }
}

fn population_schema() -> Value {
    json!({
        "displayName": "Penduduk per Dusun",
        "storageName": "penduduk_dusun",
        "columns": [
            {"key": "dusun", "label": "Dusun", "type": "category", "required": true},
            {"key": "jumlah_l", "label": "Laki-laki", "type": "number", "required": true},
            {"key": "jumlah_p", "label": "Perempuan", "type": "number", "required": true},
            {"key": "catatan", "label": "Catatan", "type": "text"}
        ],
        "hasRowTotal": true,
        "charts": [{"type": "bar", "columnKey": "dusun", "label": "Jumlah per Dusun"}]
    })
}

#[tokio::test]
async fn test_schema_and_row_endpoints() {
    let app = start();

    let (status, created) = app
        .call(Method::POST, "/schemas", Some(population_schema()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    let schema_id = created["data"]["id"].as_u64().unwrap();

    let (status, duplicate) = app
        .call(Method::POST, "/schemas", Some(population_schema()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(duplicate["success"], false);
    assert_eq!(duplicate["error"]["code"], "409");

    let (status, by_name) = app
        .call(Method::GET, "/schemas/by-name/penduduk_dusun", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_name["data"]["id"], schema_id);

    let (_, listed) = app.call(Method::GET, "/schemas", None).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let rows_uri = format!("/schemas/{}/rows", schema_id);
    let (status, row) = app
        .call(
            Method::POST,
            &rows_uri,
            Some(json!({"dusun": "Krajan", "jumlah_l": 120, "jumlah_p": 131})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row["data"]["rowTotal"], json!(251.0));
    assert_eq!(row["data"]["data"]["catatan"], Value::Null);
    let row_id = row["data"]["id"].as_u64().unwrap();

    app.call(
        Method::POST,
        &rows_uri,
        Some(json!({"dusun": "Sumberejo", "jumlah_l": 88, "jumlah_p": 90})),
    )
    .await;

    let (status, invalid) = app
        .call(Method::POST, &rows_uri, Some(json!({"dusun": "Krajan", "rt": 1})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(invalid["error"]["message"]
        .as_str()
        .unwrap()
        .contains("rt"));

    let (status, page) = app
        .call(Method::GET, &format!("{}?page=2&page_size=1", rows_uri), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["totalRows"], 2);
    assert_eq!(page["data"]["totalPages"], 2);
    assert_eq!(page["data"]["rows"][0]["data"]["dusun"], "Sumberejo");

    let (_, totals) = app
        .call(Method::GET, &format!("/schemas/{}/totals", schema_id), None)
        .await;
    assert_eq!(totals["data"]["grandTotal"], json!(429.0));

    let (_, charts) = app
        .call(Method::GET, &format!("/schemas/{}/charts", schema_id), None)
        .await;
    assert_eq!(charts["data"][0]["points"].as_array().unwrap().len(), 2);

    let (status, points) = app
        .call(
            Method::POST,
            &format!("/schemas/{}/aggregate", schema_id),
            Some(json!({"type": "line", "columnKey": "jumlah_l"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(points["data"], json!([{"label": "Laki-laki", "value": 208.0}]));

    let row_uri = format!("/rows/{}", row_id);
    let (status, updated) = app
        .call(
            Method::PUT,
            &row_uri,
            Some(json!({"dusun": "Krajan", "jumlah_l": 121, "jumlah_p": 131})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["rowTotal"], json!(252.0));

    let (status, body) = app.call(Method::DELETE, &row_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (status, _) = app.call(Method::GET, &row_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let schema_uri = format!("/schemas/{}", schema_id);
    let (status, _) = app.call(Method::DELETE, &schema_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::GET, &schema_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call(Method::GET, &rows_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_schema_patch_rules() {
    let app = start();
    let (_, created) = app
        .call(Method::POST, "/schemas", Some(population_schema()))
        .await;
    let schema_uri = format!("/schemas/{}", created["data"]["id"]);
    app.call(
        Method::POST,
        &format!("{}/rows", schema_uri),
        Some(json!({"dusun": "Krajan", "jumlah_l": 1, "jumlah_p": 2, "catatan": "baru"})),
    )
    .await;

    let (status, _) = app
        .call(Method::PATCH, &schema_uri, Some(json!({"storageName": "lain"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let columns_without_note = json!([
        {"key": "dusun", "label": "Dusun", "type": "category", "required": true},
        {"key": "jumlah_l", "label": "Laki-laki", "type": "number", "required": true},
        {"key": "jumlah_p", "label": "Perempuan", "type": "number", "required": true}
    ]);
    let (status, conflict) = app
        .call(
            Method::PATCH,
            &schema_uri,
            Some(json!({"columns": columns_without_note})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(conflict["error"]["message"]
        .as_str()
        .unwrap()
        .contains("catatan"));

    let (status, renamed) = app
        .call(
            Method::PATCH,
            &schema_uri,
            Some(json!({"displayName": "Jumlah Penduduk"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["data"]["displayName"], "Jumlah Penduduk");
    assert_eq!(renamed["data"]["storageName"], "penduduk_dusun");
}

#[tokio::test]
async fn test_routing_errors() {
    let app = start();

    let (status, body) = app.call(Method::GET, "/tidak-ada", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = app.call(Method::PUT, "/schemas", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app.call(Method::GET, "/schemas/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call_raw(Method::POST, "/schemas", Bytes::from_static(b"{not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, created) = app
        .call(Method::POST, "/schemas", Some(population_schema()))
        .await;
    let rows_uri = format!("/schemas/{}/rows", created["data"]["id"]);
    let (status, body) = app
        .call(Method::GET, &format!("{}?page=0", rows_uri), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "400");

    let (status, _) = app
        .call(Method::GET, &format!("{}?page_size=banyak", rows_uri), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call(Method::GET, "/rows/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_answers_over_tcp_and_stops_on_shutdown() {
    let (router, _data_dir) = spawn_runtime();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(Server::new(addr, router).serve_listener(
        listener,
        async move {
            let _ = stop_rx.await;
        },
        Duration::from_secs(2),
    ));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /schemas HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"), "unexpected response: {}", raw);
    assert!(raw.contains(r#""success":true"#), "unexpected response: {}", raw);

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use scanwatch::api::DashboardClient;
use scanwatch::errors::{PollBackoff, ReconnectPolicy, ScanwatchError};
use scanwatch::models::ToolName;
use scanwatch::poll::HttpResultsFetcher;
use scanwatch::session::{ScanSession, SessionRequest, SessionSettings, SessionView, StartDecision};
use scanwatch::stream::WsConnector;

#[derive(Clone, Default)]
struct Backend {
    /// Frames pushed to every stream subscriber, keyed by scan id.
    frames: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    results: Arc<Mutex<Vec<Value>>>,
    started: Arc<Mutex<Vec<Value>>>,
}

async fn stream_handler(Path(id): Path<String>, State(backend): State<Backend>, ws: WebSocketUpgrade) -> Response {
    let frames = backend
        .frames
        .lock()
        .unwrap()
        .iter()
        .find(|(scan, _)| *scan == id)
        .map(|(_, frames)| frames.clone());
    match frames {
        Some(frames) => ws.on_upgrade(move |socket| replay(socket, frames)),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn replay(mut socket: WebSocket, frames: Vec<Value>) {
    for frame in frames {
        if socket.send(Message::Text(frame.to_string())).await.is_err() {
            return;
        }
    }
    // Hold the connection open until the client goes away.
    while let Some(Ok(_)) = socket.recv().await {}
}

async fn results_handler(Path(_project): Path<String>, State(backend): State<Backend>) -> Json<Value> {
    Json(Value::Array(backend.results.lock().unwrap().clone()))
}

async fn project_handler(Path(id): Path<String>) -> Response {
    if id != "proj-1" {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Project not found" }))).into_response();
    }
    Json(json!({
        "id": "proj-1",
        "name": "Support bot",
        "description": "Customer support assistant",
        "targetUrl": "https://bot.example.com/chat",
        "targetType": "Chat UI",
        "createdAt": "2024-04-30 08:15:00",
    }))
    .into_response()
}

async fn start_handler(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    if body["tools"].as_array().map_or(true, |t| t.is_empty()) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing projectId or tools" }))).into_response();
    }
    backend.started.lock().unwrap().push(body);
    Json(json!({ "scanId": "1714550000000", "status": "started" })).into_response()
}

async fn spawn_backend(backend: Backend) -> SocketAddr {
    let app = Router::new()
        .route("/api/scans/start", post(start_handler))
        .route("/api/scans/:id/stream", get(stream_handler))
        .route("/api/scans/:id/results", get(results_handler))
        .route("/api/projects/:id", get(project_handler))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn result_json(scan: &str, tool: &str, status: &str, severity: Option<&str>, rate: f64) -> Value {
    let mut value = json!({
        "id": format!("{}_{}", scan, tool),
        "projectId": "proj-1",
        "toolName": tool,
        "status": status,
        "logs": [],
        "timestamp": "2024-05-01T10:00:00.123",
    });
    if status != "running" {
        value["severity"] = json!(severity);
        value["metrics"] = json!({
            "attackSuccessRate": rate,
            "detectionTime": 1.75,
            "dataExfilVolume": 0.5,
            "repeatFailures": 1,
        });
    }
    value
}

fn settings() -> SessionSettings {
    SessionSettings {
        reconnect: ReconnectPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(10),
        },
        poll: PollBackoff {
            interval: Duration::from_millis(20),
            max_interval: Duration::from_millis(100),
            degraded_after: 3,
        },
        expected_log_lines_per_tool: 4,
    }
}

async fn watch(addr: SocketAddr, scan_id: &str, tools: Vec<ToolName>) -> SessionView {
    let server = format!("http://{}", addr);
    let decision = SessionRequest {
        project_id: Some("proj-1".into()),
        scan_id: Some(scan_id.into()),
        tools,
    }
    .validate();
    let StartDecision::Start(request) = decision else {
        panic!("request should validate");
    };

    let client = DashboardClient::new(&server);
    let connector = Arc::new(WsConnector::from_http_base(&server).unwrap());
    let fetcher = Arc::new(HttpResultsFetcher::new(client, "proj-1", scan_id));
    let handle = ScanSession::new(request, settings(), connector, fetcher).spawn();

    tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .expect("session did not finish in time")
        .unwrap()
}

#[tokio::test]
async fn test_websocket_stream_drives_session_to_completion() {
    let backend = Backend::default();
    backend.frames.lock().unwrap().push((
        "scan-a".into(),
        vec![
            json!({ "type": "log", "message": "[PromptMap] Starting PromptMap scan..." }),
            json!({ "type": "log", "message": "[PromptMap] Testing injection payloads" }),
            json!({ "type": "progress", "value": 40 }),
            json!({ "type": "log", "message": "[PromptMap] Scan completed" }),
            json!({ "type": "complete", "result": result_json("scan-a", "PromptMap", "completed", Some("High"), 66.0) }),
        ],
    ));
    // A finished result from an older scan of the same project must not leak in.
    backend
        .results
        .lock()
        .unwrap()
        .push(result_json("scan-old", "PromptMap", "completed", Some("Critical"), 99.0));
    let addr = spawn_backend(backend).await;

    let view = watch(addr, "scan-a", vec![ToolName::PromptMap]).await;
    assert!(view.is_complete);
    assert_eq!(view.results.len(), 1);
    assert_eq!(view.results[0].id, "scan-a_PromptMap");
    assert_eq!(view.results[0].logs.len(), 3);
    assert_eq!(view.logs.len(), 3);
    assert_eq!(view.dropped_frames, 1);
    assert_eq!(view.aggregated.critical_findings, 0);
    assert_eq!(view.aggregated.average_success_rate, 66.0);
}

#[tokio::test]
async fn test_missing_stream_falls_back_to_results_endpoint() {
    let backend = Backend::default();
    {
        let mut results = backend.results.lock().unwrap();
        results.push(result_json("scan-b", "PromptMap", "completed", Some("Low"), 20.0));
        results.push(result_json("scan-b", "Agent Fuzzer", "failed", Some("Info"), 0.0));
    }
    let addr = spawn_backend(backend).await;

    let view = watch(addr, "scan-b", vec![ToolName::PromptMap, ToolName::AgentFuzzer]).await;
    assert!(view.is_complete);
    assert_eq!(view.results.len(), 2);
    assert!(view.notice.is_some());
    assert_eq!(view.progress_percent, 100.0);
}

#[tokio::test]
async fn test_client_project_lookup_and_start() {
    let backend = Backend::default();
    let started = backend.started.clone();
    let addr = spawn_backend(backend).await;
    let client = DashboardClient::new(&format!("http://{}", addr));

    let project = client.get_project("proj-1").await.unwrap();
    assert_eq!(project.name, "Support bot");

    let missing = client.get_project("nope").await.unwrap_err();
    assert!(matches!(missing, ScanwatchError::NotFound(_)));

    let response = client
        .start_scan("proj-1", &[ToolName::PromptMap, ToolName::RagTester])
        .await
        .unwrap();
    assert_eq!(response.scan_id, "1714550000000");
    let bodies = started.lock().unwrap();
    assert_eq!(bodies[0]["projectId"], "proj-1");
    assert_eq!(bodies[0]["tools"][1], "RAG Tester");
}

#[tokio::test]
async fn test_client_start_rejected_is_invalid_request() {
    let addr = spawn_backend(Backend::default()).await;
    let client = DashboardClient::new(&format!("http://{}", addr));
    let err = client.start_scan("proj-1", &[]).await.unwrap_err();
    assert!(matches!(err, ScanwatchError::InvalidRequest(_)));
    assert_eq!(err.exit_code(), 5);
}

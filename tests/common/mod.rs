#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use expresspay_bridge::config::GatewayConfig;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

pub const GATEWAY_PATH: &str = "/api/expresspayment";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub accept: Option<String>,
    pub body: Value,
}

struct GatewayState {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// A local stand-in for the payment gateway that always answers with the same
/// status and body.
pub struct FakeGateway {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeGateway {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn config(&self) -> GatewayConfig {
        GatewayConfig {
            endpoint: self.url.clone(),
            http_timeout_secs: 5,
            request_timeout_secs: 0,
            ..Default::default()
        }
    }
}

async fn respond(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(RecordedRequest {
        accept: headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });
    (
        state.status,
        [(CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// Bind to port 0 and serve `body` with `status` for every submission.
pub async fn start_gateway(status: u16, body: &str) -> FakeGateway {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = Arc::new(GatewayState {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
        requests: requests.clone(),
    });
    let app = Router::new()
        .route(GATEWAY_PATH, post(respond))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeGateway {
        url: format!("http://{addr}{GATEWAY_PATH}"),
        requests,
    }
}

/// An endpoint nothing listens on.
pub async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{GATEWAY_PATH}")
}

/// An endpoint that accepts connections and never answers.
pub async fn stalled_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    format!("http://{addr}{GATEWAY_PATH}")
}

pub fn payment_arguments() -> Value {
    json!({
        "currency": "GHS",
        "amount": "10.00",
        "order_id": "123",
    })
}

/// Polls `probe` until it returns true or a second has passed.
pub async fn eventually(mut probe: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if probe() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    probe()
}

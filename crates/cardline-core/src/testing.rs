//! Local HTTP server for client tests.
//!
//! Each [`TestServer`] runs an axum router on its own runtime, answers every
//! request with one canned response, and records what it received. Blocking
//! client calls go through [`crate::block_on`] on the shared runtime, so the
//! server needs a runtime of its own.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;

/// A request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, e.g. `/?fuzzy=Opt&set=xln`
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct Canned {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
    received: Mutex<Vec<RecordedRequest>>,
}

async fn answer(State(canned): State<Arc<Canned>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let body = to_bytes(body, usize::MAX)
        .await
        .map(|b| b.to_vec())
        .unwrap_or_default();
    canned
        .received
        .lock()
        .expect("request log poisoned")
        .push(RecordedRequest {
            method: parts.method.to_string(),
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body,
        });
    (
        canned.status,
        [(header::CONTENT_TYPE, canned.content_type.clone())],
        canned.body.clone(),
    )
        .into_response()
}

pub struct TestServer {
    pub url: String,
    canned: Arc<Canned>,
    _runtime: tokio::runtime::Runtime,
}

impl TestServer {
    /// Serve `body` with `status` for every request.
    pub fn respond(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let canned = Arc::new(Canned {
            status: StatusCode::from_u16(status).expect("invalid status code"),
            content_type: content_type.to_string(),
            body: body.into(),
            received: Mutex::new(Vec::new()),
        });
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("cardline-test-server")
            .enable_all()
            .build()
            .expect("failed to build test server runtime");
        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let app = Router::new()
            .fallback(answer)
            .with_state(Arc::clone(&canned));
        runtime.spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Self {
            url: format!("http://{addr}"),
            canned,
            _runtime: runtime,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.canned
            .received
            .lock()
            .expect("request log poisoned")
            .clone()
    }

    /// The only request received; panics on zero or several.
    pub fn single_request(&self) -> RecordedRequest {
        let mut requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.remove(0)
    }
}

/// Client that ignores proxy settings from the environment
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("failed to build local client")
}

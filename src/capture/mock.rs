//! 测试用的进程内采集服务

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

use crate::capture::FingerprintClient;

#[derive(Debug, Clone)]
enum Body {
    Json(Value),
    Text(&'static str),
}

#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: Body,
    delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Body::Json(body),
            delay: None,
        }
    }

    pub fn text(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            body: Body::Text(body),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Body::Json(value) => (self.status, axum::Json(value)).into_response(),
            Body::Text(text) => (self.status, text).into_response(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Bytes,
}

#[derive(Clone)]
struct MockState {
    routes: Arc<Vec<(Method, &'static str, Reply)>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct MockServer {
    pub base_url: Url,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    /// 绑定随机端口并在后台运行；服务随测试运行时一起结束
    pub async fn start(routes: Vec<(Method, &'static str, Reply)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let addr = listener.local_addr().expect("failed to get local addr");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            routes: Arc::new(routes),
            requests: requests.clone(),
        };
        let router = Router::new().fallback(handle).with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("mock server failed");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("valid mock url"),
            requests,
        }
    }

    pub fn client(&self) -> FingerprintClient {
        FingerprintClient::new(self.base_url.clone())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(State(state): State<MockState>, method: Method, uri: Uri, body: Bytes) -> Response {
    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        body,
    });

    let reply = state
        .routes
        .iter()
        .find(|(m, path, _)| *m == method && *path == uri.path())
        .map(|(_, _, reply)| reply.clone());

    match reply {
        Some(reply) => {
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            reply.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// 返回一个当前没有监听者的地址，用于模拟连接被拒绝
pub async fn unused_base_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind probe listener");
    let addr = listener.local_addr().expect("failed to get local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}/")).expect("valid probe url")
}

//! `HTTP_REQUEST` node: issues one outbound HTTP call and stores the
//! response in the context.
//!
//! Node data:
//! ```json
//! { "endpoint": "https://…", "method": "POST", "headers": {}, "body": {}, "variableName": "user" }
//! ```
//! The response lands under `variableName` (or the node id when unset) as
//! `{ "httpResponse": { "status", "statusText", "data" } }`.
//!
//! Failure policy: bad configuration and 4xx responses are fatal; transport
//! errors, 429 and 5xx responses are retryable.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::{ExecutableNode, ExecutionContext, NodeError, traits::NodeInput};

/// Tuning knobs for outbound requests.
#[derive(Debug, Clone)]
pub struct HttpRequestConfig {
    /// Per-request timeout, covering connect through reading the body.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpRequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("rusty-automation-tool/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Persisted configuration of an HTTP request node.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpRequestData {
    #[serde(default, alias = "url")]
    endpoint: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<Value>,
    #[serde(default)]
    variable_name: Option<String>,
}

pub struct HttpRequestNode {
    client: Client,
}

impl HttpRequestNode {
    pub fn new(config: &HttpRequestConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// Use an already configured client (shared connection pool, proxies, …).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecutableNode for HttpRequestNode {
    #[instrument(skip_all, fields(node_id = %input.node_id))]
    async fn execute(&self, input: NodeInput) -> Result<ExecutionContext, NodeError> {
        let data = parse_data(&input.data)?;

        let endpoint = data
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                NodeError::Fatal(format!(
                    "HTTP request node '{}' has no endpoint configured",
                    input.node_id
                ))
            })?;
        let method = parse_method(data.method.as_deref().unwrap_or("GET"))?;

        let mut request = self.client.request(method.clone(), &endpoint);
        for (key, value) in &data.headers {
            request = request.header(key, value);
        }

        if let Some(body) = data.body {
            if sends_body(&method) {
                request = match body {
                    // Strings are forwarded verbatim; the editor stores raw JSON text.
                    Value::String(raw) => request.header(CONTENT_TYPE, "application/json").body(raw),
                    other => request.json(&other),
                };
            }
        }

        debug!(%method, %endpoint, "sending request");
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        check_status(status, &endpoint)?;

        let text = response.text().await.map_err(transport_error)?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        let key = data.variable_name.unwrap_or(input.node_id);
        Ok(input.context.with(
            key,
            json!({
                "httpResponse": {
                    "status": status.as_u16(),
                    "statusText": status.canonical_reason().unwrap_or_default(),
                    "data": body,
                }
            }),
        ))
    }
}

fn parse_data(data: &Value) -> Result<HttpRequestData, NodeError> {
    if data.is_null() {
        return Ok(HttpRequestData::default());
    }
    serde_json::from_value(data.clone())
        .map_err(|e| NodeError::Fatal(format!("invalid HTTP request configuration: {e}")))
}

fn parse_method(method: &str) -> Result<Method, NodeError> {
    match method.to_uppercase().as_str() {
        "GET"     => Ok(Method::GET),
        "POST"    => Ok(Method::POST),
        "PUT"     => Ok(Method::PUT),
        "PATCH"   => Ok(Method::PATCH),
        "DELETE"  => Ok(Method::DELETE),
        "HEAD"    => Ok(Method::HEAD),
        "OPTIONS" => Ok(Method::OPTIONS),
        _ => Err(NodeError::Fatal(format!("unsupported HTTP method: {method}"))),
    }
}

fn sends_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn transport_error(err: reqwest::Error) -> NodeError {
    if err.is_builder() {
        return NodeError::Fatal(format!("cannot build request: {err}"));
    }
    NodeError::Retryable(format!("request failed: {err}"))
}

fn check_status(status: StatusCode, endpoint: &str) -> Result<(), NodeError> {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        warn!(%status, endpoint, "upstream responded with a transient error");
        return Err(NodeError::Retryable(format!("{endpoint} responded with {status}")));
    }
    if status.is_client_error() {
        return Err(NodeError::Fatal(format!("{endpoint} responded with {status}")));
    }
    Ok(())
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one canned response and hand back the raw request.
    async fn serve_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
        });

        (format!("http://{addr}/resource"), rx)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn node() -> HttpRequestNode {
        HttpRequestNode::new(&HttpRequestConfig::default()).unwrap()
    }

    fn input(data: Value) -> NodeInput {
        NodeInput {
            node_id: "fetch".into(),
            data,
            context: ExecutionContext::new().with("seed", json!(true)),
        }
    }

    #[tokio::test]
    async fn get_stores_response_under_node_id() {
        let (url, _rx) = serve_once("200 OK", r#"{"id":7}"#).await;

        let out = node().execute(input(json!({ "endpoint": url }))).await.unwrap();

        assert_eq!(out.get("seed"), Some(&json!(true)));
        let resp = &out.get("fetch").unwrap()["httpResponse"];
        assert_eq!(resp["status"], 200);
        assert_eq!(resp["statusText"], "OK");
        assert_eq!(resp["data"]["id"], 7);
    }

    #[tokio::test]
    async fn post_sends_body_and_uses_variable_name() {
        let (url, rx) = serve_once("201 Created", "created").await;

        let out = node()
            .execute(input(json!({
                "url": url,
                "method": "post",
                "body": { "name": "ada" },
                "variableName": "user",
            })))
            .await
            .unwrap();

        let raw = rx.await.unwrap();
        assert!(raw.starts_with("POST /resource"));
        assert!(raw.contains(r#"{"name":"ada"}"#));

        let resp = &out.get("user").unwrap()["httpResponse"];
        assert_eq!(resp["status"], 201);
        assert_eq!(resp["data"], "created");
    }

    #[tokio::test]
    async fn string_body_is_sent_verbatim_with_custom_headers() {
        let (url, rx) = serve_once("200 OK", "{}").await;

        node()
            .execute(input(json!({
                "endpoint": url,
                "method": "PUT",
                "headers": { "x-api-key": "secret" },
                "body": "{\"raw\":true}",
            })))
            .await
            .unwrap();

        let raw = rx.await.unwrap();
        assert!(raw.starts_with("PUT /resource"));
        let lower = raw.to_ascii_lowercase();
        assert!(lower.contains("x-api-key: secret"));
        assert!(lower.contains("content-type: application/json"));
        assert!(raw.ends_with(r#"{"raw":true}"#));
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let (url, _rx) = serve_once("503 Service Unavailable", "{}").await;
        let err = node().execute(input(json!({ "endpoint": url }))).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn client_error_is_fatal() {
        let (url, _rx) = serve_once("404 Not Found", "{}").await;
        let err = node().execute(input(json!({ "endpoint": url }))).await.unwrap_err();
        assert!(matches!(err, NodeError::Fatal(_)));
    }

    #[tokio::test]
    async fn missing_endpoint_is_fatal() {
        let err = node().execute(input(Value::Null)).await.unwrap_err();
        assert!(matches!(err, NodeError::Fatal(msg) if msg.contains("no endpoint")));
    }

    #[tokio::test]
    async fn unsupported_method_is_fatal() {
        let err = node()
            .execute(input(json!({ "endpoint": "http://127.0.0.1:1", "method": "BREW" })))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Fatal(msg) if msg.contains("BREW")));
    }

    #[test]
    fn status_classification() {
        assert!(check_status(StatusCode::OK, "e").is_ok());
        assert!(check_status(StatusCode::TOO_MANY_REQUESTS, "e").unwrap_err().is_retryable());
        assert!(check_status(StatusCode::BAD_GATEWAY, "e").unwrap_err().is_retryable());
        assert!(!check_status(StatusCode::UNAUTHORIZED, "e").unwrap_err().is_retryable());
    }
}

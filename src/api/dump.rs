//! Raw request dump, logged before the info and probe handlers run.

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

/// Bodies larger than this are not buffered for the dump.
const MAX_DUMP_BYTES: usize = 1 << 20;

/// Render a request as HTTP/1.1 wire text: request line, headers, blank line, body.
pub fn render_request(parts: &Parts, body: &[u8]) -> String {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut out = format!("{} {} {:?}\r\n", parts.method, target, parts.version);
    for (name, value) in &parts.headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));
    out
}

/// Middleware: buffer the body, log the dump, hand the request on unchanged.
pub async fn log_request(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_DUMP_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to dump http request");
            Bytes::new()
        }
    };

    info!(request = %render_request(&parts, &bytes), "Request");

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::{middleware, Router};
    use tower::ServiceExt; // for `oneshot`

    use crate::api::tests::capture_logs;

    fn echo_app() -> Router {
        Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .route_layer(middleware::from_fn(log_request))
    }

    #[test]
    fn test_render_request_includes_headers_and_body() {
        let (parts, ()) = Request::post("/mysql?verbose=1")
            .header("host", "probe.local")
            .header("x-trace", "abc")
            .body(())
            .unwrap()
            .into_parts();

        let dump = render_request(&parts, b"hello");

        assert!(dump.starts_with("POST /mysql?verbose=1 HTTP/1.1\r\n"));
        assert!(dump.contains("host: probe.local\r\n"));
        assert!(dump.contains("x-trace: abc\r\n"));
        assert!(dump.ends_with("\r\n\r\nhello"));
    }

    #[tokio::test]
    async fn test_body_reaches_handler_after_dump() {
        let response = echo_app()
            .oneshot(Request::post("/echo").body(Body::from("payload")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"payload");
    }

    #[tokio::test]
    async fn test_dump_is_logged() {
        let (captured, _guard) = capture_logs();

        echo_app()
            .oneshot(
                Request::post("/echo?x=1")
                    .header("x-trace", "abc")
                    .body(Body::from("payload"))
                    .unwrap(),
            )
            .await
            .unwrap();

        let logs = captured.text();
        assert!(logs.contains("Request"), "{logs}");
        assert!(logs.contains("POST /echo?x=1 HTTP/1.1"), "{logs}");
        assert!(logs.contains("x-trace: abc"), "{logs}");
        assert!(logs.contains("payload"), "{logs}");
    }
}

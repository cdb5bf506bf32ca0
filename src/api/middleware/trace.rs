use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use std::fmt;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header carrying the request trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Longest caller-supplied trace ID that is adopted as-is
const MAX_INBOUND_TRACE_ID_LEN: usize = 64;

/// Trace ID of the current request, stored in request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(pub String);

tokio::task_local! {
    static CURRENT_TRACE_ID: TraceId;
}

/// Trace ID of the request being handled, if called inside one
pub fn current_trace_id() -> Option<TraceId> {
    CURRENT_TRACE_ID.try_with(TraceId::clone).ok()
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reuse a caller's trace ID when it is short and made of safe characters
fn inbound_trace_id(request: &Request) -> Option<String> {
    let value = request.headers().get(TRACE_ID_HEADER)?.to_str().ok()?;
    let valid = !value.is_empty()
        && value.len() <= MAX_INBOUND_TRACE_ID_LEN
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| value.to_string())
}

/// Tag every request with a trace ID.
///
/// The ID is taken from an inbound `X-Trace-Id` header or generated as a
/// UUID v4. It is put in request extensions and in a task-local read by error
/// responses, attached to a span wrapping the rest of the stack, and echoed on
/// the response.
pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = inbound_trace_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    let id = TraceId(trace_id.clone());
    request.extensions_mut().insert(id.clone());

    let handled = async move {
        tracing::debug!("Request started");
        let response = next.run(request).await;
        tracing::info!(status = %response.status(), "Request completed");
        response
    }
    .instrument(span);
    let mut response = CURRENT_TRACE_ID.scope(id, handled).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::Extension,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use crate::core::error::ShopError;
    use tower::util::ServiceExt;

    async fn echo_trace_id(Extension(trace_id): Extension<TraceId>) -> (StatusCode, String) {
        (StatusCode::OK, trace_id.to_string())
    }

    async fn missing() -> Result<(), ShopError> {
        Err(ShopError::NotFound("Product".to_string()))
    }

    fn app() -> Router {
        Router::new()
            .route("/test", get(echo_trace_id))
            .route("/missing", get(missing))
            .layer(middleware::from_fn(trace_id_middleware))
    }

    fn header_of(response: &Response) -> String {
        response
            .headers()
            .get(TRACE_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_generated_id_matches_handler_view() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        let header = header_of(&response);
        assert!(Uuid::parse_str(&header).is_ok());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), header);
    }

    #[tokio::test]
    async fn test_unique_per_request() {
        let first = app()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let second = app()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_ne!(header_of(&first), header_of(&second));
    }

    #[tokio::test]
    async fn test_inbound_id_is_adopted() {
        let request = Request::builder()
            .uri("/test")
            .header(TRACE_ID_HEADER, "upstream-42")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(header_of(&response), "upstream-42");
    }

    #[tokio::test]
    async fn test_unsafe_inbound_id_is_replaced() {
        let request = Request::builder()
            .uri("/test")
            .header(TRACE_ID_HEADER, "bad id with spaces")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        let header = header_of(&response);
        assert_ne!(header, "bad id with spaces");
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[tokio::test]
    async fn test_error_body_carries_request_trace_id() {
        let request = Request::builder()
            .uri("/missing")
            .header(TRACE_ID_HEADER, "client-trace-7")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(header_of(&response), "client-trace-7");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["trace_id"], "client-trace-7");
    }

    #[test]
    fn test_no_trace_id_outside_a_request() {
        assert!(current_trace_id().is_none());
    }
}

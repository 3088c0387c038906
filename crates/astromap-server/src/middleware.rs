use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller-supplied ids longer than this are replaced with a fresh one.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id for one request, readable by handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

fn caller_request_id(req: &Request) -> Option<String> {
    let raw = req.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    (!raw.is_empty() && raw.len() <= MAX_REQUEST_ID_LEN).then(|| raw.to_owned())
}

/// Tags every request with a [`RequestId`] and echoes it back in the
/// `x-request-id` response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = caller_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).await;
    match HeaderValue::from_str(&id) {
        Ok(value) => {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Err(e) => tracing::debug!(error = %e, "request id not representable as a header"),
    }
    response
}

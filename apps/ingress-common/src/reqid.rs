use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request, header::HeaderName},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id for one delivery, stored in the request extensions by
/// [`with_request_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Takes the caller's `x-request-id` when it is usable, otherwise mints a UUIDv4.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|candidate| is_usable(candidate))
            .map(|candidate| Self(candidate.to_owned()))
            .unwrap_or_else(|| Self(Uuid::new_v4().to_string()))
    }
}

fn is_usable(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_REQUEST_ID_LEN
        && candidate.bytes().all(|b| b.is_ascii_graphic())
}

/// Attaches a [`RequestId`] to the request and echoes it on the response.
pub async fn with_request_id(mut req: Request<Body>, next: Next) -> Response {
    let rid = RequestId::from_headers(req.headers());
    let echoed = HeaderValue::from_str(&rid.0).ok();
    req.extensions_mut().insert(rid);

    let mut res = next.run(req).await;
    if let Some(value) = echoed {
        res.headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    res
}

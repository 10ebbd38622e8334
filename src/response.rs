//! Response envelope building
//!
//! Every outcome funnels through one envelope shape: a status code plus an
//! optional JSON body, rendered with the fixed permissive CORS header set.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::Value;

use crate::error::ApiError;
use crate::logger;

/// The uniform outbound envelope
///
/// `body: None` renders as an empty body (204-style responses).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl Envelope {
    pub const fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// 204-style empty envelope
    pub const fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    pub const fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, Some(body))
    }

    pub const fn created(body: Value) -> Self {
        Self::new(StatusCode::CREATED, Some(body))
    }
}

impl From<ApiError> for Envelope {
    fn from(err: ApiError) -> Self {
        Self::new(err.status(), Some(err.body()))
    }
}

/// Fixed response headers: JSON content type plus permissive CORS
const FIXED_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Methods",
        "GET,POST,PUT,PATCH,DELETE,OPTIONS",
    ),
    ("Access-Control-Allow-Headers", "Content-Type,Authorization"),
];

/// Render an envelope as an HTTP response
///
/// Bodies serialize through `serde_json`, so numbers come out in standard
/// decimal/float form.
pub fn into_http(envelope: Envelope) -> Response<Full<Bytes>> {
    let body = match &envelope.body {
        Some(value) => match serde_json::to_string(value) {
            Ok(json) => Bytes::from(json),
            Err(e) => {
                logger::log_error(&format!("Failed to serialize response body: {e}"));
                Bytes::from(r#"{"error":"internal_server_error"}"#)
            }
        },
        None => Bytes::new(),
    };

    let mut builder = Response::builder().status(envelope.status);
    for (name, value) in FIXED_HEADERS {
        builder = builder.header(name, value);
    }
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build response: {e}"));
        Response::new(Full::new(Bytes::from(
            r#"{"error":"internal_server_error"}"#,
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_headers_present_on_every_response() {
        let resp = into_http(Envelope::ok(json!({"items": []})));
        let headers = resp.headers();
        assert_eq!(headers["Content-Type"], "application/json");
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(
            headers["Access-Control-Allow-Methods"],
            "GET,POST,PUT,PATCH,DELETE,OPTIONS"
        );
        assert_eq!(
            headers["Access-Control-Allow-Headers"],
            "Content-Type,Authorization"
        );
    }

    #[test]
    fn test_empty_envelope_has_empty_body() {
        let resp = into_http(Envelope::empty(StatusCode::NO_CONTENT));
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            format!("{:?}", resp.into_body()),
            format!("{:?}", Full::new(Bytes::new()))
        );
    }

    #[test]
    fn test_numbers_serialize_in_plain_decimal_form() {
        let value = json!({"count": 3, "ratio": 0.5});
        let resp = into_http(Envelope::ok(value.clone()));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"count":3,"ratio":0.5}"#
        );
    }

    #[test]
    fn test_error_envelope_conversion() {
        let envelope: Envelope = ApiError::NotFound.into();
        assert_eq!(envelope.status, StatusCode::NOT_FOUND);
        assert_eq!(envelope.body, Some(json!({"error": "not_found"})));
    }
}

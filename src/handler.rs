//! Transport adapter
//!
//! Converts a hyper request into the router's transport-neutral
//! `ApiRequest`, applies the body-size guard, and renders the resulting
//! envelope back out as a hyper response.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};

use crate::config::AppState;
use crate::error::ApiError;
use crate::logger;
use crate::response::{self, Envelope};
use crate::router::{self, ApiRequest};

/// Validate Content-Length header against max body size
/// Returns Some(413 envelope) if too large, None otherwise
fn check_body_size(req: &Request<hyper::body::Incoming>, max_body_size: u64) -> Option<Envelope> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(Envelope::new(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Some(serde_json::json!({"error": "payload_too_large"})),
                ))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Parse the query string into a flat map; later duplicates win
fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();

    let access_log = state.config.logging.access_log;
    if access_log {
        logger::log_request(&method, &uri, req.version());
    }

    if let Some(envelope) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(response::into_http(envelope));
    }

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            let envelope: Envelope = ApiError::Internal("failed to read request body".to_string()).into();
            return Ok(response::into_http(envelope));
        }
    };

    let api_request = ApiRequest {
        method,
        path,
        query: parse_query(uri.query()),
        body,
    };

    let envelope = router::dispatch(&api_request, &state).await;
    if access_log {
        logger::log_dispatch(
            api_request.method.as_str(),
            &api_request.path,
            envelope.status.as_u16(),
        );
    }
    Ok(response::into_http(envelope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_basic_and_duplicates() {
        let query = parse_query(Some("limit=10&last=abc&limit=20"));
        assert_eq!(query.get("limit"), Some(&"20".to_string()));
        assert_eq!(query.get("last"), Some(&"abc".to_string()));
    }

    #[test]
    fn test_parse_query_percent_decoding() {
        let query = parse_query(Some("last=%7B%22id%22%3A%22a%22%7D"));
        assert_eq!(query.get("last"), Some(&"{\"id\":\"a\"}".to_string()));
    }

    #[test]
    fn test_parse_query_absent_is_empty() {
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_parse_query_value_free_key() {
        let query = parse_query(Some("last"));
        assert_eq!(query.get("last"), Some(&String::new()));
    }
}

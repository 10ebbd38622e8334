//! Request routing dispatch
//!
//! Maps an inbound request (method, path, query, body) onto the generic
//! store operations. CORS preflight answers before any validation; the
//! upload route is matched before generic resource dispatch.

use std::collections::HashMap;

use chrono::Utc;
use hyper::{Method, StatusCode};
use serde_json::{json, Value};

use crate::config::AppState;
use crate::error::{ApiError, ApiResult};
use crate::resource::{self, ResourceSpec};
use crate::response::Envelope;
use crate::store::Item;

/// Inbound request, already decoupled from the transport
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Lenient JSON body parse
///
/// Unreadable or non-object bodies become an empty object; the operation's
/// own validation then produces the 400.
fn parse_json_body(body: &[u8]) -> Item {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Item::new(),
    }
}

fn resolve(name: &str) -> ApiResult<&'static ResourceSpec> {
    resource::lookup(name).ok_or_else(|| ApiError::UnknownResource {
        name: name.to_string(),
        allowed: resource::allowed_names(),
    })
}

/// Dispatch a request to its operation, producing the outbound envelope
pub async fn dispatch(req: &ApiRequest, state: &AppState) -> Envelope {
    // CORS preflight: unconditional, before any resource validation.
    if req.method == Method::OPTIONS {
        return Envelope::empty(StatusCode::NO_CONTENT);
    }

    let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();
    match route(req, &segments, state).await {
        Ok(envelope) => envelope,
        Err(err) => err.into(),
    }
}

async fn route(req: &ApiRequest, segments: &[&str], state: &AppState) -> ApiResult<Envelope> {
    match (req.method.clone(), segments) {
        (_, []) => Ok(Envelope::new(
            StatusCode::NOT_FOUND,
            Some(json!({"error": "no_resource_in_path"})),
        )),

        (Method::GET, ["health"]) => Ok(Envelope::ok(json!({
            "status": "ok",
            "time": Utc::now().to_rfc3339(),
        }))),

        // Literal upload route, ahead of generic dispatch.
        (Method::POST, ["files", "upload"]) => handle_upload(req, state),

        (Method::POST, [name]) => handle_create(req, name, state).await,
        (Method::GET, [name]) => handle_list(req, name, state).await,
        (Method::GET, [name, id]) => handle_get(name, id, state).await,
        (Method::PATCH, [name, id, "read"]) => handle_read_flag(req, name, id, state).await,
        (Method::PUT, [name, id]) => handle_partial_update(req, name, id, state).await,
        (Method::DELETE, [name, id]) => handle_delete(name, id, state).await,

        _ => Ok(Envelope::new(
            StatusCode::NOT_FOUND,
            Some(json!({
                "error": "route_not_found",
                "method": req.method.as_str(),
                "path": req.path,
            })),
        )),
    }
}

async fn handle_create(req: &ApiRequest, name: &str, state: &AppState) -> ApiResult<Envelope> {
    let spec = resolve(name)?;
    let payload = parse_json_body(&req.body);
    if !spec.has_required(&payload) {
        return Err(ApiError::Validation(spec.required_message()));
    }
    let item = state.store.create(spec, payload).await?;
    Ok(Envelope::created(Value::Object(item)))
}

async fn handle_list(req: &ApiRequest, name: &str, state: &AppState) -> ApiResult<Envelope> {
    let spec = resolve(name)?;
    let limit = match req.query.get("limit") {
        None => state.config.storage.default_list_limit,
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::Validation(format!("invalid limit '{raw}'")))?,
    };
    let last = req.query.get("last").map(String::as_str);

    let page = state.store.list(spec, limit, last).await?;
    Ok(Envelope::ok(json!({
        "items": page.items,
        "last": page.last,
    })))
}

async fn handle_get(name: &str, id: &str, state: &AppState) -> ApiResult<Envelope> {
    resolve(name)?;
    match state.store.get(name, id).await? {
        Some(item) => Ok(Envelope::ok(Value::Object(item))),
        None => Err(ApiError::NotFound),
    }
}

async fn handle_read_flag(
    req: &ApiRequest,
    name: &str,
    id: &str,
    state: &AppState,
) -> ApiResult<Envelope> {
    resolve(name)?;
    let payload = parse_json_body(&req.body);
    let Some(Value::Bool(value)) = payload.get("read") else {
        return Err(ApiError::Validation(
            "'read' boolean required in body".to_string(),
        ));
    };
    match state.store.update_read_flag(name, id, *value).await? {
        Some(item) => Ok(Envelope::ok(Value::Object(item))),
        None => Err(ApiError::NotFound),
    }
}

async fn handle_partial_update(
    req: &ApiRequest,
    name: &str,
    id: &str,
    state: &AppState,
) -> ApiResult<Envelope> {
    resolve(name)?;
    let fields = parse_json_body(&req.body);
    if fields.is_empty() {
        return Err(ApiError::Validation("no_update_fields_provided".to_string()));
    }
    match state.store.partial_update(name, id, fields).await? {
        Some(item) => Ok(Envelope::ok(Value::Object(item))),
        None => Err(ApiError::NothingToUpdate),
    }
}

async fn handle_delete(name: &str, id: &str, state: &AppState) -> ApiResult<Envelope> {
    resolve(name)?;
    if state.store.delete(name, id).await? {
        Ok(Envelope::empty(StatusCode::NO_CONTENT))
    } else {
        Err(ApiError::NotFound)
    }
}

fn handle_upload(req: &ApiRequest, state: &AppState) -> ApiResult<Envelope> {
    let payload = parse_json_body(&req.body);
    let field = |name: &str| {
        payload
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let (Some(filename), Some(content_type)) = (field("filename"), field("content_type")) else {
        return Err(ApiError::Validation(
            "filename and content_type required for upload".to_string(),
        ));
    };

    let grant = state.presigner.presign(&filename, &content_type);
    serde_json::to_value(grant)
        .map(Envelope::ok)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

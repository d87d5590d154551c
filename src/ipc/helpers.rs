use crate::error::GradebookError;
use crate::ipc::error::{err, fail};
use crate::ipc::types::Request;
use crate::view::View;
use serde::de::DeserializeOwned;
use serde_json::json;

pub fn param_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn require_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    match param_str(req, key) {
        Some(v) => Ok(v.to_string()),
        None => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
    }
}

/// Decode the whole `params` object into `T`; missing or null params decode
/// as `T::default()`.
pub fn decode_params<T>(req: &Request) -> Result<T, serde_json::Value>
where
    T: DeserializeOwned + Default,
{
    if req.params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(req.params.clone())
        .map_err(|e| err(&req.id, "bad_params", e.to_string(), None))
}

/// Decode one object-valued param, e.g. the full record of an `*.update` call.
pub fn decode_record<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key).cloned() else {
        return Err(err(&req.id, "bad_params", format!("missing {key}"), None));
    };
    serde_json::from_value(raw).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            e.to_string(),
            Some(json!({ "param": key })),
        )
    })
}

pub fn require_view(req: &Request) -> Result<View, serde_json::Value> {
    let raw = require_str(req, "view")?;
    View::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("unknown view: {raw}"),
            Some(json!({ "allowed": ["overview", "students", "subjects", "grades", "add-grade"] })),
        )
    })
}

pub fn not_logged_in(req: &Request) -> serde_json::Value {
    fail(&req.id, &GradebookError::NotLoggedIn)
}

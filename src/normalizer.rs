use bytes::Bytes;
use serde_json::Value;

use crate::{
    errors::ApiError,
    models::upload::{CdnUploadResponse, UploadResponse},
};

pub const CREDENTIAL_MISMATCH: &str = "API key mismatch. Please ensure UPLOAD_API_KEY on the \
     relay matches the key configured on the storage endpoint.";

#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn status_text(&self) -> String {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }

    fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

pub fn normalize_upload(reply: &UpstreamReply, requested_name: &str) -> Result<UploadResponse, ApiError> {
    if !reply.is_success() {
        return Err(normalize_failure(reply));
    }
    let body = reply.json().ok_or_else(|| invalid_success(reply, "response is not JSON"))?;

    if body.get("success").and_then(Value::as_bool) == Some(false) || reports_error(&body) {
        let error = error_message(&body).unwrap_or_else(|| "Upload failed".into());
        return Err(ApiError::Upstream {
            status: 500,
            error,
            details: "Storage endpoint answered with a success status but reported a failure".into(),
            debug: body.get("debug").cloned(),
        });
    }

    let url = string_field(&body, "url").ok_or_else(|| invalid_success(reply, "no url in response"))?;
    let file_name = string_field(&body, "fileName").unwrap_or_else(|| requested_name.to_string());

    Ok(UploadResponse {
        url,
        file_name: Some(file_name),
    })
}

pub fn normalize_cdn(reply: &UpstreamReply) -> Result<CdnUploadResponse, ApiError> {
    if !reply.is_success() {
        return Err(normalize_failure(reply));
    }
    let body = reply.json().ok_or_else(|| invalid_success(reply, "response is not JSON"))?;
    let url = string_field(&body, "secure_url")
        .or_else(|| string_field(&body, "url"))
        .ok_or_else(|| invalid_success(reply, "no secure_url in response"))?;

    Ok(CdnUploadResponse {
        url,
        public_id: string_field(&body, "public_id"),
    })
}

pub fn normalize_failure(reply: &UpstreamReply) -> ApiError {
    let status_text = reply.status_text();
    let body = reply.json();
    let error = body
        .as_ref()
        .and_then(error_message)
        .unwrap_or_else(|| status_text.clone());
    let upstream_debug = body.as_ref().and_then(|b| b.get("debug").cloned());

    tracing::warn!(
        status = reply.status,
        error = %error,
        has_debug = upstream_debug.is_some(),
        "upstream rejected upload"
    );

    match reply.status {
        401 => ApiError::Unauthorized {
            error,
            details: CREDENTIAL_MISMATCH.into(),
            debug: upstream_debug,
        },
        400 | 413 | 415 | 422 => ApiError::ValidationRejected {
            status: reply.status,
            details: body
                .as_ref()
                .and_then(|b| string_field(b, "message"))
                .unwrap_or(status_text),
            error,
            debug: upstream_debug,
        },
        status => ApiError::Upstream {
            status,
            details: body
                .as_ref()
                .and_then(|b| string_field(b, "message"))
                .unwrap_or(status_text),
            error,
            debug: upstream_debug,
        },
    }
}

// null и пустая строка в `error` ошибкой не считаются
fn reports_error(body: &Value) -> bool {
    match body.get("error") {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Object(_)) => true,
        _ => false,
    }
}

/// `{"error": "..."}`, `{"error": {"message": "..."}}` or `{"message": "..."}`.
fn error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => string_field(body, "message"),
    }
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn invalid_success(reply: &UpstreamReply, why: &str) -> ApiError {
    let snippet: String = String::from_utf8_lossy(&reply.body).chars().take(300).collect();
    tracing::warn!(status = reply.status, %snippet, "unusable success body from upstream: {why}");
    ApiError::Upstream {
        status: 500,
        error: "Upload failed: Invalid response from server".into(),
        details: why.to_string(),
        debug: None,
    }
}

use std::fmt;

use crate::{config::Settings, errors::ApiError, util::mask_secret};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// `Debug` and `Display` never print the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn resolve(settings: &Settings) -> Result<Self, ApiError> {
        match settings.upload_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                tracing::debug!("upload credential present ({})", mask_secret(key));
                Ok(Self(key.to_string()))
            }
            _ => {
                tracing::error!("UPLOAD_API_KEY is not set");
                Err(ApiError::Configuration {
                    error: "Upload API key not set".into(),
                    details: "Set UPLOAD_API_KEY in the relay environment and restart the \
                              service. It must match the key configured on the storage endpoint."
                        .into(),
                })
            }
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Compares without an early exit on the first differing byte.
    pub fn matches(&self, provided: &str) -> bool {
        let (a, b) = (self.0.as_bytes(), provided.as_bytes());
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", mask_secret(&self.0))
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask_secret(&self.0))
    }
}

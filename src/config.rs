use dotenvy::dotenv;
use std::{env, str::FromStr, time::Duration};

pub const DEFAULT_ENDPOINT_URL: &str = "https://booksglance.com/uploads.php";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// How the relay encodes the file when talking to the legacy endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Multipart,
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Encoding::Json),
            "multipart" | "form" => Ok(Encoding::Multipart),
            other => Err(format!("unknown upload encoding: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_addr: String,
    pub upload_api_key: Option<String>,
    pub upload_endpoint_url: String,
    pub upload_timeout_ms: u64,
    pub upload_encoding: Encoding,
    pub mock_mode: bool,
    pub mock_base_url: String,
    pub max_upload_bytes: usize,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_upload_preset: Option<String>,
    pub cloudinary_api_base: String,
    pub cloudinary_folder: String,
    pub storage_dir: Option<String>,
    pub storage_api_key: Option<String>,
    pub sentry_dsn: Option<String>,
    pub swagger_enabled: bool,
    pub swagger_title: String,
    pub swagger_version: String,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|s| s == "true" || s == "1")
                .unwrap_or(default)
        };

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".into());
        let upload_api_key = non_empty("UPLOAD_API_KEY");
        let upload_endpoint_url =
            non_empty("UPLOAD_ENDPOINT_URL").unwrap_or_else(|| DEFAULT_ENDPOINT_URL.into());
        let upload_timeout_ms = parse_or("UPLOAD_TIMEOUT_MS", lookup("UPLOAD_TIMEOUT_MS"), DEFAULT_TIMEOUT_MS);
        let upload_encoding = parse_or("UPLOAD_ENCODING", lookup("UPLOAD_ENCODING"), Encoding::Json);
        let mock_mode = flag("UPLOAD_MOCK_MODE", false);
        let mock_base_url = non_empty("UPLOAD_MOCK_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".into())
            .trim_end_matches('/')
            .to_string();
        let max_upload_bytes = parse_or(
            "MAX_UPLOAD_BYTES",
            lookup("MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        );

        let cloudinary_cloud_name = non_empty("CLOUDINARY_CLOUD_NAME");
        let cloudinary_upload_preset = non_empty("CLOUDINARY_UPLOAD_PRESET");
        let cloudinary_api_base = non_empty("CLOUDINARY_API_BASE")
            .unwrap_or_else(|| "https://api.cloudinary.com".into())
            .trim_end_matches('/')
            .to_string();
        let cloudinary_folder =
            non_empty("CLOUDINARY_FOLDER").unwrap_or_else(|| "BooksGlance".into());

        let storage_dir = non_empty("STORAGE_DIR");
        // встроенное хранилище по умолчанию принимает тот же ключ, что и релей
        let storage_api_key = non_empty("STORAGE_API_KEY").or_else(|| upload_api_key.clone());

        let sentry_dsn = non_empty("SENTRY_DSN");
        let swagger_enabled = flag("SWAGGER_ENABLED", true);
        let swagger_title =
            lookup("SWAGGER_TITLE").unwrap_or_else(|| "BooksGlance Upload Relay".into());
        let swagger_version = lookup("SWAGGER_VERSION").unwrap_or_else(|| "1.0.0".into());

        Self {
            bind_addr,
            upload_api_key,
            upload_endpoint_url,
            upload_timeout_ms,
            upload_encoding,
            mock_mode,
            mock_base_url,
            max_upload_bytes,
            cloudinary_cloud_name,
            cloudinary_upload_preset,
            cloudinary_api_base,
            cloudinary_folder,
            storage_dir,
            storage_api_key,
            sentry_dsn,
            swagger_enabled,
            swagger_title,
            swagger_version,
        }
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }

    // base64 раздувает на 4/3, плюс запас на остальные поля
    pub fn max_body_bytes(&self) -> usize {
        (self.max_upload_bytes / 3)
            .saturating_mul(4)
            .saturating_add(64 * 1024)
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => default,
        Some(v) => v.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {key} value {v:?}: {e}, using default");
            default
        }),
    }
}

#[cfg(test)]
pub(crate) fn settings_with(pairs: &[(&str, &str)]) -> Settings {
    use std::collections::HashMap;
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(|key| map.get(key).cloned())
}

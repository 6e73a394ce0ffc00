use std::path::{Path, PathBuf};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::Utc;
use thiserror::Error;
use tokio::{fs as tokio_fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::{
    config::Settings,
    credential::Credential,
    decoder,
    models::upload::{StoreRequest, StoredFileResponse},
    util,
};

pub const ALLOWED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unauthorized: Invalid or missing API key")]
    Unauthorized,
    #[error("{0}")]
    Rejected(String),
    #[error("Error uploading file. Please check folder permissions.")]
    Io(#[from] std::io::Error),
}

impl ResponseError for StorageError {
    fn status_code(&self) -> StatusCode {
        match self {
            StorageError::Unauthorized => StatusCode::UNAUTHORIZED,
            StorageError::Rejected(_) => StatusCode::BAD_REQUEST,
            StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}

#[derive(Clone, Debug)]
pub struct StorageEndpoint {
    uploads_dir: PathBuf,
    credential: Option<Credential>,
    max_bytes: usize,
}

impl StorageEndpoint {
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let dir = settings.storage_dir.as_deref()?;
        if settings.storage_api_key.is_none() {
            tracing::warn!("storage endpoint enabled without a key; every upload will be rejected");
        }
        Some(Self::new(
            Path::new(dir).join("uploads"),
            settings.storage_api_key.clone().map(Credential::from),
        ))
    }

    pub fn new(uploads_dir: PathBuf, credential: Option<Credential>) -> Self {
        Self {
            uploads_dir,
            credential,
            max_bytes: MAX_FILE_SIZE,
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub async fn store(
        &self,
        header_key: Option<&str>,
        req: StoreRequest,
        host: &str,
    ) -> Result<StoredFileResponse, StorageError> {
        self.authenticate(header_key.or(req.api_key.as_deref()))?;

        let file_data = req
            .file_data
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| StorageError::Rejected("No file uploaded".into()))?;

        let requested = match req.file_name.as_deref().filter(|s| !s.is_empty()) {
            Some(name) => name.to_string(),
            None => format!(
                "{}_{}",
                Utc::now().timestamp(),
                req.book_id.as_deref().unwrap_or("upload")
            ),
        };
        let file_name = util::sanitize_file_name(&requested)
            .ok_or_else(|| StorageError::Rejected("Invalid file name".into()))?;

        let bytes = self.validate(file_data, &file_name)?;
        let path = self.write(&file_name, &bytes).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "stored upload");

        Ok(StoredFileResponse {
            success: true,
            url: format!("https://{host}/uploads/{file_name}"),
            file_name,
        })
    }

    pub fn authenticate(&self, provided: Option<&str>) -> Result<(), StorageError> {
        match (&self.credential, provided) {
            (Some(expected), Some(given)) if !given.is_empty() && expected.matches(given) => Ok(()),
            _ => {
                tracing::warn!(provided = provided.is_some(), "storage upload rejected: bad api key");
                Err(StorageError::Unauthorized)
            }
        }
    }

    fn validate(&self, file_data: &str, file_name: &str) -> Result<Vec<u8>, StorageError> {
        let (declared, payload) = decoder::split_data_url(file_data);
        let mime = declared
            .map(|m| m.to_ascii_lowercase())
            .or_else(|| decoder::mime_from_extension(file_name).map(str::to_string))
            .unwrap_or_default();
        if !ALLOWED_TYPES.contains(&mime.as_str()) {
            return Err(StorageError::Rejected(
                "Invalid file type. Only images are allowed.".into(),
            ));
        }

        let bytes = decoder::decode_base64(payload, self.max_bytes.saturating_mul(2))
            .map_err(|_| StorageError::Rejected("No file uploaded".into()))?;
        if bytes.len() > self.max_bytes {
            return Err(StorageError::Rejected("File size exceeds 10MB limit.".into()));
        }
        Ok(bytes)
    }

    // временный файл + rename: читатель не увидит половину картинки
    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        tokio_fs::create_dir_all(&self.uploads_dir).await?;
        let target = self.uploads_dir.join(file_name);
        let tmp = self
            .uploads_dir
            .join(format!(".{}.{}.part", file_name, Uuid::new_v4()));

        let mut file = tokio_fs::File::create(&tmp).await?;
        let written = async {
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        if let Err(e) = written {
            let _ = tokio_fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tokio_fs::rename(&tmp, &target).await?;
        Ok(target)
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// поля опциональны: отсутствие поля это MissingField, а не ошибка парсинга
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub file_data: Option<String>,
    #[schema(example = "cover.png")]
    pub file_name: Option<String>,
    #[schema(example = "book_1")]
    pub book_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardEnvelope {
    pub file_data: String,
    pub file_name: String,
    pub book_id: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[schema(example = "https://booksglance.com/uploads/cover.png")]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdnUploadResponse {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredFileResponse {
    pub success: bool,
    pub url: String,
    pub file_name: String,
}

/// Storage endpoint JSON body; `apiKey` is the body-field alternative to `X-API-Key`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    pub file_data: Option<String>,
    pub file_name: Option<String>,
    pub book_id: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub debug: Option<Value>,
}

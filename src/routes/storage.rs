use actix_web::{http::Method, web, HttpRequest, HttpResponse};

use crate::{
    credential::API_KEY_HEADER,
    models::upload::{ErrorResponse, StoreRequest, StoredFileResponse},
    routes::upload::method_not_allowed,
    storage::{StorageEndpoint, StorageError},
};

#[utoipa::path(
    post,
    path = "/uploads",
    tag = "Storage",
    request_body = StoreRequest,
    params(("X-API-Key" = Option<String>, Header, description = "shared secret; `apiKey` body field also accepted")),
    responses(
        (status = 200, description = "file written", body = StoredFileResponse),
        (status = 400, description = "bad type, size or name", body = ErrorResponse),
        (status = 401, description = "missing or wrong key", body = ErrorResponse)
    )
)]
pub async fn store_upload(
    req: HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
    storage: web::Data<StorageEndpoint>,
) -> Result<HttpResponse, StorageError> {
    let header_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let parsed = body.map_err(|e| e.to_string()).and_then(|bytes| {
        serde_json::from_slice::<StoreRequest>(&bytes).map_err(|e| e.to_string())
    });
    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            // тело не прочитать, ключ только из заголовка
            storage.authenticate(header_key)?;
            tracing::warn!("unreadable storage upload body: {e}");
            return Err(StorageError::Rejected("No file uploaded".into()));
        }
    };
    let host = req.connection_info().host().to_string();

    let stored = storage.store(header_key, parsed, &host).await?;
    Ok(HttpResponse::Ok().json(stored))
}

async fn storage_preflight() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Headers", "Content-Type, X-API-Key"))
        .finish()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/uploads")
            .route(web::post().to(store_upload))
            .route(web::method(Method::OPTIONS).to(storage_preflight))
            .default_service(web::to(method_not_allowed)),
    );
}

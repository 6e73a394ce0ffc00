pub mod cdn;
pub mod storage;
pub mod upload;

use actix_web::{get, middleware::DefaultHeaders, web, HttpResponse};

use crate::{errors::ApiError, relay::UploadRelay, storage::StorageEndpoint};

pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
        .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
}

#[utoipa::path(
    get,
    tag = "Service",
    responses((status = 200, description = "service is up"))
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn mount(
    relay: web::Data<UploadRelay>,
    storage: Option<web::Data<StorageEndpoint>>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let body_limit = relay.settings().max_body_bytes();
        // переполнение и кривой JSON отвечают тем же JSON, что и остальные ошибки
        let json_config = web::JsonConfig::default()
            .limit(body_limit)
            .content_type_required(false)
            .error_handler(|err, _req| ApiError::InvalidPayload(err.to_string()).into());
        cfg.app_data(json_config)
            .app_data(web::PayloadConfig::new(body_limit))
            .app_data(relay)
            .service(health)
            .configure(upload::configure)
            .configure(cdn::configure);

        if let Some(storage) = storage {
            tracing::info!(dir = %storage.uploads_dir().display(), "storage endpoint mounted at /uploads");
            cfg.app_data(storage).configure(storage::configure);
        }
    }
}

use actix_web::{http::Method, web, HttpResponse};

use crate::{
    cdn::upload_to_cdn,
    errors::ApiError,
    models::upload::{CdnUploadResponse, ErrorResponse, UploadRequest},
    relay::UploadRelay,
    routes::upload::{method_not_allowed, preflight},
};

#[utoipa::path(
    post,
    path = "/upload-image",
    tag = "CDN",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "stored on the image CDN", body = CdnUploadResponse),
        (status = 400, description = "bad request", body = ErrorResponse),
        (status = 500, description = "CDN not configured or failed", body = ErrorResponse),
        (status = 504, description = "CDN timed out", body = ErrorResponse)
    )
)]
pub async fn upload_image(
    body: web::Json<UploadRequest>,
    relay: web::Data<UploadRelay>,
) -> Result<HttpResponse, ApiError> {
    let resp = upload_to_cdn(&relay, &body).await?;
    Ok(HttpResponse::Ok().json(resp))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/upload-image")
            .route(web::post().to(upload_image))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(method_not_allowed)),
    );
}

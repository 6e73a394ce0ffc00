use crate::models::upload::{
    CdnUploadResponse, ErrorResponse, StoreRequest, StoredFileResponse, UploadRequest,
    UploadResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::upload::upload,
        crate::routes::cdn::upload_image,
        crate::routes::storage::store_upload,
        crate::routes::health,
    ),
    components(
        schemas(
            UploadRequest,
            UploadResponse,
            CdnUploadResponse,
            StoreRequest,
            StoredFileResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "Uploads", description = "Relay to the legacy storage endpoint"),
        (name = "CDN", description = "Direct upload to the image CDN"),
        (name = "Storage", description = "Built-in storage endpoint"),
        (name = "Service", description = "Liveness")
    )
)]
pub struct ApiDoc;

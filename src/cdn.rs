use crate::{
    decoder::Requirements,
    errors::ApiError,
    models::upload::{CdnUploadResponse, UploadRequest},
    normalizer::{self, UpstreamReply},
    relay::UploadRelay,
};

struct CdnTarget<'a> {
    cloud_name: &'a str,
    upload_preset: &'a str,
}

pub async fn upload_to_cdn(
    relay: &UploadRelay,
    request: &UploadRequest,
) -> Result<CdnUploadResponse, ApiError> {
    let settings = relay.settings();
    let file = relay.decode(request, Requirements::DataAndBookId)?;
    let public_id = file.book_id.clone();

    if relay.forwarder().is_mock() {
        let reply = relay.forwarder().mock_reply(&file.file_name);
        let upload = normalizer::normalize_upload(&reply, &file.file_name)?;
        return Ok(CdnUploadResponse {
            url: upload.url,
            public_id: Some(format!("{}/{}", settings.cloudinary_folder, public_id)),
        });
    }

    let target = match (
        settings.cloudinary_cloud_name.as_deref(),
        settings.cloudinary_upload_preset.as_deref(),
    ) {
        (Some(cloud_name), Some(upload_preset)) => CdnTarget {
            cloud_name,
            upload_preset,
        },
        _ => {
            tracing::error!("CLOUDINARY_CLOUD_NAME or CLOUDINARY_UPLOAD_PRESET is not set");
            return Err(ApiError::Configuration {
                error: "CDN credentials not set".into(),
                details: "Set CLOUDINARY_CLOUD_NAME and CLOUDINARY_UPLOAD_PRESET in the relay \
                          environment and restart the service."
                    .into(),
            });
        }
    };

    let url = format!(
        "{}/v1_1/{}/image/upload",
        settings.cloudinary_api_base, target.cloud_name
    );
    let data_url = file.to_data_url();
    let form = [
        ("file", data_url.as_str()),
        ("upload_preset", target.upload_preset),
        ("folder", settings.cloudinary_folder.as_str()),
        ("public_id", public_id.as_str()),
    ];
    let request = relay.forwarder().client().post(&url).form(&form);

    tracing::info!(%url, bytes = file.len(), %public_id, "uploading to cdn");
    let reply: UpstreamReply = relay.forwarder().send(&url, request).await?;
    normalizer::normalize_cdn(&reply)
}

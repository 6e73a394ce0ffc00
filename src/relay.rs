use crate::{
    config::{Encoding, Settings},
    credential::Credential,
    decoder::{self, DecodedFile, Requirements},
    errors::ApiError,
    forwarder::Forwarder,
    models::upload::{UploadRequest, UploadResponse},
    normalizer,
};

// один экземпляр на все воркеры
#[derive(Clone, Debug)]
pub struct UploadRelay {
    settings: Settings,
    forwarder: Forwarder,
}

impl UploadRelay {
    pub fn new(settings: Settings) -> Result<Self, ApiError> {
        let forwarder = Forwarder::new(&settings)?;
        Ok(Self {
            settings,
            forwarder,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    pub fn decode(
        &self,
        request: &UploadRequest,
        requirements: Requirements,
    ) -> Result<DecodedFile, ApiError> {
        decoder::decode_request(request, requirements, self.settings.max_upload_bytes)
    }

    pub async fn relay(&self, request: &UploadRequest) -> Result<UploadResponse, ApiError> {
        let requirements = match self.forwarder.encoding() {
            Encoding::Multipart => Requirements::AllFields,
            Encoding::Json => Requirements::DataAndBookId,
        };
        let file = self.decode(request, requirements)?;

        if self.forwarder.is_mock() {
            let reply = self.forwarder.mock_reply(&file.file_name);
            return normalizer::normalize_upload(&reply, &file.file_name);
        }

        let credential = Credential::resolve(&self.settings)?;
        let reply = self.forwarder.forward(&file, &credential).await?;
        let result = normalizer::normalize_upload(&reply, &file.file_name);
        match &result {
            Ok(ok) => tracing::info!(url = %ok.url, book_id = %file.book_id, "upload stored"),
            Err(e) => tracing::warn!(book_id = %file.book_id, "upload failed: {e}"),
        }
        result
    }
}

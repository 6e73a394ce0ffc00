use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::{multipart, Client, RequestBuilder};

use crate::{
    config::{Encoding, Settings},
    credential::{Credential, API_KEY_HEADER},
    decoder::DecodedFile,
    errors::ApiError,
    models::upload::ForwardEnvelope,
    normalizer::UpstreamReply,
};

#[derive(Clone, Debug)]
pub struct Forwarder {
    client: Client,
    endpoint: String,
    timeout: Duration,
    encoding: Encoding,
    mock_base_url: Option<String>,
}

impl Forwarder {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("booksglance-upload-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                tracing::error!("failed to build http client: {e}");
                ApiError::Internal
            })?;
        Ok(Self {
            client,
            endpoint: settings.upload_endpoint_url.clone(),
            timeout: settings.upload_timeout(),
            encoding: settings.upload_encoding,
            mock_base_url: settings.mock_mode.then(|| settings.mock_base_url.clone()),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn is_mock(&self) -> bool {
        self.mock_base_url.is_some()
    }

    pub fn mock_reply(&self, file_name: &str) -> UpstreamReply {
        let base = self.mock_base_url.as_deref().unwrap_or("http://localhost:8080");
        let url = format!("{base}/uploads/{file_name}");
        tracing::info!(%url, "mock mode: skipping storage endpoint");
        let body = serde_json::json!({ "success": true, "url": url, "fileName": file_name });
        UpstreamReply {
            status: 200,
            body: Bytes::from(body.to_string()),
        }
    }

    pub async fn forward(
        &self,
        file: &DecodedFile,
        credential: &Credential,
    ) -> Result<UpstreamReply, ApiError> {
        let request = self.build_request(file, credential)?;
        tracing::info!(
            endpoint = %self.endpoint,
            encoding = ?self.encoding,
            bytes = file.len(),
            file_name = %file.file_name,
            "forwarding upload"
        );
        self.send(&self.endpoint, request).await
    }

    fn build_request(
        &self,
        file: &DecodedFile,
        credential: &Credential,
    ) -> Result<RequestBuilder, ApiError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, credential.expose());

        match self.encoding {
            Encoding::Json => Ok(request.json(&ForwardEnvelope {
                file_data: file.to_data_url(),
                file_name: file.file_name.clone(),
                book_id: file.book_id.clone(),
            })),
            Encoding::Multipart => {
                let part = multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.mime)
                    .map_err(|e| ApiError::InvalidPayload(format!("bad content type: {e}")))?;
                // PHP-сторона проверяет и заголовок, и поле формы
                let form = multipart::Form::new()
                    .part("file", part)
                    .text("fileName", file.file_name.clone())
                    .text("apiKey", credential.expose().to_string());
                Ok(request.multipart(form))
            }
        }
    }

    // по таймауту future дропается вместе с соединением
    pub async fn send(&self, target: &str, request: RequestBuilder) -> Result<UpstreamReply, ApiError> {
        let started = Instant::now();
        let exchange = async {
            let resp = request.send().await?;
            let status = resp.status().as_u16();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamReply { status, body })
        };

        let reply = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(self.classify(target, e)),
            Err(_) => {
                tracing::warn!(%target, timeout_ms = self.timeout_ms(), "upstream call cancelled on timeout");
                return Err(self.timeout_error(target));
            }
        };

        tracing::info!(
            %target,
            status = reply.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );
        Ok(reply)
    }

    fn classify(&self, target: &str, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            tracing::warn!(%target, "upstream call timed out: {err}");
            self.timeout_error(target)
        } else {
            tracing::error!(%target, connect = err.is_connect(), "upstream call failed: {err}");
            ApiError::Network(err.to_string())
        }
    }

    fn timeout_error(&self, target: &str) -> ApiError {
        ApiError::GatewayTimeout {
            endpoint: target.to_string(),
            timeout_ms: self.timeout_ms(),
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

use actix_web::{http::Method, web, HttpResponse};

use crate::{
    errors::ApiError,
    models::upload::{ErrorResponse, UploadRequest, UploadResponse},
    relay::UploadRelay,
};

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Uploads",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "stored on the legacy endpoint", body = UploadResponse),
        (status = 400, description = "missing fields or undecodable payload", body = ErrorResponse),
        (status = 401, description = "storage endpoint rejected the relay key", body = ErrorResponse),
        (status = 500, description = "configuration or upstream failure", body = ErrorResponse),
        (status = 504, description = "storage endpoint timed out", body = ErrorResponse)
    )
)]
pub async fn upload(
    body: web::Json<UploadRequest>,
    relay: web::Data<UploadRelay>,
) -> Result<HttpResponse, ApiError> {
    let resp = relay.relay(&body).await?;
    Ok(HttpResponse::Ok().json(resp))
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/upload")
            .route(web::post().to(upload))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(method_not_allowed)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::settings_with, forwarder::tests::silent_endpoint, routes};
    use actix_web::{http::StatusCode, test, App};
    use mockito::Server;
    use serde_json::{json, Value};

    const COVER: &str =
        r#"{"fileData":"data:image/png;base64,iVBORw0KGgo=","fileName":"cover.png","bookId":"book_1"}"#;

    async fn call(pairs: &[(&str, &str)], req: test::TestRequest) -> (StatusCode, Value, actix_web::http::header::HeaderMap) {
        let relay = web::Data::new(UploadRelay::new(settings_with(pairs)).unwrap());
        let app = test::init_service(
            App::new()
                .wrap(routes::cors_headers())
                .configure(routes::mount(relay, None)),
        )
        .await;
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = test::read_body(resp).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json, headers)
    }

    fn post(body: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/upload")
            .insert_header(("content-type", "application/json"))
            .set_payload(body.to_string())
    }

    #[actix_web::test]
    async fn successful_upload_returns_url_and_file_name() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/uploads.php")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_body(r#"{"success":true,"url":"https://example.com/uploads/cover.png"}"#)
            .create_async()
            .await;
        let url = format!("{}/uploads.php", server.url());

        let (status, body, headers) = call(
            &[("UPLOAD_ENDPOINT_URL", url.as_str()), ("UPLOAD_API_KEY", "secret")],
            post(COVER),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"url": "https://example.com/uploads/cover.png", "fileName": "cover.png"})
        );
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert!(!body.to_string().contains("secret"));
    }

    #[actix_web::test]
    async fn upstream_validation_error_keeps_400() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/uploads.php")
            .with_status(400)
            .with_body(r#"{"error":"Invalid file type"}"#)
            .create_async()
            .await;
        let url = format!("{}/uploads.php", server.url());

        let (status, body, _) = call(
            &[("UPLOAD_ENDPOINT_URL", url.as_str()), ("UPLOAD_API_KEY", "secret")],
            post(COVER),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid file type");
        assert!(body["details"].is_string());
    }

    #[actix_web::test]
    async fn upstream_401_explains_key_mismatch() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/uploads.php")
            .with_status(401)
            .with_body(r#"{"error":"Unauthorized: Invalid or missing API key"}"#)
            .create_async()
            .await;
        let url = format!("{}/uploads.php", server.url());

        let (status, body, _) = call(
            &[("UPLOAD_ENDPOINT_URL", url.as_str()), ("UPLOAD_API_KEY", "stale")],
            post(COVER),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["details"].as_str().unwrap().contains("API key mismatch"));
        assert!(!body.to_string().contains("stale"));
    }

    #[actix_web::test]
    async fn missing_secret_is_500_without_network() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", "/uploads.php").expect(0).create_async().await;
        let url = format!("{}/uploads.php", server.url());

        let (status, body, _) = call(&[("UPLOAD_ENDPOINT_URL", url.as_str())], post(COVER)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Server configuration error"));
        mock.assert_async().await;
    }

    #[actix_web::test]
    async fn timeout_is_504_naming_endpoint_and_budget() {
        let (url, handle) = silent_endpoint().await;

        let (status, body, _) = call(
            &[
                ("UPLOAD_ENDPOINT_URL", url.as_str()),
                ("UPLOAD_API_KEY", "secret"),
                ("UPLOAD_TIMEOUT_MS", "250"),
            ],
            post(COVER),
        )
        .await;
        handle.abort();

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "Connect Timeout Error");
        let message = body["message"].as_str().unwrap();
        assert!(message.contains(&url), "{message}");
        assert!(message.contains("250ms"), "{message}");
    }

    #[actix_web::test]
    async fn mock_mode_returns_synthetic_url() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", "/uploads.php").expect(0).create_async().await;
        let url = format!("{}/uploads.php", server.url());

        let (status, body, _) = call(
            &[("UPLOAD_ENDPOINT_URL", url.as_str()), ("UPLOAD_MOCK_MODE", "true")],
            post(COVER),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["url"].as_str().unwrap().contains("cover.png"));
        mock.assert_async().await;
    }

    #[actix_web::test]
    async fn bad_bodies_are_400() {
        for payload in ["{oops", r#"{"bookId":"b"}"#, r#"{"fileData":"%%%","bookId":"b"}"#] {
            let (status, body, _) = call(&[("UPLOAD_API_KEY", "secret")], post(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
            assert!(body["error"].is_string());
        }
    }

    #[actix_web::test]
    async fn oversized_body_is_json_400() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", "/uploads.php").expect(0).create_async().await;
        let url = format!("{}/uploads.php", server.url());

        let huge = format!(
            r#"{{"fileData":"{}","fileName":"cover.png","bookId":"book_1"}}"#,
            "A".repeat(200_000)
        );
        let (status, body, headers) = call(
            &[
                ("UPLOAD_ENDPOINT_URL", url.as_str()),
                ("UPLOAD_API_KEY", "secret"),
                ("MAX_UPLOAD_BYTES", "1024"),
            ],
            post(&huge),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        assert!(body["error"].is_string());
        mock.assert_async().await;
    }

    #[actix_web::test]
    async fn wrong_field_types_are_json_400() {
        let (status, body, _) = call(
            &[("UPLOAD_API_KEY", "secret")],
            post(r#"{"fileData":42,"bookId":"b"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid payload"));
    }

    #[actix_web::test]
    async fn preflight_and_other_methods() {
        let (status, body, headers) = call(
            &[],
            test::TestRequest::default().method(Method::OPTIONS).uri("/upload"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert_eq!(headers.get("access-control-allow-methods").unwrap(), "POST, OPTIONS");
        assert_eq!(headers.get("access-control-allow-headers").unwrap(), "Content-Type");

        let (status, body, _) = call(&[], test::TestRequest::get().uri("/upload")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }
}

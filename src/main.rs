mod cdn;
mod config;
mod credential;
mod decoder;
mod errors;
mod forwarder;
mod models;
mod normalizer;
mod openapi;
mod relay;
mod routes;
mod sentry;
mod storage;
mod util;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Settings;
use relay::UploadRelay;
use storage::StorageEndpoint;
use tracing_subscriber::{fmt, EnvFilter};
use utoipa::OpenApi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // логи
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let settings = Settings::from_env();
    let _sentry = sentry::init_sentry(&settings);

    let relay = UploadRelay::new(settings.clone())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let relay = web::Data::new(relay);
    let storage = StorageEndpoint::from_settings(&settings).map(web::Data::new);

    tracing::info!(
        endpoint = %settings.upload_endpoint_url,
        encoding = ?settings.upload_encoding,
        timeout_ms = settings.upload_timeout_ms,
        mock_mode = settings.mock_mode,
        api_key_set = settings.upload_api_key.is_some(),
        "upload relay configured"
    );
    if settings.upload_api_key.is_none() && !settings.mock_mode {
        tracing::warn!("UPLOAD_API_KEY is not set; /upload will answer 500 until it is");
    }

    let openapi = openapi::ApiDoc::openapi();

    let bind_addr = settings.bind_addr.clone();
    tracing::info!("Listening on {}", bind_addr);

    HttpServer::new(move || {
        let swagger = if settings.swagger_enabled {
            let mut doc = openapi.clone();
            doc.info.title = settings.swagger_title.clone();
            doc.info.version = settings.swagger_version.clone();
            Some(utoipa_swagger_ui::SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", doc))
        } else {
            None
        };

        // SwaggerUi сам отдаёт /api-docs/openapi.json
        let mut app = App::new()
            .wrap(routes::cors_headers())
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes::mount(relay.clone(), storage.clone()));
        if let Some(sw) = swagger {
            app = app.service(sw);
        }
        app
    })
    .workers(num_cpus::get().max(2))
    .bind(bind_addr)?
    .run()
    .await
}

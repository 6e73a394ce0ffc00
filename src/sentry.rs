use sentry::{protocol::Event, ClientInitGuard, IntoDsn, Level};
use std::{sync::Arc, time::Duration};

use crate::{config::Settings, credential::API_KEY_HEADER, errors::ApiError};

pub fn init_sentry(settings: &Settings) -> Option<ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    let guard = sentry::init((
        dsn.into_dsn().ok()?,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            traces_sample_rate: 0.1,
            shutdown_timeout: Duration::from_secs(2),
            send_default_pii: false,
            before_send: Some(Arc::new(|event| Some(scrub(event)))),
            ..Default::default()
        },
    ));
    tracing::info!("sentry reporting enabled");
    Some(guard)
}

/// Only server-side failures are worth an event; 4xx are the caller's problem.
pub fn report(err: &ApiError, status: u16) {
    if status >= 500 {
        sentry::capture_message(&err.to_string(), Level::Error);
    }
}

fn scrub(mut event: Event<'static>) -> Event<'static> {
    if let Some(request) = event.request.as_mut() {
        request
            .headers
            .retain(|name, _| !name.eq_ignore_ascii_case(API_KEY_HEADER));
        request.data = None;
    }
    event
}

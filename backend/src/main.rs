//! Backend entry-point: opens the stores, wires REST endpoints and OpenAPI
//! docs, then serves until shutdown.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use intake_backend::domain::SubmissionService;
use intake_backend::inbound::http::health::HealthState;
use intake_backend::inbound::http::state::HttpState;
use intake_backend::outbound::attachments::LocalAttachmentStore;
use intake_backend::outbound::persistence::JsonSubmissionStore;
use intake_backend::settings::AppSettings;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| io::Error::other(format!("failed to load configuration: {e}")))?;

    let data_file = settings.data_file();
    let uploads_dir = settings.uploads_dir();
    let records = JsonSubmissionStore::open(&data_file, settings.corruption_policy())
        .map_err(|e| io::Error::other(format!("record store unavailable: {e}")))?;
    let clock = Arc::new(DefaultClock);
    let attachments = LocalAttachmentStore::open(&uploads_dir, clock.clone())
        .map_err(|e| io::Error::other(format!("attachment store unavailable: {e}")))?;

    let service = Arc::new(SubmissionService::new(
        Arc::new(records),
        Arc::new(attachments),
        clock,
    ));
    let http_state =
        HttpState::from_service(service).with_max_upload_bytes(settings.max_upload_bytes());
    let config = ServerConfig::new(settings.bind_addr(), http_state);

    let health_state = web::Data::new(HealthState::new());
    info!(
        bind_addr = %config.bind_addr(),
        data_file = %data_file,
        uploads_dir = %uploads_dir,
        "starting intake server"
    );
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    info!("intake server stopped");
    result
}

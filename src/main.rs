use dotenvy::dotenv;
use hls_worker::config::env::{self, EnvKey};
use hls_worker::config::settings::AppConfig;
use hls_worker::infrastructure::db::pool::connect_to_db;
use hls_worker::infrastructure::storage::s3::StorageService;
use hls_worker::modules::video::events::decode_event;
use hls_worker::state::AppState;
use hls_worker::workers::transcoder::{process_key, report_outcome};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Checked before the rest of the configuration: an empty trigger is not an error.
    let Some(body) = env::get_opt(EnvKey::MessageBody) else {
        info!("No message body.");
        return ExitCode::SUCCESS;
    };

    // Placeholder and malformed messages never need the database.
    let key = match decode_event(&body) {
        Ok(Some(key)) => key,
        other => return exit_code(report_outcome(other.map(|_| None))),
    };

    let config = match AppConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("🎥 Starting transcoder worker...");

    let db = match connect_to_db(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Failed to connect to PostgreSQL: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let storage = StorageService::new(&config.storage).await;
    let state = AppState::new(config, db, storage);
    let transcoder = state.transcoder();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling job");
            on_signal.cancel();
        }
    });

    let result = process_key(&transcoder, &key, &cancel).await;
    state.db.close().await;

    exit_code(result)
}

fn exit_code<E>(result: Result<(), E>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

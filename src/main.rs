use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use waitwise::api;
use waitwise::config::{self, Config};
use waitwise::engine::QueueEngine;
use waitwise::estimation::{BaselineEstimator, load_primary_model};
use waitwise::narrative::{GeminiNarrator, GeminiSettings, Narrator, OfflineNarrator};
use waitwise::state::AppState;

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn build_narrator(config: &Config) -> Box<dyn Narrator> {
    let key_env = config.api_key_env();
    let api_key = match std::env::var(key_env) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            tracing::warn!(env = key_env, "No narrator API key set, explanations disabled");
            return Box::new(OfflineNarrator);
        }
    };

    let settings = GeminiSettings {
        base_url: config.narrator_base_url().to_string(),
        model: config.narrator_model().to_string(),
        api_key,
        timeout: config.narrator_timeout(),
    };
    match GeminiNarrator::new(settings) {
        Ok(narrator) => {
            tracing::info!(endpoint = narrator.endpoint(), "Narrator configured");
            Box::new(narrator)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to build narrator client, explanations disabled");
            Box::new(OfflineNarrator)
        }
    }
}

async fn serve(state: Arc<AppState>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = api::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = config::load_default()?;
    init_tracing(&config.logging.level);
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "waitwise starting"
    );

    // The blocking HTTP client must exist before the runtime starts.
    let baseline = BaselineEstimator::new(load_primary_model(config.artifact_path()));
    let narrator = build_narrator(&config);
    let state = Arc::new(AppState::new(QueueEngine::new(baseline, narrator)));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(Arc::clone(&state), config.server_port()));
    drop(runtime);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_toml() -> Result<(), Box<dyn std::error::Error>> {
        let _config = config::load_default()?;
        Ok(())
    }

    #[test]
    fn missing_api_key_selects_offline_narrator() -> Result<(), Box<dyn std::error::Error>> {
        let mut config = config::load_default()?;
        config.narrator = Some(config::NarratorSection {
            api_key_env: Some("WAITWISE_TEST_UNSET_KEY".to_string()),
            ..Default::default()
        });

        let narrator = build_narrator(&config);

        assert_eq!(narrator.name(), "offline");
        assert!(!narrator.is_available());
        Ok(())
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;

use hmi_audit::llm::{self, Provider};
use hmi_audit::telemetry::init_telemetry;
use hmi_audit::{AppState, Config, routes};

fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match config.llm_provider.as_str() {
        "anthropic" => {
            let key = config
                .anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY must be set")?;
            Arc::new(llm::anthropic::AnthropicProvider::new(key))
        }
        _ => {
            let key = config
                .openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY must be set")?;
            match config.openai_base_url.as_deref() {
                Some(base) => Arc::new(llm::openai::OpenAIProvider::with_api_base(key, base)),
                None => Arc::new(llm::openai::OpenAIProvider::new(key)),
            }
        }
    };
    Ok(provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let telemetry_guard = init_telemetry(&config)?;

    tracing::info!(
        port = config.port,
        environment = %config.environment,
        locale = %config.locale,
        "Starting hmi-audit"
    );

    let llm_client = Arc::new(llm::LlmClient::new(build_provider(&config)?));

    tracing::info!(
        provider = %llm_client.provider_name(),
        model = %config.llm_model,
        "LLM client initialized"
    );

    let state = AppState::new(config.clone(), llm_client);
    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    telemetry_guard.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

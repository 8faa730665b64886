use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use docpoint::application::services::{
    DocumentRegistry, EventConsumer, EventHandler, ExtractionClient, Orchestrator,
};
use docpoint::infrastructure::extraction::HttpExtractionCapability;
use docpoint::infrastructure::messaging::EventChannelFactory;
use docpoint::infrastructure::observability::{TracingConfig, init_tracing};
use docpoint::presentation::config::ServerSettings;
use docpoint::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    let tracing_config = TracingConfig::new(
        environment.as_str(),
        settings.logging.json,
        &settings.logging.level,
    );
    init_tracing(&tracing_config).context("Failed to initialise tracing")?;
    tracing::info!(
        environment = %tracing_config.environment,
        filter = %tracing_config.default_filter,
        json_format = tracing_config.json_format,
        "Tracing initialised"
    );

    let registry = Arc::new(DocumentRegistry::default());
    let retry_policy = settings.extraction.retry_policy();
    let channel = EventChannelFactory::create(&settings.broker, &retry_policy).await;

    let capability = HttpExtractionCapability::new(
        &settings.extraction.base_url,
        &settings.extraction.endpoint,
        settings.extraction.attempt_timeout(),
    )
    .context("Failed to build extraction client")?;
    let extraction_client = Arc::new(ExtractionClient::new(
        Arc::new(capability),
        retry_policy,
    ));

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&registry),
        channel.publisher,
        extraction_client,
    ));

    let shutdown = CancellationToken::new();
    let consumer_task = channel.source.map(|source| {
        let consumer = EventConsumer::new(
            source,
            Arc::clone(&orchestrator) as Arc<dyn EventHandler>,
            settings.broker.consumer.clone(),
        );
        tokio::spawn(consumer.run(shutdown.child_token()))
    });
    if !channel.mode.consumes() {
        tracing::warn!(
            broker = channel.mode.as_str(),
            "No event source available, submitted data points will not be processed"
        );
    }

    let state = AppState::new(Arc::clone(&orchestrator), channel.mode)
        .with_upload_limit(settings.server.upload_limit_bytes());
    let router = create_router(state);

    let listener = bind_with_retry(&settings.server).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        broker = ?channel.mode,
        "Listening"
    );

    let server_shutdown = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => tracing::info!("Shutdown signal received"),
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    if let Some(task) = consumer_task {
        match task.await {
            Ok(stats) => tracing::info!(?stats, "Event consumer stopped"),
            Err(e) => tracing::error!(error = %e, "Event consumer task failed"),
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn bind_with_retry(server: &ServerSettings) -> anyhow::Result<TcpListener> {
    let address = format!("{}:{}", server.host, server.port);
    let attempts = server.bind_attempts.max(1);
    let mut attempt = 1;

    loop {
        match TcpListener::bind(&address).await {
            Ok(listener) => return Ok(listener),
            Err(e) if attempt < attempts => {
                let delay = Duration::from_secs(server.bind_retry_delay_secs * u64::from(attempt));
                tracing::warn!(
                    error = %e,
                    address = %address,
                    attempt,
                    attempts,
                    "Bind failed, retrying in {}s",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to bind {address}"));
            }
        }
    }
}

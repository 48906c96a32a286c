use anyhow::{Context, Result};
use axum::Router;
use checkout::{
    config::myconfig::Config,
    kafka::{StockEventConsumer, StockEventHandler},
    metrics::metrics_handler,
    state::AppState,
};
use shared::{
    config::ConnectionManager,
    utils::{Telemetry, init_logger, shutdown_signal},
};
use sqlx::{Pool, Postgres};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, state, telemetry) = setup().await.context("Failed to setup application")?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let handles = run_servers(&config, state, shutdown_tx.clone());

    shutdown_signal().await;
    if let Err(e) = shutdown_tx.send(()) {
        warn!("Failed to send shutdown signal: {}", e);
    }

    shutdown(telemetry, handles).await;

    Ok(())
}

async fn setup() -> Result<(Config, Arc<AppState>, Telemetry)> {
    dotenv::dotenv().ok();

    let config = Config::init().context("Failed to load configuration")?;

    let mut telemetry = Telemetry::new("checkout-service", config.otel_endpoint.clone());
    let logger_provider = telemetry
        .init_logger()
        .context("Failed to initialize OTLP logger")?;
    telemetry
        .init_meter()
        .context("Failed to initialize OTLP meter")?;
    telemetry
        .init_tracer(config.is_dev)
        .context("Failed to initialize tracer")?;

    init_logger(
        logger_provider,
        "checkout-service",
        config.is_dev,
        config.enable_file_log,
    );

    info!("🚀 Starting Checkout Service initialization...");

    let db_pool =
        ConnectionManager::new_pool(&config.database_url, config.db_min_conn, config.db_max_conn)
            .await
            .context("Failed to initialize database pool")?;

    if config.run_migrations {
        run_migrations(&db_pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let state = Arc::new(
        AppState::new(db_pool, &config)
            .await
            .context("Failed to create AppState")?,
    );

    info!("✅ Application setup completed successfully.");
    Ok((config, state, telemetry))
}

struct ServerHandles {
    kafka_handle: tokio::task::JoinHandle<()>,
    metrics_handle: tokio::task::JoinHandle<()>,
}

fn run_servers(
    config: &Config,
    state: Arc<AppState>,
    shutdown_tx: broadcast::Sender<()>,
) -> ServerHandles {
    let handler = Arc::new(StockEventHandler::new(state.stock_levels.clone()));

    let kafka_handle = spawn_kafka_consumer(
        config.kafka_broker.clone(),
        config.kafka_group_id.clone(),
        handler,
        shutdown_tx.clone(),
    );

    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.metric_port));
    let shutdown_rx = shutdown_tx.subscribe();
    let metrics_handle = tokio::spawn(async move {
        if let Err(e) = start_metrics_server(state, metrics_addr, shutdown_rx).await {
            error!("❌ Metrics server failed: {e:?}");
        }
    });

    ServerHandles {
        kafka_handle,
        metrics_handle,
    }
}

fn spawn_kafka_consumer(
    kafka_broker: String,
    group_id: String,
    handler: Arc<StockEventHandler>,
    shutdown_tx: broadcast::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();

        loop {
            info!("🔄 Starting Kafka consumer...");

            let result = match StockEventConsumer::new(&kafka_broker, &group_id, handler.clone()) {
                Ok(consumer) => consumer
                    .start_with_shutdown(shutdown_rx.resubscribe())
                    .await,
                Err(e) => Err(e).context("Failed to create Kafka consumer"),
            };

            match result {
                Ok(()) => {
                    info!("✅ Kafka consumer stopped gracefully");
                    break;
                }
                Err(e) => error!("💀 Kafka consumer error: {e:?}. Restarting in 5s..."),
            }

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(5)) => {}
            }
        }
    })
}

async fn start_metrics_server(
    state: Arc<AppState>,
    addr: SocketAddr,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    info!("📡 Starting metrics server on {}", addr);

    let app = Router::new()
        .route("/metrics", axum::routing::get(metrics_handler))
        .route("/health", axum::routing::get(health_check))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics listener on {addr}"))?;

    let shutdown_future = async move {
        let _ = shutdown_rx.recv().await;
        info!("Metrics server received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_future)
        .await
        .context("Metrics server failed to start or serve")
}

async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown(telemetry: Telemetry, handles: ServerHandles) {
    info!("🛑 Shutting down all servers...");

    let shutdown_timeout = tokio::time::Duration::from_secs(30);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = tokio::join!(handles.kafka_handle, handles.metrics_handle);
    })
    .await;

    match shutdown_result {
        Ok(()) => info!("✅ All components shutdown gracefully"),
        Err(_) => warn!("⚠️  Shutdown timeout reached, forcing exit"),
    }

    if let Err(e) = telemetry.shutdown().await {
        error!("Failed to shutdown telemetry: {}", e);
    }

    info!("✅ Checkout Service shutdown complete.");
}

pub async fn run_migrations(pool: &Pool<Postgres>) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}

use crate::{
    config::myconfig::Config,
    di::{DependenciesInject, DependenciesInjectDeps, Repositories},
    metrics::StockLevelMetrics,
};
use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::DynKafka,
    config::{ConnectionPool, Kafka},
    utils::{SystemMetrics, run_metrics_collector},
};
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub di_container: DependenciesInject,
    pub registry: Arc<Mutex<Registry>>,
    pub system_metrics: Arc<SystemMetrics>,
    pub stock_levels: StockLevelMetrics,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("deps", &self.di_container)
            .field("system_metrics", &self.system_metrics)
            .finish()
    }
}

impl AppState {
    pub async fn new(pool: ConnectionPool, config: &Config) -> Result<Self> {
        let kafka = Arc::new(
            Kafka::new(&config.kafka_broker).context("Failed to create Kafka producer")?,
        ) as DynKafka;

        let mut registry = Registry::default();
        let system_metrics = Arc::new(SystemMetrics::new());
        let stock_levels = StockLevelMetrics::new();

        let deps = DependenciesInjectDeps {
            repositories: Repositories::postgres(pool, config.lock_timeout),
            kafka,
            checkout_timeout: config.checkout_timeout,
        };

        let di_container = DependenciesInject::new(deps, &mut registry);

        system_metrics.register(&mut registry);
        stock_levels.register(&mut registry);

        tokio::spawn(run_metrics_collector(
            system_metrics.clone(),
            Duration::from_secs(15),
        ));

        Ok(Self {
            di_container,
            registry: Arc::new(Mutex::new(registry)),
            system_metrics,
            stock_levels,
        })
    }
}

use anyhow::{Context, Result, anyhow};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub kafka_broker: String,
    pub kafka_group_id: String,
    pub run_migrations: bool,
    pub db_max_conn: u32,
    pub db_min_conn: u32,
    pub metric_port: u16,
    pub otel_endpoint: String,
    pub checkout_timeout: Duration,
    pub lock_timeout: Duration,
    pub is_dev: bool,
    pub enable_file_log: bool,
}

impl Config {
    pub fn init() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("Missing environment variable: DATABASE_URL")?;

        let kafka_broker = std::env::var("KAFKA").context("Missing environment variable: KAFKA")?;

        let kafka_group_id = std::env::var("KAFKA_GROUP_ID")
            .unwrap_or_else(|_| "checkout-service-group".to_string());

        let run_migrations_str = std::env::var("RUN_MIGRATIONS")
            .context("Missing environment variable: RUN_MIGRATIONS")?;
        let run_migrations = match run_migrations_str.as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(anyhow!(
                    "RUN_MIGRATIONS must be 'true' or 'false', got '{}'",
                    other
                ));
            }
        };

        let db_max_conn: u32 = std::env::var("DB_MAX_CONN")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("Unable to parse DB_MAX_CONN as u32")?;

        let db_min_conn: u32 = std::env::var("DB_MIN_CONN")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<u32>()
            .context("Unable to parse DB_MIN_CONN as u32")?;

        let metric_port = std::env::var("METRIC_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("METRIC_PORT must be a valid u16 integer")?;

        let otel_endpoint = std::env::var("OTEL_ENDPOINT")
            .unwrap_or_else(|_| "http://otel-collector:4317".to_string());

        let checkout_timeout_ms = std::env::var("CHECKOUT_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()
            .context("CHECKOUT_TIMEOUT_MS must be a number of milliseconds")?;

        let lock_timeout_ms = std::env::var("LOCK_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse::<u64>()
            .context("LOCK_TIMEOUT_MS must be a number of milliseconds")?;

        if lock_timeout_ms >= checkout_timeout_ms {
            return Err(anyhow!(
                "LOCK_TIMEOUT_MS ({lock_timeout_ms}) must be below CHECKOUT_TIMEOUT_MS ({checkout_timeout_ms})"
            ));
        }

        let is_dev = std::env::var("DEV_MODE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let enable_file_log = std::env::var("ENABLE_FILE_LOG")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            kafka_broker,
            kafka_group_id,
            run_migrations,
            db_max_conn,
            db_min_conn,
            metric_port,
            otel_endpoint,
            checkout_timeout: Duration::from_millis(checkout_timeout_ms),
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            is_dev,
            enable_file_log,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

use prometheus_client::metrics::{counter::Counter, family::Family, gauge::Gauge, histogram::Histogram};
use prometheus_client::registry::Registry;
use prometheus_client_derive_encode::{EncodeLabelSet, EncodeLabelValue};
use std::sync::{Arc, Mutex, atomic::AtomicU64};
use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::warn;

/// Process-level gauges refreshed on an interval by [`run_metrics_collector`].
#[derive(Debug)]
pub struct SystemMetrics {
    pub resident_memory_bytes: Gauge,
    pub virtual_memory_bytes: Gauge,
    pub available_memory_bytes: Gauge,
    pub thread_count: Gauge,
    pub process_cpu_percent: Gauge<f64, AtomicU64>,
    pub global_cpu_percent: Gauge<f64, AtomicU64>,
    pub process_start_time: Gauge,
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMetrics {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            warn!("⚠️ Could not resolve own pid, process metrics disabled");
        }

        Self {
            resident_memory_bytes: Gauge::default(),
            virtual_memory_bytes: Gauge::default(),
            available_memory_bytes: Gauge::default(),
            thread_count: Gauge::default(),
            process_cpu_percent: Gauge::default(),
            global_cpu_percent: Gauge::default(),
            process_start_time: Gauge::default(),
            pid,
            system: Mutex::new(System::new()),
        }
    }

    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "process_resident_memory_bytes",
            "Resident memory of the process in bytes",
            self.resident_memory_bytes.clone(),
        );
        registry.register(
            "process_virtual_memory_bytes",
            "Virtual memory of the process in bytes",
            self.virtual_memory_bytes.clone(),
        );
        registry.register(
            "host_available_memory_bytes",
            "Memory available to new allocations on the host",
            self.available_memory_bytes.clone(),
        );
        registry.register(
            "process_threads",
            "Threads owned by the process",
            self.thread_count.clone(),
        );
        registry.register(
            "process_cpu_percent",
            "CPU used by the process since the previous refresh",
            self.process_cpu_percent.clone(),
        );
        registry.register(
            "host_cpu_percent",
            "CPU used by the host since the previous refresh",
            self.global_cpu_percent.clone(),
        );
        registry.register(
            "process_start_time_seconds",
            "Start time of the process since unix epoch in seconds",
            self.process_start_time.clone(),
        );
    }

    /// Refreshes every gauge. CPU percentages need two refreshes to be
    /// meaningful, so the first tick reports zero.
    pub fn refresh(&self) {
        let Some(pid) = self.pid else {
            return;
        };

        let mut system = match self.system.lock() {
            Ok(system) => system,
            Err(poisoned) => poisoned.into_inner(),
        };

        system.refresh_memory();
        system.refresh_cpu_usage();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        self.available_memory_bytes
            .set(to_i64(system.available_memory()));
        self.global_cpu_percent
            .set(f64::from(system.global_cpu_usage()));

        if let Some(process) = system.process(pid) {
            self.resident_memory_bytes.set(to_i64(process.memory()));
            self.virtual_memory_bytes
                .set(to_i64(process.virtual_memory()));
            self.process_cpu_percent
                .set(f64::from(process.cpu_usage()));
            self.process_start_time.set(to_i64(process.start_time()));

            if let Some(tasks) = process.tasks() {
                self.thread_count.set(to_i64(tasks.len() as u64));
            }
        }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Status {
    Success,
    Error,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct Labels {
    pub operation: String,
    pub method: Method,
    pub status: Status,
}

/// Per-service request counter and latency histogram, labelled by operation.
#[derive(Clone, Debug)]
pub struct Metrics {
    pub request_counter: Family<Labels, Counter>,
    pub request_duration: Family<Labels, Histogram>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            request_counter: Family::default(),
            // checkout latency is dominated by row-lock waits, hence the
            // dense low end and a tail up to the checkout timeout
            request_duration: Family::new_with_constructor(|| {
                Histogram::new(vec![
                    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                ])
            }),
        }
    }

    pub fn register(&self, prefix: &str, registry: &mut Registry) {
        registry.register(
            format!("{prefix}_requests"),
            format!("Requests handled by the {prefix}"),
            self.request_counter.clone(),
        );
        registry.register(
            format!("{prefix}_request_duration_seconds"),
            format!("Latency of requests handled by the {prefix}"),
            self.request_duration.clone(),
        );
    }

    pub fn record(&self, operation: &str, method: Method, status: Status, duration_secs: f64) {
        let labels = Labels {
            operation: operation.to_string(),
            method,
            status,
        };
        self.request_counter.get_or_create(&labels).inc();
        self.request_duration
            .get_or_create(&labels)
            .observe(duration_secs);
    }
}

pub async fn run_metrics_collector(system_metrics: Arc<SystemMetrics>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        system_metrics.refresh();
    }
}

// Periodic counter polling. One scheduler task per process; each tick polls every enabled
// source concurrently and appends whatever it reads to the counter store.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tracing::{Instrument, instrument};

use crate::config::PollingConfig;
use crate::fetcher::CounterFetcher;
use crate::models::{Counters, NewReading, PrinterSource};
use crate::store::CounterStore;

/// Scheduler timing. Built from `[polling]`.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Budget for one source, retries and alternate endpoints included.
    pub poll_timeout: Duration,
    pub concurrency: usize,
}

impl From<&PollingConfig> for PollerConfig {
    fn from(c: &PollingConfig) -> Self {
        Self {
            interval: c.effective_interval(),
            poll_timeout: c.poll_timeout(),
            concurrency: c.concurrency,
        }
    }
}

/// Result of polling one source, as returned by `scan_all` and the test endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    pub source_id: i64,
    pub printer: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counters: Option<Counters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct PollScheduler {
    store: Arc<CounterStore>,
    fetcher: CounterFetcher,
    config: PollerConfig,
}

/// Running scheduler task. Dropping the handle without `stop` leaves the task running.
pub struct PollerHandle {
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Signals the loop and waits for the in-flight tick to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "poll scheduler task ended abnormally");
        }
    }
}

impl PollScheduler {
    pub fn new(store: Arc<CounterStore>, fetcher: CounterFetcher, config: PollerConfig) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> PollerConfig {
        self.config
    }

    /// Spawns the tick loop. The first tick fires immediately.
    pub fn start(self: Arc<Self>) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let poller_span = tracing::span!(
            tracing::Level::DEBUG,
            "poller",
            interval_secs = self.config.interval.as_secs()
        );
        let join = tokio::spawn(
            async move {
                let mut tick = interval(self.config.interval);
                tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = tick.tick() => {
                            match self.scan_all().await {
                                Ok(outcomes) => {
                                    let failed = outcomes.iter().filter(|o| !o.ok).count();
                                    tracing::info!(
                                        sources = outcomes.len(),
                                        ok = outcomes.len() - failed,
                                        failed,
                                        "poll tick"
                                    );
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        error = %e,
                                        operation = "list_enabled_sources",
                                        "poll tick skipped"
                                    );
                                }
                            }
                        }
                        _ = &mut shutdown_rx => {
                            tracing::debug!("Poll scheduler shutting down");
                            break;
                        }
                    }
                }
            }
            .instrument(poller_span),
        );
        PollerHandle { shutdown_tx, join }
    }

    /// Polls every enabled source once. Fails only when the source list cannot be read.
    #[instrument(skip(self), fields(operation = "scan_all"))]
    pub async fn scan_all(&self) -> anyhow::Result<Vec<PollOutcome>> {
        let sources = self.store.list_enabled_sources().await?;
        let outcomes = stream::iter(sources)
            .map(|source| async move { self.poll_source(&source).await })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;
        Ok(outcomes)
    }

    /// Fetches one source and records the reading, or records the failure as `last_error`.
    #[instrument(skip(self, source), fields(printer = %source.name, source_id = source.id))]
    pub async fn poll_source(&self, source: &PrinterSource) -> PollOutcome {
        let result = match tokio::time::timeout(
            self.config.poll_timeout,
            self.fetcher.fetch_source(source),
        )
        .await
        {
            Ok(Ok(counters)) => self.record(source, counters).await.map(|()| counters),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "timed out after {}s",
                self.config.poll_timeout.as_secs()
            )),
        };

        let error = result.as_ref().err().map(String::as_str);
        if let Err(e) = self.store.set_source_error(source.id, error).await {
            tracing::warn!(error = %e, operation = "set_source_error", "failed to store poll status");
        }

        match result {
            Ok(counters) => {
                tracing::debug!(
                    print = counters.print,
                    copy = counters.copy,
                    scan = counters.scan,
                    "counters recorded"
                );
                PollOutcome {
                    source_id: source.id,
                    printer: source.name.clone(),
                    ok: true,
                    counters: Some(counters),
                    error: None,
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "poll failed");
                PollOutcome {
                    source_id: source.id,
                    printer: source.name.clone(),
                    ok: false,
                    counters: None,
                    error: Some(error),
                }
            }
        }
    }

    async fn record(&self, source: &PrinterSource, counters: Counters) -> Result<(), String> {
        let reading = NewReading {
            printer_name: source.name.clone(),
            ip: source.ip.clone(),
            brand: source.brand.clone(),
            model: source.model.clone(),
            counters,
            timestamp: None,
        };
        self.store
            .record_counter(&reading)
            .await
            .map_err(|e| format!("failed to store reading: {e}"))
    }
}

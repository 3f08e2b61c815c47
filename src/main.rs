use anyhow::Result;
use printwatch::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let store = Arc::new(
        store::CounterStore::connect(
            &app_config.database.path,
            app_config.database.max_pool_size,
        )
        .await?,
    );
    store.init().await?;
    for printer in &app_config.printers {
        let id = store.upsert_source(printer).await?;
        tracing::debug!(printer = %printer.name, source_id = id, "printer source registered");
    }

    let fetcher = fetcher::CounterFetcher::new(app_config.polling.retry_policy())?;
    let scheduler = Arc::new(poller::PollScheduler::new(
        store.clone(),
        fetcher,
        poller::PollerConfig::from(&app_config.polling),
    ));
    let poller_handle = if app_config.polling.enabled {
        tracing::info!(
            interval_secs = scheduler.config().interval.as_secs(),
            printers = app_config.printers.len(),
            "Printer polling enabled"
        );
        Some(scheduler.clone().start())
    } else {
        tracing::info!("Printer polling disabled");
        None
    };

    let app = routes::app(store, scheduler);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            if let Some(handle) = poller_handle {
                handle.stop().await;
            }
        }
    }

    Ok(())
}

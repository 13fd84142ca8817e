use std::sync::Arc;

use anyhow::Context;
use pos_printer::NetworkPrinter;
use print_server::{Config, FleetCoordinator, init_logger_with_file};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!("Print server starting...");

    let fleet = FleetCoordinator::new(config.fleet.clone());
    spawn_status_logger(&fleet);

    if let Some(path) = &config.print_on_ready {
        let markup = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path))?;
        spawn_ready_printer(&fleet, markup);
    }

    for endpoint in &config.printers {
        let mut printer = NetworkPrinter::from_addr(&endpoint.addr)
            .with_context(|| format!("printer {}", endpoint.name))?
            .with_name(endpoint.name.clone());
        if let Some(width) = endpoint.width {
            printer = printer.with_width(width);
        }
        fleet.add_printer(Arc::new(printer));
    }

    if config.printers.is_empty() {
        tracing::warn!("No printers configured (set PRINTERS)");
    }

    match config.shutdown_after {
        Some(after) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = tokio::time::sleep(after) => {}
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    tracing::info!("Shutting down");
    if let Err(e) = fleet.close().await {
        tracing::error!("Shutdown error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

/// Log `notOpen`/`offline` of every printer on each status change
fn spawn_status_logger(fleet: &FleetCoordinator) {
    let mut rx = fleet.subscribe_status();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    for (name, status) in snapshot.iter() {
                        tracing::info!(
                            printer = %name,
                            not_open = status.not_open(),
                            offline = status.offline(),
                            "Printer status"
                        );
                    }
                }
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "Status events lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn spawn_ready_printer(fleet: &FleetCoordinator, markup: String) {
    let mut rx = fleet.subscribe_ready();
    let fleet = fleet.clone();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(printer) => {
                    if let Err(e) = fleet.print(printer.name(), &markup).await {
                        tracing::error!(printer = %printer.name(), error = %e, "Print failed");
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}

//! Fleet coordinator
//!
//! Owns the registered printers, runs one [`StatusMachine`] per printer and
//! republishes every status change as an immutable snapshot of the whole
//! fleet.
//!
//! # Events
//!
//! - `subscribe_status()` - full `name -> status` map after every change
//! - `subscribe_ready()` - printer handle on its first successful open

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::join_all;
use parking_lot::Mutex;
use pos_printer::{Printer, PrinterStatus};
use tokio::sync::{Mutex as DeviceLock, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::machine::{Registration, StatusMachine, StatusSink};
use crate::core::{FleetConfig, FleetError, FleetResult};
use crate::markup::{MarkupDocument, compile};

/// Immutable view of every printer's latest status
pub type StatusSnapshot = Arc<BTreeMap<String, PrinterStatus>>;

struct PrinterEntry {
    id: u64,
    printer: Arc<dyn Printer>,
    device: Arc<DeviceLock<()>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct FleetState {
    entries: HashMap<String, PrinterEntry>,
    statuses: BTreeMap<String, PrinterStatus>,
}

struct FleetInner {
    config: FleetConfig,
    next_id: AtomicU64,
    state: Mutex<FleetState>,
    status_tx: broadcast::Sender<StatusSnapshot>,
    ready_tx: broadcast::Sender<Arc<dyn Printer>>,
    /// Parent of every machine's token; cancelled when the fleet is dropped
    shutdown: CancellationToken,
}

impl Drop for FleetInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Machines report through a weak handle so they never keep the fleet alive
struct FleetSink(Weak<FleetInner>);

impl StatusSink for FleetSink {
    fn publish_status(&self, registration: &Registration, status: PrinterStatus) -> bool {
        let Some(inner) = self.0.upgrade() else {
            return false;
        };
        let mut state = inner.state.lock();

        let registered = state
            .entries
            .get(&registration.name)
            .is_some_and(|e| e.id == registration.id);
        if !registered {
            debug!(printer = %registration.name, "Dropping status of removed printer");
            return false;
        }

        state.statuses.insert(registration.name.clone(), status);
        let snapshot: StatusSnapshot = Arc::new(state.statuses.clone());
        // Sent under the lock so subscribers see snapshots in order
        let _ = inner.status_tx.send(snapshot);
        true
    }

    fn publish_ready(&self, registration: &Registration) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        let state = inner.state.lock();
        if let Some(entry) = state
            .entries
            .get(&registration.name)
            .filter(|e| e.id == registration.id)
        {
            let _ = inner.ready_tx.send(Arc::clone(&entry.printer));
        }
    }
}

/// Printer fleet
///
/// Cheap to clone; all clones share the same printers. Must be used from
/// within a tokio runtime.
#[derive(Clone)]
pub struct FleetCoordinator {
    inner: Arc<FleetInner>,
}

impl FleetCoordinator {
    pub fn new(config: FleetConfig) -> Self {
        let capacity = config.event_capacity.max(1);
        let (status_tx, _) = broadcast::channel(capacity);
        let (ready_tx, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(FleetInner {
                config,
                next_id: AtomicU64::new(1),
                state: Mutex::new(FleetState::default()),
                status_tx,
                ready_tx,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.inner.config
    }

    /// Register a printer and start polling it right away
    ///
    /// A name that is already registered is ignored.
    #[instrument(skip(self, printer), fields(printer = %printer.name()))]
    pub fn add_printer(&self, printer: Arc<dyn Printer>) -> &Self {
        let name = printer.name().to_string();
        let mut state = self.inner.state.lock();

        if state.entries.contains_key(&name) {
            warn!("Printer already registered, ignoring");
            return self;
        }

        let registration = Registration {
            name: name.clone(),
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
        };
        let device = Arc::new(DeviceLock::new(()));
        let cancel = self.inner.shutdown.child_token();
        let sink = Arc::new(FleetSink(Arc::downgrade(&self.inner)));

        let machine = StatusMachine::new(
            Arc::clone(&printer),
            registration.clone(),
            sink,
            Arc::clone(&device),
            cancel.clone(),
            self.inner.config.error_threshold,
        );
        let task = tokio::spawn(machine.run(self.inner.config.poll_interval));

        state.entries.insert(
            name,
            PrinterEntry {
                id: registration.id,
                printer,
                device,
                cancel,
                task,
            },
        );
        info!("Printer added");
        self
    }

    /// Stop polling a printer and release its device
    ///
    /// Polling stops and the printer's state is discarded before the device is
    /// closed; a close failure is returned but the printer stays removed.
    #[instrument(skip(self))]
    pub async fn remove_printer(&self, name: &str) -> FleetResult<()> {
        let entry = {
            let mut state = self.inner.state.lock();
            let entry = state
                .entries
                .remove(name)
                .ok_or_else(|| FleetError::UnknownPrinter(name.to_string()))?;
            state.statuses.remove(name);
            entry
        };
        entry.cancel.cancel();

        // Waits for an in-flight fetch; its result is already discarded
        let result = {
            let _guard = entry.device.lock().await;
            entry.printer.close().await
        };

        if let Err(e) = entry.task.await {
            warn!(error = %e, "Status machine task failed");
        }

        match result {
            Ok(()) => {
                info!("Printer removed");
                Ok(())
            }
            Err(source) => {
                warn!(error = %source, "Unable to close removed printer");
                Err(FleetError::Device {
                    printer: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Remove every printer, continuing past individual failures
    pub async fn close(&self) -> FleetResult<()> {
        let names = self.printers();
        info!(count = names.len(), "Closing printer fleet");

        let results = join_all(names.iter().map(|name| self.remove_printer(name))).await;
        let errors: Vec<FleetError> = results.into_iter().filter_map(Result::err).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FleetError::Teardown(errors))
        }
    }

    /// Compile XML markup and execute it on a registered printer
    pub async fn print(&self, name: &str, markup: &str) -> FleetResult<()> {
        let document = MarkupDocument::parse(markup)?;
        self.print_document(name, &document).await
    }

    /// Compile a parsed document and execute it on a registered printer
    #[instrument(skip(self, document))]
    pub async fn print_document(&self, name: &str, document: &MarkupDocument) -> FleetResult<()> {
        let (printer, device) = {
            let state = self.inner.state.lock();
            let entry = state
                .entries
                .get(name)
                .ok_or_else(|| FleetError::UnknownPrinter(name.to_string()))?;
            (Arc::clone(&entry.printer), Arc::clone(&entry.device))
        };

        let printing = compile(document, printer.create_printing())?;

        let _guard = device.lock().await;
        printer
            .execute(printing)
            .await
            .map_err(|source| FleetError::Device {
                printer: name.to_string(),
                source,
            })?;

        debug!("Print job executed");
        Ok(())
    }

    /// Latest status of every printer that reported one
    pub fn status(&self) -> StatusSnapshot {
        Arc::new(self.inner.state.lock().statuses.clone())
    }

    /// Registered printer names, sorted
    pub fn printers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.state.lock().entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.inner.status_tx.subscribe()
    }

    pub fn subscribe_ready(&self) -> broadcast::Receiver<Arc<dyn Printer>> {
        self.inner.ready_tx.subscribe()
    }
}

impl Default for FleetCoordinator {
    fn default() -> Self {
        Self::new(FleetConfig::default())
    }
}

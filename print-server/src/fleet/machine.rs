//! Per-printer status polling
//!
//! ```text
//! Closed ──open ok──▶ Polling ──fetch ok──▶ Polling
//!   ▲  │                 │
//!   │  └─open err──▶ Closed (synthesized notOpen status)
//!   │                    │
//!   └──── N consecutive fetch errors (forced close)
//! ```
//!
//! The loop reschedules itself only after a tick has finished, so two fetches
//! for the same printer never overlap.

use std::sync::Arc;
use std::time::Duration;

use pos_printer::{NOT_OPEN, Printer, PrinterStatus};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Identifies one registration of a printer
///
/// A printer removed and added again gets a new `id`, so results from the old
/// machine cannot leak into the new registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub id: u64,
}

/// Receives transitions reported by a machine
pub trait StatusSink: Send + Sync {
    /// Publish a changed status; `false` when the registration is gone
    fn publish_status(&self, registration: &Registration, status: PrinterStatus) -> bool;

    /// First successful open of this registration
    fn publish_ready(&self, registration: &Registration);
}

/// Device lifecycle as seen by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Closed,
    Opening,
    Polling,
}

/// Mutable polling bookkeeping, private to one machine
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub consecutive_errors: u32,
    pub ready_pending: bool,
    pub last_status: Option<PrinterStatus>,
}

impl Default for PollState {
    fn default() -> Self {
        Self {
            consecutive_errors: 0,
            ready_pending: true,
            last_status: None,
        }
    }
}

/// Status machine of one registered printer
pub struct StatusMachine {
    printer: Arc<dyn Printer>,
    registration: Registration,
    sink: Arc<dyn StatusSink>,
    /// Shared with `print` and removal so device operations never interleave
    device: Arc<Mutex<()>>,
    cancel: CancellationToken,
    error_threshold: u32,
    poll: PollState,
    state: MachineState,
}

impl StatusMachine {
    pub fn new(
        printer: Arc<dyn Printer>,
        registration: Registration,
        sink: Arc<dyn StatusSink>,
        device: Arc<Mutex<()>>,
        cancel: CancellationToken,
        error_threshold: u32,
    ) -> Self {
        Self {
            printer,
            registration,
            sink,
            device,
            cancel,
            error_threshold: error_threshold.max(1),
            poll: PollState::default(),
            state: MachineState::Closed,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn poll_state(&self) -> &PollState {
        &self.poll
    }

    /// Tick immediately, then every `interval` until cancelled
    pub async fn run(mut self, interval: Duration) {
        debug!(printer = %self.registration.name, "Status machine started");
        loop {
            self.tick().await;
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        debug!(printer = %self.registration.name, "Status machine stopped");
    }

    /// One poll: open if needed, then fetch the status
    #[instrument(skip(self), fields(printer = %self.registration.name))]
    pub async fn tick(&mut self) {
        let device = Arc::clone(&self.device);
        let _guard = device.lock().await;

        // Removal may have won the device lock
        if self.cancel.is_cancelled() {
            return;
        }

        if !self.printer.is_open() {
            self.state = MachineState::Opening;
            if let Err(e) = self.printer.open().await {
                warn!(error = %e, "Unable to open printer");
                self.state = MachineState::Closed;
                self.emit_not_open();
                return;
            }

            self.state = MachineState::Polling;
            if self.poll.ready_pending {
                self.poll.ready_pending = false;
                info!("Printer ready");
                self.sink.publish_ready(&self.registration);
            }
        }
        self.state = MachineState::Polling;

        match self.printer.status().await {
            Ok(mut status) => {
                status.set_flag(NOT_OPEN, false);
                self.poll.consecutive_errors = 0;
                self.emit(status);
            }
            Err(e) => {
                self.poll.consecutive_errors += 1;
                warn!(
                    error = %e,
                    consecutive_errors = self.poll.consecutive_errors,
                    "Error fetching printer status"
                );

                if self.poll.consecutive_errors >= self.error_threshold {
                    info!("Closing printer after too many errors");
                    self.poll.consecutive_errors = 0;
                    self.emit_not_open();

                    if let Err(e) = self.printer.close().await {
                        warn!(error = %e, "Unable to close printer");
                    }
                    self.state = MachineState::Closed;
                }
            }
        }
    }

    fn emit_not_open(&mut self) {
        let status = self.printer.driver().unreachable_status();
        self.emit(status);
    }

    fn emit(&mut self, status: PrinterStatus) {
        if !status.differs_from(self.poll.last_status.as_ref()) {
            return;
        }
        if self.sink.publish_status(&self.registration, status.clone()) {
            self.poll.last_status = Some(status);
        }
    }
}

//! Real-time status decoding
//!
//! Epson-compatible printers answer `DLE EOT n` with one status byte per
//! request. A [`StatusDriver`] turns those bytes into named status fields.

use crate::status::{NOT_OPEN, OFFLINE, PrinterStatus};

/// `DLE EOT n` transmit real-time status
pub const DLE_EOT: [u8; 2] = [0x10, 0x04];

/// Status request selector for `DLE EOT n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusRequest {
    Printer = 1,
    Offline = 2,
    Error = 3,
    PaperRoll = 4,
}

impl StatusRequest {
    pub const ALL: [StatusRequest; 4] = [
        StatusRequest::Printer,
        StatusRequest::Offline,
        StatusRequest::Error,
        StatusRequest::PaperRoll,
    ];

    /// Command bytes for this request
    pub fn command(self) -> [u8; 3] {
        [DLE_EOT[0], DLE_EOT[1], self as u8]
    }
}

/// Decodes raw status bytes into partial statuses
pub trait StatusDriver: Send + Sync {
    fn printer_status(&self, bytes: &[u8]) -> PrinterStatus;

    fn offline_status(&self, bytes: &[u8]) -> PrinterStatus;

    fn error_status(&self, bytes: &[u8]) -> PrinterStatus;

    fn paper_roll_status(&self, bytes: &[u8]) -> PrinterStatus;

    /// Decode the answer to a given request
    fn decode(&self, request: StatusRequest, bytes: &[u8]) -> PrinterStatus {
        match request {
            StatusRequest::Printer => self.printer_status(bytes),
            StatusRequest::Offline => self.offline_status(bytes),
            StatusRequest::Error => self.error_status(bytes),
            StatusRequest::PaperRoll => self.paper_roll_status(bytes),
        }
    }

    /// Status reported while the device cannot be reached
    ///
    /// `notOpen=true` plus every field decoded from an empty answer.
    fn unreachable_status(&self) -> PrinterStatus {
        let mut status = PrinterStatus::new();
        status.set_flag(NOT_OPEN, true);
        for request in StatusRequest::ALL {
            status.merge(self.decode(request, &[]));
        }
        status
    }
}

/// Epson TM series status decoding
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsonDriver;

fn bit(bytes: &[u8], n: u8) -> bool {
    bytes.first().is_some_and(|b| b & (1 << n) != 0)
}

impl StatusDriver for EpsonDriver {
    fn printer_status(&self, bytes: &[u8]) -> PrinterStatus {
        PrinterStatus::new()
            .with("drawerOpen", bit(bytes, 2))
            .with(OFFLINE, bit(bytes, 3))
            .with("waitingOnlineRecovery", bit(bytes, 5))
            .with("feedButtonPressed", bit(bytes, 6))
    }

    fn offline_status(&self, bytes: &[u8]) -> PrinterStatus {
        PrinterStatus::new()
            .with("coverOpen", bit(bytes, 2))
            .with("paperFeeding", bit(bytes, 3))
            .with("paperEndStop", bit(bytes, 5))
            .with("errorOccurred", bit(bytes, 6))
    }

    fn error_status(&self, bytes: &[u8]) -> PrinterStatus {
        PrinterStatus::new()
            .with("recoverableError", bit(bytes, 2))
            .with("autocutterError", bit(bytes, 3))
            .with("unrecoverableError", bit(bytes, 5))
            .with("autoRecoverableError", bit(bytes, 6))
    }

    fn paper_roll_status(&self, bytes: &[u8]) -> PrinterStatus {
        // Bits 2/3 and 5/6 are set together
        PrinterStatus::new()
            .with("paperNearEnd", bit(bytes, 2) || bit(bytes, 3))
            .with("paperEnd", bit(bytes, 5) || bit(bytes, 6))
    }
}

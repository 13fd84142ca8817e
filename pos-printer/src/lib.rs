//! # pos-printer
//!
//! Receipt printer device layer - everything below the markup compiler.
//!
//! ## Scope
//!
//! This crate handles HOW a job reaches a device:
//! - Printer-agnostic instruction streams
//! - ESC/POS encoding with GBK text conversion
//! - Real-time status decoding (`DLE EOT n`)
//! - The async [`Printer`] capability trait
//! - Network printing (TCP port 9100)
//!
//! WHAT to print (markup compilation, table layout) and fleet status polling
//! live in `print-server`.
//!
//! ## Example
//!
//! ```ignore
//! use pos_printer::{Align, NetworkPrinter, Printer};
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?.with_width(48);
//! printer.open().await?;
//!
//! let mut job = printer.create_printing();
//! job.align(Align::Center).bold(true).line("Receipt").bold(false).cut();
//! printer.execute(job).await?;
//! ```

mod driver;
mod encoding;
mod error;
mod escpos;
mod instruction;
mod printer;
mod status;

// Re-exports
pub use driver::{EpsonDriver, StatusDriver, StatusRequest};
pub use encoding::{convert_to_gbk, gbk_width};
pub use error::{PrintError, PrintResult};
pub use escpos::{to_escpos, to_escpos_raw};
pub use instruction::{Align, FontFamily, Instruction, InstructionStream, ParseModeError, SizeMode};
pub use printer::{NetworkPrinter, Printer};
pub use status::{NOT_OPEN, OFFLINE, PrinterStatus, StatusValue};

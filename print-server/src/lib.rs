//! Print Server - receipt printer fleet with markup printing
//!
//! # Overview
//!
//! - **Markup** (`markup`): XML print documents compiled to instruction
//!   streams, including monospace table layout
//! - **Fleet** (`fleet`): per-printer status polling and the coordinator that
//!   owns registration, printing and status events
//! - **Core** (`core`): configuration and errors
//!
//! # Module layout
//!
//! ```text
//! print-server/src/
//! ├── core/          # Config, FleetError
//! ├── markup/        # node tree, table layout, compiler
//! ├── fleet/         # status machine, coordinator
//! └── utils/         # logger
//! ```
//!
//! # Example
//!
//! ```ignore
//! let fleet = FleetCoordinator::default();
//! fleet.add_printer(Arc::new(NetworkPrinter::new("192.168.1.214", 9100)?));
//!
//! let mut ready = fleet.subscribe_ready();
//! let printer = ready.recv().await?;
//! fleet.print(printer.name(), "<printing><p>Hello</p><cut/></printing>").await?;
//! fleet.close().await?;
//! ```

pub mod core;
pub mod fleet;
pub mod markup;
pub mod utils;

pub use core::{Config, FleetConfig, FleetError, FleetResult};
pub use fleet::{FleetCoordinator, StatusSnapshot};
pub use markup::{MarkupDocument, MarkupError, compile, compile_str};

pub use utils::logger::{init_logger, init_logger_with_file};

//! Printer fleet
//!
//! - [`machine`] - per-printer status polling with failure-threshold recovery
//! - [`coordinator`] - registration, printing and status republishing

pub mod coordinator;
pub mod machine;

pub use coordinator::{FleetCoordinator, StatusSnapshot};
pub use machine::{MachineState, PollState, Registration, StatusMachine, StatusSink};

//! Core module - configuration and error definitions
//!
//! - [`Config`] - process configuration (environment)
//! - [`FleetConfig`] - polling parameters of the fleet
//! - [`FleetError`] - coordinator errors

pub mod config;
pub mod error;

pub use config::{Config, FleetConfig, PrinterEndpoint};
pub use error::{FleetError, FleetResult};

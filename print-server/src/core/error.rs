use pos_printer::PrintError;
use thiserror::Error;

use crate::markup::MarkupError;

#[derive(Error, Debug)]
pub enum FleetError {
    /// The document could not be compiled; nothing was sent
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// A device operation (execute, close) failed
    #[error("Printer {printer}: {source}")]
    Device {
        printer: String,
        #[source]
        source: PrintError,
    },

    #[error("Unknown printer: {0}")]
    UnknownPrinter(String),

    /// Every failure collected while tearing down the fleet
    #[error("{} printer(s) failed to shut down", .0.len())]
    Teardown(Vec<FleetError>),
}

pub type FleetResult<T> = std::result::Result<T, FleetError>;

//! Markup compilation
//!
//! - [`node`] - parsed document tree
//! - [`table`] - monospace table layout
//! - [`compiler`] - document to [`pos_printer::InstructionStream`]

pub mod compiler;
pub mod node;
pub mod table;

use thiserror::Error;

pub use compiler::{FormattingState, MarkupCompiler, ROOT_TAG, Tag, compile, compile_str};
pub use node::{MarkupDocument, MarkupElement, MarkupNode};
pub use table::{ColumnDef, TableModel, compute_layout};

/// Document cannot be compiled; never retried
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("Malformed markup: {0}")]
    Malformed(String),

    #[error("Markup document is empty")]
    Empty,

    #[error("Root element must be <printing>, found <{0}>")]
    NotPrinting(String),
}

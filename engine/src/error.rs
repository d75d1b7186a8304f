//! FILENAME: engine/src/error.rs
//! PURPOSE: Structural errors raised by sheet operations.
//! CONTEXT: These are recoverable caller errors, distinct from the
//! evaluation errors (`FormulaError`) that live inside cell values. When
//! any of these is returned, the sheet is exactly as it was before the
//! failing call.

use parser::{ParseError, Position};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpreadsheetError {
    #[error("Invalid position {0:?}")]
    InvalidPosition(Position),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Circular dependency introduced at {0}")]
    CircularDependency(Position),
}

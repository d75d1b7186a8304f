//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports public types and modules for use by embedding hosts.
//!
//! The engine is a sparse two-dimensional table of cells holding text or
//! arithmetic formulas. Formulas are parsed by the `parser` crate, evaluated
//! on demand against the sheet, and memoized; the dependency graph rejects
//! edits that would close a reference cycle and tells the sheet which
//! memoized values an edit makes stale.

pub mod cell;
pub mod dependency_graph;
pub mod error;
pub mod evaluator;
pub mod sheet;

// Re-export commonly used types at the crate root
pub use cell::{Cell, CellValue, FormulaError};
pub use dependency_graph::{CycleError, DependencyGraph};
pub use error::SpreadsheetError;
pub use evaluator::Evaluator;
pub use sheet::{Sheet, Size};

// The coordinate and formula types come from the parser crate; embedders
// usually want them alongside the sheet.
pub use parser::{parse_formula, Expression, FormulaAst, ParseError, Position};

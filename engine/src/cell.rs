//! FILENAME: engine/src/cell.rs
//! PURPOSE: Defines the fundamental data structures for a single spreadsheet cell.
//! CONTEXT: This file contains the `Cell` struct and the `CellValue` and
//! `FormulaError` enums. A cell is empty, plain text, or a formula; a formula
//! cell memoizes its last evaluated value until the dependency graph tells it
//! an upstream input changed.

use crate::evaluator::Evaluator;
use crate::sheet::Sheet;
use parser::{parse_formula, FormulaAst, ParseError, Position};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Marks the start of a formula cell. A lone "=" is still plain text.
const FORMULA_SIGN: char = '=';

/// Escapes text that would otherwise be taken for a formula: the apostrophe
/// is kept in the raw text but stripped from the value.
const ESCAPE_SIGN: char = '\'';

/// Represents the evaluation errors a cell can hold (e.g. #DIV/0!).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaError {
    /// A reference to a position outside the sheet bounds.
    Ref,
    /// Non-numeric text used where a number was needed.
    Value,
    /// Division by zero, or any non-finite arithmetic result.
    Div0,
}

impl FormulaError {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Div0 => "#DIV/0!",
        }
    }
}

impl std::fmt::Display for FormulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for FormulaError {}

/// The visible value of a cell. Numbers are always finite; arithmetic that
/// leaves the finite range surfaces as `Error(Div0)` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(FormulaError),
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// The atomic unit of the spreadsheet.
#[derive(Debug)]
pub struct Cell {
    kind: CellKind,
}

#[derive(Debug)]
enum CellKind {
    Empty,
    Text(String),
    Formula {
        ast: FormulaAst,
        /// Memoized evaluation result. Populated on first read through a
        /// shared reference, cleared by graph-driven invalidation.
        cached_value: RefCell<Option<CellValue>>,
    },
}

impl Cell {
    /// An empty cell: empty value, empty text, no references.
    pub(crate) fn empty() -> Self {
        Cell {
            kind: CellKind::Empty,
        }
    }

    /// Classifies raw input into a cell body.
    ///
    /// Empty input makes an empty cell; input that does not start with '='
    /// (or is just "=") makes a text cell; everything else is parsed as a
    /// formula. A parse failure leaves no cell behind, so the caller's
    /// table stays untouched.
    pub(crate) fn from_input(text: &str) -> Result<Self, ParseError> {
        let kind = if text.is_empty() {
            CellKind::Empty
        } else if !text.starts_with(FORMULA_SIGN) || text.len() == 1 {
            CellKind::Text(text.to_string())
        } else {
            CellKind::Formula {
                ast: parse_formula(&text[1..])?,
                cached_value: RefCell::new(None),
            }
        };
        Ok(Cell { kind })
    }

    /// The visible value. Formula cells evaluate against `sheet` on first
    /// read and memoize the result, including error results.
    pub fn get_value(&self, sheet: &Sheet) -> CellValue {
        match &self.kind {
            CellKind::Empty => CellValue::Text(String::new()),
            CellKind::Text(text) => {
                let value = text.strip_prefix(ESCAPE_SIGN).unwrap_or(text);
                CellValue::Text(value.to_string())
            }
            CellKind::Formula { ast, cached_value } => {
                if let Some(value) = cached_value.borrow().as_ref() {
                    return value.clone();
                }
                let value = match Evaluator::new(sheet).evaluate(ast.root()) {
                    Ok(number) => CellValue::Number(number),
                    Err(error) => CellValue::Error(error),
                };
                *cached_value.borrow_mut() = Some(value.clone());
                value
            }
        }
    }

    /// The raw text: what the user typed, with formulas re-serialized in
    /// canonical minimal-parenthesis form behind their '='.
    pub fn get_text(&self) -> String {
        match &self.kind {
            CellKind::Empty => String::new(),
            CellKind::Text(text) => text.clone(),
            CellKind::Formula { ast, .. } => format!("={}", ast.to_formula_string()),
        }
    }

    /// The in-bounds positions this cell's formula reads. Empty for
    /// non-formula cells.
    pub fn get_referenced_cells(&self) -> &[Position] {
        match &self.kind {
            CellKind::Formula { ast, .. } => ast.referenced_cells(),
            _ => &[],
        }
    }

    /// True when the next `get_value` will not evaluate anything.
    /// Non-formula cells are trivially cached.
    pub fn is_cached(&self) -> bool {
        match &self.kind {
            CellKind::Formula { cached_value, .. } => cached_value.borrow().is_some(),
            _ => true,
        }
    }

    /// Invalidation hook called when an upstream cell changes.
    /// A no-op for non-formula cells.
    pub(crate) fn reset_cached_value(&self) {
        if let CellKind::Formula { cached_value, .. } = &self.kind {
            *cached_value.borrow_mut() = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell() {
        let cell = Cell::empty();
        assert_eq!(cell.get_text(), "");
        assert!(cell.get_referenced_cells().is_empty());
        assert!(cell.is_cached());
    }

    #[test]
    fn test_text_cell_keeps_raw_text() {
        let sheet = Sheet::new();
        let cell = Cell::from_input("hello").unwrap();
        assert_eq!(cell.get_text(), "hello");
        assert_eq!(cell.get_value(&sheet), CellValue::Text("hello".to_string()));
    }

    #[test]
    fn test_text_cell_strips_one_escape_apostrophe() {
        let sheet = Sheet::new();
        let cell = Cell::from_input("'=1+2").unwrap();
        assert_eq!(cell.get_text(), "'=1+2");
        assert_eq!(cell.get_value(&sheet), CellValue::Text("=1+2".to_string()));

        let cell = Cell::from_input("''quoted").unwrap();
        assert_eq!(
            cell.get_value(&sheet),
            CellValue::Text("'quoted".to_string())
        );
    }

    #[test]
    fn test_lone_equals_is_text() {
        let sheet = Sheet::new();
        let cell = Cell::from_input("=").unwrap();
        assert_eq!(cell.get_text(), "=");
        assert_eq!(cell.get_value(&sheet), CellValue::Text("=".to_string()));
        assert!(cell.get_referenced_cells().is_empty());
    }

    #[test]
    fn test_formula_cell_canonicalizes_text() {
        let cell = Cell::from_input("= 1 + (2 + 3)").unwrap();
        assert_eq!(cell.get_text(), "=1+2+3");
    }

    #[test]
    fn test_formula_cell_reports_references() {
        let cell = Cell::from_input("=B1+A2*B1").unwrap();
        assert_eq!(
            cell.get_referenced_cells(),
            &[Position::from_a1("B1"), Position::from_a1("A2")]
        );
    }

    #[test]
    fn test_formula_parse_failure() {
        assert!(Cell::from_input("=1+").is_err());
        assert!(Cell::from_input("=foo").is_err());
    }

    #[test]
    fn test_formula_cache_lifecycle() {
        let sheet = Sheet::new();
        let cell = Cell::from_input("=2*3").unwrap();
        assert!(!cell.is_cached());

        assert_eq!(cell.get_value(&sheet), CellValue::Number(6.0));
        assert!(cell.is_cached());

        cell.reset_cached_value();
        assert!(!cell.is_cached());
        assert_eq!(cell.get_value(&sheet), CellValue::Number(6.0));
    }

    #[test]
    fn test_error_rendering() {
        assert_eq!(FormulaError::Ref.to_string(), "#REF!");
        assert_eq!(FormulaError::Value.to_string(), "#VALUE!");
        assert_eq!(FormulaError::Div0.to_string(), "#DIV/0!");
        assert_eq!(
            CellValue::Error(FormulaError::Div0).to_string(),
            "#DIV/0!"
        );
    }
}

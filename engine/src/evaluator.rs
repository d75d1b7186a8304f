//! FILENAME: engine/src/evaluator.rs
//! PURPOSE: Evaluates AST expressions to compute cell values.
//! CONTEXT: After a formula is parsed into an AST, this module traverses the
//! tree and computes the final result as a finite number or a formula error.
//! Cell references are resolved through the sheet, which hands back the
//! referent's (memoized) value; the walk is recursive and terminates because
//! the dependency graph keeps the reference relation acyclic.
//!
//! COERCION RULES at a reference:
//! - missing cell -> 0.0
//! - empty text   -> 0.0
//! - other text   -> full-string numeric parse, else #VALUE!
//! - number       -> itself
//! - error        -> propagated unchanged
//!
//! Any binary operation whose result is not finite yields #DIV/0!.

use crate::cell::{CellValue, FormulaError};
use crate::sheet::Sheet;
use parser::{BinaryOperator, Expression, Position, UnaryOperator};

/// The formula evaluator. Holds a reference to the sheet for cell lookups.
pub struct Evaluator<'a> {
    sheet: &'a Sheet,
}

impl<'a> Evaluator<'a> {
    /// Creates a new Evaluator with a reference to the sheet.
    pub fn new(sheet: &'a Sheet) -> Self {
        Evaluator { sheet }
    }

    /// Evaluates an expression tree. Children are evaluated left to right,
    /// so the first failing subexpression determines the error.
    pub fn evaluate(&self, expr: &Expression) -> Result<f64, FormulaError> {
        match expr {
            Expression::Number(value) => Ok(*value),

            Expression::CellRef(pos) => self.evaluate_reference(*pos),

            Expression::UnaryOp { op, operand } => {
                let value = self.evaluate(operand)?;
                Ok(match op {
                    UnaryOperator::Plus => value,
                    UnaryOperator::Negate => -value,
                })
            }

            Expression::BinaryOp { left, op, right } => {
                let lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;
                let result = match op {
                    BinaryOperator::Add => lhs + rhs,
                    BinaryOperator::Subtract => lhs - rhs,
                    BinaryOperator::Multiply => lhs * rhs,
                    BinaryOperator::Divide => lhs / rhs,
                };
                if result.is_finite() {
                    Ok(result)
                } else {
                    Err(FormulaError::Div0)
                }
            }
        }
    }

    /// Resolves one cell reference to a number.
    fn evaluate_reference(&self, pos: Position) -> Result<f64, FormulaError> {
        if !pos.is_valid() {
            return Err(FormulaError::Ref);
        }
        let Some(cell) = self.sheet.get_cell(pos) else {
            return Ok(0.0);
        };

        match cell.get_value(self.sheet) {
            CellValue::Number(value) => Ok(value),
            CellValue::Text(text) => {
                if text.is_empty() {
                    return Ok(0.0);
                }
                match text.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    _ => Err(FormulaError::Value),
                }
            }
            CellValue::Error(error) => Err(error),
        }
    }
}

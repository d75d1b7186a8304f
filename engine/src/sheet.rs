//! FILENAME: engine/src/sheet.rs
//! PURPOSE: Manages the collection of cells (the spreadsheet itself).
//! CONTEXT: This file defines the `Sheet` struct which binds positions to
//! cells, owns the dependency graph, and enforces the edit protocol: parse,
//! cycle check, cache invalidation, install. It uses a sparse storage
//! strategy (HashMap) so mostly-empty sheets cost nothing.
//!
//! EDIT PROTOCOL on set_cell:
//! 1. Reject invalid positions.
//! 2. If the stored text already equals the input, do nothing.
//! 3. Build the new cell body (parsing formulas; a parse error changes nothing).
//! 4. Offer the new reference set to the graph; a cycle rejection changes nothing.
//! 5. Clear the memoized values the graph reports stale.
//! 6. Install the body and materialize empty cells behind new references.

use crate::cell::{Cell, CellValue};
use crate::dependency_graph::DependencyGraph;
use crate::error::SpreadsheetError;
use log::{debug, trace};
use parser::Position;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};

/// The printable extent of a sheet: the tight bounding rectangle over cells
/// with non-empty text, as (rows, cols). Zero when no such cell exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

/// The Sheet holds the state of the spreadsheet data.
/// It uses a sparse representation (HashMap) mapping positions to Cells.
#[derive(Debug, Default)]
pub struct Sheet {
    /// Sparse storage: only cells that were set or referenced exist here.
    table: HashMap<Position, Cell>,

    /// Reference edges between cells, kept acyclic.
    graph: DependencyGraph,

    /// Cached printable extent; dropped on every successful edit and
    /// recomputed on demand.
    printable_size: std::cell::Cell<Option<Size>>,
}

impl Sheet {
    /// Creates a new, empty Sheet.
    pub fn new() -> Self {
        Sheet::default()
    }

    /// Sets the cell at `pos` from raw input text.
    ///
    /// Empty input empties the cell, input without a leading '=' becomes
    /// text, anything else is parsed as a formula. On any error the sheet,
    /// the graph, and the cell are exactly as they were before the call.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SpreadsheetError> {
        if !pos.is_valid() {
            return Err(SpreadsheetError::InvalidPosition(pos));
        }
        if let Some(existing) = self.table.get(&pos) {
            if existing.get_text() == text {
                return Ok(());
            }
        }

        let cell = Cell::from_input(text)?;
        let referenced = cell.get_referenced_cells().to_vec();

        let stale = self.graph.try_change(pos, &referenced).map_err(|error| {
            debug!("rejected edit at {}: {}", pos, error);
            SpreadsheetError::CircularDependency(pos)
        })?;

        trace!("edit at {} invalidates {} dependent cells", pos, stale.len());
        for dependent in stale {
            if let Some(dependent_cell) = self.table.get(&dependent) {
                dependent_cell.reset_cached_value();
            }
        }

        self.table.insert(pos, cell);

        // Cells named by a formula exist from then on, even if the formula
        // is later cleared. They are empty until set and never printable.
        for referenced_pos in referenced {
            self.table.entry(referenced_pos).or_insert_with(Cell::empty);
        }

        self.printable_size.set(None);
        Ok(())
    }

    /// Returns the cell at `pos`, or None when the position is invalid or
    /// nothing exists there. Never materializes a cell.
    pub fn get_cell(&self, pos: Position) -> Option<&Cell> {
        if !pos.is_valid() {
            return None;
        }
        self.table.get(&pos)
    }

    /// The visible value at `pos`, if a cell exists there.
    pub fn get_value(&self, pos: Position) -> Option<CellValue> {
        self.get_cell(pos).map(|cell| cell.get_value(self))
    }

    /// Removes the cell at `pos`. Dependents keep their reverse edges and
    /// will read the missing cell as zero; their memoized values are
    /// cleared here.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SpreadsheetError> {
        if !pos.is_valid() {
            return Err(SpreadsheetError::InvalidPosition(pos));
        }
        if !self.table.contains_key(&pos) {
            return Ok(());
        }

        let stale = self
            .graph
            .try_change(pos, &[])
            .expect("an empty reference set cannot form a cycle");
        for dependent in stale {
            if let Some(dependent_cell) = self.table.get(&dependent) {
                dependent_cell.reset_cached_value();
            }
        }

        self.table.remove(&pos);
        self.printable_size.set(None);
        Ok(())
    }

    /// Read access to the dependency graph for introspection.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The tight bounding rectangle over cells with non-empty text.
    /// Cells that exist only to back references do not count.
    pub fn get_printable_size(&self) -> Size {
        if let Some(size) = self.printable_size.get() {
            return size;
        }
        let size = self.compute_printable_size();
        self.printable_size.set(Some(size));
        size
    }

    /// Writes the printable rectangle of values, row by row: columns
    /// separated by tabs, rows terminated by newlines, absent cells blank.
    pub fn print_values(&self, output: &mut impl Write) -> io::Result<()> {
        self.print_region(output, |cell| cell.get_value(self).to_string())
    }

    /// Writes the printable rectangle of raw texts in the same layout.
    pub fn print_texts(&self, output: &mut impl Write) -> io::Result<()> {
        self.print_region(output, |cell| cell.get_text())
    }

    fn print_region(
        &self,
        output: &mut impl Write,
        render: impl Fn(&Cell) -> String,
    ) -> io::Result<()> {
        let size = self.get_printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    output.write_all(b"\t")?;
                }
                if let Some(cell) = self.table.get(&Position::new(row, col)) {
                    output.write_all(render(cell).as_bytes())?;
                }
            }
            output.write_all(b"\n")?;
        }
        Ok(())
    }

    fn compute_printable_size(&self) -> Size {
        let mut max_row = -1;
        let mut max_col = -1;
        for (pos, cell) in &self.table {
            if cell.get_text().is_empty() {
                continue;
            }
            max_row = max_row.max(pos.row);
            max_col = max_col.max(pos.col);
        }
        if max_row < 0 {
            Size::default()
        } else {
            Size {
                rows: max_row + 1,
                cols: max_col + 1,
            }
        }
    }
}

//! FILENAME: engine/src/dependency_graph.rs
//! PURPOSE: Implements the Directed Acyclic Graph (DAG) for tracking cell dependencies.
//! CONTEXT: This module is the heart of the spreadsheet's recalculation
//! machinery. It tracks which cells a formula references (forward edges) and
//! which formulas reference a given cell (reverse edges), rejects edits that
//! would close a reference cycle, and reports which memoized values an edit
//! makes stale.
//!
//! TERMINOLOGY:
//! - References of P: the cells P's formula reads. If A3 = A1 + A2, then
//!   references[A3] = {A1, A2}.
//! - Dependents of P: the cells whose formulas read P (reverse lookup).
//!   If A3 = A1 + A2, then A3 is a dependent of A1 and of A2.
//!
//! The graph stores only positions, never cell objects, so it has no
//! lifetime entanglement with the table that owns the cells. The owner
//! applies the invalidation list that `try_change` returns.

use parser::Position;
use std::collections::{HashMap, HashSet};

/// Error type for rejected edits that would close a reference cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleError {
    /// The cells involved in the cycle, in walk order, first == last.
    pub cycle_path: Vec<Position>,
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Circular reference detected: ")?;
        for (i, pos) in self.cycle_path.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", pos)?;
        }
        Ok(())
    }
}

impl std::error::Error for CycleError {}

/// DFS colors for cycle detection. Unvisited positions are absent from the
/// color map; a gray target means the walk has come back around.
#[derive(Clone, Copy, PartialEq)]
enum Color {
    Gray,
    Black,
}

/// The dependency graph maintains both forward (references) and reverse
/// (dependents) mappings for efficient lookups in either direction.
///
/// Invariants at every observable state:
/// - `q ∈ references[p]` iff `p ∈ dependents[q]`
/// - the forward graph is acyclic
/// - a position absent from `references` has no outgoing edges
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// For each formula cell, the set of cells it directly references.
    references: HashMap<Position, HashSet<Position>>,

    /// For each cell, the set of cells that directly reference it.
    dependents: HashMap<Position, HashSet<Position>>,
}

impl DependencyGraph {
    /// Creates a new, empty dependency graph.
    pub fn new() -> Self {
        DependencyGraph {
            references: HashMap::new(),
            dependents: HashMap::new(),
        }
    }

    /// Atomically replaces the outgoing edges of `pos` with `new_refs`.
    ///
    /// The new edge set is written tentatively, checked for cycles, and
    /// rolled back untouched if one is found. On success the reverse map is
    /// updated by symmetric difference and the transitive dependents of
    /// `pos` (excluding `pos` itself) are returned so the owner can clear
    /// their memoized values.
    pub fn try_change(
        &mut self,
        pos: Position,
        new_refs: &[Position],
    ) -> Result<Vec<Position>, CycleError> {
        let old_refs = self.references.get(&pos).cloned().unwrap_or_default();
        let new_refs: HashSet<Position> = new_refs.iter().copied().collect();

        // Tentative write; the cycle check must see the proposed state.
        if new_refs.is_empty() {
            self.references.remove(&pos);
        } else {
            self.references.insert(pos, new_refs.clone());
        }

        if let Some(cycle_path) = self.find_cycle(pos) {
            // Roll back; callers must observe the graph unchanged.
            if old_refs.is_empty() {
                self.references.remove(&pos);
            } else {
                self.references.insert(pos, old_refs);
            }
            return Err(CycleError { cycle_path });
        }

        for removed in old_refs.difference(&new_refs) {
            if let Some(deps) = self.dependents.get_mut(removed) {
                deps.remove(&pos);
                // Clean up empty sets
                if deps.is_empty() {
                    self.dependents.remove(removed);
                }
            }
        }
        for added in new_refs.difference(&old_refs) {
            self.dependents
                .entry(*added)
                .or_insert_with(HashSet::new)
                .insert(pos);
        }

        Ok(self.transitive_dependents(pos))
    }

    /// Returns the direct references of a cell, or None if it has none.
    pub fn references(&self, pos: Position) -> Option<&HashSet<Position>> {
        self.references.get(&pos)
    }

    /// Returns the direct dependents of a cell, or None if it has none.
    pub fn dependents_of(&self, pos: Position) -> Option<&HashSet<Position>> {
        self.dependents.get(&pos)
    }

    /// Returns the number of cells with outgoing edges.
    pub fn formula_cell_count(&self) -> usize {
        self.references.len()
    }

    /// Returns the total number of dependency relationships.
    pub fn dependency_count(&self) -> usize {
        self.references.values().map(|refs| refs.len()).sum()
    }

    /// Three-color depth-first search over the forward edges starting at
    /// `pos`. Returns the offending walk if it comes back to a gray node.
    /// Positions with no outgoing edges are finished immediately.
    fn find_cycle(&self, pos: Position) -> Option<Vec<Position>> {
        let mut colors = HashMap::new();
        let mut path = Vec::new();
        if self.visit(pos, &mut colors, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn visit(
        &self,
        pos: Position,
        colors: &mut HashMap<Position, Color>,
        path: &mut Vec<Position>,
    ) -> bool {
        let Some(refs) = self.references.get(&pos) else {
            colors.insert(pos, Color::Black);
            return false;
        };

        colors.insert(pos, Color::Gray);
        path.push(pos);
        for &next in refs {
            match colors.get(&next) {
                None => {
                    if self.visit(next, colors, path) {
                        return true;
                    }
                }
                Some(Color::Gray) => {
                    path.push(next);
                    return true;
                }
                Some(Color::Black) => {}
            }
        }
        path.pop();
        colors.insert(pos, Color::Black);
        false
    }

    /// Walks the reverse edges from `pos` and collects every position that
    /// transitively depends on it, excluding `pos` itself. Terminates
    /// because the forward graph is acyclic.
    fn transitive_dependents(&self, pos: Position) -> Vec<Position> {
        let mut visited = HashSet::from([pos]);
        let mut stack = vec![pos];
        let mut result = Vec::new();

        while let Some(current) = stack.pop() {
            if let Some(deps) = self.dependents.get(&current) {
                for &dep in deps {
                    if visited.insert(dep) {
                        result.push(dep);
                        stack.push(dep);
                    }
                }
            }
        }

        result
    }
}

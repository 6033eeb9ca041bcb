//! Dependency resolver - expands a set of requested field titles into the
//! full set of cell identifiers their formulas need, following declared
//! formula inputs until the set stops growing.

use crate::error::{SummaryError, SummaryResult};
use crate::registry::{self, CellId};
use std::collections::HashSet;
use tracing::trace;

/// Passes the fixpoint loop may take before a chain is considered cyclic
/// or too deep.
pub const MAX_RESOLVE_PASSES: usize = 10;

/// Compute every cell identifier required, directly or transitively, by the
/// formulas among `requested_titles`. Titles without a registered formula
/// contribute nothing.
pub fn required_cells(requested_titles: &[String]) -> SummaryResult<HashSet<CellId>> {
    let mut frontier: HashSet<CellId> = requested_titles
        .iter()
        .filter(|title| registry::is_formula_title(title))
        .filter_map(|title| registry::cell_for_title(title))
        .collect();

    let mut required: HashSet<CellId> = HashSet::new();
    for pass in 0..MAX_RESOLVE_PASSES {
        let mut discovered: HashSet<CellId> = HashSet::new();
        for cell in &frontier {
            if let Some(formula) = registry::formula_for_cell(*cell) {
                for input in formula.inputs {
                    if !required.contains(input) {
                        discovered.insert(*input);
                    }
                }
            }
        }
        trace!(pass, discovered = discovered.len(), "resolver pass");
        if discovered.is_empty() {
            return Ok(required);
        }
        required.extend(discovered.iter().copied());
        frontier = discovered;
    }

    // Did not converge within the budget: report whatever the last pass
    // was still chasing.
    let mut cells: Vec<String> = frontier.iter().map(|c| c.to_string()).collect();
    cells.sort();
    Err(SummaryError::UnresolvedDependency {
        iterations: MAX_RESOLVE_PASSES,
        cells,
    })
}

/// Cell identifiers addressable from a set of titles (parameters plus
/// summary titles); the counterpart of [`required_cells`] used during
/// layout validation.
pub fn available_cells(titles: &[String]) -> HashSet<CellId> {
    titles
        .iter()
        .filter_map(|title| registry::cell_for_title(title))
        .collect()
}

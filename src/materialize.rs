//! Formula materializer - turns planned slots into final output cell values.
//!
//! Measured slots pass through unchanged; derived slots render their
//! registered formula against the row's resolved addresses.

use crate::error::{SummaryError, SummaryResult};
use crate::registry::{self, AddressMap, CellId};
use crate::types::{CellValue, Datum};

/// One planned output slot before materialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A value read from an input sheet (or a blank substitution).
    Measured(Datum),
    /// A derived cell whose value is a formula over other cells' addresses.
    Derived(CellId),
}

/// Resolve a slot into its final cell value using the row's address map.
pub fn materialize(slot: Slot, addresses: &AddressMap) -> SummaryResult<CellValue> {
    match slot {
        Slot::Measured(datum) => Ok(datum.into()),
        Slot::Derived(cell) => {
            let formula = registry::formula_for_cell(cell).ok_or_else(|| {
                SummaryError::UnresolvedDependency {
                    iterations: 0,
                    cells: vec![cell.to_string()],
                }
            })?;
            let mut args = Vec::with_capacity(formula.inputs.len());
            let mut missing = Vec::new();
            for input in formula.inputs {
                match addresses.get(input) {
                    Some(address) => args.push(address.clone()),
                    None => missing.push(input.to_string()),
                }
            }
            if !missing.is_empty() {
                missing.sort();
                return Err(SummaryError::UnresolvedDependency {
                    iterations: 0,
                    cells: missing,
                });
            }
            Ok(CellValue::Formula((formula.render)(&args)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FLOW, HEAD, HYDRAULIC_POWER};
    use std::collections::HashMap;

    #[test]
    fn test_measured_passes_through() {
        let addresses = HashMap::new();
        assert_eq!(
            materialize(Slot::Measured(Datum::Number(3.5)), &addresses).unwrap(),
            CellValue::Number(3.5)
        );
        assert_eq!(
            materialize(Slot::Measured(Datum::Blank), &addresses).unwrap(),
            CellValue::Blank
        );
    }

    #[test]
    fn test_derived_renders_addresses() {
        let addresses: AddressMap = HashMap::from([
            (FLOW, "E3".to_string()),
            (HEAD, "B3".to_string()),
        ]);
        let value = materialize(Slot::Derived(HYDRAULIC_POWER), &addresses).unwrap();
        assert_eq!(value, CellValue::Formula("=0.1635*E3*B3".to_string()));
    }

    #[test]
    fn test_derived_with_missing_address_fails() {
        let addresses: AddressMap = HashMap::from([(FLOW, "E3".to_string())]);
        let err = materialize(Slot::Derived(HYDRAULIC_POWER), &addresses).unwrap_err();
        match err {
            SummaryError::UnresolvedDependency { cells, .. } => {
                assert_eq!(cells, vec!["head_cell".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Static field/cell registry.
//!
//! Maps human-readable field titles (column headers in the half-cycle summary
//! block) to short internal cell identifiers, and records which cells are
//! derived via a spreadsheet formula rather than measured. Built once at
//! process start and never mutated afterwards.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Internal token naming one formula input/output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub &'static str);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Spreadsheet addresses resolved for one output row, keyed by cell id.
pub type AddressMap = HashMap<CellId, String>;

/// A derived cell: the inputs it consumes and a renderer producing the
/// textual spreadsheet formula.
///
/// Inputs are declared explicitly instead of being recovered from a
/// function signature, so the dependency resolver can walk them without
/// any reflection.
pub struct CellFormula {
    /// Cell ids whose addresses the formula consumes, in argument order.
    pub inputs: &'static [CellId],
    /// Renders the formula text; `args` holds addresses in `inputs` order.
    pub render: fn(args: &[String]) -> String,
}

pub const HEAD: CellId = CellId("head_cell");
pub const VELOCITY: CellId = CellId("velocity_cell");
pub const FLOW: CellId = CellId("flow_cell");
pub const MOTOR_POWER: CellId = CellId("motor_power_cell");
pub const CYCLE_ENERGY: CellId = CellId("cycle_energy_cell");
pub const HYDRAULIC_POWER: CellId = CellId("hydraulic_power_cell");
pub const EFFICIENCY: CellId = CellId("efficiency_cell");

/// Parameter titles that always appear in the output and whose cells are
/// addressable by formulas.
pub const PREDEFINED_PARAMETER_TITLES: &[&str] = &["Pump Head [m]"];

fn render_hydraulic_power(args: &[String]) -> String {
    // P [W] = rho * g * Q * H with Q in LPM: 1000 * 9.81 / 60000 = 0.1635
    format!("=0.1635*{}*{}", args[0], args[1])
}

fn render_efficiency(args: &[String]) -> String {
    format!("=100*{}/{}", args[0], args[1])
}

struct FieldSpec {
    title: &'static str,
    cell: CellId,
    formula: Option<CellFormula>,
}

static FIELDS: [FieldSpec; 7] = [
    FieldSpec {
        title: "Pump Head [m]",
        cell: HEAD,
        formula: None,
    },
    FieldSpec {
        title: "Average Velocity [m/s]",
        cell: VELOCITY,
        formula: None,
    },
    FieldSpec {
        title: "Flow Rate [LPM]",
        cell: FLOW,
        formula: None,
    },
    FieldSpec {
        title: "Motor Power [W]",
        cell: MOTOR_POWER,
        formula: None,
    },
    FieldSpec {
        title: "Energy per Cycle [J]",
        cell: CYCLE_ENERGY,
        formula: None,
    },
    FieldSpec {
        title: "Hydraulic Power [W]",
        cell: HYDRAULIC_POWER,
        formula: Some(CellFormula {
            inputs: &[FLOW, HEAD],
            render: render_hydraulic_power,
        }),
    },
    FieldSpec {
        title: "Pump Efficiency [%]",
        cell: EFFICIENCY,
        formula: Some(CellFormula {
            inputs: &[HYDRAULIC_POWER, MOTOR_POWER],
            render: render_efficiency,
        }),
    },
];

static TITLE_TO_CELL: Lazy<HashMap<&'static str, CellId>> =
    Lazy::new(|| FIELDS.iter().map(|f| (f.title, f.cell)).collect());

static CELL_TO_TITLE: Lazy<HashMap<CellId, &'static str>> =
    Lazy::new(|| FIELDS.iter().map(|f| (f.cell, f.title)).collect());

static CELL_TO_FORMULA: Lazy<HashMap<CellId, &'static CellFormula>> = Lazy::new(|| {
    FIELDS
        .iter()
        .filter_map(|f| f.formula.as_ref().map(|formula| (f.cell, formula)))
        .collect()
});

/// Cell ids of the predefined parameter titles, in declaration order.
pub static PREDEFINED_CELLS: Lazy<Vec<CellId>> = Lazy::new(|| {
    PREDEFINED_PARAMETER_TITLES
        .iter()
        .filter_map(|t| cell_for_title(t))
        .collect()
});

pub fn cell_for_title(title: &str) -> Option<CellId> {
    TITLE_TO_CELL.get(title).copied()
}

pub fn title_for_cell(cell: CellId) -> Option<&'static str> {
    CELL_TO_TITLE.get(&cell).copied()
}

pub fn formula_for_cell(cell: CellId) -> Option<&'static CellFormula> {
    CELL_TO_FORMULA.get(&cell).copied()
}

pub fn formula_for_title(title: &str) -> Option<&'static CellFormula> {
    cell_for_title(title).and_then(formula_for_cell)
}

/// True when the title's value is computed in the output rather than read
/// from the input block.
pub fn is_formula_title(title: &str) -> bool {
    formula_for_title(title).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_cell_mapping_is_bijective() {
        for field in &FIELDS {
            assert_eq!(cell_for_title(field.title), Some(field.cell));
            assert_eq!(title_for_cell(field.cell), Some(field.title));
        }
    }

    #[test]
    fn test_unknown_title_has_no_cell() {
        assert_eq!(cell_for_title("General Notes"), None);
        assert_eq!(cell_for_title(""), None);
    }

    #[test]
    fn test_formula_titles() {
        assert!(is_formula_title("Hydraulic Power [W]"));
        assert!(is_formula_title("Pump Efficiency [%]"));
        assert!(!is_formula_title("Flow Rate [LPM]"));
        assert!(!is_formula_title("Pump Head [m]"));
    }

    #[test]
    fn test_formula_inputs_declared() {
        let hydraulic = formula_for_cell(HYDRAULIC_POWER).unwrap();
        assert_eq!(hydraulic.inputs, &[FLOW, HEAD]);

        // Efficiency references another derived cell (multi-level chain)
        let efficiency = formula_for_cell(EFFICIENCY).unwrap();
        assert_eq!(efficiency.inputs, &[HYDRAULIC_POWER, MOTOR_POWER]);
        assert!(formula_for_cell(efficiency.inputs[0]).is_some());
    }

    #[test]
    fn test_render_produces_formula_text() {
        let hydraulic = formula_for_cell(HYDRAULIC_POWER).unwrap();
        let text = (hydraulic.render)(&["D3".to_string(), "B3".to_string()]);
        assert_eq!(text, "=0.1635*D3*B3");

        let efficiency = formula_for_cell(EFFICIENCY).unwrap();
        let text = (efficiency.render)(&["F3".to_string(), "E3".to_string()]);
        assert_eq!(text, "=100*F3/E3");
    }

    #[test]
    fn test_predefined_cells_follow_title_order() {
        assert_eq!(PREDEFINED_CELLS.as_slice(), &[HEAD]);
    }
}

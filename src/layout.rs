//! Layout planner - assigns every parameter, title and per-direction value
//! an absolute grid position, and resolves the spreadsheet address of every
//! formula-relevant cell per data row.

use crate::error::{SummaryError, SummaryResult};
use crate::materialize::{self, Slot};
use crate::registry::{self, AddressMap, CellId, PREDEFINED_PARAMETER_TITLES};
use crate::resolve;
use crate::types::{CellValue, ParameterSet, SummaryBlock};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Convert a 0-based column index to Excel letters (0→A, 25→Z, 26→AA).
pub fn column_letter(col: u16) -> String {
    let mut result = String::new();
    let mut num = col as u32;
    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }
    result
}

/// Textual spreadsheet address for a 0-based (row, col) position.
pub fn cell_address(row: u32, col: u16) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

/// The column assignment for one aggregation run. Left to right: file name,
/// user-defined fields, parameters (predefined first), then one summary-title
/// block per configured direction.
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    pub user_fields: Vec<String>,
    pub parameter_names: Vec<String>,
    pub summary_titles: Vec<String>,
    pub directions: Vec<String>,
}

/// One data row, split by the format each segment is written with.
#[derive(Debug, Clone)]
pub struct PlannedRow {
    pub file: CellValue,
    pub user: Vec<CellValue>,
    pub parameters: Vec<CellValue>,
    pub summaries: Vec<CellValue>,
}

impl ColumnPlan {
    /// Build the plan from the configured lists, auto-extending the summary
    /// titles with any field a requested formula needs but the configuration
    /// omitted.
    pub fn new(
        user_fields: Vec<String>,
        extra_parameters: Vec<String>,
        summary_titles: Vec<String>,
        directions: Vec<String>,
    ) -> SummaryResult<Self> {
        let user_fields: Vec<String> = user_fields
            .into_iter()
            .filter(|f| !PREDEFINED_PARAMETER_TITLES.contains(&f.as_str()))
            .collect();

        let mut parameter_names: Vec<String> = PREDEFINED_PARAMETER_TITLES
            .iter()
            .map(|t| t.to_string())
            .collect();
        parameter_names.extend(extra_parameters);

        let mut summary_titles = summary_titles;
        loop {
            let required = resolve::required_cells(&summary_titles)?;
            let known: Vec<String> = parameter_names
                .iter()
                .chain(summary_titles.iter())
                .cloned()
                .collect();
            let available = resolve::available_cells(&known);

            let mut missing: Vec<CellId> =
                required.difference(&available).copied().collect();
            if missing.is_empty() {
                break;
            }
            missing.sort();

            // Appending a title can itself introduce a formula, so validate
            // again after extending.
            for cell in missing {
                match registry::title_for_cell(cell) {
                    Some(title) => {
                        info!(%cell, title, "adding field required by a configured formula");
                        summary_titles.push(title.to_string());
                    }
                    None => {
                        return Err(SummaryError::UnresolvedDependency {
                            iterations: 0,
                            cells: vec![cell.to_string()],
                        })
                    }
                }
            }
        }

        Ok(Self {
            user_fields,
            parameter_names,
            summary_titles,
            directions,
        })
    }

    fn param_col0(&self) -> u16 {
        1 + self.user_fields.len() as u16
    }

    fn summary_col0(&self) -> u16 {
        self.param_col0() + self.parameter_names.len() as u16
    }

    fn direction_col0(&self, direction_index: usize) -> u16 {
        self.summary_col0() + (direction_index * self.summary_titles.len()) as u16
    }

    pub fn total_cols(&self) -> u16 {
        self.summary_col0() + (self.directions.len() * self.summary_titles.len()) as u16
    }

    /// Row 0 header starting at column 1: blank over user and parameter
    /// columns, the direction name repeated over its summary-title block.
    pub fn header_group_row(&self) -> Vec<CellValue> {
        let mut row = vec![CellValue::Blank; self.user_fields.len() + self.parameter_names.len()];
        for direction in &self.directions {
            for _ in &self.summary_titles {
                row.push(CellValue::Text(direction.clone()));
            }
        }
        row
    }

    /// Row 1 header starting at column 1: the literal field titles.
    pub fn header_title_row(&self) -> Vec<CellValue> {
        let mut row: Vec<CellValue> = self
            .user_fields
            .iter()
            .chain(self.parameter_names.iter())
            .map(|t| CellValue::Text(t.clone()))
            .collect();
        for _ in &self.directions {
            row.extend(
                self.summary_titles
                    .iter()
                    .map(|t| CellValue::Text(t.clone())),
            );
        }
        row
    }

    /// Plan one data row: project parameters (blank default), restrict each
    /// direction's block to the configured titles, resolve every addressable
    /// cell's position and materialize formula slots.
    ///
    /// Each direction gets its own address map (predefined parameter cells
    /// plus that direction's column span) so a derived cell references its
    /// own direction's measured columns. A cell claimed a second time under
    /// the same direction name means the column-advance arithmetic would
    /// hand one logical slot two positions, which is a collision.
    pub fn plan_row(
        &self,
        row: u32,
        file_name: &str,
        parameters: &ParameterSet,
        summary: &SummaryBlock,
    ) -> SummaryResult<PlannedRow> {
        // Parameters carrying a cell id are addressable by formulas.
        let mut base_addresses: AddressMap = AddressMap::new();
        for (i, name) in self.parameter_names.iter().enumerate() {
            if let Some(cell) = registry::cell_for_title(name) {
                let address = cell_address(row, self.param_col0() + i as u16);
                if let Some(existing) = base_addresses.insert(cell, address) {
                    return Err(SummaryError::CellCollision {
                        detail: format!(
                            "parameter {name:?} re-places {cell} (previously at {existing})"
                        ),
                    });
                }
            }
        }

        let mut claimed: HashSet<(CellId, &str)> = HashSet::new();
        let mut summaries: Vec<CellValue> = Vec::new();
        for (di, direction) in self.directions.iter().enumerate() {
            // This direction's merged address map. A span position overrides
            // the predefined parameter address of the same cell (the
            // direction-local position wins).
            let mut addresses = base_addresses.clone();
            let mut slots: Vec<Slot> = Vec::new();
            for (i, title) in self.summary_titles.iter().enumerate() {
                let col = self.direction_col0(di) + i as u16;
                if let Some(cell) = registry::cell_for_title(title) {
                    if !claimed.insert((cell, direction.as_str())) {
                        return Err(SummaryError::CellCollision {
                            detail: format!(
                                "{cell} claimed twice under direction {direction:?}"
                            ),
                        });
                    }
                    addresses.insert(cell, cell_address(row, col));
                }
                if registry::is_formula_title(title) {
                    // cell lookup above succeeds for every formula title
                    if let Some(cell) = registry::cell_for_title(title) {
                        slots.push(Slot::Derived(cell));
                    }
                } else {
                    slots.push(Slot::Measured(summary.value_for(direction, title)));
                }
            }

            check_distinct_addresses(&addresses)?;
            for slot in slots {
                summaries.push(materialize::materialize(slot, &addresses)?);
            }
        }

        let parameter_values = self
            .parameter_names
            .iter()
            .map(|name| {
                parameters
                    .get(name)
                    .cloned()
                    .map(CellValue::from)
                    .unwrap_or(CellValue::Blank)
            })
            .collect();

        Ok(PlannedRow {
            file: CellValue::Text(file_name.to_string()),
            user: vec![CellValue::Blank; self.user_fields.len()],
            parameters: parameter_values,
            summaries,
        })
    }
}

/// Enforce the per-row invariant: no two cell identifiers may resolve to
/// the same spreadsheet address.
fn check_distinct_addresses(addresses: &AddressMap) -> SummaryResult<()> {
    let mut seen: HashMap<&str, CellId> = HashMap::new();
    for (cell, address) in addresses {
        if let Some(other) = seen.insert(address.as_str(), *cell) {
            return Err(SummaryError::CellCollision {
                detail: format!("address {address} assigned to both {other} and {cell}"),
            });
        }
    }
    Ok(())
}

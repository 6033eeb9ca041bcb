//! Workbook reader - extracts parameter sets and half-cycle summary blocks
//! from per-run .xlsx files produced by the post-processing pipeline.

use crate::error::{SummaryError, SummaryResult};
use crate::types::{Datum, ParameterSet, SummaryBlock};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PARAMETERS_SHEET: &str = "Parameters";
pub const HALF_CYCLES_SHEET: &str = "Half-Cycles";
pub const HALF_CYCLE_SUMMARY_TEXT: &str = "Half-Cycle Summary";

/// The summary marker must appear within this many rows of the sheet top.
pub const MARKER_SEARCH_LIMIT: u32 = 200;

const DIRECTION_TEXT: &str = "Direction";
const DOWN_AVERAGES_TEXT: &str = "DOWN Averages";
const UP_AVERAGES_TEXT: &str = "UP Averages";
const ALL_AVERAGES_TEXT: &str = "ALL Averages";

/// An opened input workbook that passed the eligibility check.
pub struct RunWorkbook {
    path: PathBuf,
    workbook: Xlsx<BufReader<File>>,
}

/// Open a workbook if it qualifies for aggregation. Files without a
/// "Half-Cycles" sheet are not produced by the post processor and are
/// skipped rather than treated as errors.
pub fn open_if_eligible(path: &Path) -> SummaryResult<Option<RunWorkbook>> {
    let workbook: Xlsx<_> = open_workbook(path)?;
    if !workbook
        .sheet_names()
        .iter()
        .any(|name| name == HALF_CYCLES_SHEET)
    {
        debug!(path = %path.display(), "skipping: no {HALF_CYCLES_SHEET} sheet");
        return Ok(None);
    }
    Ok(Some(RunWorkbook {
        path: path.to_path_buf(),
        workbook,
    }))
}

impl RunWorkbook {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used as the row label in the output.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Read the key/value run configuration from the "Parameters" sheet
    /// (keys in column 0, values in column 1).
    pub fn read_parameters(&mut self) -> SummaryResult<ParameterSet> {
        let range = self.workbook.worksheet_range(PARAMETERS_SHEET)?;
        let mut parameters = ParameterSet::new();
        if let Some((end_row, _)) = range.end() {
            for row in 0..=end_row {
                let key = match range.get_value((row, 0)) {
                    Some(Data::String(s)) => s.clone(),
                    Some(Data::Empty) | None => continue,
                    Some(other) => other.to_string(),
                };
                let value = range
                    .get_value((row, 1))
                    .map(Datum::from_sheet)
                    .unwrap_or(Datum::Blank);
                parameters.insert(key, value);
            }
        }
        Ok(parameters)
    }

    /// Locate the "Half-Cycle Summary" marker and read the four fixed-offset
    /// rows below it: titles, then DOWN/UP/ALL averages. Values start at
    /// column 2; column 1 carries captions that are verified before use.
    pub fn read_summary(&mut self) -> SummaryResult<SummaryBlock> {
        let range = self.workbook.worksheet_range(HALF_CYCLES_SHEET)?;
        let marker_row = find_marker_row(
            &range,
            HALF_CYCLES_SHEET,
            0,
            HALF_CYCLE_SUMMARY_TEXT,
            MARKER_SEARCH_LIMIT,
        )?;

        let titles_row = marker_row + 1;
        let down_row = marker_row + 2;
        let up_row = marker_row + 3;
        let all_row = marker_row + 4;

        for (row, caption) in [
            (titles_row, DIRECTION_TEXT),
            (down_row, DOWN_AVERAGES_TEXT),
            (up_row, UP_AVERAGES_TEXT),
            (all_row, ALL_AVERAGES_TEXT),
        ] {
            verify_cell_at(&range, HALF_CYCLES_SHEET, row, 1, caption)?;
        }

        Ok(SummaryBlock {
            titles: read_row_text(&range, titles_row),
            down: read_row_values(&range, down_row),
            up: read_row_values(&range, up_row),
            all: read_row_values(&range, all_row),
        })
    }
}

/// Scan rows 0..limit of one column for an exact text match.
pub fn find_marker_row(
    range: &Range<Data>,
    sheet: &str,
    col: u32,
    text: &str,
    limit: u32,
) -> SummaryResult<u32> {
    for row in 0..limit {
        if let Some(Data::String(s)) = range.get_value((row, col)) {
            if s == text {
                return Ok(row);
            }
        }
    }
    Err(SummaryError::MarkerNotFound {
        sheet: sheet.to_string(),
        col,
        text: text.to_string(),
        limit,
    })
}

fn verify_cell_at(
    range: &Range<Data>,
    sheet: &str,
    row: u32,
    col: u32,
    expected: &str,
) -> SummaryResult<()> {
    let found = match range.get_value((row, col)) {
        Some(Data::Empty) | None => String::new(),
        Some(value) => value.to_string(),
    };
    if found != expected {
        return Err(SummaryError::MalformedLayout {
            sheet: sheet.to_string(),
            row,
            col,
            expected: expected.to_string(),
            found,
        });
    }
    Ok(())
}

fn read_row_text(range: &Range<Data>, row: u32) -> Vec<String> {
    let Some((_, end_col)) = range.end() else {
        return Vec::new();
    };
    (2..=end_col)
        .map(|col| match range.get_value((row, col)) {
            Some(Data::Empty) | None => String::new(),
            Some(value) => value.to_string(),
        })
        .collect()
}

fn read_row_values(range: &Range<Data>, row: u32) -> Vec<Datum> {
    let Some((_, end_col)) = range.end() else {
        return Vec::new();
    };
    (2..=end_col)
        .map(|col| {
            range
                .get_value((row, col))
                .map(Datum::from_sheet)
                .unwrap_or(Datum::Blank)
        })
        .collect()
}

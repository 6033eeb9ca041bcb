//! Output writer - buffers positioned cells and named formats in memory and
//! serializes them to the summary workbook in one pass.

use crate::error::SummaryResult;
use crate::types::CellValue;
use rust_xlsxwriter::{Format, FormatAlign, Formula, Workbook};
use std::path::{Path, PathBuf};

pub const OUTPUT_SHEET: &str = "Summary";

/// Handle to a format registered with [`SummaryOutput::add_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatId(usize);

/// Bold wrapped header format.
pub fn title_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Left)
}

/// Three-decimal numeric format for data cells.
pub fn data_format() -> Format {
    Format::new()
        .set_text_wrap()
        .set_align(FormatAlign::Left)
        .set_num_format("0.000")
}

/// Three-decimal numeric format for the user-defined field columns.
pub fn user_format() -> Format {
    Format::new().set_align(FormatAlign::Left).set_num_format("0.000")
}

/// In-memory output grid. Write-once, flush-once: cells accumulate until
/// [`write`](Self::write) serializes everything and consumes the buffer.
pub struct SummaryOutput {
    path: PathBuf,
    formats: Vec<Format>,
    cells: Vec<(u32, u16, CellValue, FormatId)>,
}

impl SummaryOutput {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            formats: Vec::new(),
            cells: Vec::new(),
        }
    }

    pub fn add_format(&mut self, format: Format) -> FormatId {
        self.formats.push(format);
        FormatId(self.formats.len() - 1)
    }

    pub fn add(&mut self, row: u32, col: u16, value: CellValue, format: FormatId) {
        self.cells.push((row, col, value, format));
    }

    /// Place `values` left to right starting at (row, col).
    pub fn add_row<I>(&mut self, row: u32, col: u16, values: I, format: FormatId)
    where
        I: IntoIterator<Item = CellValue>,
    {
        for (i, value) in values.into_iter().enumerate() {
            self.add(row, col + i as u16, value, format);
        }
    }

    /// Place `values` top to bottom starting at (row, col).
    pub fn add_col<I>(&mut self, row: u32, col: u16, values: I, format: FormatId)
    where
        I: IntoIterator<Item = CellValue>,
    {
        for (i, value) in values.into_iter().enumerate() {
            self.add(row + i as u32, col, value, format);
        }
    }

    /// Serialize all buffered cells to the workbook and return the written
    /// path. Consumes the buffer; a failure leaves no usable output file.
    pub fn write(self) -> SummaryResult<PathBuf> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(OUTPUT_SHEET)?;

        for (row, col, value, format) in &self.cells {
            let format = &self.formats[format.0];
            match value {
                CellValue::Blank => {
                    worksheet.write_blank(*row, *col, format)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number_with_format(*row, *col, *n, format)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string_with_format(*row, *col, s, format)?;
                }
                CellValue::Formula(f) => {
                    worksheet.write_formula_with_format(*row, *col, Formula::new(f), format)?;
                }
            }
        }

        workbook.save(&self.path)?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    #[test]
    fn test_write_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");

        let mut output = SummaryOutput::new(&path);
        let title = output.add_format(title_format());
        let data = output.add_format(data_format());
        output.add_row(
            0,
            1,
            vec![
                CellValue::Text("a".into()),
                CellValue::Blank,
                CellValue::Text("b".into()),
            ],
            title,
        );
        output.add(1, 0, CellValue::Number(3.25), data);
        output.add(1, 1, CellValue::Formula("=A2*2".into()), data);

        let written = output.write().unwrap();
        assert_eq!(written, path);

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range(OUTPUT_SHEET).unwrap();
        assert_eq!(
            range.get_value((0, 1)),
            Some(&Data::String("a".to_string()))
        );
        assert_eq!(range.get_value((0, 3)), Some(&Data::String("b".to_string())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(3.25)));

        let formulas = workbook.worksheet_formula(OUTPUT_SHEET).unwrap();
        assert_eq!(formulas.get_value((1, 1)), Some(&"A2*2".to_string()));
    }

    #[test]
    fn test_add_col_places_vertically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("col.xlsx");

        let mut output = SummaryOutput::new(&path);
        let data = output.add_format(data_format());
        output.add_col(
            0,
            0,
            vec![CellValue::Number(1.0), CellValue::Number(2.0)],
            data,
        );
        output.write().unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range(OUTPUT_SHEET).unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::Float(1.0)));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(2.0)));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let mut output = SummaryOutput::new("/nonexistent/dir/out.xlsx");
        let data = output.add_format(data_format());
        output.add(0, 0, CellValue::Number(1.0), data);
        assert!(output.write().is_err());
    }
}

//! Top-level orchestration: scan, filter, read, plan, write.

use crate::config::Config;
use crate::error::{SummaryError, SummaryResult};
use crate::layout::ColumnPlan;
use crate::output::{self, SummaryOutput};
use crate::reader::{self, RunWorkbook};
use crate::types::{ParameterSet, SummaryBlock};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const OUTPUT_FILENAME: &str = "summary.xlsx";

const MAX_FILENAME_ATTEMPTS: u32 = 1000;

/// Progress counter ticked once per successfully opened candidate file,
/// eligible or not. The observer receives the 0-based index of each file
/// after it opens.
pub struct Progress<'a> {
    count: usize,
    sink: Option<&'a mut dyn FnMut(usize)>,
}

impl<'a> Progress<'a> {
    pub fn new(sink: &'a mut dyn FnMut(usize)) -> Self {
        Self {
            count: 0,
            sink: Some(sink),
        }
    }

    pub fn none() -> Progress<'static> {
        Progress {
            count: 0,
            sink: None,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    fn tick(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink(self.count);
        }
        self.count += 1;
    }
}

/// Non-recursive scan for `.xlsx` files, sorted by path.
pub fn scan_xlsx_files(dir: &Path) -> SummaryResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == "xlsx")
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Find a non-colliding output path by suffixing `_1`, `_2`, ... before the
/// extension. Gives up after a bounded number of attempts and returns the
/// last candidate.
pub fn allocate_unused_path(initial: &Path) -> PathBuf {
    if !initial.exists() {
        return initial.to_path_buf();
    }
    let dir = initial.parent().unwrap_or_else(|| Path::new(""));
    let stem = initial
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = initial
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut candidate = initial.to_path_buf();
    for i in 1..MAX_FILENAME_ATTEMPTS {
        candidate = dir.join(format!("{stem}_{i}.{ext}"));
        if !candidate.exists() {
            break;
        }
    }
    candidate
}

/// Scan `dir` and aggregate every eligible run file into a new summary
/// workbook written alongside them.
pub fn summarize_dir(
    dir: &Path,
    config: &Config,
    progress: &mut Progress,
) -> SummaryResult<PathBuf> {
    let filenames = scan_xlsx_files(dir)?;
    summarize_files(&filenames, dir, config, progress)
}

/// Aggregate the given candidate files into one summary workbook in
/// `output_dir`. Candidates without a "Half-Cycles" sheet are skipped;
/// the rest are processed in sorted-path order.
pub fn summarize_files(
    filenames: &[PathBuf],
    output_dir: &Path,
    config: &Config,
    progress: &mut Progress,
) -> SummaryResult<PathBuf> {
    let mut candidates: Vec<&PathBuf> = filenames.iter().collect();
    candidates.sort();

    let mut workbooks: Vec<RunWorkbook> = Vec::new();
    for path in candidates {
        let opened = reader::open_if_eligible(path)?;
        // Ticked only once the file has opened
        progress.tick();
        if let Some(workbook) = opened {
            workbooks.push(workbook);
        }
    }

    if workbooks.is_empty() {
        return Err(SummaryError::NoEligibleFiles);
    }
    info!(eligible = workbooks.len(), "aggregating run files");

    let output_path = allocate_unused_path(&output_dir.join(OUTPUT_FILENAME));

    // Read everything up front; layout depends on the full result set.
    debug!("reading parameters");
    let all_parameters: Vec<ParameterSet> = workbooks
        .iter_mut()
        .map(|w| w.read_parameters())
        .collect::<SummaryResult<_>>()?;

    debug!("reading summaries");
    let all_summaries: Vec<SummaryBlock> = workbooks
        .iter_mut()
        .map(|w| w.read_summary())
        .collect::<SummaryResult<_>>()?;

    let plan = ColumnPlan::new(
        config.user_defined_fields.clone(),
        config.parameters.clone(),
        config.half_cycle_fields.clone(),
        config.half_cycle_directions.clone(),
    )?;

    let mut output = SummaryOutput::new(&output_path);
    let title_fmt = output.add_format(output::title_format());
    let data_fmt = output.add_format(output::data_format());
    let user_fmt = output.add_format(output::user_format());

    // Two-level header; column 0 stays blank above the file-name column.
    output.add_row(0, 1, plan.header_group_row(), title_fmt);
    output.add_row(1, 1, plan.header_title_row(), title_fmt);

    let mut row = 2u32;
    for (workbook, (parameters, summary)) in workbooks
        .iter()
        .zip(all_parameters.iter().zip(all_summaries.iter()))
    {
        let planned = plan.plan_row(row, &workbook.file_name(), parameters, summary)?;
        let user_col = 1;
        let param_col = user_col + planned.user.len() as u16;
        let summary_col = param_col + planned.parameters.len() as u16;

        output.add(row, 0, planned.file, data_fmt);
        output.add_row(row, user_col, planned.user, user_fmt);
        output.add_row(row, param_col, planned.parameters, data_fmt);
        output.add_row(row, summary_col, planned.summaries, data_fmt);
        row += 1;
    }

    let written = output.write()?;
    info!(path = %written.display(), rows = row - 2, "summary written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_scan_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("b.xlsx")).unwrap();
        File::create(dir.path().join("a.xlsx")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        fs::create_dir(dir.path().join("sub.xlsx")).unwrap();

        let files = scan_xlsx_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xlsx", "b.xlsx"]);
    }

    #[test]
    fn test_allocate_unused_path() {
        let dir = TempDir::new().unwrap();
        let initial = dir.path().join(OUTPUT_FILENAME);

        assert_eq!(allocate_unused_path(&initial), initial);

        File::create(&initial).unwrap();
        assert_eq!(
            allocate_unused_path(&initial),
            dir.path().join("summary_1.xlsx")
        );

        File::create(dir.path().join("summary_1.xlsx")).unwrap();
        assert_eq!(
            allocate_unused_path(&initial),
            dir.path().join("summary_2.xlsx")
        );
    }

    #[test]
    fn test_progress_counts_every_tick() {
        let mut seen = Vec::new();
        let mut sink = |i: usize| seen.push(i);
        let mut progress = Progress::new(&mut sink);
        progress.tick();
        progress.tick();
        progress.tick();
        assert_eq!(progress.count(), 3);
        drop(progress);
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_dir_reports_no_eligible_files() {
        let dir = TempDir::new().unwrap();
        let err = summarize_dir(dir.path(), &Config::default(), &mut Progress::none())
            .unwrap_err();
        assert!(matches!(err, SummaryError::NoEligibleFiles));
    }
}

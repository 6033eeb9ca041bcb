use thiserror::Error;

pub type SummaryResult<T> = Result<T, SummaryError>;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook read error: {0}")]
    Read(#[from] calamine::XlsxError),

    #[error("workbook write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{sheet}: expected {expected:?} at row {row}, column {col} but found {found:?}")]
    MalformedLayout {
        sheet: String,
        row: u32,
        col: u32,
        expected: String,
        found: String,
    },

    #[error("{sheet}: no row containing {text:?} in column {col} within the first {limit} rows")]
    MarkerNotFound {
        sheet: String,
        col: u32,
        text: String,
        limit: u32,
    },

    #[error("unresolved formula inputs after {iterations} passes: {cells:?}")]
    UnresolvedDependency {
        iterations: usize,
        cells: Vec<String>,
    },

    #[error("cell collision: {detail}")]
    CellCollision { detail: String },

    #[error("no eligible input files (none contain a 'Half-Cycles' sheet)")]
    NoEligibleFiles,
}

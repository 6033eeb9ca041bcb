//! Pumpsum - consolidates per-run pump measurement spreadsheets into one
//! summary workbook.
//!
//! Each input file carries a "Parameters" sheet (key/value run
//! configuration) and a "Half-Cycles" sheet with an averaged measurement
//! block for the down, up and all motion directions. This library locates
//! those blocks, resolves which derived fields need other fields as formula
//! inputs, lays out a dense two-level-header table whose column positions
//! are referenced by the emitted formulas, and writes everything in one
//! pass.
//!
//! # Example
//!
//! ```no_run
//! use pumpsum::config::Config;
//! use pumpsum::summarize::{summarize_dir, Progress};
//! use std::path::Path;
//!
//! let dir = Path::new("runs");
//! let config = Config::load(dir)?;
//! let written = summarize_dir(dir, &config, &mut Progress::none())?;
//! println!("wrote {}", written.display());
//! # Ok::<(), pumpsum::error::SummaryError>(())
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod materialize;
pub mod output;
pub mod reader;
pub mod registry;
pub mod resolve;
pub mod summarize;
pub mod types;

// Re-export commonly used types
pub use error::{SummaryError, SummaryResult};
pub use types::{CellValue, Datum, ParameterSet, SummaryBlock};

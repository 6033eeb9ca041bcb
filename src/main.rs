use clap::Parser;
use colored::Colorize;
use pumpsum::config::Config;
use pumpsum::summarize::{summarize_dir, Progress};
use pumpsum::SummaryError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pumpsum")]
#[command(about = "Consolidate pump run spreadsheets into one summary workbook")]
#[command(long_about = "Pumpsum - pump post-processing summary aggregator

Scans a directory (non-recursively) for .xlsx files produced by the pump
post processor, reads each file's 'Parameters' and 'Half-Cycles' sheets and
writes a consolidated summary.xlsx with one row per run.

CONFIGURATION:
  An optional summary.toml in the scanned directory selects the summary
  fields, directions and extra parameters:

  [half_cycle]
  fields = \"Flow Rate [LPM], Pump Efficiency [%]\"
  directions = \"down, up, all\"

  [global]
  parameters = \"Serial\"

  Fields a configured formula depends on are added automatically.

EXAMPLES:
  pumpsum ./runs              # summarize and open the result
  pumpsum ./runs --no-open    # summarize only")]
#[command(version)]
struct Cli {
    /// Directory to scan (non-recursively) for .xlsx run files
    dir: PathBuf,

    /// Do not open the written summary with the OS default handler
    #[arg(long)]
    no_open: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SummaryError::NoEligibleFiles) => {
            // A directory with no run files is a report, not a failure
            println!("{}", "no eligible run files found".yellow());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), SummaryError> {
    let config = Config::load(&cli.dir)?;

    let mut sink = |i: usize| debug!(file_index = i, "opened candidate file");
    let mut progress = Progress::new(&mut sink);
    let written = summarize_dir(&cli.dir, &config, &mut progress)?;

    println!("{} {}", "wrote".green().bold(), written.display());

    if !cli.no_open {
        open_with_default_app(&written);
    }
    Ok(())
}

/// Hand the written file to the OS default handler. Failure to open is not
/// a pipeline failure.
fn open_with_default_app(path: &Path) {
    #[cfg(target_os = "windows")]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", ""])
        .arg(path)
        .spawn();

    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(path).spawn();

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let result = std::process::Command::new("xdg-open").arg(path).spawn();

    if let Err(e) = result {
        warn!(path = %path.display(), "could not open with default handler: {e}");
    }
}

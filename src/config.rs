//! Run configuration, read from an optional `summary.toml` in the scanned
//! directory. Unset keys fall back to the stated defaults; list values are
//! comma-separated strings with surrounding whitespace trimmed and empty
//! tokens dropped.

use crate::error::SummaryResult;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const CONFIG_FILENAME: &str = "summary.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub user_defined_fields: Vec<String>,
    pub half_cycle_fields: Vec<String>,
    pub half_cycle_directions: Vec<String>,
    pub parameters: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_defined_fields: to_strings(&[
                "Pump Head [m]",
                "Damper used?",
                "PSU or Solar Panels",
                "MPPT used?",
                "General Notes",
            ]),
            half_cycle_fields: to_strings(&["Average Velocity [m/s]", "Flow Rate [LPM]"]),
            half_cycle_directions: to_strings(&["down", "up", "all"]),
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    user_defined: Option<FieldsSection>,
    half_cycle: Option<HalfCycleSection>,
    /// Legacy section name, recognised when `half_cycle` does not provide
    /// the key.
    half_cycles: Option<HalfCycleSection>,
    global: Option<GlobalSection>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldsSection {
    fields: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HalfCycleSection {
    fields: Option<String>,
    directions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalSection {
    parameters: Option<String>,
}

impl Config {
    /// Read `summary.toml` from `dir`, falling back to defaults when the
    /// file is absent.
    pub fn load(dir: &Path) -> SummaryResult<Self> {
        let path = dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        info!(path = %path.display(), "reading config");
        let raw: RawConfig = toml::from_str(&fs::read_to_string(&path)?)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();

        let half_cycle_key = |pick: fn(&HalfCycleSection) -> Option<String>| {
            raw.half_cycle
                .as_ref()
                .and_then(pick)
                .or_else(|| raw.half_cycles.as_ref().and_then(pick))
        };

        Self {
            user_defined_fields: raw
                .user_defined
                .as_ref()
                .and_then(|s| s.fields.as_deref().map(split_list))
                .unwrap_or(defaults.user_defined_fields),
            half_cycle_fields: half_cycle_key(|s| s.fields.clone())
                .as_deref()
                .map(split_list)
                .unwrap_or(defaults.half_cycle_fields),
            half_cycle_directions: half_cycle_key(|s| s.directions.clone())
                .as_deref()
                .map(split_list)
                .unwrap_or(defaults.half_cycle_directions),
            parameters: raw
                .global
                .as_ref()
                .and_then(|s| s.parameters.as_deref().map(split_list))
                .unwrap_or(defaults.parameters),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

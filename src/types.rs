//! Shared value types for the summary pipeline.

use std::collections::HashMap;

/// A value read from one input cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Blank,
    Number(f64),
    Text(String),
}

impl Datum {
    /// Convert a calamine cell into the pipeline's value type.
    pub fn from_sheet(data: &calamine::Data) -> Self {
        use calamine::Data;
        match data {
            Data::Empty => Datum::Blank,
            Data::Float(f) => Datum::Number(*f),
            Data::Int(i) => Datum::Number(*i as f64),
            Data::Bool(b) => Datum::Number(if *b { 1.0 } else { 0.0 }),
            Data::String(s) => Datum::Text(s.clone()),
            Data::DateTime(dt) => Datum::Number(dt.as_f64()),
            other => Datum::Text(other.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Datum::Blank)
    }
}

/// A value destined for one output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Number(f64),
    Text(String),
    Formula(String),
}

impl From<Datum> for CellValue {
    fn from(d: Datum) -> Self {
        match d {
            Datum::Blank => CellValue::Blank,
            Datum::Number(n) => CellValue::Number(n),
            Datum::Text(s) => CellValue::Text(s),
        }
    }
}

/// Key/value run configuration from one file's "Parameters" sheet.
pub type ParameterSet = HashMap<String, Datum>;

/// The averaged measurement block from one file's "Half-Cycles" sheet:
/// field titles plus one value vector per motion direction.
#[derive(Debug, Clone, Default)]
pub struct SummaryBlock {
    pub titles: Vec<String>,
    pub down: Vec<Datum>,
    pub up: Vec<Datum>,
    pub all: Vec<Datum>,
}

impl SummaryBlock {
    /// Look up a direction's value vector by its configured name.
    pub fn direction(&self, name: &str) -> Option<&[Datum]> {
        match name.to_ascii_lowercase().as_str() {
            "down" => Some(&self.down),
            "up" => Some(&self.up),
            "all" => Some(&self.all),
            _ => None,
        }
    }

    /// The value a direction holds for a given title, blank when the title
    /// is absent from the block.
    pub fn value_for(&self, direction: &str, title: &str) -> Datum {
        let Some(values) = self.direction(direction) else {
            return Datum::Blank;
        };
        self.titles
            .iter()
            .position(|t| t == title)
            .and_then(|i| values.get(i).cloned())
            .unwrap_or(Datum::Blank)
    }
}

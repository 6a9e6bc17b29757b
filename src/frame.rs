//! Tidy record table (one row = one observation), loaded from CSV.

use crate::error::{PlotError, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Column-named table of string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(PlotError::validation(format!(
                "row {i} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Read a CSV file with a header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading records from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read CSV with a header row from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            rows.push(rec.iter().map(|c| c.trim().to_string()).collect());
        }
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PlotError::validation(format!("column '{name}' not found")))
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &str>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| r[idx].as_str()))
    }

    /// Keep the rows for which `keep` returns true.
    pub(crate) fn retain_rows<F: FnMut(&[String]) -> bool>(&self, mut keep: F) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Set `name` to the given per-row values, appending the column if it is new.
    pub(crate) fn with_column(&self, name: &str, values: Vec<String>) -> Result<Frame> {
        if values.len() != self.rows.len() {
            return Err(PlotError::validation(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        let mut out = self.clone();
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, v) in out.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                out.columns.push(name.to_string());
                for (row, v) in out.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Ok(out)
    }
}

//! Data-layer transforms: filtering, recategorization, and time-binned aggregation.
//!
//! All functions are pure: they borrow a [`Frame`] and return new values, so
//! callers are free to memoize them on their inputs.

use crate::error::{PlotError, Result};
use crate::frame::Frame;
use crate::models::{SeriesTable, Totals};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Case-insensitive regex search on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub column: String,
    pub pattern: String,
}

/// Row filters. Every configured filter must pass for a row to survive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub search: Option<SearchFilter>,
    /// Column -> allowed values.
    pub categorical: BTreeMap<String, BTreeSet<String>>,
    /// Column -> inclusive `(min, max)` range.
    pub numerical: BTreeMap<String, (f64, f64)>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.categorical.is_empty() && self.numerical.is_empty()
    }
}

pub fn filter_frame(frame: &Frame, filters: &Filters) -> Result<Frame> {
    if filters.is_empty() {
        return Ok(frame.clone());
    }

    let search = match &filters.search {
        Some(s) => {
            let re = RegexBuilder::new(&s.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| PlotError::validation(format!("invalid search pattern: {e}")))?;
            Some((frame.column_index(&s.column)?, re))
        }
        None => None,
    };
    let categorical = filters
        .categorical
        .iter()
        .map(|(col, allowed)| Ok((frame.column_index(col)?, allowed)))
        .collect::<Result<Vec<_>>>()?;
    let numerical = filters
        .numerical
        .iter()
        .map(|(col, range)| Ok((frame.column_index(col)?, *range)))
        .collect::<Result<Vec<_>>>()?;

    let out = frame.retain_rows(|row| {
        if let Some((idx, re)) = &search
            && !re.is_match(&row[*idx])
        {
            return false;
        }
        if categorical
            .iter()
            .any(|(idx, allowed)| !allowed.contains(&row[*idx]))
        {
            return false;
        }
        numerical.iter().all(|(idx, (lo, hi))| {
            row[*idx]
                .parse::<f64>()
                .map(|v| v >= *lo && v <= *hi)
                .unwrap_or(false)
        })
    });
    log::debug!("filter kept {} of {} rows", out.len(), frame.len());
    Ok(out)
}

/// Map the values of one column onto new category labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recategorization {
    pub source_column: String,
    pub target_column: String,
    /// Original value -> new category.
    pub mapping: BTreeMap<String, String>,
    /// Label for unmapped values; unmapped values keep their original text when unset.
    #[serde(default)]
    pub fallback: Option<String>,
    /// Fold categories with fewer than this many rows into the fallback label ("Other").
    #[serde(default)]
    pub combine_below: Option<usize>,
}

pub fn recategorize(frame: &Frame, recat: &Recategorization) -> Result<Frame> {
    let src = frame.column_index(&recat.source_column)?;
    let mut values: Vec<String> = frame
        .rows()
        .iter()
        .map(|row| {
            let v = &row[src];
            match (recat.mapping.get(v), &recat.fallback) {
                (Some(mapped), _) => mapped.clone(),
                (None, Some(fallback)) => fallback.clone(),
                (None, None) => v.clone(),
            }
        })
        .collect();

    if let Some(min_count) = recat.combine_below {
        let other = recat.fallback.clone().unwrap_or_else(|| "Other".to_string());
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for v in &values {
            *counts.entry(v.as_str()).or_default() += 1;
        }
        let rare: BTreeSet<String> = counts
            .into_iter()
            .filter(|(_, n)| *n < min_count)
            .map(|(v, _)| v.to_string())
            .collect();
        if !rare.is_empty() {
            log::debug!("combining {} rare categories into '{other}'", rare.len());
            for v in values.iter_mut() {
                if rare.contains(v) {
                    *v = other.clone();
                }
            }
        }
    }

    frame.with_column(&recat.target_column, values)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMode {
    /// Number of rows per (bin, category).
    #[default]
    Count,
    /// Sum of the y column per (bin, category).
    Sum,
}

/// Category column order in the aggregated table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOrder {
    #[default]
    FirstSeen,
    Sorted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub time_bin_column: String,
    pub groupby_column: String,
    #[serde(default)]
    pub y_column: Option<String>,
    #[serde(default)]
    pub mode: AggregateMode,
    /// Width of the time bins; keys are floored onto `origin + k * width`.
    #[serde(default = "default_bin_width")]
    pub bin_width: i64,
    #[serde(default)]
    pub bin_origin: i64,
    #[serde(default)]
    pub order: CategoryOrder,
}

fn default_bin_width() -> i64 {
    1
}

impl AggregateSpec {
    pub fn count(time_bin_column: impl Into<String>, groupby_column: impl Into<String>) -> Self {
        Self {
            time_bin_column: time_bin_column.into(),
            groupby_column: groupby_column.into(),
            y_column: None,
            mode: AggregateMode::Count,
            bin_width: 1,
            bin_origin: 0,
            order: CategoryOrder::FirstSeen,
        }
    }

    pub fn sum(
        time_bin_column: impl Into<String>,
        groupby_column: impl Into<String>,
        y_column: impl Into<String>,
    ) -> Self {
        Self {
            y_column: Some(y_column.into()),
            mode: AggregateMode::Sum,
            ..Self::count(time_bin_column, groupby_column)
        }
    }
}

/// Bucket rows by time bin and category, counting or summing.
///
/// Every (key, category) cell that has no rows is `0`, so the resulting
/// table is dense. Totals are the per-key sum across all categories.
pub fn aggregate(frame: &Frame, spec: &AggregateSpec) -> Result<(SeriesTable, Totals)> {
    if spec.bin_width <= 0 {
        return Err(PlotError::validation(format!(
            "bin width must be positive, got {}",
            spec.bin_width
        )));
    }
    let t_idx = frame.column_index(&spec.time_bin_column)?;
    let g_idx = frame.column_index(&spec.groupby_column)?;
    let y_idx = match (spec.mode, &spec.y_column) {
        (AggregateMode::Sum, Some(col)) => Some(frame.column_index(col)?),
        (AggregateMode::Sum, None) => {
            return Err(PlotError::validation("sum aggregation needs a y column"));
        }
        (AggregateMode::Count, _) => None,
    };

    let mut categories: Vec<String> = Vec::new();
    let mut cells: BTreeMap<i64, HashMap<String, f64>> = BTreeMap::new();
    for (i, row) in frame.rows().iter().enumerate() {
        let raw_bin = &row[t_idx];
        let t = parse_bin(raw_bin).ok_or_else(|| {
            PlotError::validation(format!(
                "row {i}: '{raw_bin}' in '{}' is not a time bin",
                spec.time_bin_column
            ))
        })?;
        let key = bin_key(t, spec.bin_origin, spec.bin_width).ok_or_else(|| {
            PlotError::validation(format!(
                "row {i}: time bin {t} is out of range for origin {} and width {}",
                spec.bin_origin, spec.bin_width
            ))
        })?;
        let value = match y_idx {
            Some(idx) => row[idx].parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                PlotError::validation(format!("row {i}: '{}' is not a number", row[idx]))
            })?,
            None => 1.0,
        };
        let category = &row[g_idx];
        if !categories.contains(category) {
            categories.push(category.clone());
        }
        *cells
            .entry(key)
            .or_default()
            .entry(category.clone())
            .or_default() += value;
    }
    if matches!(spec.order, CategoryOrder::Sorted) {
        categories.sort();
    }

    let keys: Vec<i64> = cells.keys().copied().collect();
    let columns = categories
        .iter()
        .map(|c| {
            let col = cells
                .values()
                .map(|by_cat| by_cat.get(c).copied().unwrap_or(0.0))
                .collect();
            (c.clone(), col)
        })
        .collect();
    let table = SeriesTable::new(keys, columns)?;
    let totals = table.row_totals();
    log::info!(
        "aggregated {} rows into {} bins x {} categories",
        frame.len(),
        table.len(),
        table.categories().len()
    );
    Ok((table, totals))
}

/// Floor `t` onto `origin + k * width`; `None` on overflow.
fn bin_key(t: i64, origin: i64, width: i64) -> Option<i64> {
    let k = t.checked_sub(origin)?.div_euclid(width);
    origin.checked_add(k.checked_mul(width)?)
}

/// Integer time bins; accepts `2020` as well as `2020.0`.
fn parse_bin(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

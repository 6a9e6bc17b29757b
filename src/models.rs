use crate::error::{PlotError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// 8-bit RGB color. Serialized as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb8 {
    type Err = PlotError;

    /// Accepts `#RRGGBB` or `RRGGBB` (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PlotError::validation(format!("invalid color '{s}'")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| PlotError::validation(format!("invalid color '{s}'")))
        };
        Ok(Rgb8::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Rgb8 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Category name -> color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryColors(pub BTreeMap<String, Rgb8>);

impl CategoryColors {
    pub fn get(&self, category: &str) -> Option<Rgb8> {
        self.0.get(category).copied()
    }

    pub fn insert(&mut self, category: impl Into<String>, color: Rgb8) {
        self.0.insert(category.into(), color);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Rgb8)> for CategoryColors {
    fn from_iter<I: IntoIterator<Item = (String, Rgb8)>>(iter: I) -> Self {
        CategoryColors(iter.into_iter().collect())
    }
}

/// Ordered x-axis keys with one value per key for every category column.
///
/// Keys are strictly increasing, category names are unique and their order
/// drives default colors and legend order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTable {
    keys: Vec<i64>,
    categories: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SeriesTable {
    pub fn new(keys: Vec<i64>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PlotError::validation(
                "x-axis keys must be strictly increasing",
            ));
        }
        let mut seen = BTreeSet::new();
        let mut categories = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (name, col) in columns {
            if !seen.insert(name.clone()) {
                return Err(PlotError::validation(format!(
                    "duplicate category '{name}'"
                )));
            }
            if col.len() != keys.len() {
                return Err(PlotError::validation(format!(
                    "category '{name}' has {} values for {} x-axis keys",
                    col.len(),
                    keys.len()
                )));
            }
            if let Some(bad) = col.iter().find(|v| !v.is_finite()) {
                return Err(PlotError::validation(format!(
                    "category '{name}' holds a non-finite value ({bad})"
                )));
            }
            categories.push(name);
            values.push(col);
        }
        Ok(Self {
            keys,
            categories,
            columns: values,
        })
    }

    pub fn keys(&self) -> &[i64] {
        &self.keys
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn column(&self, category: &str) -> Option<&[f64]> {
        self.categories
            .iter()
            .position(|c| c == category)
            .map(|i| self.columns[i].as_slice())
    }

    /// Iterate `(category, values)` in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.categories
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Number of x-axis keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Running sum of every column along the x-axis order.
    pub fn cumulative(&self) -> SeriesTable {
        SeriesTable {
            keys: self.keys.clone(),
            categories: self.categories.clone(),
            columns: self.columns.iter().map(|c| running_sum(c)).collect(),
        }
    }

    /// Per-key sum across all categories.
    pub fn row_totals(&self) -> Totals {
        let values = (0..self.keys.len())
            .map(|i| self.columns.iter().map(|c| c[i]).sum())
            .collect();
        Totals { values }
    }
}

/// Aggregate series aligned positionally with a [`SeriesTable`]'s keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    values: Vec<f64>,
}

impl Totals {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(PlotError::validation(format!(
                "totals hold a non-finite value ({bad})"
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn cumulative(&self) -> Totals {
        Totals {
            values: running_sum(&self.values),
        }
    }
}

/// Running (prefix) sum of a slice.
pub fn running_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

//! Export series tables ("download" outputs) as CSV or JSON.

use crate::error::{PlotError, Result};
use crate::models::{SeriesTable, Totals};
use csv::WriterBuilder;
use serde::Serialize;
use serde::ser::SerializeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header of the key column when the caller does not name it.
pub const DEFAULT_X_HEADER: &str = "x";

/// Header of the totals column.
pub const TOTAL_HEADER: &str = "Total";

/// Save a table as CSV: `x,<category…>[,Total]`, one row per key.
pub fn save_csv<P: AsRef<Path>>(table: &SeriesTable, totals: Option<&Totals>, path: P) -> Result<()> {
    let path = path.as_ref();
    write_csv(table, totals, DEFAULT_X_HEADER, File::create(path)?)?;
    log::info!("saved {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Write a table as CSV to any writer, naming the key column `x_header`.
///
/// Text cells that a spreadsheet would evaluate as a formula are prefixed with `'`.
pub fn write_csv<W: Write>(
    table: &SeriesTable,
    totals: Option<&Totals>,
    x_header: &str,
    writer: W,
) -> Result<()> {
    check_totals(table, totals)?;
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header = Vec::with_capacity(table.categories().len() + 2);
    header.push(sanitize_cell(x_header));
    header.extend(table.categories().iter().map(|c| sanitize_cell(c)));
    if totals.is_some() {
        header.push(TOTAL_HEADER.to_string());
    }
    wtr.write_record(&header)?;

    for (i, key) in table.keys().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(key.to_string());
        record.extend(table.iter().map(|(_, col)| col[i].to_string()));
        if let Some(t) = totals {
            record.push(t.values()[i].to_string());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a table as pretty JSON: `{ "x": [...], "series": { category: [...] }, "total": [...] }`.
///
/// `series` keeps category order; `total` is omitted without totals.
pub fn save_json<P: AsRef<Path>>(table: &SeriesTable, totals: Option<&Totals>, path: P) -> Result<()> {
    let path = path.as_ref();
    let f = BufWriter::new(File::create(path)?);
    write_json(table, totals, f)?;
    log::info!("saved {} keys to {}", table.len(), path.display());
    Ok(())
}

pub fn write_json<W: Write>(table: &SeriesTable, totals: Option<&Totals>, mut writer: W) -> Result<()> {
    check_totals(table, totals)?;
    let export = JsonExport {
        x: table.keys(),
        series: OrderedSeries(table),
        total: totals.map(Totals::values),
    };
    serde_json::to_writer_pretty(&mut writer, &export)?;
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonExport<'a> {
    x: &'a [i64],
    series: OrderedSeries<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<&'a [f64]>,
}

struct OrderedSeries<'a>(&'a SeriesTable);

impl Serialize for OrderedSeries<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.categories().len()))?;
        for (cat, col) in self.0.iter() {
            map.serialize_entry(cat, col)?;
        }
        map.end()
    }
}

fn check_totals(table: &SeriesTable, totals: Option<&Totals>) -> Result<()> {
    match totals {
        Some(t) if t.len() != table.len() => Err(PlotError::validation(format!(
            "totals have {} values but the table has {} keys",
            t.len(),
            table.len()
        ))),
        _ => Ok(()),
    }
}

/// Prefix cells starting with `=`, `+`, `-` or `@` so spreadsheets show them as text.
pub fn sanitize_cell(s: &str) -> String {
    if s.starts_with(['=', '+', '-', '@']) {
        format!("'{s}")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table() -> SeriesTable {
        SeriesTable::new(
            vec![2020, 2021],
            vec![("A".into(), vec![1.0, 2.5]), ("B".into(), vec![0.0, -1.0])],
        )
        .unwrap()
    }

    #[test]
    fn csv_has_key_category_and_total_columns() {
        let t = table();
        let totals = t.row_totals();
        let mut buf = Vec::new();
        write_csv(&t, Some(&totals), "year", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "year,A,B,Total");
        assert_eq!(lines[1], "2020,1,0,1");
        assert_eq!(lines[2], "2021,2.5,-1,1.5");
    }

    #[test]
    fn formula_like_headers_are_prefixed() {
        let t = SeriesTable::new(vec![1], vec![("=cmd".into(), vec![1.0])]).unwrap();
        let mut buf = Vec::new();
        write_csv(&t, None, "x", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("x,'=cmd\n"));
        assert_eq!(sanitize_cell("plain"), "plain");
    }

    #[test]
    fn write_csv_and_json_files() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let t = table();
        save_csv(&t, None, &csvp).unwrap();
        save_json(&t, Some(&t.row_totals()), &jsonp).unwrap();
        assert!(csvp.exists());

        let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&jsonp).unwrap()).unwrap();
        assert_eq!(v["x"], serde_json::json!([2020, 2021]));
        assert_eq!(v["series"]["A"], serde_json::json!([1.0, 2.5]));
        assert_eq!(v["total"], serde_json::json!([1.0, 1.5]));
    }

    #[test]
    fn mismatched_totals_are_rejected() {
        let t = table();
        let short = Totals::new(vec![1.0]).unwrap();
        let e = write_json(&t, Some(&short), Vec::new()).unwrap_err();
        assert!(e.is_validation());
    }
}

//! Visualization: build line and stacked-area charts from a [`SeriesTable`] and
//! render them to **SVG** or **PNG**.
//!
//! - Colors from an explicit category map or a fixed palette (stable by category order)
//! - Optional black "Total" overlay beneath the category series
//! - Anchored legend (`legend_x`, `legend_y`, `legend_loc`), multi-column for many categories
//! - Locale-aware y tick labels (`30,000` vs `30.000`)
//! - Linear or log y axis
//!
//! Rendering is split in two: `build_*` returns a backend-independent [`Figure`],
//! `render_*` additionally hands it to a [`Presenter`].

pub mod figure;
pub mod legend;
pub mod present;
pub mod style;
pub mod text;
pub mod types;
pub mod util;

pub use figure::{Annotation, Figure, Layer, LegendEntry, LegendSpec, Mark};
pub use present::{FilePresenter, MemoryPresenter, NullPresenter, Presenter};
pub use style::{LinePlotStyle, PlotContext, StackPlotStyle};
pub use types::{AxisScale, ChartTheme, HAlign, LegendLoc, Palette};

use crate::error::{PlotError, Result};
use crate::models::{Rgb8, SeriesTable, Totals};
use crate::ticks::{HEADROOM, arange, integer_ticks, log_ticks, nice_ticks};
use std::borrow::Cow;
use std::collections::BTreeSet;

use figure::annotation_offset_px;
use util::{DPI, marker_radius_px, pt_to_px, resolve_category_colors};

/// Legend label of the totals overlay.
pub const TOTAL_LABEL: &str = "Total";

/// Relative padding added on each side of auto-computed limits.
const AUTO_MARGIN: f64 = 0.05;

/// Target tick count for default linear y ticks.
const DEFAULT_Y_TICKS: usize = 6;

/// Build a line plot and hand it to `presenter`.
///
/// See [`build_lineplot`] for the rules; nothing is presented when building fails.
pub fn render_lineplot(
    table: &SeriesTable,
    totals: Option<&Totals>,
    categories: Option<&[String]>,
    cumulative: bool,
    style: &LinePlotStyle,
    presenter: &mut dyn Presenter,
) -> Result<Figure> {
    let fig = build_lineplot(table, totals, categories, cumulative, style)?;
    presenter.present(&fig)?;
    Ok(fig)
}

/// Build a line plot: one line + markers per category, optional totals overlay,
/// legend and right-edge annotations.
///
/// `categories` selects (and orders) the drawn columns; all columns when `None`.
/// With `cumulative`, the table and totals are replaced by running sums first.
pub fn build_lineplot(
    table: &SeriesTable,
    totals: Option<&Totals>,
    categories: Option<&[String]>,
    cumulative: bool,
    style: &LinePlotStyle,
) -> Result<Figure> {
    style.validate()?;
    if table.is_empty() {
        return Err(PlotError::validation("cannot plot an empty series table"));
    }
    let drawn = select_categories(table, categories)?;
    if let Some(t) = totals
        && t.len() != table.len()
    {
        return Err(PlotError::validation(format!(
            "totals have {} values but the table has {} keys",
            t.len(),
            table.len()
        )));
    }

    let (table, totals): (Cow<'_, SeriesTable>, Option<Cow<'_, Totals>>) = if cumulative {
        (
            Cow::Owned(table.cumulative()),
            totals.map(|t| Cow::Owned(t.cumulative())),
        )
    } else {
        (Cow::Borrowed(table), totals.map(Cow::Borrowed))
    };

    let colors = resolve_category_colors(&drawn, style.category_colors.as_ref(), style.palette)?;
    let (width_px, height_px) = figure_px(style.fig_width, style.fig_height)?;
    let xs: Vec<f64> = table.keys().iter().map(|k| *k as f64).collect();

    let width = pt_to_px(style.linewidth);
    let radius = marker_radius_px(style.marker_size);

    let mut layers = Vec::new();
    let mut y_values: Vec<f64> = Vec::new();

    if let Some(t) = totals.as_deref() {
        let points: Vec<(f64, f64)> = xs.iter().copied().zip(t.values().iter().copied()).collect();
        y_values.extend_from_slice(t.values());
        layers.push(line_layer(TOTAL_LABEL, Rgb8::BLACK, 0, points.clone(), width, 0.5));
        layers.push(marker_layer(TOTAL_LABEL, Rgb8::BLACK, 1, points, radius));
    }

    let mut annotations = Vec::new();
    for (cat, color) in drawn.iter().zip(colors.iter().copied()) {
        let values = table
            .column(cat)
            .ok_or_else(|| PlotError::validation(format!("unknown category '{cat}'")))?;
        let points: Vec<(f64, f64)> = xs.iter().copied().zip(values.iter().copied()).collect();
        y_values.extend_from_slice(values);
        layers.push(line_layer(cat, color, 2, points.clone(), width, 0.5));
        layers.push(marker_layer(cat, color, 3, points, radius));

        if style.include_annotations
            && let Some(last) = values.last()
        {
            annotations.push(Annotation {
                text: cat.clone(),
                y: *last,
                align: style.annotations_ha,
                offset_px: annotation_offset_px(style.annotations_ha),
            });
        }
    }

    let x_range = match style.x_lim {
        Some(lim) => lim,
        None => auto_limits(&xs, AxisScale::Linear)?,
    };
    let y_range = match style.y_lim {
        Some(lim) => lim,
        None => auto_limits(&y_values, style.y_scale)?,
    };
    let x_ticks = x_axis_ticks(table.keys(), x_range, style.xtick_spacing)?;
    let y_ticks = y_axis_ticks(y_range, style.y_scale, style.ytick_spacing)?;

    let legend = style.include_legend.then(|| {
        let mut entries: Vec<LegendEntry> = drawn
            .iter()
            .zip(colors.iter())
            .map(|(label, color)| LegendEntry {
                label: label.clone(),
                color: *color,
            })
            .collect();
        if totals.is_some() {
            entries.push(LegendEntry {
                label: TOTAL_LABEL.to_string(),
                color: Rgb8::BLACK,
            });
        }
        LegendSpec {
            entries,
            anchor: (style.legend_x, style.legend_y),
            loc: style.legend_loc,
            columns: drawn.len() / 4 + 1,
            font_px: pt_to_px(style.context.legend_size * style.legend_scale),
        }
    });

    log::debug!(
        "lineplot: {} categories x {} keys, cumulative={cumulative}, x={x_range:?}, y={y_range:?} ({:?})",
        drawn.len(),
        xs.len(),
        style.y_scale
    );

    Ok(Figure {
        width_px,
        height_px,
        theme: style.theme,
        x_range,
        y_range,
        y_scale: style.y_scale,
        x_ticks,
        y_ticks,
        tick_font_px: pt_to_px(style.context.tick_size * style.font_scale),
        label_font_px: pt_to_px(style.context.label_size * style.font_scale),
        x_label: style.x_label.clone(),
        y_label: style.y_label.clone(),
        layers,
        legend,
        annotations,
        locale: style.locale.clone(),
    })
}

/// Build a stacked-area plot and hand it to `presenter`.
pub fn render_stackplot(
    table: &SeriesTable,
    categories: Option<&[String]>,
    style: &StackPlotStyle,
    presenter: &mut dyn Presenter,
) -> Result<Figure> {
    let fig = build_stackplot(table, categories, style)?;
    presenter.present(&fig)?;
    Ok(fig)
}

/// Build a stacked-area plot: one band per category, stacked in category order.
///
/// With `style.normalize`, each key's values are divided by that key's total so the
/// stack reaches 1 (a key whose total is zero stacks to zero). Values must not be negative.
pub fn build_stackplot(
    table: &SeriesTable,
    categories: Option<&[String]>,
    style: &StackPlotStyle,
) -> Result<Figure> {
    style.validate()?;
    if table.is_empty() {
        return Err(PlotError::validation("cannot plot an empty series table"));
    }
    let drawn = select_categories(table, categories)?;
    let columns: Vec<&[f64]> = drawn
        .iter()
        .map(|cat| {
            table
                .column(cat)
                .ok_or_else(|| PlotError::validation(format!("unknown category '{cat}'")))
        })
        .collect::<Result<_>>()?;
    if let Some((cat, v)) = drawn
        .iter()
        .zip(columns.iter())
        .find_map(|(cat, col)| col.iter().find(|v| **v < 0.0).map(|v| (cat, *v)))
    {
        return Err(PlotError::validation(format!(
            "stack plots need non-negative values; '{cat}' has {v}"
        )));
    }

    let colors = resolve_category_colors(&drawn, style.category_colors.as_ref(), style.palette)?;
    let (width_px, height_px) = figure_px(style.fig_width, style.fig_height)?;
    let xs: Vec<f64> = table.keys().iter().map(|k| *k as f64).collect();

    let key_totals: Vec<f64> = (0..xs.len())
        .map(|i| columns.iter().map(|col| col[i]).sum())
        .collect();

    let mut baseline = vec![0.0; xs.len()];
    let mut layers = Vec::with_capacity(drawn.len());
    for (z, ((cat, col), color)) in drawn.iter().zip(columns.iter()).zip(colors.iter()).enumerate() {
        let mut lower = Vec::with_capacity(xs.len());
        let mut upper = Vec::with_capacity(xs.len());
        for (i, x) in xs.iter().copied().enumerate() {
            let v = if style.normalize {
                if key_totals[i] > 0.0 {
                    col[i] / key_totals[i]
                } else {
                    0.0
                }
            } else {
                col[i]
            };
            lower.push((x, baseline[i]));
            baseline[i] += v;
            upper.push((x, baseline[i]));
        }
        layers.push(Layer {
            label: cat.clone(),
            color: *color,
            z_order: z as i32,
            mark: Mark::Band {
                lower,
                upper,
                alpha: style.alpha,
            },
        });
    }

    let x_range = match style.x_lim {
        Some(lim) => lim,
        None => auto_limits(&xs, AxisScale::Linear)?,
    };
    let y_range = match style.y_lim {
        Some(lim) => lim,
        None if style.normalize => (0.0, 1.0),
        None => {
            let top = key_totals.iter().copied().fold(0.0, f64::max);
            if top > 0.0 { (0.0, top * HEADROOM) } else { (0.0, 1.0) }
        }
    };
    let x_ticks = x_axis_ticks(table.keys(), x_range, style.xtick_spacing)?;
    let y_ticks = y_axis_ticks(y_range, AxisScale::Linear, style.ytick_spacing)?;

    let legend = style.include_legend.then(|| LegendSpec {
        entries: drawn
            .iter()
            .zip(colors.iter())
            .map(|(label, color)| LegendEntry {
                label: label.clone(),
                color: *color,
            })
            .collect(),
        anchor: (style.legend_x, style.legend_y),
        loc: style.legend_loc,
        columns: drawn.len() / 4 + 1,
        font_px: pt_to_px(style.context.legend_size * style.legend_scale),
    });

    log::debug!(
        "stackplot: {} categories x {} keys, normalize={}, y={y_range:?}",
        drawn.len(),
        xs.len(),
        style.normalize
    );

    Ok(Figure {
        width_px,
        height_px,
        theme: style.theme,
        x_range,
        y_range,
        y_scale: AxisScale::Linear,
        x_ticks,
        y_ticks,
        tick_font_px: pt_to_px(style.context.tick_size * style.font_scale),
        label_font_px: pt_to_px(style.context.label_size * style.font_scale),
        x_label: style.x_label.clone(),
        y_label: style.y_label.clone(),
        layers,
        legend,
        annotations: Vec::new(),
        locale: style.locale.clone(),
    })
}

/// Resolve which columns to draw and in what order.
fn select_categories(table: &SeriesTable, categories: Option<&[String]>) -> Result<Vec<String>> {
    let Some(requested) = categories else {
        return Ok(table.categories().to_vec());
    };
    if requested.is_empty() {
        return Err(PlotError::validation("no categories selected"));
    }
    let mut seen = BTreeSet::new();
    for cat in requested {
        if table.column(cat).is_none() {
            return Err(PlotError::validation(format!("unknown category '{cat}'")));
        }
        if !seen.insert(cat.as_str()) {
            return Err(PlotError::validation(format!("category '{cat}' selected twice")));
        }
    }
    Ok(requested.to_vec())
}

fn figure_px(width_in: f64, height_in: f64) -> Result<(u32, u32)> {
    let w = (width_in * DPI).round();
    let h = (height_in * DPI).round();
    if w < 1.0 || h < 1.0 {
        return Err(PlotError::validation(format!(
            "figure size {width_in}x{height_in} in is too small"
        )));
    }
    Ok((w as u32, h as u32))
}

fn line_layer(label: &str, color: Rgb8, z_order: i32, points: Vec<(f64, f64)>, width_px: f64, alpha: f64) -> Layer {
    Layer {
        label: label.to_string(),
        color,
        z_order,
        mark: Mark::Line {
            points,
            width_px,
            alpha,
        },
    }
}

fn marker_layer(label: &str, color: Rgb8, z_order: i32, points: Vec<(f64, f64)>, radius_px: f64) -> Layer {
    Layer {
        label: label.to_string(),
        color,
        z_order,
        mark: Mark::Markers { points, radius_px },
    }
}

/// Data range padded by [`AUTO_MARGIN`] on each side; in log10 space for log axes.
pub(crate) fn auto_limits(values: &[f64], scale: AxisScale) -> Result<(f64, f64)> {
    match scale {
        AxisScale::Linear => {
            let (lo, hi) = min_max(values.iter().copied())
                .ok_or_else(|| PlotError::validation("no data to derive axis limits from"))?;
            if lo == hi {
                let pad = if lo == 0.0 { 1.0 } else { lo.abs() * AUTO_MARGIN };
                return Ok((lo - pad, hi + pad));
            }
            let pad = (hi - lo) * AUTO_MARGIN;
            Ok((lo - pad, hi + pad))
        }
        AxisScale::Log => {
            let (lo, hi) = min_max(values.iter().copied().filter(|v| *v > 0.0))
                .ok_or_else(|| PlotError::domain("log scale needs at least one positive value"))?;
            let (l, h) = (lo.log10(), hi.log10());
            if l == h {
                return Ok((10f64.powf(l - AUTO_MARGIN), 10f64.powf(h + AUTO_MARGIN)));
            }
            let pad = (h - l) * AUTO_MARGIN;
            Ok((10f64.powf(l - pad), 10f64.powf(h + pad)))
        }
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn x_axis_ticks(keys: &[i64], range: (f64, f64), spacing: Option<f64>) -> Result<Vec<f64>> {
    match spacing {
        Some(step) => arange(range.0, range.1, step),
        None => Ok(integer_ticks(keys)),
    }
}

fn y_axis_ticks(range: (f64, f64), scale: AxisScale, spacing: Option<f64>) -> Result<Vec<f64>> {
    match (spacing, scale) {
        (Some(step), _) => arange(range.0, range.1, step),
        (None, AxisScale::Linear) => Ok(nice_ticks(range.0, range.1, DEFAULT_Y_TICKS)),
        (None, AxisScale::Log) => Ok(log_ticks(range.0, range.1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SeriesTable {
        SeriesTable::new(
            vec![2019, 2020, 2021],
            vec![
                ("A".into(), vec![1.0, 2.0, 3.0]),
                ("B".into(), vec![0.0, 1.0, 1.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn linear_auto_limits_pad_five_percent() {
        let (lo, hi) = auto_limits(&[0.0, 10.0], AxisScale::Linear).unwrap();
        assert!((lo + 0.5).abs() < 1e-9);
        assert!((hi - 10.5).abs() < 1e-9);
        let (lo, hi) = auto_limits(&[0.0], AxisScale::Linear).unwrap();
        assert_eq!((lo, hi), (-1.0, 1.0));
    }

    #[test]
    fn log_auto_limits_ignore_non_positive_values() {
        let (lo, hi) = auto_limits(&[0.0, 1.0, 100.0], AxisScale::Log).unwrap();
        assert!(lo < 1.0 && lo > 0.0);
        assert!(hi > 100.0);
        assert!(auto_limits(&[0.0, -3.0], AxisScale::Log).unwrap_err().is_domain());
    }

    #[test]
    fn selection_keeps_requested_order() {
        let t = table();
        let sel = select_categories(&t, Some(&["B".to_string(), "A".to_string()])).unwrap();
        assert_eq!(sel, vec!["B", "A"]);
        assert!(select_categories(&t, Some(&["Z".to_string()])).unwrap_err().is_validation());
        assert!(
            select_categories(&t, Some(&["A".to_string(), "A".to_string()]))
                .unwrap_err()
                .is_validation()
        );
    }

    #[test]
    fn totals_layers_sit_below_categories() {
        let t = table();
        let totals = t.row_totals();
        let fig = build_lineplot(&t, Some(&totals), None, false, &LinePlotStyle::default()).unwrap();
        let total_z: Vec<i32> = fig.layers_for(TOTAL_LABEL).map(|l| l.z_order).collect();
        let a_z: Vec<i32> = fig.layers_for("A").map(|l| l.z_order).collect();
        assert!(total_z.iter().max() < a_z.iter().min());
        assert_eq!(fig.legend_labels(), vec!["A", "B", TOTAL_LABEL]);
    }

    #[test]
    fn stack_bands_reach_one_when_normalized() {
        let fig = build_stackplot(&table(), None, &StackPlotStyle::default()).unwrap();
        let Some(Mark::Band { upper, .. }) = fig.layers.last().map(|l| &l.mark) else {
            panic!("expected a band layer");
        };
        assert!((upper[1].1 - 1.0).abs() < 1e-9);
        // 2019: A=1, B=0 still sums to one
        assert!((upper[0].1 - 1.0).abs() < 1e-9);
        assert_eq!(fig.y_range, (0.0, 1.0));
    }
}

//! Legend layout and drawing for the anchored legend box.
//!
//! Entries fill the box column-major (top to bottom, then left to right), the
//! box is opaque, and its position is given by an anchor point in axis
//! fractions plus a [`LegendLoc`] naming which point of the box sits on it.

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};

use super::figure::LegendEntry;
use super::text::{estimate_text_width_px, truncate_to_width};
use super::types::LegendLoc;
use crate::error::{Result, render_err};

// Layout constants (shared by layout and drawing)
const PAD_X: i32 = 8;
const PAD_Y: i32 = 6;
const ROW_GAP: i32 = 4;
const MARKER_RADIUS: i32 = 4;
const MARKER_TO_TEXT_GAP: i32 = 8;
const TRAILING_GAP: i32 = 12;

/// Pixel geometry of a legend box, independent of where it is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendLayout {
    pub width: i32,
    pub height: i32,
    pub rows: usize,
    pub columns: usize,
    pub font_px: u32,
    /// Left edge of each column, relative to the box's left edge.
    pub col_x: Vec<i32>,
    /// Display text per entry (truncated to fit).
    pub labels: Vec<String>,
}

impl LegendLayout {
    fn line_h(&self) -> i32 {
        self.font_px as i32 + ROW_GAP
    }

    /// Top-left offset of entry `i` relative to the box's top-left corner.
    pub fn entry_origin(&self, i: usize) -> (i32, i32) {
        let col = i / self.rows;
        let row = i % self.rows;
        (self.col_x[col], PAD_Y + row as i32 * self.line_h())
    }
}

/// Size a legend for `labels` spread over at most `max_columns` columns.
pub fn layout_legend(labels: &[String], max_columns: usize, font_px: u32, max_label_px: u32) -> LegendLayout {
    let n = labels.len().max(1);
    let max_columns = max_columns.clamp(1, n);
    let rows = n.div_ceil(max_columns);
    let columns = n.div_ceil(rows);

    let labels: Vec<String> = labels
        .iter()
        .map(|l| truncate_to_width(l, font_px, max_label_px))
        .collect();

    let mut col_x = Vec::with_capacity(columns);
    let mut x = PAD_X;
    for c in 0..columns {
        col_x.push(x);
        let text_w = labels
            .iter()
            .skip(c * rows)
            .take(rows)
            .map(|l| estimate_text_width_px(l, font_px) as i32)
            .max()
            .unwrap_or(0);
        x += MARKER_RADIUS * 2 + MARKER_TO_TEXT_GAP + text_w;
        if c + 1 < columns {
            x += TRAILING_GAP;
        }
    }
    let line_h = font_px as i32 + ROW_GAP;
    LegendLayout {
        width: x + PAD_X,
        height: PAD_Y * 2 + rows as i32 * line_h - ROW_GAP,
        rows,
        columns,
        font_px,
        col_x,
        labels,
    }
}

/// Top-left corner of a `w x h` box whose `loc` point sits on `anchor`.
pub fn place_legend(anchor: (i32, i32), loc: LegendLoc, w: i32, h: i32) -> (i32, i32) {
    let (ax, ay) = anchor;
    let x = match loc {
        LegendLoc::UpperLeft | LegendLoc::LowerLeft | LegendLoc::CenterLeft => ax,
        LegendLoc::UpperRight | LegendLoc::LowerRight | LegendLoc::CenterRight => ax - w,
        LegendLoc::LowerCenter | LegendLoc::UpperCenter | LegendLoc::Center => ax - w / 2,
    };
    let y = match loc {
        LegendLoc::UpperLeft | LegendLoc::UpperRight | LegendLoc::UpperCenter => ay,
        LegendLoc::LowerLeft | LegendLoc::LowerRight | LegendLoc::LowerCenter => ay - h,
        LegendLoc::CenterLeft | LegendLoc::CenterRight | LegendLoc::Center => ay - h / 2,
    };
    (x, y)
}

/// How far the box reaches above and to the right of its anchor, in pixels.
pub fn extent_beyond_anchor(loc: LegendLoc, w: i32, h: i32) -> (i32, i32) {
    let (x, y) = place_legend((0, 0), loc, w, h);
    ((-y).max(0), (x + w).max(0))
}

/// Draw the legend box with its top-left corner at `origin` (root pixel coordinates).
pub fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &LegendLayout,
    entries: &[LegendEntry],
    origin: (i32, i32),
) -> Result<()> {
    let (x0, y0) = origin;
    let (x1, y1) = (x0 + layout.width, y0 + layout.height);
    root.draw(&Rectangle::new([(x0, y0), (x1, y1)], WHITE.filled()))
        .map_err(render_err)?;
    root.draw(&Rectangle::new(
        [(x0, y0), (x1, y1)],
        RGBColor(204, 204, 204).stroke_width(1),
    ))
    .map_err(render_err)?;

    let label_style = FontDesc::new(FontFamily::SansSerif, layout.font_px as f64, FontStyle::Normal)
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    let line_h = layout.font_px as i32 + ROW_GAP;

    for (i, (entry, text)) in entries.iter().zip(layout.labels.iter()).enumerate() {
        let (ex, ey) = layout.entry_origin(i);
        let cy = y0 + ey + (line_h - ROW_GAP) / 2;
        let marker_x = x0 + ex + MARKER_RADIUS;
        let color = RGBColor(entry.color.r, entry.color.g, entry.color.b);
        root.draw(&Circle::new((marker_x, cy), MARKER_RADIUS, color.filled()))
            .map_err(render_err)?;
        root.draw(&Text::new(
            text.clone(),
            (marker_x + MARKER_RADIUS + MARKER_TO_TEXT_GAP, cy),
            label_style.clone(),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

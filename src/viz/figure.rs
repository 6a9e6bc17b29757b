//! Rendered figure: a backend-independent description of one chart plus the
//! code that draws it onto a plotters backend (SVG string, SVG file, or PNG).

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::prelude::IntoLogRange;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle, FontTransform};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use serde::Serialize;
use std::ops::Range;
use std::path::Path;
use std::sync::Once;

use super::legend::{LegendLayout, draw_legend, extent_beyond_anchor, layout_legend, place_legend};
use super::text::estimate_text_width_px;
use super::types::{AxisScale, ChartTheme, HAlign, LegendLoc};
use super::util::{compute_left_label_area_px, format_x_tick, format_y_tick, pt_to_px};
use crate::error::{PlotError, Result, render_err};
use crate::models::Rgb8;

const MARGIN: i32 = 16;

/// One-time registration for a fallback "sans-serif" font when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let _ = plotters::style::register_font(
            "sans-serif",
            FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

/// What a layer draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Mark {
    /// Connected line through `points`.
    Line {
        points: Vec<(f64, f64)>,
        width_px: f64,
        alpha: f64,
    },
    /// One filled circle per point.
    Markers { points: Vec<(f64, f64)>, radius_px: f64 },
    /// Filled region between two curves over the same x values.
    Band {
        lower: Vec<(f64, f64)>,
        upper: Vec<(f64, f64)>,
        alpha: f64,
    },
}

/// A drawn series. Layers are painted in ascending `z_order`; ties keep insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub label: String,
    pub color: Rgb8,
    pub z_order: i32,
    pub mark: Mark,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendSpec {
    pub entries: Vec<LegendEntry>,
    /// Anchor in axis fractions.
    pub anchor: (f64, f64),
    pub loc: LegendLoc,
    /// Maximum number of legend columns.
    pub columns: usize,
    pub font_px: f64,
}

/// Text placed just outside the right edge of the axes at data height `y`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub y: f64,
    pub align: HAlign,
    /// Horizontal offset from the axes edge in pixels (positive = outward).
    pub offset_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub width_px: u32,
    pub height_px: u32,
    pub theme: ChartTheme,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub y_scale: AxisScale,
    pub x_ticks: Vec<f64>,
    pub y_ticks: Vec<f64>,
    pub tick_font_px: f64,
    pub label_font_px: f64,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub layers: Vec<Layer>,
    pub legend: Option<LegendSpec>,
    pub annotations: Vec<Annotation>,
    pub locale: String,
}

impl Figure {
    /// Legend labels in display order (empty when the legend is off).
    pub fn legend_labels(&self) -> Vec<&str> {
        self.legend
            .as_ref()
            .map(|l| l.entries.iter().map(|e| e.label.as_str()).collect())
            .unwrap_or_default()
    }

    /// The color each labeled series is drawn with, in first-drawn order.
    pub fn series_colors(&self) -> Vec<(&str, Rgb8)> {
        let mut out: Vec<(&str, Rgb8)> = Vec::new();
        for layer in &self.layers {
            if !out.iter().any(|(l, _)| *l == layer.label) {
                out.push((layer.label.as_str(), layer.color));
            }
        }
        out
    }

    /// Layers belonging to one series label.
    pub fn layers_for<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Layer> + 'a {
        self.layers.iter().filter(move |l| l.label == label)
    }

    /// Render to SVG markup.
    pub fn to_svg(&self) -> Result<String> {
        ensure_fonts_registered();
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (self.width_px, self.height_px))
                .into_drawing_area();
            draw_figure(&root, self)?;
            root.present().map_err(render_err)?;
        }
        Ok(buf)
    }

    /// Write the figure to `path`: SVG for `.svg`, PNG (bitmap) otherwise.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ensure_fonts_registered();
        let out_path = path.as_ref();
        let path_string = out_path.to_string_lossy().into_owned();
        let size = (self.width_px, self.height_px);

        if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
            let root = SVGBackend::new(path_string.as_str(), size).into_drawing_area();
            draw_figure(&root, self)?;
            root.present().map_err(render_err)?;
        } else {
            let root = BitMapBackend::new(path_string.as_str(), size).into_drawing_area();
            draw_figure(&root, self)?;
            root.present().map_err(render_err)?;
        }
        log::info!("wrote figure to {}", out_path.display());
        Ok(())
    }
}

#[inline]
fn rgb(c: Rgb8) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn text_style(px: f64, color: Rgb8, h: HPos, v: VPos) -> TextStyle<'static> {
    FontDesc::new(FontFamily::SansSerif, px, FontStyle::Normal)
        .color(&rgb(color))
        .pos(Pos::new(h, v))
}

fn hpos(align: HAlign) -> HPos {
    match align {
        HAlign::Left => HPos::Left,
        HAlign::Center => HPos::Center,
        HAlign::Right => HPos::Right,
    }
}

/// Pixel room an annotation needs to the right of the axes.
fn annotation_extent_px(a: &Annotation, font_px: u32) -> i32 {
    let w = estimate_text_width_px(&a.text, font_px) as i32;
    let off = a.offset_px.round() as i32;
    let right = match a.align {
        HAlign::Left => off + w,
        HAlign::Center => off + w / 2,
        HAlign::Right => off,
    };
    right.max(0) + 4
}

fn draw_figure<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, fig: &Figure) -> Result<()> {
    let (x0, x1) = fig.x_range;
    let (y0, y1) = fig.y_range;
    if !(x0 < x1 && y0 < y1) {
        return Err(PlotError::validation(format!(
            "empty axis range x=({x0}, {x1}) y=({y0}, {y1})"
        )));
    }
    if fig.y_scale == AxisScale::Log && y0 <= 0.0 {
        return Err(PlotError::domain("log-scaled axis must start above zero"));
    }

    root.fill(&WHITE).map_err(render_err)?;

    // ----------------------------
    // 1) Gutters
    // ----------------------------
    let tick_px = fig.tick_font_px.round().max(1.0) as u32;
    let label_px = fig.label_font_px.round().max(1.0) as u32;

    let y_tick_labels: Vec<String> = fig
        .y_ticks
        .iter()
        .map(|v| format_y_tick(*v, &fig.locale))
        .collect();
    let left_area = compute_left_label_area_px(
        &y_tick_labels,
        tick_px,
        fig.y_label.as_ref().map(|_| label_px),
    );
    let bottom_area = tick_px + 14 + fig.x_label.as_ref().map_or(0, |_| label_px + 10);

    let legend_layout: Option<LegendLayout> = fig.legend.as_ref().map(|spec| {
        let labels: Vec<String> = spec.entries.iter().map(|e| e.label.clone()).collect();
        let font = spec.font_px.round().max(1.0) as u32;
        layout_legend(&labels, spec.columns, font, (fig.width_px as f64 * 0.35) as u32)
    });

    // Room for legends anchored on or beyond the top/right axes edges.
    let (mut extra_top, mut extra_right) = (0, 0);
    if let (Some(spec), Some(layout)) = (fig.legend.as_ref(), legend_layout.as_ref()) {
        let (above, right) = extent_beyond_anchor(spec.loc, layout.width, layout.height);
        if spec.anchor.1 >= 1.0 {
            extra_top = above;
        }
        if spec.anchor.0 >= 1.0 {
            extra_right = right;
        }
    }
    let annot_right = fig
        .annotations
        .iter()
        .map(|a| annotation_extent_px(a, tick_px))
        .max()
        .unwrap_or(0);
    extra_right = extra_right.max(annot_right);

    // ----------------------------
    // 2) Chart
    // ----------------------------
    let mut builder = ChartBuilder::on(root);
    builder
        .margin(MARGIN as u32)
        .margin_top((MARGIN + extra_top) as u32)
        .margin_right((MARGIN + extra_right) as u32)
        .set_label_area_size(LabelAreaPosition::Left, left_area)
        .set_label_area_size(LabelAreaPosition::Bottom, bottom_area);

    match fig.y_scale {
        AxisScale::Linear => {
            let mut chart = builder
                .build_cartesian_2d(x0..x1, y0..y1)
                .map_err(render_err)?;
            draw_plot(root, &mut chart, fig, &y_tick_labels, legend_layout.as_ref())
        }
        AxisScale::Log => {
            let mut chart = builder
                .build_cartesian_2d(x0..x1, (y0..y1).log_scale())
                .map_err(render_err)?;
            draw_plot(root, &mut chart, fig, &y_tick_labels, legend_layout.as_ref())
        }
    }
}

fn draw_plot<DB, Y>(
    root: &DrawingArea<DB, Shift>,
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, Y>>,
    fig: &Figure,
    y_tick_labels: &[String],
    legend_layout: Option<&LegendLayout>,
) -> Result<()>
where
    DB: DrawingBackend,
    Y: Ranged<ValueType = f64>,
{
    let (x0, x1) = fig.x_range;
    let (y0, y1) = fig.y_range;
    let in_x = |x: f64| x >= x0 - 1e-9 && x <= x1 + 1e-9;
    let in_y = |y: f64| y >= y0 - 1e-9 * y0.abs().max(1.0) && y <= y1 + 1e-9 * y1.abs().max(1.0);

    chart
        .plotting_area()
        .fill(&rgb(fig.theme.background()))
        .map_err(render_err)?;
    let (px_range, py_range): (Range<i32>, Range<i32>) = chart.plotting_area().get_pixel_range();

    // ----------------------------
    // 1) Grid & spines
    // ----------------------------
    if let Some(grid) = fig.theme.grid() {
        let style = rgb(grid).stroke_width(1);
        for x in fig.x_ticks.iter().copied().filter(|x| in_x(*x)) {
            chart
                .draw_series(std::iter::once(PathElement::new(vec![(x, y0), (x, y1)], style)))
                .map_err(render_err)?;
        }
        for y in fig.y_ticks.iter().copied().filter(|y| in_y(*y)) {
            chart
                .draw_series(std::iter::once(PathElement::new(vec![(x0, y), (x1, y)], style)))
                .map_err(render_err)?;
        }
    }
    let spine = if fig.theme.draws_spines() {
        RGBColor(38, 38, 38)
    } else {
        RGBColor(204, 204, 204)
    };
    if fig.theme != ChartTheme::DarkGrid {
        root.draw(&Rectangle::new(
            [
                (px_range.start, py_range.start),
                (px_range.end, py_range.end),
            ],
            spine.stroke_width(1),
        ))
        .map_err(render_err)?;
    }

    // ----------------------------
    // 2) Series, lowest z-order first
    // ----------------------------
    let mut layers: Vec<&Layer> = fig.layers.iter().collect();
    layers.sort_by_key(|l| l.z_order);
    for layer in layers {
        let color = rgb(layer.color);
        match &layer.mark {
            Mark::Line {
                points,
                width_px,
                alpha,
            } => {
                let width = width_px.round().max(1.0) as u32;
                chart
                    .draw_series(LineSeries::new(
                        points.iter().copied(),
                        color.mix(*alpha).stroke_width(width),
                    ))
                    .map_err(render_err)?;
            }
            Mark::Markers { points, radius_px } => {
                let r = radius_px.round().max(1.0) as i32;
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|&(x, y)| Circle::new((x, y), r, color.filled())),
                    )
                    .map_err(render_err)?;
            }
            Mark::Band { lower, upper, alpha } => {
                // polygon: lower (forward) + upper (reverse)
                let mut poly: Vec<(f64, f64)> = Vec::with_capacity(lower.len() + upper.len());
                poly.extend(lower.iter().copied());
                poly.extend(upper.iter().rev().copied());
                chart
                    .draw_series(std::iter::once(Polygon::new(poly, color.mix(*alpha).filled())))
                    .map_err(render_err)?;
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        upper.clone(),
                        color.stroke_width(1),
                    )))
                    .map_err(render_err)?;
            }
        }
    }

    // ----------------------------
    // 3) Tick labels & axis titles
    // ----------------------------
    let tick_px = fig.tick_font_px;
    let tick_color = Rgb8::new(38, 38, 38);
    let tick_mark = fig.theme.draws_spines();
    for x in fig.x_ticks.iter().copied().filter(|x| in_x(*x)) {
        let (px, py) = chart.plotting_area().map_coordinate(&(x, y0));
        if tick_mark {
            root.draw(&PathElement::new(vec![(px, py), (px, py + 4)], spine.stroke_width(1)))
                .map_err(render_err)?;
        }
        root.draw(&Text::new(
            format_x_tick(x),
            (px, py + 6),
            text_style(tick_px, tick_color, HPos::Center, VPos::Top),
        ))
        .map_err(render_err)?;
    }
    for (y, label) in fig.y_ticks.iter().copied().zip(y_tick_labels.iter()) {
        if !in_y(y) {
            continue;
        }
        let (px, py) = chart.plotting_area().map_coordinate(&(x0, y));
        if tick_mark {
            root.draw(&PathElement::new(vec![(px - 4, py), (px, py)], spine.stroke_width(1)))
                .map_err(render_err)?;
        }
        root.draw(&Text::new(
            label.clone(),
            (px - 6, py),
            text_style(tick_px, tick_color, HPos::Right, VPos::Center),
        ))
        .map_err(render_err)?;
    }

    let label_px = fig.label_font_px;
    if let Some(x_label) = &fig.x_label {
        let cx = (px_range.start + px_range.end) / 2;
        let top = py_range.end + tick_px.round() as i32 + 14;
        root.draw(&Text::new(
            x_label.clone(),
            (cx, top),
            text_style(label_px, tick_color, HPos::Center, VPos::Top),
        ))
        .map_err(render_err)?;
    }
    if let Some(y_label) = &fig.y_label {
        let cy = (py_range.start + py_range.end) / 2;
        let cx = MARGIN + (label_px / 2.0).round() as i32 + 2;
        root.draw(&Text::new(
            y_label.clone(),
            (cx, cy),
            text_style(label_px, tick_color, HPos::Center, VPos::Center)
                .transform(FontTransform::Rotate270),
        ))
        .map_err(render_err)?;
    }

    // ----------------------------
    // 4) Annotations (white halo behind the text)
    // ----------------------------
    for a in &fig.annotations {
        if !in_y(a.y) {
            log::debug!("annotation '{}' at y={} is outside the y range", a.text, a.y);
            continue;
        }
        let (px, py) = chart.plotting_area().map_coordinate(&(x1, a.y));
        let x = px + a.offset_px.round() as i32;
        let h = hpos(a.align);
        for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, 1), (-1, 1), (1, -1)] {
            root.draw(&Text::new(
                a.text.clone(),
                (x + dx, py + dy),
                text_style(tick_px, Rgb8::WHITE, h, VPos::Center),
            ))
            .map_err(render_err)?;
        }
        root.draw(&Text::new(
            a.text.clone(),
            (x, py),
            text_style(tick_px, Rgb8::BLACK, h, VPos::Center),
        ))
        .map_err(render_err)?;
    }

    // ----------------------------
    // 5) Legend
    // ----------------------------
    if let (Some(spec), Some(layout)) = (fig.legend.as_ref(), legend_layout) {
        let w = (px_range.end - px_range.start) as f64;
        let h = (py_range.end - py_range.start) as f64;
        let anchor = (
            px_range.start + (spec.anchor.0 * w).round() as i32,
            py_range.end - (spec.anchor.1 * h).round() as i32,
        );
        let origin = place_legend(anchor, spec.loc, layout.width, layout.height);
        draw_legend(root, layout, &spec.entries, origin)?;
    }

    Ok(())
}

/// Margin (in points) between the axes edge and an annotation.
pub(crate) fn annotation_offset_px(align: HAlign) -> f64 {
    let pt = if align == HAlign::Left { 5.0 } else { -5.0 };
    pt_to_px(pt)
}

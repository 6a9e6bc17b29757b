//! Typed style configuration for the renderers.
//!
//! Every field has a documented default; style files are JSON and only need
//! to name the fields they override (`#[serde(default)]`).

use crate::error::{PlotError, Result};
use crate::models::CategoryColors;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::{AxisScale, ChartTheme, HAlign, LegendLoc, Palette};

/// Base font sizes (points) that `font_scale` / `legend_scale` multiply.
///
/// Defaults match the common "notebook" plotting context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotContext {
    pub label_size: f64,
    pub tick_size: f64,
    pub legend_size: f64,
}

impl Default for PlotContext {
    fn default() -> Self {
        Self {
            label_size: 12.0,
            tick_size: 11.0,
            legend_size: 11.0,
        }
    }
}

impl PlotContext {
    /// "paper" context: everything at 0.8x of notebook.
    pub fn paper() -> Self {
        Self::default().scaled(0.8)
    }

    /// "talk" context: 1.5x of notebook.
    pub fn talk() -> Self {
        Self::default().scaled(1.5)
    }

    fn scaled(self, f: f64) -> Self {
        Self {
            label_size: self.label_size * f,
            tick_size: self.tick_size * f,
            legend_size: self.legend_size * f,
        }
    }
}

/// Options for [`super::render_lineplot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePlotStyle {
    /// X axis label; not drawn when unset.
    pub x_label: Option<String>,
    /// Y axis label; not drawn when unset.
    pub y_label: Option<String>,
    /// Figure width in inches (default 12.8).
    pub fig_width: f64,
    /// Figure height in inches (default 4.8).
    pub fig_height: f64,
    pub y_scale: AxisScale,
    /// Explicit x limits; auto (data range + 5 % margins) when unset.
    pub x_lim: Option<(f64, f64)>,
    /// Explicit y limits; auto when unset.
    pub y_lim: Option<(f64, f64)>,
    /// Distance between x ticks in data units; one tick per x key when unset.
    pub xtick_spacing: Option<f64>,
    /// Distance between y ticks in data units; default ticks when unset.
    pub ytick_spacing: Option<f64>,
    /// Multiplies axis label and tick font sizes.
    pub font_scale: f64,
    /// Line width in points.
    pub linewidth: f64,
    /// Marker area in points squared.
    pub marker_size: f64,
    /// Explicit per-category colors; palette order when unset.
    pub category_colors: Option<CategoryColors>,
    pub palette: Palette,
    pub theme: ChartTheme,
    pub context: PlotContext,
    pub include_legend: bool,
    /// Legend anchor x, in axis fractions.
    pub legend_x: f64,
    /// Legend anchor y, in axis fractions.
    pub legend_y: f64,
    pub legend_loc: LegendLoc,
    /// Multiplies the legend font size.
    pub legend_scale: f64,
    /// Label each line with its category at the right edge.
    pub include_annotations: bool,
    pub annotations_ha: HAlign,
    /// Locale tag for y tick labels (`en`, `de`, ...).
    pub locale: String,
}

impl Default for LinePlotStyle {
    fn default() -> Self {
        Self {
            x_label: None,
            y_label: None,
            fig_width: 6.4 * 2.0,
            fig_height: 4.8,
            y_scale: AxisScale::Linear,
            x_lim: None,
            y_lim: None,
            xtick_spacing: None,
            ytick_spacing: None,
            font_scale: 1.0,
            linewidth: 2.0,
            marker_size: 30.0,
            category_colors: None,
            palette: Palette::Deep,
            theme: ChartTheme::WhiteGrid,
            context: PlotContext::default(),
            include_legend: true,
            legend_x: 1.0,
            legend_y: 1.0,
            legend_loc: LegendLoc::LowerRight,
            legend_scale: 1.0,
            include_annotations: false,
            annotations_ha: HAlign::Left,
            locale: "en".to_string(),
        }
    }
}

impl LinePlotStyle {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_figure(self.fig_width, self.fig_height)?;
        validate_positive("font_scale", self.font_scale)?;
        validate_positive("legend_scale", self.legend_scale)?;
        validate_non_negative("linewidth", self.linewidth)?;
        validate_non_negative("marker_size", self.marker_size)?;
        validate_lim("x_lim", self.x_lim)?;
        validate_lim("y_lim", self.y_lim)?;
        if let Some((lo, _)) = self.y_lim
            && self.y_scale == AxisScale::Log
            && lo <= 0.0
        {
            return Err(PlotError::domain("log-scaled y_lim must start above zero"));
        }
        Ok(())
    }
}

/// Options for [`super::render_stackplot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackPlotStyle {
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub fig_width: f64,
    pub fig_height: f64,
    /// Stack per-key fractions (each key sums to 1) instead of raw values.
    pub normalize: bool,
    pub x_lim: Option<(f64, f64)>,
    pub y_lim: Option<(f64, f64)>,
    pub xtick_spacing: Option<f64>,
    pub ytick_spacing: Option<f64>,
    pub font_scale: f64,
    /// Fill opacity of the stacked bands.
    pub alpha: f64,
    pub category_colors: Option<CategoryColors>,
    pub palette: Palette,
    pub theme: ChartTheme,
    pub context: PlotContext,
    pub include_legend: bool,
    pub legend_x: f64,
    pub legend_y: f64,
    pub legend_loc: LegendLoc,
    pub legend_scale: f64,
    pub locale: String,
}

impl Default for StackPlotStyle {
    fn default() -> Self {
        Self {
            x_label: None,
            y_label: None,
            fig_width: 6.4 * 2.0,
            fig_height: 4.8,
            normalize: true,
            x_lim: None,
            y_lim: None,
            xtick_spacing: None,
            ytick_spacing: None,
            font_scale: 1.0,
            alpha: 0.8,
            category_colors: None,
            palette: Palette::Deep,
            theme: ChartTheme::WhiteGrid,
            context: PlotContext::default(),
            include_legend: true,
            legend_x: 1.0,
            legend_y: 1.0,
            legend_loc: LegendLoc::LowerRight,
            legend_scale: 1.0,
            locale: "en".to_string(),
        }
    }
}

impl StackPlotStyle {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_figure(self.fig_width, self.fig_height)?;
        validate_positive("font_scale", self.font_scale)?;
        validate_positive("legend_scale", self.legend_scale)?;
        validate_lim("x_lim", self.x_lim)?;
        validate_lim("y_lim", self.y_lim)?;
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(PlotError::validation(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

fn validate_figure(width: f64, height: f64) -> Result<()> {
    validate_positive("fig_width", width)?;
    validate_positive("fig_height", height)
}

fn validate_positive(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(PlotError::validation(format!("{name} must be positive, got {v}")))
    }
}

fn validate_non_negative(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(PlotError::validation(format!("{name} must not be negative, got {v}")))
    }
}

fn validate_lim(name: &str, lim: Option<(f64, f64)>) -> Result<()> {
    match lim {
        Some((lo, hi)) if !(lo.is_finite() && hi.is_finite() && lo < hi) => Err(
            PlotError::validation(format!("{name} must be an increasing pair, got ({lo}, {hi})")),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let style: LinePlotStyle = serde_json::from_str(
            r#"{"y_scale": "log", "legend_loc": "upper left", "x_label": "Year", "y_lim": [1, 500]}"#,
        )
        .unwrap();
        assert_eq!(style.y_scale, AxisScale::Log);
        assert_eq!(style.legend_loc, LegendLoc::UpperLeft);
        assert_eq!(style.x_label.as_deref(), Some("Year"));
        assert_eq!(style.y_lim, Some((1.0, 500.0)));
        assert_eq!(style.marker_size, 30.0);
        assert!(style.include_legend);
    }

    #[test]
    fn unknown_scale_is_rejected() {
        let e = serde_json::from_str::<LinePlotStyle>(r#"{"y_scale": "logit"}"#);
        assert!(e.is_err());
    }

    #[test]
    fn validation_catches_bad_sizes_and_limits() {
        let style = LinePlotStyle {
            fig_width: 0.0,
            ..LinePlotStyle::default()
        };
        assert!(style.validate().unwrap_err().is_validation());

        let style = LinePlotStyle {
            y_lim: Some((5.0, 1.0)),
            ..LinePlotStyle::default()
        };
        assert!(style.validate().unwrap_err().is_validation());

        let style = LinePlotStyle {
            y_scale: AxisScale::Log,
            y_lim: Some((0.0, 10.0)),
            ..LinePlotStyle::default()
        };
        assert!(style.validate().unwrap_err().is_domain());
    }

    #[test]
    fn contexts_scale_font_sizes() {
        assert!((PlotContext::talk().label_size - 18.0).abs() < 1e-9);
        assert!(PlotContext::paper().tick_size < PlotContext::default().tick_size);
    }
}

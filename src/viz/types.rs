//! Public enums for the visualization module.

use crate::models::Rgb8;
use serde::{Deserialize, Serialize};

/// Y-axis scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

/// Which point of the legend box sits on the anchor `(legend_x, legend_y)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendLoc {
    #[serde(rename = "upper right")]
    UpperRight,
    #[serde(rename = "upper left")]
    UpperLeft,
    #[serde(rename = "lower left")]
    LowerLeft,
    #[default]
    #[serde(rename = "lower right")]
    LowerRight,
    #[serde(rename = "right", alias = "center right")]
    CenterRight,
    #[serde(rename = "center left")]
    CenterLeft,
    #[serde(rename = "lower center")]
    LowerCenter,
    #[serde(rename = "upper center")]
    UpperCenter,
    #[serde(rename = "center")]
    Center,
}

/// Horizontal alignment of a text anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Background and grid treatment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartTheme {
    #[default]
    WhiteGrid,
    DarkGrid,
    White,
    Ticks,
}

impl ChartTheme {
    pub fn background(self) -> Rgb8 {
        match self {
            ChartTheme::DarkGrid => Rgb8::new(234, 234, 242),
            _ => Rgb8::WHITE,
        }
    }

    /// Grid line color, or `None` when the theme draws no grid.
    pub fn grid(self) -> Option<Rgb8> {
        match self {
            ChartTheme::WhiteGrid => Some(Rgb8::new(204, 204, 204)),
            ChartTheme::DarkGrid => Some(Rgb8::WHITE),
            ChartTheme::White | ChartTheme::Ticks => None,
        }
    }

    /// Whether the axes get a dark spine and outward tick marks.
    pub fn draws_spines(self) -> bool {
        matches!(self, ChartTheme::White | ChartTheme::Ticks)
    }
}

/// Fixed color sequences used when no category colors are supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Muted "deep" palette (blue, orange, green, red, purple, ...).
    #[default]
    Deep,
    /// Microsoft Office (2013+) chart series palette.
    Office,
}

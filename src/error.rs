//! Error types shared by the data layer and the renderers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotError {
    /// Malformed or mismatched input shapes (unknown category, length mismatch, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Mathematically undefined computation (e.g. log of a non-positive axis maximum).
    #[error("domain error: {0}")]
    Domain(String),

    /// Drawing backend failure.
    #[error("render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlotError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PlotError::Validation(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        PlotError::Domain(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PlotError::Validation(_))
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, PlotError::Domain(_))
    }
}

/// Map any plotters backend error into a [`PlotError::Render`].
pub(crate) fn render_err<E: std::fmt::Debug>(e: E) -> PlotError {
    PlotError::Render(format!("{e:?}"))
}

pub type Result<T> = std::result::Result<T, PlotError>;

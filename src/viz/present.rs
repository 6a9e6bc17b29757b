//! Where finished figures go.
//!
//! Renderers hand the [`Figure`] to a [`Presenter`] as their last step, so the
//! same pipeline serves headless runs, file output and hosts that embed markup.

use super::figure::Figure;
use crate::error::Result;
use std::path::PathBuf;

pub trait Presenter {
    fn present(&mut self, fig: &Figure) -> Result<()>;
}

/// Discards figures.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _fig: &Figure) -> Result<()> {
        Ok(())
    }
}

/// Writes each figure to a file; `.svg` paths get SVG, anything else PNG.
#[derive(Debug, Clone)]
pub struct FilePresenter {
    path: PathBuf,
}

impl FilePresenter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Presenter for FilePresenter {
    fn present(&mut self, fig: &Figure) -> Result<()> {
        fig.save(&self.path)
    }
}

/// Keeps the SVG markup of every presented figure.
#[derive(Debug, Default, Clone)]
pub struct MemoryPresenter {
    pub svgs: Vec<String>,
}

impl MemoryPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&str> {
        self.svgs.last().map(String::as_str)
    }
}

impl Presenter for MemoryPresenter {
    fn present(&mut self, fig: &Figure) -> Result<()> {
        self.svgs.push(fig.to_svg()?);
        Ok(())
    }
}

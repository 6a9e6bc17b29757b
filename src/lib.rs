//! root_dash
//!
//! A Rust library for turning tidy tabular records into time-binned series and
//! rendering them as line or stacked-area charts. Pairs with the `root-dash` CLI.
//!
//! ### Features
//! - Load records from CSV, filter (regex search, categorical sets, numerical ranges)
//! - Recategorize values and aggregate them per time bin and category (count or sum)
//! - Default y-axis maximum and "nice" tick spacing from the totals
//! - Line plots with an optional "Total" overlay, annotations and anchored legend
//! - Stacked-area plots, optionally normalized to fractions
//! - SVG/PNG output, CSV/JSON table export
//!
//! ### Example
//! ```no_run
//! use root_dash::transform::{AggregateSpec, aggregate};
//! use root_dash::viz::{FilePresenter, LinePlotStyle, render_lineplot};
//! use root_dash::{Frame, compute_default_tick_range};
//!
//! let frame = Frame::from_csv_path("papers.csv")?;
//! let (table, totals) = aggregate(&frame, &AggregateSpec::count("year", "field"))?;
//! let ticks = compute_default_tick_range(totals.values(), false)?;
//! let style = LinePlotStyle {
//!     y_lim: Some((0.0, ticks.y_max)),
//!     ytick_spacing: Some(ticks.tick_spacing),
//!     ..LinePlotStyle::default()
//! };
//! let mut out = FilePresenter::new("papers.svg");
//! render_lineplot(&table, Some(&totals), None, false, &style, &mut out)?;
//! root_dash::storage::save_csv(&table, Some(&totals), "papers_table.csv")?;
//! # Ok::<(), root_dash::PlotError>(())
//! ```

pub mod error;
pub mod frame;
pub mod models;
pub mod storage;
pub mod ticks;
pub mod transform;
pub mod viz;

pub use error::{PlotError, Result};
pub use frame::Frame;
pub use models::{CategoryColors, Rgb8, SeriesTable, Totals};
pub use ticks::{TickRange, compute_default_tick_range, compute_tick_range};

//! Axis range and tick helpers.
//!
//! [`compute_tick_range`] derives a default y maximum and a "nice" tick spacing
//! from a totals series. The remaining functions generate tick positions for
//! the renderers: explicit spacing (`arange`), integer keys, and the default
//! 1-2-5 / decade ticks used when no spacing is given.

use crate::error::{PlotError, Result};
use serde::Serialize;

/// Fraction of the full axis between two ticks (~10 ticks).
pub const DEFAULT_AXIS_FRACTION: f64 = 0.1;

/// Headroom factor applied on top of the largest (or final cumulative) total.
pub const HEADROOM: f64 = 1.05;

/// Upper bound on generated ticks; more than this is always a caller mistake.
const MAX_TICKS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickRange {
    pub y_max: f64,
    pub tick_spacing: f64,
}

/// Default y maximum and tick spacing for a totals series.
///
/// - `cumulative`: `y_max = sum(totals) * 1.05`, otherwise `max(totals) * 1.05`.
/// - `tick_spacing = axis_fraction * y_max`, rounded to its leading digit
///   (`round(raw, -floor(log10(raw)))`).
///
/// ### Errors
/// [`PlotError::Domain`] for empty totals, a non-positive `y_max`, or an
/// `axis_fraction` that is not a positive finite number.
pub fn compute_tick_range(totals: &[f64], cumulative: bool, axis_fraction: f64) -> Result<TickRange> {
    if totals.is_empty() {
        return Err(PlotError::domain("cannot derive a tick range from empty totals"));
    }
    if !(axis_fraction.is_finite() && axis_fraction > 0.0) {
        return Err(PlotError::domain(format!(
            "axis fraction must be positive, got {axis_fraction}"
        )));
    }

    let y_max = if cumulative {
        totals.iter().sum::<f64>() * HEADROOM
    } else {
        totals.iter().copied().fold(f64::NEG_INFINITY, f64::max) * HEADROOM
    };
    if !(y_max.is_finite() && y_max > 0.0) {
        return Err(PlotError::domain(format!(
            "axis maximum must be positive, got {y_max}"
        )));
    }

    let tick_spacing = round_to_leading_digit(axis_fraction * y_max)?;
    log::debug!("tick range: y_max={y_max} tick_spacing={tick_spacing} (cumulative={cumulative})");
    Ok(TickRange { y_max, tick_spacing })
}

/// [`compute_tick_range`] with [`DEFAULT_AXIS_FRACTION`].
pub fn compute_default_tick_range(totals: &[f64], cumulative: bool) -> Result<TickRange> {
    compute_tick_range(totals, cumulative, DEFAULT_AXIS_FRACTION)
}

/// Round `x` to `-floor(log10(x))` decimal places, i.e. to one significant digit.
///
/// `101.01 -> 100`, `0.0734 -> 0.07`, `4.6 -> 5`.
pub fn round_to_leading_digit(x: f64) -> Result<f64> {
    if !(x.is_finite() && x > 0.0) {
        return Err(PlotError::domain(format!(
            "cannot round non-positive value {x} to a tick spacing"
        )));
    }
    let decimals = -(x.log10().floor() as i32);
    let rounded = round_decimals(x, decimals);
    if !(rounded.is_finite() && rounded > 0.0) {
        return Err(PlotError::domain(format!(
            "tick spacing for {x} rounds to {rounded}"
        )));
    }
    Ok(rounded)
}

/// Round half away from zero to `decimals` places; negative `decimals` round to tens, hundreds, ...
pub fn round_decimals(x: f64, decimals: i32) -> f64 {
    if decimals >= 0 {
        let f = 10f64.powi(decimals);
        (x * f).round() / f
    } else {
        let f = 10f64.powi(-decimals);
        (x / f).round() * f
    }
}

/// Evenly spaced values in the half-open interval `[start, stop)`.
pub fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if !(step.is_finite() && step > 0.0) {
        return Err(PlotError::validation(format!(
            "tick spacing must be positive, got {step}"
        )));
    }
    if !(start.is_finite() && stop.is_finite()) || stop <= start {
        return Ok(Vec::new());
    }
    let n = ((stop - start) / step).ceil() as usize;
    if n > MAX_TICKS {
        return Err(PlotError::validation(format!(
            "tick spacing {step} yields {n} ticks over [{start}, {stop})"
        )));
    }
    Ok((0..n).map(|i| start + i as f64 * step).collect())
}

/// One tick per integer x-axis key.
pub fn integer_ticks(keys: &[i64]) -> Vec<f64> {
    keys.iter().map(|k| *k as f64).collect()
}

/// Default linear ticks: multiples of a 1-2-5 step inside `[lo, hi]`.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo || target == 0 {
        return Vec::new();
    }
    let raw = (hi - lo) / target as f64;
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let residual = raw / magnitude;
    let step = magnitude
        * if residual <= 1.0 {
            1.0
        } else if residual <= 2.0 {
            2.0
        } else if residual <= 2.5 {
            2.5
        } else if residual <= 5.0 {
            5.0
        } else {
            10.0
        };

    let eps = step * 1e-9;
    let first = (lo / step).ceil();
    let mut out = Vec::new();
    let mut i = 0.0;
    loop {
        let v = (first + i) * step;
        if v > hi + eps {
            break;
        }
        // Avoid "-0" labels.
        out.push(if v.abs() < eps { 0.0 } else { v });
        i += 1.0;
    }
    out
}

/// Default log ticks: powers of ten inside `[lo, hi]` (`lo > 0`).
///
/// Ranges holding fewer than two powers of ten get 1-2-5 multiples instead,
/// and linear ticks when even those are too sparse.
pub fn log_ticks(lo: f64, hi: f64) -> Vec<f64> {
    if !(lo > 0.0 && hi.is_finite()) || hi <= lo {
        return Vec::new();
    }
    let start = lo.log10().ceil() as i32;
    let end = hi.log10().floor() as i32;
    let decades: Vec<f64> = (start..=end).map(|e| 10f64.powi(e)).collect();
    if decades.len() >= 2 {
        return decades;
    }

    let eps = hi * 1e-9;
    let multiples: Vec<f64> = (lo.log10().floor() as i32..=end)
        .flat_map(|e| [1.0, 2.0, 5.0].map(|m| m * 10f64.powi(e)))
        .filter(|v| *v >= lo - eps && *v <= hi + eps)
        .collect();
    if multiples.len() >= 2 {
        multiples
    } else {
        nice_ticks(lo, hi, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn single_total_rounds_to_hundred() {
        let r = compute_default_tick_range(&[962.0], false).unwrap();
        assert!(close(r.y_max, 1010.1));
        assert!(close(r.tick_spacing, 100.0));
    }

    #[test]
    fn cumulative_uses_sum() {
        let r = compute_default_tick_range(&[10.0, 20.0, 30.0], true).unwrap();
        assert!(close(r.y_max, 63.0));
        // 6.3 -> 6
        assert!(close(r.tick_spacing, 6.0));
    }

    #[test]
    fn small_values_keep_a_positive_spacing() {
        let r = compute_default_tick_range(&[0.3], false).unwrap();
        assert!(close(r.y_max, 0.315));
        assert!(close(r.tick_spacing, 0.03));
    }

    #[test]
    fn empty_and_non_positive_totals_are_domain_errors() {
        assert!(compute_default_tick_range(&[], false).unwrap_err().is_domain());
        assert!(compute_default_tick_range(&[0.0, 0.0], false).unwrap_err().is_domain());
        assert!(compute_default_tick_range(&[-3.0, 1.0], true).unwrap_err().is_domain());
        assert!(compute_tick_range(&[1.0], false, 0.0).unwrap_err().is_domain());
    }

    #[test]
    fn rounding_helpers() {
        assert!(close(round_decimals(101.01, -2), 100.0));
        assert!(close(round_decimals(0.0734, 2), 0.07));
        assert!(close(round_to_leading_digit(4.6).unwrap(), 5.0));
        assert!(close(round_to_leading_digit(950.0).unwrap(), 1000.0));
        assert!(round_to_leading_digit(0.0).is_err());
    }

    #[test]
    fn arange_is_half_open() {
        assert_eq!(arange(0.0, 1010.1, 100.0).unwrap().len(), 11);
        assert_eq!(arange(0.0, 1000.0, 100.0).unwrap().last(), Some(&900.0));
        assert!(arange(5.0, 1.0, 1.0).unwrap().is_empty());
        assert!(arange(0.0, 1.0, 0.0).unwrap_err().is_validation());
    }

    #[test]
    fn nice_ticks_cover_range() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        let t = nice_ticks(-0.35, 3.35, 6);
        assert_eq!(t.len(), 4);
        assert!(close(t[0], 0.0));
        assert!(close(t[3], 3.0));
    }

    #[test]
    fn log_ticks_are_decades() {
        assert_eq!(log_ticks(0.5, 2000.0), vec![1.0, 10.0, 100.0, 1000.0]);
        assert!(log_ticks(0.0, 10.0).is_empty());
    }

    #[test]
    fn narrow_log_ranges_still_get_ticks() {
        assert_eq!(log_ticks(1.866, 8.574), vec![2.0, 5.0]);
        assert_eq!(log_ticks(12.0, 95.0), vec![20.0, 50.0]);
        let t = log_ticks(5.5, 9.5);
        assert!(t.len() >= 2, "{t:?}");
        assert!(t.iter().all(|v| (5.5..=9.5).contains(v)));
    }
}

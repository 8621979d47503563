//! Exact fits: fixed-point lines that reproduce every sample with no residual.
//!
//! Two evaluation shapes are supported:
//!
//! ```text
//! single: y = b0 + ((k1·x + b1) >> nb)
//! dual:   y = b0 + ((((k1·x) >> nb) + b1) >> nb)
//! ```
//!
//! These are used for "which interval contains x" conversions (day → month,
//! second → solar term), where a correctly rounded line has no true scatter.
//! The dual shape keeps `k1·x` inside `i64` when `x` is a whole-history second
//! count, at the price of a smaller search bound.

use crate::domain::{DualShiftCoefficients, ExactCoefficients, FitKind};
use crate::error::FitResult;
use crate::fit::level::real_line;
use crate::fit::search::{
    DUAL_SHIFT_MAX_SHIFT, EXACT_MAX_SHIFT, min_max, residuals_with, search_shift, validate_samples,
};
use crate::math::{Line, int_frac, quantize};

/// Options for exact fits.
#[derive(Debug, Clone, Copy)]
pub struct ExactOptions {
    /// Shift the real intercept by one half so the line runs through
    /// interval midpoints.
    pub midpoint: bool,
    pub max_shift: u32,
}

impl ExactOptions {
    pub fn single() -> Self {
        Self {
            midpoint: false,
            max_shift: EXACT_MAX_SHIFT,
        }
    }

    pub fn dual() -> Self {
        Self {
            midpoint: false,
            max_shift: DUAL_SHIFT_MAX_SHIFT,
        }
    }

    pub fn midpoint(mut self) -> Self {
        self.midpoint = true;
        self
    }

    pub fn with_max_shift(mut self, max_shift: u32) -> Self {
        self.max_shift = max_shift;
        self
    }
}

/// Fit `y = b0 + ((k1·x + b1) >> nb)` exactly.
pub fn fit_exact(xs: &[i64], ys: &[i64], opts: ExactOptions) -> FitResult<ExactCoefficients> {
    validate_samples(xs, ys)?;
    let line = shifted_line(xs, ys, opts)?;
    let coefs = search_shift(FitKind::Exact, opts.max_shift, |nb| exact_at_shift(&line, xs, ys, nb))?;
    tracing::debug!(nb = coefs.nb, b0 = coefs.b0, k1 = coefs.k1, b1 = coefs.b1, "exact fit accepted");
    Ok(coefs)
}

/// Fit `y = b0 + ((((k1·x) >> nb) + b1) >> nb)` exactly.
pub fn fit_dual_shift(xs: &[i64], ys: &[i64], opts: ExactOptions) -> FitResult<DualShiftCoefficients> {
    validate_samples(xs, ys)?;
    let line = shifted_line(xs, ys, opts)?;
    let coefs = search_shift(FitKind::DualShift, opts.max_shift, |nb| {
        dual_shift_at_shift(&line, xs, ys, nb)
    })?;
    tracing::debug!(nb = coefs.nb, b0 = coefs.b0, k1 = coefs.k1, b1 = coefs.b1, "dual-shift fit accepted");
    Ok(coefs)
}

fn shifted_line(xs: &[i64], ys: &[i64], opts: ExactOptions) -> FitResult<Line> {
    let mut line = real_line(xs, ys)?;
    if opts.midpoint {
        line.intercept += 0.5;
    }
    Ok(line)
}

/// Acceptance predicate for the single-shift shape.
///
/// The integer slope part is folded into `k1`: `floor(k·2^nb)` equals
/// `k0·2^nb + floor(kf·2^nb)`.
pub(crate) fn exact_at_shift(line: &Line, xs: &[i64], ys: &[i64], nb: u32) -> Option<ExactCoefficients> {
    let (b0, bf) = int_frac(line.intercept);
    let mut coefs = ExactCoefficients {
        b0,
        k1: quantize(line.slope, nb)?,
        b1: quantize(bf, nb)?,
        nb,
    };
    coefs.b0 = coefs.b0.checked_add(constant_residual(xs, ys, |x| coefs.predict(x))?)?;
    Some(coefs)
}

/// Acceptance predicate for the dual-shift shape.
pub(crate) fn dual_shift_at_shift(line: &Line, xs: &[i64], ys: &[i64], nb: u32) -> Option<DualShiftCoefficients> {
    let (b0, bf) = int_frac(line.intercept);
    let mut coefs = DualShiftCoefficients {
        b0,
        k1: quantize(line.slope, 2 * nb)?,
        b1: quantize(bf, nb)?,
        nb,
    };
    coefs.b0 = coefs.b0.checked_add(constant_residual(xs, ys, |x| coefs.predict(x))?)?;
    Some(coefs)
}

/// The residual shared by every sample, if the range is zero.
fn constant_residual<P>(xs: &[i64], ys: &[i64], predict: P) -> Option<i64>
where
    P: Fn(i64) -> Option<i64>,
{
    let residuals = residuals_with(xs, ys, predict)?;
    let (lo, hi) = min_max(&residuals)?;
    (lo == hi).then_some(lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;

    #[test]
    fn exact_line_is_found_at_zero_shift() {
        let xs = [0, 1, 2, 3, 4];
        let ys = [10, 13, 16, 19, 22];
        let c = fit_exact(&xs, &ys, ExactOptions::single()).unwrap();
        assert_eq!(c.nb, 0);
        for (&x, &y) in xs.iter().zip(&ys) {
            assert_eq!(c.predict(x), Some(y));
        }
    }

    #[test]
    fn day_to_month_midpoint_conversion_is_exact() {
        // New moons every 29.530589 days; each sample is the first day of a month.
        let months: Vec<i64> = (0..400).collect();
        let days: Vec<i64> = months
            .iter()
            .map(|&m| ((m as f64) * 29.530589 + 3.25).floor() as i64)
            .collect();

        let c = fit_exact(&days, &months, ExactOptions::single().midpoint()).unwrap();
        for (&d, &m) in days.iter().zip(&months) {
            assert_eq!(c.predict(d), Some(m), "day {d}");
        }

        // Minimality.
        if c.nb > 0 {
            let mut line = real_line(&days, &months).unwrap();
            line.intercept += 0.5;
            assert!(exact_at_shift(&line, &days, &months, c.nb - 1).is_none());
        }
    }

    #[test]
    fn second_to_term_dual_shift_is_exact() {
        // Solar terms every ~15.2 days, spanning several centuries around the epoch.
        let terms: Vec<i64> = (-1700..5500).collect();
        let secs: Vec<i64> = terms
            .iter()
            .map(|&j| ((j as f64) * 1_314_871.9 + 2_000_000.0).floor() as i64)
            .collect();

        let c = fit_dual_shift(&secs, &terms, ExactOptions::dual().midpoint()).unwrap();
        assert!(c.nb < DUAL_SHIFT_MAX_SHIFT);
        for (&s, &j) in secs.iter().zip(&terms) {
            assert_eq!(c.predict(s), Some(j), "usec {s}");
        }

        if c.nb > 0 {
            let mut line = real_line(&secs, &terms).unwrap();
            line.intercept += 0.5;
            assert!(dual_shift_at_shift(&line, &secs, &terms, c.nb - 1).is_none());
        }
    }

    #[test]
    fn scattered_samples_are_infeasible() {
        let xs = [0, 1, 2, 3, 4, 5];
        let ys = [0, 5, 1, 7, 2, 9];
        let err = fit_exact(&xs, &ys, ExactOptions::single()).unwrap_err();
        assert_eq!(
            err,
            FitError::InfeasibleFit {
                kind: FitKind::Exact,
                max_shift: EXACT_MAX_SHIFT
            }
        );
    }

    #[test]
    fn negative_slope_is_supported() {
        let xs = [-2, 0, 3, 5];
        let ys: Vec<i64> = xs.iter().map(|x| -2 * x + 1).collect();
        let c = fit_exact(&xs, &ys, ExactOptions::single()).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert_eq!(c.predict(x), Some(y));
        }
    }
}

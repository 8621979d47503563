//! Level fit: a single-shift fixed-point line with a bounded residual table.
//!
//! The real least-squares line `y ≈ k·x + b` is split into exact integer
//! parts `(k0, b0)` and fractional parts `(kf, bf)`. The fractions are
//! quantized to `nb` bits (truncated, never rounded), so the runtime can
//! evaluate
//!
//! ```text
//! y = k0·x + b0 + ((k1·x + b1) >> nb) + residual
//! ```
//!
//! with integer ops only. The smallest `nb` whose residual range fits in
//! `residual_bits` wins.

use crate::domain::{FitKind, LevelCoefficients, LevelFit};
use crate::error::{FitError, FitResult};
use crate::fit::search::{
    LEVEL_MAX_SHIFT, fold_bounded, residuals_with, search_shift, validate_residual_bits, validate_samples,
};
use crate::math::{Line, fit_line, int_frac, quantize};

/// Options for a level fit.
#[derive(Debug, Clone, Copy)]
pub struct LevelOptions {
    /// Residuals must satisfy `0 <= r < 2^residual_bits`.
    pub residual_bits: u32,
    /// Shift widths `0..max_shift` are tried.
    pub max_shift: u32,
}

impl LevelOptions {
    pub fn new(residual_bits: u32) -> Self {
        Self {
            residual_bits,
            max_shift: LEVEL_MAX_SHIFT,
        }
    }

    pub fn with_max_shift(mut self, max_shift: u32) -> Self {
        self.max_shift = max_shift;
        self
    }
}

/// Fit `ys` against `xs` with a bounded residual table.
pub fn fit_level(xs: &[i64], ys: &[i64], opts: LevelOptions) -> FitResult<LevelFit> {
    validate_samples(xs, ys)?;
    validate_residual_bits(opts.residual_bits)?;

    let line = real_line(xs, ys)?;
    let fit = search_shift(FitKind::Level, opts.max_shift, |nb| {
        level_at_shift(&line, xs, ys, nb, opts.residual_bits)
    })?;

    tracing::debug!(
        nb = fit.coefficients.nb,
        k0 = fit.coefficients.k0,
        b0 = fit.coefficients.b0,
        samples = xs.len(),
        "level fit accepted"
    );
    Ok(fit)
}

/// Acceptance predicate for one shift width.
pub(crate) fn level_at_shift(line: &Line, xs: &[i64], ys: &[i64], nb: u32, bits: u32) -> Option<LevelFit> {
    let (k0, kf) = int_frac(line.slope);
    let (b0, bf) = int_frac(line.intercept);
    let mut coefficients = LevelCoefficients {
        k0,
        b0,
        k1: quantize(kf, nb)?,
        b1: quantize(bf, nb)?,
        nb,
    };

    let raw = residuals_with(xs, ys, |x| coefficients.predict(x))?;
    let (rmin, residuals) = fold_bounded(&raw, bits)?;
    coefficients.b0 = coefficients.b0.checked_add(rmin)?;

    Some(LevelFit {
        coefficients,
        residual_bits: bits,
        residuals,
    })
}

/// Real least-squares line over integer samples.
pub(crate) fn real_line(xs: &[i64], ys: &[i64]) -> FitResult<Line> {
    let xf: Vec<f64> = xs.iter().map(|&v| v as f64).collect();
    let yf: Vec<f64> = ys.iter().map(|&v| v as f64).collect();
    fit_line(&xf, &yf).ok_or_else(|| FitError::InvalidInput("degenerate sample set for line fit".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_reconstructs(fit: &LevelFit, xs: &[i64], ys: &[i64]) {
        let c = fit.coefficients;
        for ((&x, &y), &r) in xs.iter().zip(ys).zip(&fit.residuals) {
            assert!(u64::from(r) < 1u64 << fit.residual_bits);
            assert_eq!(c.predict(x).unwrap() + i64::from(r), y, "x={x}");
        }
    }

    #[test]
    fn fits_shallow_slope_with_one_bit_residuals() {
        let xs = [0, 1, 2, 3, 4, 5];
        let ys = [0, 1, 1, 2, 3, 3];
        let fit = fit_level(&xs, &ys, LevelOptions::new(1)).unwrap();

        assert_eq!(fit.residuals.len(), xs.len());
        assert!(fit.residuals.iter().all(|&r| r <= 1));
        assert_reconstructs(&fit, &xs, &ys);

        // Minimality: the next smaller width must fail.
        let nb = fit.coefficients.nb;
        if nb > 0 {
            let line = real_line(&xs, &ys).unwrap();
            assert!(level_at_shift(&line, &xs, &ys, nb - 1, 1).is_none());
        }
    }

    #[test]
    fn exact_line_needs_no_residual_width() {
        let xs = [-5, -1, 0, 2, 4];
        let ys: Vec<i64> = xs.iter().map(|x| 7 * x - 11).collect();
        let fit = fit_level(&xs, &ys, LevelOptions::new(0)).unwrap();
        assert_eq!(fit.coefficients.nb, 0);
        assert_eq!(fit.coefficients.k0, 7);
        assert!(fit.residuals.iter().all(|&r| r == 0));
        assert_reconstructs(&fit, &xs, &ys);
    }

    #[test]
    fn floor_of_linear_fits_in_one_bit() {
        // Month counts: floor(235·y / 19), a Metonic-style staircase.
        let xs: Vec<i64> = (1800..2300).collect();
        let ys: Vec<i64> = xs.iter().map(|y| (235 * y + 4).div_euclid(19)).collect();
        let fit = fit_level(&xs, &ys, LevelOptions::new(1)).unwrap();
        assert_eq!(fit.coefficients.k0, 12);
        assert_reconstructs(&fit, &xs, &ys);

        let nb = fit.coefficients.nb;
        let line = real_line(&xs, &ys).unwrap();
        for smaller in 0..nb {
            assert!(level_at_shift(&line, &xs, &ys, smaller, 1).is_none());
        }
    }

    #[test]
    fn too_narrow_budget_is_infeasible() {
        let xs = [0, 1, 2, 3, 4, 5, 6, 7];
        let ys = [0, 9, -4, 12, 1, -8, 5, 0];
        let err = fit_level(&xs, &ys, LevelOptions::new(1)).unwrap_err();
        assert_eq!(
            err,
            FitError::InfeasibleFit {
                kind: FitKind::Level,
                max_shift: LEVEL_MAX_SHIFT
            }
        );
    }

    #[test]
    fn fit_is_deterministic() {
        let xs: Vec<i64> = (0..200).collect();
        let ys: Vec<i64> = xs.iter().map(|x| (x * 2953 + 17) / 100).collect();
        let a = fit_level(&xs, &ys, LevelOptions::new(2)).unwrap();
        let b = fit_level(&xs, &ys, LevelOptions::new(2)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_unsorted_samples() {
        let err = fit_level(&[0, 2, 1], &[0, 1, 2], LevelOptions::new(1)).unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));
    }
}

//! Shift-width search scaffold shared by every fit kind.
//!
//! Every fit is a search over `nb = 0 … max_shift-1` for the smallest shift
//! width whose quantized formula passes an exact integer acceptance check.
//! The residual landscape is not monotone in `nb`, so the search is exhaustive
//! and in order; there is no closed-form estimate of the width.
//!
//! Candidates are evaluated with rayon's `find_map_first`, which yields the
//! lowest accepted `nb`, the same answer a sequential loop gives.

use rayon::prelude::*;

use crate::domain::FitKind;
use crate::error::{FitError, FitResult};

/// Default search bound for level fits.
pub const LEVEL_MAX_SHIFT: u32 = 32;

/// Default search bound for single-shift exact fits.
pub const EXACT_MAX_SHIFT: u32 = 64;

/// Default search bound for dual-shift exact fits (`k1` is scaled by `2^(2nb)`).
pub const DUAL_SHIFT_MAX_SHIFT: u32 = 32;

/// Default search bound for sextic group fits.
pub const SEXTIC_MAX_SHIFT: u32 = 32;

/// Return the first accepted candidate in `0..max_shift`.
pub(crate) fn search_shift<T, F>(kind: FitKind, max_shift: u32, accept: F) -> FitResult<T>
where
    T: Send,
    F: Fn(u32) -> Option<T> + Sync,
{
    if max_shift > 64 {
        return Err(FitError::InvalidInput(format!(
            "shift search bound {max_shift} exceeds 64"
        )));
    }

    let found = (0..max_shift).into_par_iter().find_map_first(|nb| {
        let out = accept(nb);
        if out.is_none() {
            tracing::trace!(%kind, nb, "shift width rejected");
        }
        out.map(|t| (nb, t))
    });

    match found {
        Some((nb, t)) => {
            tracing::debug!(%kind, nb, "shift width accepted");
            Ok(t)
        }
        None => Err(FitError::InfeasibleFit { kind, max_shift }),
    }
}

/// Validate a paired sample set: equal lengths, at least two points, `x`
/// strictly increasing.
pub(crate) fn validate_samples(xs: &[i64], ys: &[i64]) -> FitResult<()> {
    if xs.len() != ys.len() {
        return Err(FitError::InvalidInput(format!(
            "x has {} samples but y has {}",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(FitError::InvalidInput(format!(
            "need at least 2 samples, got {}",
            xs.len()
        )));
    }
    if let Some(i) = xs.windows(2).position(|w| w[0] >= w[1]) {
        return Err(FitError::InvalidInput(format!(
            "x is not strictly increasing at index {}",
            i + 1
        )));
    }
    Ok(())
}

pub(crate) fn validate_residual_bits(bits: u32) -> FitResult<()> {
    if bits > 32 {
        return Err(FitError::InvalidInput(format!(
            "residual width {bits} exceeds 32 bits"
        )));
    }
    Ok(())
}

/// Integer residuals `y - predict(x)`, `None` on overflow.
pub(crate) fn residuals_with<P>(xs: &[i64], ys: &[i64], predict: P) -> Option<Vec<i64>>
where
    P: Fn(i64) -> Option<i64>,
{
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| y.checked_sub(predict(x)?))
        .collect()
}

/// `(min, max)` of a non-empty slice.
pub(crate) fn min_max(values: &[i64]) -> Option<(i64, i64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Shift residuals so the minimum is zero and check they fit in `bits`.
///
/// Returns `(rmin, normalized)` on acceptance.
pub(crate) fn fold_bounded(residuals: &[i64], bits: u32) -> Option<(i64, Vec<u32>)> {
    let (lo, hi) = min_max(residuals)?;
    let range = hi as i128 - lo as i128;
    if range >= 1i128 << bits {
        return None;
    }
    let normalized = residuals.iter().map(|&r| (r as i128 - lo as i128) as u32).collect();
    Some((lo, normalized))
}

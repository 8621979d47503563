//! Sextic group fit for solar-term instants.
//!
//! Each of the 24 solar-term phases drifts along its own curve, and no single
//! low-degree polynomial covers all of them within a narrow residual budget.
//! The fit therefore has two layers:
//!
//! - a linear major term `k0·x + b0` shared by every group (the mean year length)
//! - per group, a degree-6 minor polynomial in Horner form, quantized with one
//!   shift width `nb` shared by every group
//!
//! ```text
//! H = c0
//! H = ((H·x) >> nb) + c_j        for j = 1..=6
//! y = k0·x + b0 + H + residual
//! ```
//!
//! After acceptance the trailing coefficient column is centered across groups
//! so the stored per-group constants stay small.

use rayon::prelude::*;

use crate::domain::{FitKind, GROUP_COUNT, HORNER_LEN, SEXTIC_DEGREE, SexticCoefficients, SexticFit, horner_eval};
use crate::error::{FitError, FitResult};
use crate::fit::level::real_line;
use crate::fit::search::{SEXTIC_MAX_SHIFT, fold_bounded, min_max, search_shift, validate_residual_bits};
use crate::math::{int_frac, polyfit, quantize};

/// Options for a sextic group fit.
#[derive(Debug, Clone, Copy)]
pub struct SexticOptions {
    pub residual_bits: u32,
    pub max_shift: u32,
}

impl SexticOptions {
    pub fn new(residual_bits: u32) -> Self {
        Self {
            residual_bits,
            max_shift: SEXTIC_MAX_SHIFT,
        }
    }
}

/// Real-valued inputs that do not depend on the shift width.
#[derive(Debug, Clone)]
pub(crate) struct SexticPlan {
    k0: i64,
    b0: i64,
    /// Real minor polynomial per group, highest power first.
    minor: Vec<[f64; HORNER_LEN]>,
}

/// Fit `ys` against `xs` with one minor polynomial per group tag.
///
/// `groups[i]` must be in `0..24`; every group needs at least seven samples
/// with strictly increasing `x`.
pub fn fit_sextic(xs: &[i64], ys: &[i64], groups: &[usize], opts: SexticOptions) -> FitResult<SexticFit> {
    validate_grouped(xs, ys, groups)?;
    validate_residual_bits(opts.residual_bits)?;

    let plan = plan_sextic(xs, ys, groups)?;
    let fit = search_shift(FitKind::Sextic, opts.max_shift, |nb| {
        sextic_at_shift(&plan, xs, ys, groups, nb, opts.residual_bits)
    })?;

    tracing::debug!(
        nb = fit.coefficients.nb,
        k0 = fit.coefficients.k0,
        b0 = fit.coefficients.b0,
        samples = xs.len(),
        "sextic group fit accepted"
    );
    Ok(fit)
}

/// Major line plus the real per-group minor fits.
pub(crate) fn plan_sextic(xs: &[i64], ys: &[i64], groups: &[usize]) -> FitResult<SexticPlan> {
    let line = real_line(xs, ys)?;
    let (k0, _) = int_frac(line.slope);
    let (b0, _) = int_frac(line.intercept);

    // Minor residuals after removing the shared major trend.
    let rsec: Vec<f64> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (y as i128 - (k0 as i128 * x as i128 + b0 as i128)) as f64)
        .collect();

    let minor: Vec<Option<[f64; HORNER_LEN]>> = (0..GROUP_COUNT)
        .into_par_iter()
        .map(|g| {
            let (gx, gy): (Vec<f64>, Vec<f64>) = groups
                .iter()
                .zip(xs.iter().zip(&rsec))
                .filter(|(tag, _)| **tag == g)
                .map(|(_, (&x, &r))| (x as f64, r))
                .unzip();
            let coefs = polyfit(&gx, &gy, SEXTIC_DEGREE)?;
            let mut row = [0.0; HORNER_LEN];
            row.copy_from_slice(&coefs);
            Some(row)
        })
        .collect();

    let minor = minor
        .into_iter()
        .enumerate()
        .map(|(g, row)| {
            row.ok_or_else(|| FitError::InvalidInput(format!("degenerate samples in group {g}")))
        })
        .collect::<FitResult<Vec<_>>>()?;

    Ok(SexticPlan { k0, b0, minor })
}

/// Acceptance predicate for one shift width.
pub(crate) fn sextic_at_shift(
    plan: &SexticPlan,
    xs: &[i64],
    ys: &[i64],
    groups: &[usize],
    nb: u32,
    bits: u32,
) -> Option<SexticFit> {
    let mut coef = [[0i64; HORNER_LEN]; GROUP_COUNT];
    for (row, real) in coef.iter_mut().zip(&plan.minor) {
        for (j, (c, &a)) in row.iter_mut().zip(real).enumerate() {
            let level = (SEXTIC_DEGREE - j) as u32;
            *c = quantize(a, nb * level)?;
        }
    }

    let raw = xs
        .iter()
        .zip(ys)
        .zip(groups)
        .map(|((&x, &y), &g)| {
            let major = plan.k0.checked_mul(x)?.checked_add(plan.b0)?;
            let pred = major.checked_add(horner_eval(&coef[g], x, nb)?)?;
            y.checked_sub(pred)
        })
        .collect::<Option<Vec<i64>>>()?;
    let (rmin, residuals) = fold_bounded(&raw, bits)?;

    let bm = center_trailing(&mut coef)?;
    let b0 = plan.b0.checked_add(bm)?.checked_add(rmin)?;

    Some(SexticFit {
        coefficients: SexticCoefficients {
            k0: plan.k0,
            b0,
            nb,
            coef,
        },
        residual_bits: bits,
        residuals,
    })
}

/// Subtract `floor((max + min) / 2)` of the trailing column from every row and return it.
fn center_trailing(coef: &mut [[i64; HORNER_LEN]; GROUP_COUNT]) -> Option<i64> {
    let trailing: Vec<i64> = coef.iter().map(|row| row[SEXTIC_DEGREE]).collect();
    let (lo, hi) = min_max(&trailing)?;
    // `>> 1` floors toward negative infinity.
    let bm = i64::try_from((i128::from(lo) + i128::from(hi)) >> 1).ok()?;
    for row in coef.iter_mut() {
        row[SEXTIC_DEGREE] = row[SEXTIC_DEGREE].checked_sub(bm)?;
    }
    Some(bm)
}

fn validate_grouped(xs: &[i64], ys: &[i64], groups: &[usize]) -> FitResult<()> {
    if xs.len() != ys.len() || xs.len() != groups.len() {
        return Err(FitError::InvalidInput(format!(
            "x, y and group lengths differ ({}, {}, {})",
            xs.len(),
            ys.len(),
            groups.len()
        )));
    }

    let mut last: [Option<i64>; GROUP_COUNT] = [None; GROUP_COUNT];
    let mut counts = [0usize; GROUP_COUNT];
    for (i, (&x, &g)) in xs.iter().zip(groups).enumerate() {
        if g >= GROUP_COUNT {
            return Err(FitError::InvalidInput(format!(
                "group tag {g} at index {i} is outside 0..{GROUP_COUNT}"
            )));
        }
        if last[g].is_some_and(|prev| prev >= x) {
            return Err(FitError::InvalidInput(format!(
                "x is not strictly increasing within group {g} at index {i}"
            )));
        }
        last[g] = Some(x);
        counts[g] += 1;
    }

    if let Some((g, &n)) = counts.iter().enumerate().find(|(_, n)| **n < HORNER_LEN) {
        return Err(FitError::InvalidInput(format!(
            "group {g} has {n} samples, need at least {HORNER_LEN}"
        )));
    }
    Ok(())
}

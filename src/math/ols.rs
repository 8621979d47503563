//! Real-valued least squares.
//!
//! Two shapes of problem show up in the fit engine:
//!
//! ```text
//! minimize Σ (y_i - (k x_i + b))^2            (degree-1 line)
//! minimize Σ (y_i - Σ_j a_j x_i^(n-j))^2       (degree-n polynomial)
//! ```
//!
//! Implementation choices:
//! - The line uses the closed-form centered-sum solution. On exactly linear
//!   integer data it reproduces the slope and intercept without rounding
//!   noise, which matters because the integer search truncates.
//! - The polynomial is solved in a normalized variable `t = (x - c) / s` so the
//!   Vandermonde matrix stays well conditioned, then expanded back to raw-x
//!   monomial coefficients. We use SVD because the design matrix is tall.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Real line `y = slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub slope: f64,
    pub intercept: f64,
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Ordinary least squares line through `(xs, ys)`.
///
/// Returns `None` for fewer than two points or when every `x` is identical.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<Line> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }

    let xbar = xs.iter().sum::<f64>() / n as f64;
    let ybar = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - xbar;
        cov += dx * (y - ybar);
        var += dx * dx;
    }
    if var <= 0.0 || !cov.is_finite() {
        return None;
    }

    let slope = cov / var;
    Some(Line {
        slope,
        intercept: ybar - slope * xbar,
    })
}

/// Least squares polynomial of `degree`, highest power first.
///
/// The returned vector has `degree + 1` entries `a_0 … a_degree` with
/// `y ≈ a_0·x^degree + … + a_degree`.
pub fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = xs.len();
    if n <= degree || ys.len() != n {
        return None;
    }

    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let center = 0.5 * (lo + hi);
    let scale = if hi > lo { 0.5 * (hi - lo) } else { 1.0 };

    let cols = degree + 1;
    let mut design = DMatrix::<f64>::zeros(n, cols);
    for (i, &x) in xs.iter().enumerate() {
        let t = (x - center) / scale;
        let mut p = 1.0;
        for j in 0..cols {
            design[(i, j)] = p;
            p *= t;
        }
    }
    let rhs = DVector::from_column_slice(ys);
    let beta = solve_least_squares(&design, &rhs)?;

    // Expand Σ_j beta_j ((x - c)/s)^j into raw monomials (lowest power first).
    let mut raw = vec![0.0; cols];
    for j in 0..cols {
        let bj = beta[j] / scale.powi(j as i32);
        let mut binom = 1.0;
        for k in 0..=j {
            // C(j, k) x^k (-c)^(j-k)
            raw[k] += bj * binom * (-center).powi((j - k) as i32);
            binom = binom * (j - k) as f64 / (k + 1) as f64;
        }
    }
    raw.reverse();
    Some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn line_is_exact_on_exact_integer_data() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [10.0, 13.0, 16.0, 19.0, 22.0];
        let line = fit_line(&xs, &ys).unwrap();
        assert_eq!(line.slope, 3.0);
        assert_eq!(line.intercept, 10.0);
    }

    #[test]
    fn line_rejects_degenerate_input() {
        assert!(fit_line(&[1.0], &[1.0]).is_none());
        assert!(fit_line(&[2.0, 2.0], &[1.0, 3.0]).is_none());
    }

    #[test]
    fn polyfit_recovers_cubic_on_offset_domain() {
        // y = 0.5 x^3 - 2 x^2 + x - 7 sampled far from the origin.
        let xs: Vec<f64> = (100..120).map(|v| v as f64).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|&x| 0.5 * x * x * x - 2.0 * x * x + x - 7.0)
            .collect();
        let coefs = polyfit(&xs, &ys, 3).unwrap();
        assert_eq!(coefs.len(), 4);
        for (&x, &y) in xs.iter().zip(&ys) {
            let fit = coefs.iter().fold(0.0, |acc, c| acc * x + c);
            assert!((fit - y).abs() < 1e-4 * y.abs().max(1.0), "x={x}: {fit} vs {y}");
        }
    }

    #[test]
    fn polyfit_needs_more_points_than_degree() {
        assert!(polyfit(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], 3).is_none());
    }
}

//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - produced by the fit engine and never mutated afterwards
//! - rendered by the report layer (text or JSON)
//! - re-evaluated in tests to check bit-exact reproduction

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Number of solar-term phases in one solar year.
pub const GROUP_COUNT: usize = 24;

/// Degree of the per-group minor polynomial.
pub const SEXTIC_DEGREE: usize = 6;

/// Entries in one Horner coefficient row.
pub const HORNER_LEN: usize = SEXTIC_DEGREE + 1;

/// Which fit procedure produced a set of coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitKind {
    Level,
    Exact,
    DualShift,
    Sextic,
}

impl FitKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            FitKind::Level => "level",
            FitKind::Exact => "exact",
            FitKind::DualShift => "dual-shift exact",
            FitKind::Sextic => "sextic group",
        }
    }
}

impl fmt::Display for FitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// `y ≈ k0·x + b0 + ((k1·x + b1) >> nb)`; the gap is stored as a residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelCoefficients {
    pub k0: i64,
    pub b0: i64,
    pub k1: i64,
    pub b1: i64,
    pub nb: u32,
}

impl LevelCoefficients {
    /// Integer prediction, `None` if any intermediate overflows `i64`.
    pub fn predict(&self, x: i64) -> Option<i64> {
        let major = self.k0.checked_mul(x)?.checked_add(self.b0)?;
        let minor = self.k1.checked_mul(x)?.checked_add(self.b1)? >> self.nb;
        major.checked_add(minor)
    }
}

/// `y = b0 + ((k1·x + b1) >> nb)`, exact on every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExactCoefficients {
    pub b0: i64,
    pub k1: i64,
    pub b1: i64,
    pub nb: u32,
}

impl ExactCoefficients {
    pub fn predict(&self, x: i64) -> Option<i64> {
        let minor = self.k1.checked_mul(x)?.checked_add(self.b1)? >> self.nb;
        self.b0.checked_add(minor)
    }
}

/// `y = b0 + ((((k1·x) >> nb) + b1) >> nb)`, exact on every sample.
///
/// Splitting the shift keeps `k1·x` small when `x` spans whole-history
/// second counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DualShiftCoefficients {
    pub b0: i64,
    pub k1: i64,
    pub b1: i64,
    pub nb: u32,
}

impl DualShiftCoefficients {
    pub fn predict(&self, x: i64) -> Option<i64> {
        let inner = self.k1.checked_mul(x)? >> self.nb;
        let minor = inner.checked_add(self.b1)? >> self.nb;
        self.b0.checked_add(minor)
    }
}

/// Shared linear major term plus one Horner row per solar-term phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SexticCoefficients {
    pub k0: i64,
    pub b0: i64,
    pub nb: u32,
    /// `coef[g][0]` is the highest-degree coefficient of group `g`.
    pub coef: [[i64; HORNER_LEN]; GROUP_COUNT],
}

impl SexticCoefficients {
    /// Minor (per-group) Horner term only.
    pub fn horner(&self, group: usize, x: i64) -> Option<i64> {
        horner_eval(self.coef.get(group)?, x, self.nb)
    }

    /// Major + minor prediction for one sample.
    pub fn predict(&self, group: usize, x: i64) -> Option<i64> {
        let major = self.k0.checked_mul(x)?.checked_add(self.b0)?;
        major.checked_add(self.horner(group, x)?)
    }
}

/// Nested evaluation `(((c0·x >> nb) + c1)·x >> nb) + c2 …` with floor shifts.
pub fn horner_eval(row: &[i64; HORNER_LEN], x: i64, nb: u32) -> Option<i64> {
    let mut acc = row[0];
    for &c in &row[1..] {
        acc = (acc.checked_mul(x)? >> nb).checked_add(c)?;
    }
    Some(acc)
}

/// Level fit output: coefficients plus a bounded, non-negative residual table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelFit {
    pub coefficients: LevelCoefficients,
    pub residual_bits: u32,
    pub residuals: Vec<u32>,
}

/// Sextic group fit output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SexticFit {
    pub coefficients: SexticCoefficients,
    pub residual_bits: u32,
    pub residuals: Vec<u32>,
}

/// One row of the lunar event table (one new moon).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarRow {
    pub cyue: i64,
    pub nian: i64,
    pub ryue: i64,
    pub usec: i64,
}

impl LunarRow {
    /// Leap (intercalary) flag carried in the low bit of `ryue`.
    pub fn is_leap(&self) -> bool {
        self.ryue & 1 == 1
    }

    /// Month ordinal 1..=12.
    pub fn month(&self) -> i64 {
        self.ryue >> 1
    }

    /// First (non-leap) month of its year.
    pub fn opens_year(&self) -> bool {
        self.ryue == 2
    }
}

/// One row of the solar event table (one solar term).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarRow {
    pub cjie: i64,
    pub sui: i64,
    pub jie: i64,
    pub usec: i64,
}

impl SolarRow {
    /// Group tag for the sextic fit; negative `jie` maps out of range.
    pub fn group(&self) -> usize {
        usize::try_from(self.jie).unwrap_or(usize::MAX)
    }
}

/// Largest accepted `|usec|`, several million years either side of the epoch.
pub const USEC_LIMIT: i64 = 1 << 47;

/// Day index from the Unix epoch at a fixed offset east of UTC.
pub fn uday_of(usec: i64, tz_hours: i64) -> Option<i64> {
    let local = usec.checked_add(tz_hours.checked_mul(3600)?)?;
    Some(local.div_euclid(86_400))
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub lunar_path: PathBuf,
    pub solar_path: PathBuf,
    /// Inclusive lower bound of the export window (nian / sui).
    pub year_min: i64,
    /// Inclusive upper bound of the export window.
    pub year_max: i64,
    /// Offset east of UTC used to derive `uday`.
    pub tz_hours: i64,
    pub bytes_per_line: usize,
    pub lines_per_array: usize,
}

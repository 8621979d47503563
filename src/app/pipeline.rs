//! Shared "fit pipeline" logic used by both the text and JSON front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> wide fits -> window slicing -> packing -> self-check
//!
//! The derived tables, named after their mapping:
//!
//! ```text
//! NR  nian -> leap month            4-bit table
//! NY  nian -> cyue of month 1       level fit, 1-bit residuals
//! YD  cyue -> uday                  level fit, 2-bit residuals (paged)
//! DY  uday -> cyue                  exact fit through midpoints
//! YN  cyue of month 1 -> nian       exact fit through midpoints
//! JS  (sui, jie) -> usec            sextic group fit, 12-bit residuals (paged)
//! SJ  usec -> cjie                  dual-shift exact fit through midpoints
//! ```

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::domain::{
    DualShiftCoefficients, ExactCoefficients, GROUP_COUNT, HORNER_LEN, LevelCoefficients, LunarRow, RunConfig,
    SexticCoefficients, SolarRow, uday_of,
};
use crate::error::{AppError, FitResult};
use crate::fit::{
    ExactOptions, LevelOptions, SexticOptions, fit_dual_shift, fit_exact, fit_level, fit_sextic,
};
use crate::io::export::{
    ByteTally, ExportLayout, ResidualTable, export_packed, export_packed_12, items_per_line, round_up, window_slice,
};
use crate::io::ingest::{Table, load_lunar, load_solar};
use crate::pack::{unpack, unpack_12};

/// Leap-month nibble for years without a leap month.
pub const NO_LEAP: u32 = 13;

const NR_BITS: u32 = 4;
const NY_BITS: u32 = 1;
const YD_BITS: u32 = 2;
const JS_BITS: u32 = 12;

/// Bounds are stored as six `int16_t` and four `int32_t` constants.
const BOUNDS_BYTES: usize = 2 * 6 + 4 * 4;

/// Exported window bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub year_min: i64,
    pub year_max: i64,
    pub cyue_min: i64,
    pub cyue_max: i64,
    pub cjie_min: i64,
    pub cjie_max: i64,
}

/// First and last event instant (`usec`) inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSpans {
    pub lunar: [i64; 2],
    pub solar: [i64; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelExport {
    pub coefficients: LevelCoefficients,
    pub residuals: ResidualTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SexticExport {
    pub coefficients: SexticCoefficients,
    pub residuals: ResidualTable,
}

/// Everything the downstream calendar routine needs, in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportBundle {
    pub bounds: Bounds,
    pub spans: WindowSpans,
    pub layout: ExportLayout,
    pub nr: ResidualTable,
    pub ny: LevelExport,
    pub yd: LevelExport,
    pub dy: ExactCoefficients,
    pub yn: ExactCoefficients,
    pub js: SexticExport,
    pub sj: DualShiftCoefficients,
    pub tally: ByteTally,
}

/// Row counts of one ingested table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub rows_read: usize,
    pub rows_used: usize,
}

impl<R> From<&Table<R>> for TableStats {
    fn from(table: &Table<R>) -> Self {
        Self {
            rows_read: table.rows_read,
            rows_used: table.rows.len(),
        }
    }
}

/// All computed outputs of a single `nlfit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub lunar: TableStats,
    pub solar: TableStats,
    pub bundle: ExportBundle,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    validate_config(config)?;

    let lunar = load_lunar(&config.lunar_path)?;
    tracing::info!(rows = lunar.rows.len(), skipped = lunar.row_errors.len(), "lunar table loaded");
    let solar = load_solar(&config.solar_path)?;
    tracing::info!(rows = solar.rows.len(), skipped = solar.row_errors.len(), "solar table loaded");

    let bundle = build_bundle(&lunar.rows, &solar.rows, config)?;
    verify_bundle(&bundle, &lunar.rows, &solar.rows, config)?;

    Ok(RunOutput {
        lunar: TableStats::from(&lunar),
        solar: TableStats::from(&solar),
        bundle,
    })
}

/// Reject configurations that cannot produce a meaningful export.
pub fn validate_config(config: &RunConfig) -> Result<(), AppError> {
    if config.year_min > config.year_max {
        return Err(AppError::new(
            2,
            format!(
                "Year window is empty: year_min ({}) > year_max ({}).",
                config.year_min, config.year_max
            ),
        ));
    }
    year_span(config)?;
    if !(-12..=14).contains(&config.tz_hours) {
        return Err(AppError::new(
            2,
            format!("Timezone offset {}h is outside -12..=14.", config.tz_hours),
        ));
    }
    ExportLayout::new(config.bytes_per_line, config.lines_per_array)?;
    Ok(())
}

/// Fit every table over the full rows and export the window.
pub fn build_bundle(lunar: &[LunarRow], solar: &[SolarRow], config: &RunConfig) -> Result<ExportBundle, AppError> {
    let layout = ExportLayout::new(config.bytes_per_line, config.lines_per_array)?;
    let window = config.year_min..=config.year_max;
    let mut tally = ByteTally::default();

    let (bounds, spans) = window_bounds(lunar, solar, &window)?;
    tally.record("bounds", BOUNDS_BYTES);

    let nr = leap_months(lunar, config, layout, &mut tally)?;
    tracing::info!(stage = "NR", bytes = nr.byte_len, "leap month table packed");

    let openers: Vec<&LunarRow> = lunar.iter().filter(|r| r.opens_year()).collect();
    let opener_nian: Vec<i64> = openers.iter().map(|r| r.nian).collect();
    let opener_cyue: Vec<i64> = openers.iter().map(|r| r.cyue).collect();
    let cyue: Vec<i64> = lunar.iter().map(|r| r.cyue).collect();
    let nian: Vec<i64> = lunar.iter().map(|r| r.nian).collect();
    let uday: Vec<i64> = lunar
        .iter()
        .map(|r| uday_of(r.usec, config.tz_hours))
        .collect::<Option<_>>()
        .ok_or_else(|| AppError::new(3, "Lunar instant is out of range for a day index."))?;

    // NY: nian -> cyue of the first month.
    let fit = stage("NY", fit_level(&opener_nian, &opener_cyue, LevelOptions::new(NY_BITS)))?;
    tally.record_shift("NY");
    tally.record_coefs("NY", 4);
    let in_window = opener_nian.iter().filter(|y| window.contains(y)).count();
    let values = window_slice(
        &fit.residuals,
        &opener_nian,
        config.year_min,
        in_window,
        items_per_line(NY_BITS, layout),
    );
    let ny = LevelExport {
        coefficients: fit.coefficients,
        residuals: export_packed("NY", &values, NY_BITS, layout, false, &mut tally),
    };
    tracing::info!(stage = "NY", nb = ny.coefficients.nb, bytes = ny.residuals.byte_len, "fitted");

    // YD: cyue -> uday.
    let opts = LevelOptions::new(YD_BITS).with_max_shift(64);
    let fit = stage("YD", fit_level(&cyue, &uday, opts))?;
    tally.record_shift("YD");
    tally.record_coefs("YD", 4);
    let in_window = nian.iter().filter(|y| window.contains(y)).count();
    let values = window_slice(
        &fit.residuals,
        &nian,
        config.year_min,
        in_window,
        items_per_line(YD_BITS, layout),
    );
    let yd = LevelExport {
        coefficients: fit.coefficients,
        residuals: export_packed("YD", &values, YD_BITS, layout, true, &mut tally),
    };
    tracing::info!(
        stage = "YD",
        nb = yd.coefficients.nb,
        bytes = yd.residuals.byte_len,
        pages = yd.residuals.pages.len(),
        "fitted"
    );

    // DY: uday -> cyue.
    let dy = stage("DY", fit_exact(&uday, &cyue, ExactOptions::single().midpoint()))?;
    tally.record_shift("DY");
    tally.record_coefs("DY", 3);
    tracing::info!(stage = "DY", nb = dy.nb, "fitted");

    // YN: cyue of the first month -> nian.
    let yn = stage("YN", fit_exact(&opener_cyue, &opener_nian, ExactOptions::single().midpoint()))?;
    tally.record_shift("YN");
    tally.record_coefs("YN", 3);
    tracing::info!(stage = "YN", nb = yn.nb, "fitted");

    let sui: Vec<i64> = solar.iter().map(|r| r.sui).collect();
    let groups: Vec<usize> = solar.iter().map(SolarRow::group).collect();
    let usec: Vec<i64> = solar.iter().map(|r| r.usec).collect();
    let cjie: Vec<i64> = solar.iter().map(|r| r.cjie).collect();

    // JS: (sui, jie) -> usec.
    let fit = stage("JS", fit_sextic(&sui, &usec, &groups, SexticOptions::new(JS_BITS)))?;
    tally.record_shift("JS");
    tally.record("JS clin", 8 * 2);
    tally.record_coefs("JS", HORNER_LEN * GROUP_COUNT);
    let in_window = sui.iter().filter(|y| window.contains(y)).count();
    let values = window_slice(
        &fit.residuals,
        &sui,
        config.year_min,
        in_window,
        items_per_line(JS_BITS, layout),
    );
    let js = SexticExport {
        coefficients: fit.coefficients,
        residuals: export_packed_12("JS", &values, layout, true, &mut tally),
    };
    tracing::info!(
        stage = "JS",
        nb = js.coefficients.nb,
        bytes = js.residuals.byte_len,
        pages = js.residuals.pages.len(),
        "fitted"
    );

    // SJ: usec -> cjie.
    let sj = stage("SJ", fit_dual_shift(&usec, &cjie, ExactOptions::dual().midpoint()))?;
    tally.record_shift("SJ");
    tally.record_coefs("SJ", 3);
    tracing::info!(stage = "SJ", nb = sj.nb, "fitted");

    tracing::info!(total = tally.total(), "export bundle built");
    Ok(ExportBundle {
        bounds,
        spans,
        layout,
        nr,
        ny,
        yd,
        dy,
        yn,
        js,
        sj,
        tally,
    })
}

/// Decode every exported table and check it against the in-window samples.
///
/// Returns the number of samples checked.
pub fn verify_bundle(
    bundle: &ExportBundle,
    lunar: &[LunarRow],
    solar: &[SolarRow],
    config: &RunConfig,
) -> Result<usize, AppError> {
    let window = &(config.year_min..=config.year_max);
    let mut checked = 0;

    let leaps = leap_map(lunar);
    let nr = unpack::<u8>(&table_bytes(&bundle.nr), NR_BITS, 2);
    for (year, &nibble) in window.clone().zip(&nr) {
        let expected = leaps.get(&year).copied().unwrap_or(NO_LEAP);
        if nibble != expected {
            return Err(mismatch("NR", year));
        }
        checked += 1;
    }

    let in_lunar = move || lunar.iter().filter(move |r| window.contains(&r.nian));
    let in_openers = move || in_lunar().filter(|r| r.opens_year());
    let in_solar = move || solar.iter().filter(move |r| window.contains(&r.sui));

    let ny = unpack::<u8>(&table_bytes(&bundle.ny.residuals), NY_BITS, 8);
    checked += verify_rows("NY", in_openers(), Some(&ny), |r| {
        (bundle.ny.coefficients.predict(r.nian), r.cyue)
    })?;

    let yd = unpack::<u8>(&table_bytes(&bundle.yd.residuals), YD_BITS, 4);
    checked += verify_rows("YD", in_lunar(), Some(&yd), |r| {
        uday_of(r.usec, config.tz_hours).map_or((None, 0), |d| (bundle.yd.coefficients.predict(r.cyue), d))
    })?;

    checked += verify_rows("DY", in_lunar(), None, |r| {
        (uday_of(r.usec, config.tz_hours).and_then(|d| bundle.dy.predict(d)), r.cyue)
    })?;
    checked += verify_rows("YN", in_openers(), None, |r| (bundle.yn.predict(r.cyue), r.nian))?;

    let js = unpack_12(&table_bytes(&bundle.js.residuals));
    checked += verify_rows("JS", in_solar(), Some(&js), |r| {
        (bundle.js.coefficients.predict(r.group(), r.sui), r.usec)
    })?;
    checked += verify_rows("SJ", in_solar(), None, |r| (bundle.sj.predict(r.usec), r.cjie))?;

    tracing::info!(samples = checked, "export bundle verified");
    Ok(checked)
}

fn stage<T>(name: &str, result: FitResult<T>) -> Result<T, AppError> {
    result.map_err(|err| {
        let app = AppError::from(err);
        AppError::new(app.exit_code(), format!("{name}: {app}"))
    })
}

fn mismatch(name: &str, key: i64) -> AppError {
    AppError::new(4, format!("{name} does not reproduce the sample at {key}."))
}

fn table_bytes(table: &ResidualTable) -> Vec<u8> {
    table.bytes().collect()
}

fn leap_map(lunar: &[LunarRow]) -> HashMap<i64, u32> {
    lunar
        .iter()
        .filter(|r| r.is_leap())
        .map(|r| (r.nian, r.month() as u32))
        .collect()
}

/// `prediction + residual == target` for the `k`-th in-window row.
fn verify_rows<'a, T: 'a>(
    name: &str,
    rows: impl Iterator<Item = &'a T>,
    residuals: Option<&[u32]>,
    eval: impl Fn(&T) -> (Option<i64>, i64),
) -> Result<usize, AppError> {
    let mut checked = 0;
    for (k, row) in rows.enumerate() {
        let (predicted, target) = eval(row);
        let residual = match residuals {
            Some(rs) => rs.get(k).map(|&r| i64::from(r)),
            None => Some(0),
        };
        match predicted.zip(residual).and_then(|(p, r)| p.checked_add(r)) {
            Some(v) if v == target => checked += 1,
            _ => return Err(mismatch(name, target)),
        }
    }
    Ok(checked)
}

/// Number of years in the window. Both bounds are stored as `int16_t`.
fn year_span(config: &RunConfig) -> Result<usize, AppError> {
    let stored = i64::from(i16::MIN)..=i64::from(i16::MAX);
    if !stored.contains(&config.year_min) || !stored.contains(&config.year_max) {
        return Err(AppError::new(
            2,
            format!(
                "Year window {}..={} does not fit in 16-bit bounds.",
                config.year_min, config.year_max
            ),
        ));
    }
    config
        .year_max
        .checked_sub(config.year_min)
        .and_then(|d| usize::try_from(d).ok())
        .map(|d| d + 1)
        .ok_or_else(|| AppError::new(2, "Year window is empty."))
}

fn leap_months(
    lunar: &[LunarRow],
    config: &RunConfig,
    layout: ExportLayout,
    tally: &mut ByteTally,
) -> Result<ResidualTable, AppError> {
    let leaps = leap_map(lunar);
    let years = year_span(config)?;
    let count = round_up(years, items_per_line(NR_BITS, layout));
    let values: Vec<u32> = (config.year_min..)
        .take(count)
        .map(|year| leaps.get(&year).copied().unwrap_or(NO_LEAP))
        .collect();
    Ok(export_packed("NR", &values, NR_BITS, layout, false, tally))
}

fn window_bounds(
    lunar: &[LunarRow],
    solar: &[SolarRow],
    window: &RangeInclusive<i64>,
) -> Result<(Bounds, WindowSpans), AppError> {
    let lunar_in: Vec<&LunarRow> = lunar.iter().filter(|r| window.contains(&r.nian)).collect();
    let solar_in: Vec<&SolarRow> = solar.iter().filter(|r| window.contains(&r.sui)).collect();

    let (Some(lf), Some(ll)) = (lunar_in.first(), lunar_in.last()) else {
        return Err(AppError::new(3, "No lunar rows inside the year window."));
    };
    let (Some(sf), Some(sl)) = (solar_in.first(), solar_in.last()) else {
        return Err(AppError::new(3, "No solar rows inside the year window."));
    };

    // Both tables are sorted by their cumulative index.
    let bounds = Bounds {
        year_min: *window.start(),
        year_max: *window.end(),
        cyue_min: lf.cyue,
        cyue_max: ll.cyue,
        cjie_min: sf.cjie,
        cjie_max: sl.cjie,
    };
    let spans = WindowSpans {
        lunar: [lf.usec, ll.usec],
        solar: [sf.usec, sl.usec],
    };
    Ok((bounds, spans))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::path::PathBuf;

    /// Synthetic lunar table: a leap month every third year.
    pub(crate) fn synthetic_lunar(years: RangeInclusive<i64>, seed: u64) -> Vec<LunarRow> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rows = Vec::new();
        let mut cyue = 0;
        for nian in years {
            let leap = (nian % 3 == 0).then_some(nian % 11 + 1);
            for month in 1..=12 {
                rows.push((cyue, nian, 2 * month));
                cyue += 1;
                if leap == Some(month) {
                    rows.push((cyue, nian, 2 * month + 1));
                    cyue += 1;
                }
            }
        }

        // Anchor cyue 0 at the first month of 1970.
        let anchor = rows
            .iter()
            .find(|(_, nian, ryue)| *nian == 1970 && *ryue == 2)
            .map_or(0, |(c, _, _)| *c);
        rows.into_iter()
            .map(|(c, nian, ryue)| {
                let cyue = c - anchor;
                let usec = cyue * 2_551_443 + 2_000_000 + rng.gen_range(-10_800..=10_800);
                LunarRow { cyue, nian, ryue, usec }
            })
            .collect()
    }

    /// Synthetic solar table: uneven term spacing plus a slow quadratic drift.
    pub(crate) fn synthetic_solar(years: RangeInclusive<i64>, seed: u64) -> Vec<SolarRow> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rows = Vec::new();
        for sui in years {
            let d = sui - 1970;
            for jie in 0..GROUP_COUNT as i64 {
                let uneven = (jie * 7 % 24) * 5_000 - 60_000;
                let usec = 31_556_926 * d + jie * 1_314_872 + uneven + 2 * d * d + rng.gen_range(0..=40);
                rows.push(SolarRow {
                    cjie: d * 24 + jie,
                    sui,
                    jie,
                    usec,
                });
            }
        }
        rows
    }

    pub(crate) fn config(year_min: i64, year_max: i64) -> RunConfig {
        RunConfig {
            lunar_path: PathBuf::from("lunar.csv"),
            solar_path: PathBuf::from("solar.csv"),
            year_min,
            year_max,
            tz_hours: 8,
            bytes_per_line: 12,
            lines_per_array: 315,
        }
    }

    pub(crate) fn sample_bundle() -> (ExportBundle, Vec<LunarRow>, Vec<SolarRow>, RunConfig) {
        let lunar = synthetic_lunar(1880..=2220, 17);
        let solar = synthetic_solar(1880..=2220, 29);
        let config = config(1900, 2199);
        let bundle = build_bundle(&lunar, &solar, &config).unwrap();
        (bundle, lunar, solar, config)
    }

    #[test]
    fn synthetic_tables_build_and_reproduce() {
        let (bundle, lunar, solar, config) = sample_bundle();
        let checked = verify_bundle(&bundle, &lunar, &solar, &config).unwrap();

        let lunar_in = lunar.iter().filter(|r| (1900..=2199).contains(&r.nian)).count();
        let openers_in = lunar
            .iter()
            .filter(|r| r.opens_year() && (1900..=2199).contains(&r.nian))
            .count();
        let solar_in = solar.iter().filter(|r| (1900..=2199).contains(&r.sui)).count();
        assert_eq!(checked, 300 + 2 * openers_in + 2 * lunar_in + 2 * solar_in);
    }

    #[test]
    fn exported_tables_have_whole_lines() {
        let (bundle, ..) = sample_bundle();
        let bpl = bundle.layout.bytes_per_line;

        // 300 years padded to 312 nibbles.
        assert_eq!(bundle.nr.byte_len, 156);
        for table in [&bundle.nr, &bundle.ny.residuals, &bundle.yd.residuals, &bundle.js.residuals] {
            assert_eq!(table.byte_len % bpl, 0, "{}", table.name);
        }
        // 300 years × 24 terms + 1, rounded up to 8 items per line.
        assert_eq!(bundle.js.residuals.items, 7208);
        assert_eq!(bundle.js.residuals.byte_len, 10_812);
        assert_eq!(bundle.js.residuals.pages.len(), 3);
        assert!(bundle.js.residuals.pages.iter().all(|p| p.len() <= bundle.layout.page_size()));
    }

    #[test]
    fn bounds_follow_the_window() {
        let (bundle, ..) = sample_bundle();
        let b = bundle.bounds;
        assert_eq!((b.year_min, b.year_max), (1900, 2199));
        assert_eq!(b.cjie_min, (1900 - 1970) * 24);
        assert_eq!(b.cjie_max, (2199 - 1970) * 24 + 23);
        assert!(b.cyue_min < 0 && b.cyue_max > 0);
        assert!(bundle.spans.lunar[0] < bundle.spans.lunar[1]);
    }

    #[test]
    fn tally_counts_every_export() {
        let (bundle, ..) = sample_bundle();
        let tally = &bundle.tally;
        assert_eq!(tally.total(), tally.entries.iter().map(|(_, b)| b).sum::<usize>());

        let pointer = std::mem::size_of::<usize>();
        // Six shift widths; NY, YD, DY, YN, SJ coefficients; JS line and rows.
        let fixed = BOUNDS_BYTES + 6 * 8 + (4 + 4 + 3 + 3 + 3 + 2 + 7 * 24) * 8;
        let tables = bundle.nr.byte_len
            + bundle.ny.residuals.byte_len
            + 8
            + bundle.yd.residuals.byte_len
            + pointer * bundle.yd.residuals.pages.len()
            + 8
            + bundle.js.residuals.byte_len
            + pointer * bundle.js.residuals.pages.len();
        assert_eq!(tally.total(), fixed + tables);
    }

    #[test]
    fn identical_inputs_give_identical_bundles() {
        let (a, ..) = sample_bundle();
        let (b, ..) = sample_bundle();
        assert_eq!(a, b);
    }

    #[test]
    fn tampered_residuals_are_caught() {
        let (mut bundle, lunar, solar, config) = sample_bundle();
        bundle.yd.coefficients.b0 += 1;
        let err = verify_bundle(&bundle, &lunar, &solar, &config).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn empty_window_is_rejected() {
        let lunar = synthetic_lunar(1880..=1920, 1);
        let solar = synthetic_solar(1880..=1920, 1);
        let err = build_bundle(&lunar, &solar, &config(2500, 2600)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn bad_configuration_is_rejected() {
        assert_eq!(validate_config(&config(2000, 1999)).unwrap_err().exit_code(), 2);

        let mut cfg = config(1900, 2199);
        cfg.tz_hours = 20;
        assert_eq!(validate_config(&cfg).unwrap_err().exit_code(), 2);

        let mut cfg = config(1900, 2199);
        cfg.bytes_per_line = 16;
        assert_eq!(validate_config(&cfg).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn oversized_window_is_rejected_before_export() {
        let lunar = synthetic_lunar(1880..=1920, 1);
        let solar = synthetic_solar(1880..=1920, 1);
        for (lo, hi) in [(-(1 << 62), 1 << 62), (-1_000_000_000, 1_000_000_000), (1900, 40_000)] {
            let cfg = config(lo, hi);
            assert_eq!(validate_config(&cfg).unwrap_err().exit_code(), 2, "{lo}..={hi}");
            assert_eq!(build_bundle(&lunar, &solar, &cfg).unwrap_err().exit_code(), 2, "{lo}..={hi}");
        }
        assert!(validate_config(&config(-32_768, 32_767)).is_ok());
    }

    #[test]
    fn out_of_range_instant_is_an_error() {
        let mut lunar = synthetic_lunar(1880..=1920, 1);
        let solar = synthetic_solar(1880..=1920, 1);
        if let Some(last) = lunar.last_mut() {
            last.usec = i64::MAX;
        }
        let err = build_bundle(&lunar, &solar, &config(1890, 1910)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}

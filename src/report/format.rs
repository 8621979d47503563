//! Formatted terminal output for a pipeline run.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use chrono::{DateTime, FixedOffset};

use crate::app::pipeline::{ExportBundle, RunOutput};
use crate::domain::RunConfig;
use crate::io::export::{ByteTally, ResidualTable};

/// Format the full run summary (tables read, fitted constants, byte tally).
pub fn format_run_summary(run: &RunOutput, config: &RunConfig) -> String {
    let bundle = &run.bundle;
    let mut out = String::new();

    out.push_str("=== nlfit - Fixed-Point Calendar Tables ===\n");
    out.push_str(&format!(
        "Window: {}..={} | tz=UTC{:+}h | layout={}B x {} lines\n",
        bundle.bounds.year_min,
        bundle.bounds.year_max,
        config.tz_hours,
        bundle.layout.bytes_per_line,
        bundle.layout.lines_per_array,
    ));
    out.push_str(&format!(
        "Lunar: rows={}/{} | first={} | last={}\n",
        run.lunar.rows_used,
        run.lunar.rows_read,
        format_instant(bundle.spans.lunar[0], config.tz_hours),
        format_instant(bundle.spans.lunar[1], config.tz_hours),
    ));
    out.push_str(&format!(
        "Solar: rows={}/{} | first={} | last={}\n",
        run.solar.rows_used,
        run.solar.rows_read,
        format_instant(bundle.spans.solar[0], config.tz_hours),
        format_instant(bundle.spans.solar[1], config.tz_hours),
    ));

    out.push_str("\nBounds:\n");
    out.push_str(&format!("- cyue: [{}, {}]\n", bundle.bounds.cyue_min, bundle.bounds.cyue_max));
    out.push_str(&format!("- cjie: [{}, {}]\n", bundle.bounds.cjie_min, bundle.bounds.cjie_max));

    out.push_str(&format_fits(bundle));
    out.push('\n');
    out.push_str(&format_tally(&bundle.tally));

    out
}

/// One line per fitted constant set, coefficients in storage order.
pub fn format_fits(bundle: &ExportBundle) -> String {
    let mut out = String::new();
    out.push_str("\nFits:\n");

    let ny = &bundle.ny.coefficients;
    let yd = &bundle.yd.coefficients;
    let js = &bundle.js.coefficients;
    let rows = [
        ("NR", "table", None, String::new(), Some(&bundle.nr)),
        ("NY", "level", Some(ny.nb), fmt_coefs(&[ny.k0, ny.b0, ny.k1, ny.b1]), Some(&bundle.ny.residuals)),
        ("YD", "level", Some(yd.nb), fmt_coefs(&[yd.k0, yd.b0, yd.k1, yd.b1]), Some(&bundle.yd.residuals)),
        ("DY", "exact", Some(bundle.dy.nb), fmt_coefs(&[bundle.dy.b0, bundle.dy.k1, bundle.dy.b1]), None),
        ("YN", "exact", Some(bundle.yn.nb), fmt_coefs(&[bundle.yn.b0, bundle.yn.k1, bundle.yn.b1]), None),
        ("JS", "sextic", Some(js.nb), fmt_coefs(&[js.k0, js.b0]), Some(&bundle.js.residuals)),
        ("SJ", "dual", Some(bundle.sj.nb), fmt_coefs(&[bundle.sj.b0, bundle.sj.k1, bundle.sj.b1]), None),
    ];

    out.push_str(format!("{:<4} {:<7} {:>4} {:<48} {}\n", "name", "kind", "bits", "coef", "residuals").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<7} {:-<4} {:-<48} {:-<24}\n", "", "", "", "", "").trim_end());
    out.push('\n');
    for (name, kind, nb, coefs, table) in rows {
        let nb = nb.map(|v| v.to_string()).unwrap_or_default();
        let table = table.map(fmt_table).unwrap_or_else(|| "-".to_string());
        out.push_str(format!("{name:<4} {kind:<7} {nb:>4} {coefs:<48} {table}\n").trim_end());
        out.push('\n');
    }

    out.push_str("\nJS rows (highest power first, trailing column centered):\n");
    for (g, row) in js.coef.iter().enumerate() {
        out.push_str(&format!("  {g:>2} {}\n", fmt_coefs(row)));
    }

    out
}

/// Byte tally with a total line.
pub fn format_tally(tally: &ByteTally) -> String {
    let mut out = String::new();
    out.push_str("Byte tally:\n");
    for (label, bytes) in &tally.entries {
        out.push_str(&format!("  {label:<12} {bytes:>8}\n"));
    }
    out.push_str(&format!("  {:<12} {:>8}\n", "total", tally.total()));
    out
}

/// Render a Unix-second instant at a fixed offset east of UTC.
pub fn format_instant(usec: i64, tz_hours: i64) -> String {
    let offset = i32::try_from(tz_hours * 3600)
        .ok()
        .and_then(FixedOffset::east_opt);
    match (DateTime::from_timestamp(usec, 0), offset) {
        (Some(utc), Some(offset)) => utc.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S %:z").to_string(),
        _ => format!("{usec}s"),
    }
}

fn fmt_table(table: &ResidualTable) -> String {
    let pages = table.pages.len();
    let suffix = if pages > 1 { format!(" in {pages} pages") } else { String::new() };
    format!("{}x{}bit = {}B{suffix}", table.items, table.bit_width, table.byte_len)
}

fn fmt_coefs(v: &[i64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

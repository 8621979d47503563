//! Export shaping: window slicing, line padding, paging, and byte accounting.
//!
//! Fits run over the full (wide) tables for numerical conditioning; only the
//! residuals inside the declared year window are exported. Each exported
//! table is padded to whole lines of `bytes_per_line` bytes and split into
//! pages of `bytes_per_line × lines_per_array` bytes.
//!
//! Byte counts are collected in an explicit [`ByteTally`] threaded through
//! every export call.

use serde::Serialize;

use crate::error::AppError;
use crate::pack::{pack, pack_12};

/// Size of one stored `int64_t` constant.
const WORD: usize = 8;

/// Line/page geometry of exported byte arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportLayout {
    pub bytes_per_line: usize,
    pub lines_per_array: usize,
}

impl Default for ExportLayout {
    fn default() -> Self {
        Self {
            bytes_per_line: 12,
            lines_per_array: 315,
        }
    }
}

impl ExportLayout {
    pub fn new(bytes_per_line: usize, lines_per_array: usize) -> Result<Self, AppError> {
        if bytes_per_line == 0 || lines_per_array == 0 {
            return Err(AppError::new(2, "Bytes per line and lines per array must be > 0."));
        }
        if bytes_per_line % 3 != 0 {
            return Err(AppError::new(
                2,
                format!("Bytes per line ({bytes_per_line}) must be a multiple of 3 to hold 12-bit pairs."),
            ));
        }
        Ok(Self {
            bytes_per_line,
            lines_per_array,
        })
    }

    /// Bytes in one exported array.
    pub fn page_size(&self) -> usize {
        self.bytes_per_line * self.lines_per_array
    }
}

/// Running byte count per exported item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ByteTally {
    pub entries: Vec<(String, usize)>,
}

impl ByteTally {
    pub fn record(&mut self, label: impl Into<String>, bytes: usize) {
        self.entries.push((label.into(), bytes));
    }

    /// A shift width is stored as one 8-byte constant.
    pub fn record_shift(&mut self, label: &str) {
        self.record(format!("{label} bits"), WORD);
    }

    /// `count` 8-byte coefficients.
    pub fn record_coefs(&mut self, label: &str, count: usize) {
        self.record(format!("{label} coef"), WORD * count);
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, b)| b).sum()
    }
}

/// An exported residual table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidualTable {
    pub name: String,
    pub bit_width: u32,
    /// Residuals stored (after padding).
    pub items: usize,
    pub byte_len: usize,
    /// One entry per exported array; a single page for unpaged tables.
    pub pages: Vec<Vec<u8>>,
}

impl ResidualTable {
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.pages.iter().flatten().copied()
    }
}

/// Round `n` up to a whole multiple of `unit`.
pub fn round_up(n: usize, unit: usize) -> usize {
    n.div_ceil(unit) * unit
}

/// Slice the exported part of a wide residual sequence.
///
/// Starts at the first sample whose `year` is at least `year_min`, keeps
/// `in_window + 1` items rounded up to whole lines of `items_per_line`, and
/// pads with zeros when the sample set ends first.
pub fn window_slice(residuals: &[u32], years: &[i64], year_min: i64, in_window: usize, items_per_line: usize) -> Vec<u32> {
    let start = years.iter().position(|&y| y >= year_min).unwrap_or(years.len());
    let count = round_up(in_window + 1, items_per_line);
    let mut out: Vec<u32> = residuals.iter().skip(start).take(count).copied().collect();
    out.resize(count, 0);
    out
}

/// Pack byte-lane residuals (1, 2 or 4 bits per item) and account for them.
pub fn export_packed(
    name: &str,
    values: &[u32],
    bit_width: u32,
    layout: ExportLayout,
    paged: bool,
    tally: &mut ByteTally,
) -> ResidualTable {
    let items_per_byte = (8 / bit_width) as usize;
    let bytes = pack::<u8>(values, bit_width, items_per_byte);
    finish_table(name, bit_width, values.len(), bytes, layout, paged, tally)
}

/// Pack 12-bit residuals two per three bytes and account for them.
pub fn export_packed_12(
    name: &str,
    values: &[u32],
    layout: ExportLayout,
    paged: bool,
    tally: &mut ByteTally,
) -> ResidualTable {
    let bytes = pack_12(values);
    finish_table(name, 12, values.len(), bytes, layout, paged, tally)
}

/// Items of `bit_width` that fill one line.
pub fn items_per_line(bit_width: u32, layout: ExportLayout) -> usize {
    layout.bytes_per_line * 8 / bit_width as usize
}

fn finish_table(
    name: &str,
    bit_width: u32,
    items: usize,
    bytes: Vec<u8>,
    layout: ExportLayout,
    paged: bool,
    tally: &mut ByteTally,
) -> ResidualTable {
    let byte_len = bytes.len();
    let pages: Vec<Vec<u8>> = if paged {
        bytes.chunks(layout.page_size()).map(<[u8]>::to_vec).collect()
    } else {
        vec![bytes]
    };

    if paged {
        let pointer = std::mem::size_of::<usize>();
        tally.record(format!("{name} table"), WORD + byte_len + pointer * pages.len());
    } else {
        tally.record(format!("{name} table"), byte_len);
    }

    tracing::debug!(table = name, items, byte_len, pages = pages.len(), "residual table packed");
    ResidualTable {
        name: name.to_string(),
        bit_width,
        items,
        byte_len,
        pages,
    }
}

//! Fixed-width bit packing of residual sequences.
//!
//! Layout (little-endian bit order): inside one lane, item `i` occupies bits
//! `i·bit_width .. (i+1)·bit_width`.
//!
//! ```text
//! pack::<u8>([1, 2, 3, 4], 4, 2) == [0x21, 0x43]
//! ```
//!
//! 12-bit items do not divide a byte, so they get their own layout: two items
//! in exactly three bytes.
//!
//! ```text
//! byte0 = a & 0xff
//! byte1 = (a >> 8) | ((b & 0x0f) << 4)
//! byte2 = b >> 4
//! ```

/// An unsigned integer used as one packed collection.
pub trait Lane: Copy {
    const BITS: u32;

    fn from_bits(bits: u64) -> Self;

    fn to_bits(self) -> u64;
}

macro_rules! impl_lane {
    ($($t:ty),*) => {
        $(
            impl Lane for $t {
                const BITS: u32 = <$t>::BITS;

                fn from_bits(bits: u64) -> Self {
                    bits as $t
                }

                fn to_bits(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_lane!(u8, u16, u32, u64);

fn mask(bit_width: u32) -> u64 {
    if bit_width >= 64 { u64::MAX } else { (1u64 << bit_width) - 1 }
}

/// Pack `values` into lanes of `items_per_lane` items each.
///
/// Preconditions (checked only in debug builds):
/// - every value is `< 2^bit_width`
/// - `values.len()` is a multiple of `items_per_lane`
/// - `bit_width · items_per_lane <= L::BITS`
pub fn pack<L: Lane>(values: &[u32], bit_width: u32, items_per_lane: usize) -> Vec<L> {
    debug_assert!(items_per_lane > 0);
    debug_assert!(bit_width as usize * items_per_lane <= L::BITS as usize);
    debug_assert_eq!(values.len() % items_per_lane, 0);
    debug_assert!(values.iter().all(|&v| u64::from(v) <= mask(bit_width)));

    values
        .chunks(items_per_lane)
        .map(|chunk| {
            let bits = chunk
                .iter()
                .enumerate()
                .fold(0u64, |acc, (j, &v)| acc | (u64::from(v) << (j as u32 * bit_width)));
            L::from_bits(bits)
        })
        .collect()
}

/// Inverse of [`pack`].
pub fn unpack<L: Lane>(lanes: &[L], bit_width: u32, items_per_lane: usize) -> Vec<u32> {
    let m = mask(bit_width);
    lanes
        .iter()
        .flat_map(|lane| {
            let bits = lane.to_bits();
            (0..items_per_lane).map(move |j| ((bits >> (j as u32 * bit_width)) & m) as u32)
        })
        .collect()
}

/// Pack 12-bit items two per three bytes.
///
/// Preconditions (checked only in debug builds): every value is `< 4096` and
/// the length is even.
pub fn pack_12(values: &[u32]) -> Vec<u8> {
    debug_assert_eq!(values.len() % 2, 0);
    debug_assert!(values.iter().all(|&v| v < 1 << 12));

    let mut out = Vec::with_capacity(values.len() / 2 * 3);
    for pair in values.chunks_exact(2) {
        let (a, b) = (pair[0], pair[1]);
        out.push((a & 0xff) as u8);
        out.push(((a >> 8) & 0x0f | (b & 0x0f) << 4) as u8);
        out.push(((b >> 4) & 0xff) as u8);
    }
    out
}

/// Inverse of [`pack_12`].
pub fn unpack_12(bytes: &[u8]) -> Vec<u32> {
    let mut out = Vec::with_capacity(bytes.len() / 3 * 2);
    for triple in bytes.chunks_exact(3) {
        let (lo, md, hi) = (u32::from(triple[0]), u32::from(triple[1]), u32::from(triple[2]));
        out.push(lo | (md & 0x0f) << 8);
        out.push(md >> 4 | hi << 4);
    }
    out
}

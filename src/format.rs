use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Transform output to DAC code formatter
///
/// Selects the bits `[lsb, lsb + width)` of a word and inverts the top one of them.
/// For a two's complement slice this is the conversion to offset binary:
/// the most negative value maps to zero, zero maps to mid scale.
/// The result is shifted up by `shift` bits.
/// Truncation only, no rounding.
///
/// ```
/// # use pulsegen::Format;
/// let f = Format::new(0, 16, 0);
/// assert_eq!(f.apply(0), 0x8000);
/// assert_eq!(f.apply(0x8000), 0);
/// assert_eq!(f.apply(0x7fff), 0xffff);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    /// Lowest selected bit
    pub lsb: u32,
    /// Number of selected bits including the sign
    pub width: u32,
    /// Output left shift
    pub shift: u32,
}

impl Default for Format {
    fn default() -> Self {
        Self::new(0, 16, 0)
    }
}

impl Format {
    /// Create a new formatter
    pub const fn new(lsb: u32, width: u32, shift: u32) -> Self {
        Self { lsb, width, shift }
    }

    /// Whether the slice lies within a 32 bit word and the output fits `bits` bits
    pub const fn is_valid(&self, bits: u32) -> bool {
        self.width > 0 && self.lsb + self.width <= 32 && self.width + self.shift <= bits
    }

    /// Format a word
    pub fn apply(&self, word: u32) -> u32 {
        debug_assert!(self.is_valid(32));
        let mask = u32::MAX >> (32 - self.width);
        let sign = 1 << (self.width - 1);
        (((word >> self.lsb) & mask) ^ sign) << self.shift
    }
}

/// Sign extend the low `width` bits of a word
///
/// ```
/// # use pulsegen::truncate;
/// assert_eq!(truncate(0x1234_8001, 16), -0x7fff);
/// assert_eq!(truncate(0xffff_0003, 2), -1);
/// ```
pub fn truncate(word: u32, width: u32) -> i32 {
    debug_assert!((1..=32).contains(&width));
    ((word << (32 - width)) as i32) >> (32 - width)
}

/// Pack a complex sample into a transform buffer word
///
/// The real part occupies the low `width` bits, the imaginary part the next `width` bits.
pub fn pack(x: Complex<i32>, width: u32) -> u32 {
    debug_assert!((1..=16).contains(&width));
    let mask = u32::MAX >> (32 - width);
    (x.re as u32 & mask) | ((x.im as u32 & mask) << width)
}

/// Unpack a transform buffer word, see [`pack()`]
pub fn unpack(word: u32, width: u32) -> Complex<i32> {
    Complex::new(truncate(word, width), truncate(word >> width, width))
}

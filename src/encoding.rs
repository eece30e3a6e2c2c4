//! Bit-level helpers for ARINC 429 words
//!
//! Fields travel least-significant-bit first on the bus, so every field is
//! stored bit-reversed within its own width. Data payloads of the decimal
//! labels are packed as groups of binary-coded decimal nibbles.

/// Reverse the low `width` bits of `value`
///
/// Bits above `width` are ignored. Reversal is an involution:
/// `reverse_bits(reverse_bits(x, w), w) == x` for every `x < 2^w`.
pub fn reverse_bits(value: u32, width: u32) -> u32 {
    debug_assert!(width <= 32);
    if width == 0 {
        return 0;
    }
    (value << (32 - width)).reverse_bits()
}

/// Parity bit that makes the total number of 1s in `bits` plus the bit odd
pub fn odd_parity_bit(bits: u32) -> u32 {
    if bits.count_ones() % 2 == 0 {
        1
    } else {
        0
    }
}

/// Check that a full 32-bit word has an odd number of 1s
///
/// Equivalent to recomputing the parity over bits 32-2 and comparing it
/// with bit 1.
pub fn has_odd_parity(word: u32) -> bool {
    word.count_ones() % 2 == 1
}

/// Layout of a packed decimal field
///
/// Nibble `i` holds the decimal digit of weight `10^(i - fraction_digits)`
/// and sits at bit offset `4 * i`. The most significant nibble may be
/// narrower than 4 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcdLayout {
    /// Number of digits after the decimal point
    pub fraction_digits: i32,
    /// Bit width of every nibble, least significant first
    pub widths: &'static [u32],
}

impl BcdLayout {
    /// Smallest magnitude that no longer fits in the layout
    pub fn limit(&self) -> f64 {
        let top = self.widths.len() as i32 - 1;
        let top_width = self.widths.last().copied().unwrap_or(0);
        (1u32 << top_width) as f64 * 10f64.powi(top - self.fraction_digits)
    }

    /// Pack a non-negative magnitude, truncating below the last digit
    ///
    /// Returns `None` when the magnitude is negative, not finite, or does
    /// not fit in the most significant nibble.
    pub fn pack(&self, magnitude: f64) -> Option<u32> {
        if !magnitude.is_finite() || magnitude < 0.0 || magnitude >= self.limit() {
            return None;
        }

        let top = self.widths.len() - 1;
        let mut bits = 0u32;
        for (i, &width) in self.widths.iter().enumerate() {
            let power = i as i32 - self.fraction_digits;
            let shifted = (if power < 0 {
                magnitude * 10f64.powi(-power)
            } else {
                magnitude / 10f64.powi(power)
            })
            .floor() as u64;
            let digit = if i == top { shifted } else { shifted % 10 };
            bits |= ((digit as u32) & ((1 << width) - 1)) << (4 * i);
        }
        Some(bits)
    }

    /// Unpack a magnitude from the field bits
    pub fn unpack(&self, bits: u32) -> f64 {
        let mut scaled = 0u32;
        let mut weight = 1u32;
        for (i, &width) in self.widths.iter().enumerate() {
            let digit = (bits >> (4 * i)) & ((1 << width) - 1);
            scaled += digit * weight;
            weight *= 10;
        }
        scaled as f64 / 10f64.powi(self.fraction_digits)
    }
}

//! Convolutional channel coding, bit interleaving and sync-vector overlay.
//!
//! The 81 payload+tail bits pass through two parallel rate-1 shift registers
//! of constraint length 32. Each input bit yields one parity bit per
//! register; the 162 parity bits are scattered by a fixed permutation and
//! combined with the 162-bit sync vector into symbols 0..=3
//! (`2*parity + sync`). The three tables below are protocol constants shared
//! by every conforming station; changing any entry breaks interoperability.

use crate::pack::PAYLOAD_BYTES;
use crate::SYMBOL_COUNT;

/// Convolutional generator polynomials (Layland-Lushbaugh)
pub const POLY1: u32 = 0xF2D0_5351;
pub const POLY2: u32 = 0xE461_3C47;

/// Parity of each byte value
#[rustfmt::skip]
pub const PARITY_TABLE: [u8; 256] = [
    0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1,
    1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0,
    1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0,
    0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1,
    1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0,
    0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1,
    0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1,
    1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0,
];

/// Where coded bit `i` lands in the 162-symbol frame
#[rustfmt::skip]
pub const INTERLEAVE: [u8; 162] = [
      0, 128,  64,  32, 160,  96,  16, 144,  80,  48, 112,   8,
    136,  72,  40, 104,  24, 152,  88,  56, 120,   4, 132,  68,
     36, 100,  20, 148,  84,  52, 116,  12, 140,  76,  44, 108,
     28, 156,  92,  60, 124,   2, 130,  66,  34,  98,  18, 146,
     82,  50, 114,  10, 138,  74,  42, 106,  26, 154,  90,  58,
    122,   6, 134,  70,  38, 102,  22, 150,  86,  54, 118,  14,
    142,  78,  46, 110,  30, 158,  94,  62, 126,   1, 129,  65,
     33, 161,  97,  17, 145,  81,  49, 113,   9, 137,  73,  41,
    105,  25, 153,  89,  57, 121,   5, 133,  69,  37, 101,  21,
    149,  85,  53, 117,  13, 141,  77,  45, 109,  29, 157,  93,
     61, 125,   3, 131,  67,  35,  99,  19, 147,  83,  51, 115,
     11, 139,  75,  43, 107,  27, 155,  91,  59, 123,   7, 135,
     71,  39, 103,  23, 151,  87,  55, 119,  15, 143,  79,  47,
    111,  31, 159,  95,  63, 127,
];

/// Pseudo-random synchronization pattern, one bit per symbol position
#[rustfmt::skip]
pub const SYNC_VECTOR: [u8; 162] = [
    1, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1, 0, 1, 1, 1, 1, 0, 0, 0, 0, 0,
    0, 0, 1, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1, 1, 0, 1, 0,
    0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0,
    0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1, 1, 1,
    0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0,
    0, 0,
];

/// Even parity over the set bits of a 32-bit word.
#[inline]
pub fn parity32(mut x: u32) -> u8 {
    x ^= x >> 16;
    x ^= x >> 8;
    PARITY_TABLE[(x & 0xFF) as usize]
}

/// Run the payload through the convolutional encoder, interleaver and sync
/// overlay, producing the 162 channel symbols.
pub fn encode_symbols(payload: &[u8; PAYLOAD_BYTES]) -> [u8; SYMBOL_COUNT] {
    let mut parity = [0u8; SYMBOL_COUNT];
    let mut reg: u32 = 0;
    let mut k = 0;
    'outer: for byte in payload {
        for bit_pos in (0..8).rev() {
            let bit = (byte >> bit_pos) & 1;
            reg = (reg << 1) | bit as u32;
            parity[INTERLEAVE[k] as usize] = parity32(reg & POLY1);
            k += 1;
            if k == SYMBOL_COUNT {
                break 'outer;
            }
            parity[INTERLEAVE[k] as usize] = parity32(reg & POLY2);
            k += 1;
            if k == SYMBOL_COUNT {
                break 'outer;
            }
        }
    }
    let mut symbols = [0u8; SYMBOL_COUNT];
    for i in 0..SYMBOL_COUNT {
        symbols[i] = 2 * parity[i] + SYNC_VECTOR[i];
    }
    symbols
}

/// Undo the interleaver: map a per-symbol-position array back into coded-bit
/// order. Used on the decoder's soft metrics.
pub fn deinterleave<T: Copy + Default>(values: &[T; SYMBOL_COUNT]) -> [T; SYMBOL_COUNT] {
    let mut out = [T::default(); SYMBOL_COUNT];
    for (i, &pos) in INTERLEAVE.iter().enumerate() {
        out[i] = values[pos as usize];
    }
    out
}

/// Re-encode decoded bits and count positions where the parity stream
/// disagrees with hard decisions on the received soft symbols. A perfect
/// decode gives 0; random data averages ~81 of 162.
pub fn reencode_distance(bits: &[u8], soft_symbols: &[u8; SYMBOL_COUNT]) -> usize {
    let mut reg: u32 = 0;
    let mut coded = [0u8; SYMBOL_COUNT];
    let mut k = 0;
    'outer: for &bit in bits {
        reg = (reg << 1) | bit as u32;
        coded[INTERLEAVE[k] as usize] = parity32(reg & POLY1);
        k += 1;
        if k == SYMBOL_COUNT {
            break 'outer;
        }
        coded[INTERLEAVE[k] as usize] = parity32(reg & POLY2);
        k += 1;
        if k == SYMBOL_COUNT {
            break 'outer;
        }
    }
    coded
        .iter()
        .zip(soft_symbols.iter())
        .filter(|&(&c, &s)| c != u8::from(s >= 128))
        .count()
}

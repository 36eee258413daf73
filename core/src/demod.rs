//! Fine synchronization and soft symbol extraction on the 375 Hz baseband.
//!
//! Starting from a coarse candidate, the lag, residual frequency and drift
//! estimates are refined in stages against the coherent sync metric, then
//! each symbol is correlated against the four expected tones to produce the
//! soft metrics the sequential decoder consumes.

use crate::baseband::{BB_RATE, BB_SYMBOL_SAMPLES};
use crate::coding::SYNC_VECTOR;
use crate::{SYMBOL_COUNT, TONE_SPACING_HZ};
use rustfft::num_complex::Complex;
use std::f64::consts::TAU;

/// Baseband samples per spectrogram frame step (4096 / 32)
pub const BB_FRAME_STEP: i32 = 128;

/// Scale applied to normalized soft metrics before clamping to a byte
const SOFT_SCALE: f32 = 50.0;

/// Refined timing and frequency for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct FineSync {
    /// Start of symbol 0 in baseband samples from the window start
    pub start: i32,
    /// Residual frequency relative to the mixed-down candidate centre, Hz
    pub freq_err: f64,
    /// Total drift across the transmission, Hz
    pub drift: f32,
}

impl FineSync {
    /// Start time in seconds from the window start.
    pub fn time_offset(&self) -> f64 {
        self.start as f64 / BB_RATE
    }
}

/// Correlate one symbol against the four tone hypotheses. Returns per-tone
/// powers, `None` when the symbol window falls outside the baseband.
fn tone_powers(
    bb: &[Complex<f32>],
    start: i32,
    symbol_idx: usize,
    freq_offset: f64,
    lsb: bool,
) -> Option<[f32; 4]> {
    let base = start + (symbol_idx * BB_SYMBOL_SAMPLES) as i32;
    if base < 0 || base as usize + BB_SYMBOL_SAMPLES > bb.len() {
        return None;
    }
    let base = base as usize;
    let mut powers = [0.0f32; 4];
    for (tone, p) in powers.iter_mut().enumerate() {
        let freq = (tone as f64 - 1.5) * TONE_SPACING_HZ + freq_offset;
        let step = -TAU * freq / BB_RATE;
        let rot = Complex::new(step.cos() as f32, step.sin() as f32);
        let mut phase = Complex::new(1.0f32, 0.0);
        let mut acc = Complex::new(0.0f32, 0.0);
        for &v in &bb[base..base + BB_SYMBOL_SAMPLES] {
            acc += v * phase;
            phase *= rot;
        }
        *p = acc.norm_sqr();
    }
    if lsb {
        powers.reverse();
    }
    Some(powers)
}

/// Coherent sync correlation at a timing/frequency/drift hypothesis.
/// `stride` subsamples the symbol positions during the coarser passes.
fn sync_power(
    bb: &[Complex<f32>],
    start: i32,
    freq_err: f64,
    drift: f32,
    lsb: bool,
    stride: usize,
) -> f32 {
    let mut total = 0.0f32;
    let mut i = 0;
    while i < SYMBOL_COUNT {
        let fd = freq_err + drift as f64 * ((i as f64 - 81.0) / SYMBOL_COUNT as f64);
        if let Some(p) = tone_powers(bb, start, i, fd, lsb) {
            let odd_minus_even = (p[1] + p[3]) - (p[0] + p[2]);
            total += if SYNC_VECTOR[i] == 1 {
                odd_minus_even
            } else {
                -odd_minus_even
            };
        }
        i += stride;
    }
    total
}

/// Refine a coarse candidate. `frame_offset` is the candidate's start-time
/// estimate in spectrogram frame steps.
pub fn fine_sync(bb: &[Complex<f32>], frame_offset: i32, drift: f32, lsb: bool) -> FineSync {
    let start0 = frame_offset * BB_FRAME_STEP;

    // lag, coarse to fine
    let mut best = (f32::MIN, 0i32);
    let mut lag = -192;
    while lag <= 192 {
        let m = sync_power(bb, start0 + lag, 0.0, drift, lsb, 3);
        if m > best.0 {
            best = (m, lag);
        }
        lag += 16;
    }
    for step in [4i32, 1] {
        let centre = best.1;
        let mut lag = centre - 4 * step;
        while lag <= centre + 4 * step {
            let m = sync_power(bb, start0 + lag, 0.0, drift, lsb, 3);
            if m > best.0 {
                best = (m, lag);
            }
            lag += step;
        }
    }
    let mut lag = best.1;

    // residual frequency
    let mut best_f = (sync_power(bb, start0 + lag, 0.0, drift, lsb, 2), 0.0f64);
    let mut f = -1.5;
    while f <= 1.5 {
        let m = sync_power(bb, start0 + lag, f, drift, lsb, 2);
        if m > best_f.0 {
            best_f = (m, f);
        }
        f += 0.1;
    }
    let centre = best_f.1;
    let mut f = centre - 0.08;
    while f <= centre + 0.08 {
        let m = sync_power(bb, start0 + lag, f, drift, lsb, 2);
        if m > best_f.0 {
            best_f = (m, f);
        }
        f += 0.02;
    }
    let freq_err = best_f.1;

    // drift, re-estimated from scratch at the refined timing
    let mut best_d = (f32::MIN, drift);
    let mut d = -4.0f32;
    while d <= 4.0 {
        let m = sync_power(bb, start0 + lag, freq_err, d, lsb, 2);
        if m > best_d.0 {
            best_d = (m, d);
        }
        d += 0.25;
    }
    let drift = best_d.1;

    // second iteration at full symbol resolution: lag, then frequency
    let mut best_l = (f32::MIN, lag);
    let mut l = lag - 8;
    while l <= lag + 8 {
        let m = sync_power(bb, start0 + l, freq_err, drift, lsb, 1);
        if m > best_l.0 {
            best_l = (m, l);
        }
        l += 1;
    }
    lag = best_l.1;

    let mut best_f2 = (best_l.0, freq_err);
    let mut f = freq_err - 0.06;
    while f <= freq_err + 0.06 {
        let m = sync_power(bb, start0 + lag, f, drift, lsb, 1);
        if m > best_f2.0 {
            best_f2 = (m, f);
        }
        f += 0.02;
    }
    let freq_err = best_f2.1;

    FineSync {
        start: start0 + lag,
        freq_err,
        drift,
    }
}

/// Extract the 162 soft symbols at a refined sync point. The data metric is
/// the power of the tones with data bit 1 minus those with data bit 0,
/// normalized over the transmission and mapped onto 0..=255 around 128.
pub fn soft_symbols(bb: &[Complex<f32>], sync: &FineSync, lsb: bool) -> [u8; SYMBOL_COUNT] {
    let mut raw = [0.0f32; SYMBOL_COUNT];
    for (i, r) in raw.iter_mut().enumerate() {
        let fd = sync.freq_err + sync.drift as f64 * ((i as f64 - 81.0) / SYMBOL_COUNT as f64);
        if let Some(p) = tone_powers(bb, sync.start, i, fd, lsb) {
            *r = (p[2] + p[3]) - (p[0] + p[1]);
        }
    }
    let n = SYMBOL_COUNT as f32;
    let mean = raw.iter().sum::<f32>() / n;
    let var = raw.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / n;
    let sd = var.sqrt().max(f32::MIN_POSITIVE);

    let mut out = [128u8; SYMBOL_COUNT];
    for (o, &r) in out.iter_mut().zip(raw.iter()) {
        let v = (SOFT_SCALE * r / sd).round().clamp(-128.0, 127.0) as i32;
        *o = (v + 128) as u8;
    }
    out
}

//! Downconversion of the capture window to a 375 Hz complex baseband around
//! a candidate frequency.
//!
//! One large forward FFT of the whole window runs per decode. For each
//! candidate, a 46080-bin slab centred on the candidate frequency is pulled
//! out of that spectrum and inverse-transformed, yielding complex samples at
//! 12000/32 = 375 Hz with the candidate centre at DC. The slab edges act as
//! a sharp band-pass, so no separate decimation filter is needed.

use crate::error::{Result, WsprError};
use crate::SAMPLE_RATE;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::sync::Arc;

/// Forward FFT length: 2^15 * 45, comfortably above the 114 s window
pub const FFT_FULL: usize = 1_474_560;

/// Slab / inverse FFT length; FFT_FULL / FFT_SLAB = 32 is the decimation factor
pub const FFT_SLAB: usize = 46_080;

/// Baseband sample rate in Hz
pub const BB_RATE: f64 = SAMPLE_RATE as f64 / DECIMATION as f64;

/// Decimation from audio rate to baseband rate
pub const DECIMATION: usize = 32;

/// Baseband samples per symbol (8192 / 32)
pub const BB_SYMBOL_SAMPLES: usize = 256;

pub struct Downconverter {
    spectrum: Vec<Complex<f32>>,
    inverse: Arc<dyn rustfft::Fft<f32>>,
}

impl Downconverter {
    /// Transform the capture window once. Input shorter than [`FFT_FULL`]
    /// is zero-padded.
    pub fn new(samples: &[f32]) -> Result<Self> {
        if samples.len() > FFT_FULL {
            return Err(WsprError::FftError(format!(
                "window of {} samples exceeds the {FFT_FULL}-point transform",
                samples.len()
            )));
        }
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(FFT_FULL);
        let mut spectrum: Vec<Complex<f32>> = samples
            .iter()
            .map(|&s| Complex::new(s, 0.0))
            .collect();
        spectrum.resize(FFT_FULL, Complex::new(0.0, 0.0));
        forward.process(&mut spectrum);
        let inverse = planner.plan_fft_inverse(FFT_SLAB);
        Ok(Self { spectrum, inverse })
    }

    /// Complex baseband with `center_hz` mixed to DC, 375 samples per second
    /// from the start of the capture window.
    pub fn extract(&self, center_hz: f64) -> Vec<Complex<f32>> {
        let i0 = (center_hz * FFT_FULL as f64 / SAMPLE_RATE as f64).round() as usize;
        let half = FFT_SLAB / 2;
        let mut slab = vec![Complex::new(0.0f32, 0.0); FFT_SLAB];
        for k in 0..half {
            slab[k] = self.spectrum[i0 + k];
        }
        for k in 1..half {
            slab[FFT_SLAB - k] = self.spectrum[i0 - k];
        }
        self.inverse.process(&mut slab);
        let scale = 1.0 / FFT_SLAB as f32;
        for v in slab.iter_mut() {
            *v *= scale;
        }
        slab
    }

    /// Exact frequency that lands on DC after [`extract`], which snaps
    /// `center_hz` to the transform grid (0.0081 Hz).
    pub fn snapped_center(center_hz: f64) -> f64 {
        (center_hz * FFT_FULL as f64 / SAMPLE_RATE as f64).round() * SAMPLE_RATE as f64
            / FFT_FULL as f64
    }
}

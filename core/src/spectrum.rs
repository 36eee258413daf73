//! Spectrogram front-end: Hann-windowed overlapping FFTs of the capture
//! window, restricted to the 1350-1650 Hz WSPR sub-band.
//!
//! The window is 16384 samples (1.365 s, two symbols) stepped by 4096
//! samples. A half-symbol step keeps frames whose window centre falls inside
//! a single symbol regardless of the transmission's start time; symbol
//! centres then land on every other frame.

use crate::error::{Result, WsprError};
use realfft::RealFftPlanner;

/// FFT length: 16384 samples at 12 kHz, bin width 0.7324 Hz (half the tone spacing)
pub const FFT_SIZE: usize = 16384;

/// Frame step: 4096 samples = half a symbol (341 ms)
pub const FRAME_STEP: usize = 4096;

/// Bin width in Hz
pub const BIN_HZ: f64 = crate::SAMPLE_RATE as f64 / FFT_SIZE as f64;

/// First retained FFT bin (1350 Hz)
pub const BIN_LO: usize = 1843;

/// Last retained FFT bin (1650 Hz)
pub const BIN_HI: usize = 2253;

/// Retained band width in bins
pub const BAND_BINS: usize = BIN_HI - BIN_LO + 1;

/// Symbol length in frame steps
pub const STEPS_PER_SYMBOL: usize = 2;

/// Power grid over (frame, band bin).
pub struct Spectrogram {
    power: Vec<f32>,
    n_frames: usize,
}

impl Spectrogram {
    /// Compute the grid from 12 kHz mono samples.
    pub fn compute(samples: &[f32]) -> Result<Self> {
        if samples.len() < FFT_SIZE {
            return Err(WsprError::InsufficientData {
                got: samples.len(),
                needed: FFT_SIZE,
            });
        }
        let n_frames = (samples.len() - FFT_SIZE) / FRAME_STEP + 1;

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let mut input = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();

        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                let x = i as f32 / (FFT_SIZE - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * x).cos())
            })
            .collect();

        let mut power = Vec::with_capacity(n_frames * BAND_BINS);
        for frame in 0..n_frames {
            let start = frame * FRAME_STEP;
            for (dst, (&s, &w)) in input
                .iter_mut()
                .zip(samples[start..start + FFT_SIZE].iter().zip(window.iter()))
            {
                *dst = s * w;
            }
            fft.process(&mut input, &mut spectrum)
                .map_err(|e| WsprError::FftError(format!("spectrogram frame {frame}: {e:?}")))?;
            for bin in BIN_LO..=BIN_HI {
                power.push(spectrum[bin].norm_sqr());
            }
        }
        Ok(Self { power, n_frames })
    }

    #[inline]
    pub fn power(&self, frame: usize, bin: usize) -> f32 {
        self.power[frame * BAND_BINS + bin]
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Median bin power across the whole grid. With a signal occupying a few
    /// bins of the 411-bin band, the median tracks the noise floor.
    pub fn noise_floor(&self) -> f32 {
        let mut sorted = self.power.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted[sorted.len() / 2]
    }

    /// Frequency in Hz of a band bin.
    #[inline]
    pub fn bin_freq(bin: usize) -> f64 {
        (BIN_LO + bin) as f64 * BIN_HZ
    }
}

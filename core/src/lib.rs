//! WSPR (Weak Signal Propagation Reporter) codec
//!
//! Encodes a station report (callsign, Maidenhead grid, power in dBm) into a
//! 162-symbol 4-FSK waveform at 12 kHz, and decodes such waveforms out of
//! noisy 114-second capture windows using sync-vector correlation and a Fano
//! sequential decoder.

pub mod baseband;
pub mod candidate;
pub mod coding;
pub mod decoder;
pub mod demod;
pub mod encoder;
pub mod error;
pub mod fano;
pub mod grid;
pub mod hash;
pub mod message;
pub mod modulator;
pub mod pack;
pub mod spectrum;
pub mod unpack;

pub use decoder::{DecodedRecord, Decoder};
pub use encoder::Encoder;
pub use error::{Result, WsprError};
pub use grid::{grid_distance_km, latlon_to_grid};
pub use hash::{callsign_hash, CallsignHashTable, InMemoryHashTable};
pub use message::Message;

// Configuration constants
pub const SAMPLE_RATE: usize = 12000;
pub const SYMBOL_COUNT: usize = 162;
pub const SYMBOL_SAMPLES: usize = 8192;

/// Tone spacing in Hz (12000 / 8192)
pub const TONE_SPACING_HZ: f64 = SAMPLE_RATE as f64 / SYMBOL_SAMPLES as f64;

/// Audio-band carrier the four tones sit just above
pub const BASE_FREQ_HZ: f64 = 1500.0;

/// Peak amplitude of synthesized PCM (16383 >> 2, half of 16-bit peak with headroom)
pub const PCM_AMPLITUDE: i16 = 4095;

/// Encoder output length: 162 symbols x 8192 samples (~110.6 s)
pub const ENCODE_SAMPLES: usize = SYMBOL_COUNT * SYMBOL_SAMPLES;

/// Decoder input window: 114 s at 12 kHz
pub const DECODE_WINDOW_SECS: usize = 114;
pub const DECODE_WINDOW_SAMPLES: usize = DECODE_WINDOW_SECS * SAMPLE_RATE;

/// WSPR sub-band searched by the decoder, relative to [`BASE_FREQ_HZ`]
pub const SEARCH_HALF_WIDTH_HZ: f64 = 150.0;

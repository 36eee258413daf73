//! Decode side: a buffered 114-second capture window in, a list of decoded
//! reports out.
//!
//! Candidates from the coarse sync search are refined and decoded one at a
//! time; a candidate that fails fine sync, the Fano search, the re-encode
//! check or message grammar is skipped silently and the next one is tried.

use crate::baseband::Downconverter;
use crate::candidate::{self, Candidate};
use crate::coding::reencode_distance;
use crate::demod::{fine_sync, soft_symbols};
use crate::error::{Result, WsprError};
use crate::fano::FanoDecoder;
use crate::hash::{CallsignHashTable, InMemoryHashTable};
use crate::spectrum::Spectrogram;
use crate::unpack::unpack_payload;
use crate::{BASE_FREQ_HZ, DECODE_WINDOW_SAMPLES, TONE_SPACING_HZ};

/// Largest re-encode Hamming distance accepted as a valid decode. Clean
/// decodes give 0, deep-noise decodes a few tens, random bit streams ~81.
const MAX_REENCODE_DISTANCE: usize = 40;

/// Offset from single-bin SNR to the 2500 Hz reporting bandwidth, including
/// the spectrogram window factors
const SNR_REF_DB: f32 = -32.0;

const SNR_FLOOR_DB: f32 = -33.0;
const SNR_CEIL_DB: f32 = 60.0;

/// One decoded transmission with its channel measurements.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    /// SNR referenced to 2500 Hz bandwidth, dB
    pub snr_db: f32,
    /// Frequency of tone 0 relative to the 1500 Hz sub-band centre, Hz
    pub freq_offset_hz: f64,
    /// Transmission start relative to the window start, seconds
    pub time_offset_s: f64,
    /// Total frequency excursion across the transmission, Hz
    pub drift_hz_s: f32,
    /// Printable report, e.g. "K1JT FN20 37"
    pub message_text: String,
    pub callsign: String,
    pub grid: String,
    pub power_dbm: i32,
    /// Dial frequency the caller supplied, MHz (labelling only)
    pub dial_freq_mhz: f64,
    /// Absolute signal frequency, MHz
    pub freq_mhz: f64,
    /// Normalized sync correlation of the underlying candidate
    pub sync_score: f32,
}

pub struct Decoder {
    hash_table: Box<dyn CallsignHashTable>,
    fano: FanoDecoder,
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_hash_table(Box::new(InMemoryHashTable::new()))
    }

    /// Use a caller-provided hash table (persistent store, test stub, or a
    /// table shared across decoders).
    pub fn with_hash_table(hash_table: Box<dyn CallsignHashTable>) -> Self {
        Self {
            hash_table,
            fano: FanoDecoder::new(),
        }
    }

    /// Decode raw little-endian 16-bit mono PCM at 12 kHz.
    pub fn decode_pcm(
        &mut self,
        pcm: &[u8],
        dial_freq_mhz: f64,
        lsb: bool,
    ) -> Result<Vec<DecodedRecord>> {
        if pcm.len() % 2 != 0 {
            return Err(WsprError::MalformedPcm(pcm.len()));
        }
        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        self.decode_samples(&samples, dial_freq_mhz, lsb)
    }

    /// Decode a window of 16-bit samples. At least 114 s must be supplied;
    /// anything beyond 114 s is ignored.
    pub fn decode_samples(
        &mut self,
        samples: &[i16],
        dial_freq_mhz: f64,
        lsb: bool,
    ) -> Result<Vec<DecodedRecord>> {
        if samples.len() < DECODE_WINDOW_SAMPLES {
            return Err(WsprError::InsufficientData {
                got: samples.len(),
                needed: DECODE_WINDOW_SAMPLES,
            });
        }
        let window: Vec<f32> = samples[..DECODE_WINDOW_SAMPLES]
            .iter()
            .map(|&s| s as f32)
            .collect();

        let sg = Spectrogram::compute(&window)?;
        let candidates = candidate::search(&sg, lsb);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let noise_floor = sg.noise_floor();
        let downconverter = Downconverter::new(&window)?;

        let mut records: Vec<DecodedRecord> = Vec::new();
        for cand in &candidates {
            // without signal subtraction, candidates this close to a decoded
            // signal are echoes of it, not a separable second station
            let taken = records.iter().any(|r| {
                (cand.tone0_freq() - (BASE_FREQ_HZ + r.freq_offset_hz)).abs() < 3.0
            });
            if taken {
                continue;
            }
            if let Some(rec) =
                self.try_candidate(cand, &downconverter, &sg, noise_floor, dial_freq_mhz, lsb)
            {
                records.push(rec);
            }
        }

        // sync score descending, then frequency ascending
        records.sort_by(|a, b| {
            b.sync_score
                .total_cmp(&a.sync_score)
                .then_with(|| a.freq_offset_hz.total_cmp(&b.freq_offset_hz))
        });
        // overlapping candidates that resolved to the same report collapse
        // onto the strongest one
        let mut seen: Vec<(String, String, i32, i32)> = Vec::new();
        records.retain(|r| {
            let key = (
                r.callsign.clone(),
                r.grid.clone(),
                r.power_dbm,
                (r.snr_db * 10.0).round() as i32,
            );
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });
        Ok(records)
    }

    fn try_candidate(
        &mut self,
        cand: &Candidate,
        downconverter: &Downconverter,
        sg: &Spectrogram,
        noise_floor: f32,
        dial_freq_mhz: f64,
        lsb: bool,
    ) -> Option<DecodedRecord> {
        let center = Downconverter::snapped_center(cand.center_freq());
        let bb = downconverter.extract(cand.center_freq());
        let sync = fine_sync(&bb, cand.frame_offset, cand.drift, lsb);
        let softs = soft_symbols(&bb, &sync, lsb);

        let fano = self.fano.decode(&softs)?;
        if reencode_distance(&fano.bits, &softs) > MAX_REENCODE_DISTANCE {
            return None;
        }
        let unpacked = unpack_payload(&fano.bits, self.hash_table.as_mut()).ok()?;

        let tone0 = center + sync.freq_err - 1.5 * TONE_SPACING_HZ;
        let freq_offset = tone0 - BASE_FREQ_HZ;
        let snr_db = estimate_snr(sg, cand, noise_floor);
        Some(DecodedRecord {
            snr_db,
            freq_offset_hz: freq_offset,
            time_offset_s: sync.time_offset(),
            drift_hz_s: sync.drift,
            message_text: unpacked.text,
            callsign: unpacked.callsign,
            grid: unpacked.grid,
            power_dbm: unpacked.power_dbm,
            dial_freq_mhz,
            freq_mhz: dial_freq_mhz + (BASE_FREQ_HZ + freq_offset) * 1e-6,
            sync_score: cand.score,
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// SNR in the WSPR convention (2500 Hz reference bandwidth), from the mean
/// strongest-tone-bin power along the candidate track against the band's
/// median noise floor.
fn estimate_snr(sg: &Spectrogram, cand: &Candidate, noise_floor: f32) -> f32 {
    use crate::spectrum::{BAND_BINS, BIN_HZ, STEPS_PER_SYMBOL};
    use crate::SYMBOL_COUNT;

    let n_frames = sg.n_frames() as i32;
    let mut signal = 0.0f32;
    let mut counted = 0usize;
    for i in 0..SYMBOL_COUNT {
        let frame = cand.frame_offset + (STEPS_PER_SYMBOL * i) as i32;
        if frame < 0 || frame >= n_frames {
            continue;
        }
        let shift =
            (cand.drift as f64 * ((i as f64 - 81.0) / SYMBOL_COUNT as f64) / BIN_HZ).round() as i32;
        let b = cand.bin as i32 + shift;
        if b < 0 || b as usize + 6 >= BAND_BINS {
            continue;
        }
        let b = b as usize;
        let frame = frame as usize;
        let peak = (0..4)
            .map(|t| sg.power(frame, b + 2 * t))
            .fold(0.0f32, f32::max);
        signal += peak;
        counted += 1;
    }
    if counted == 0 || noise_floor <= 0.0 {
        return SNR_CEIL_DB;
    }
    let ratio = (signal / counted as f32 / noise_floor - 1.0).max(1e-6);
    (10.0 * ratio.log10() + SNR_REF_DB).clamp(SNR_FLOOR_DB, SNR_CEIL_DB)
}

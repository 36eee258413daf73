//! Coarse search for transmissions: correlate the sync vector against the
//! spectrogram over frequency, start time and linear drift.

use crate::coding::SYNC_VECTOR;
use crate::spectrum::{Spectrogram, BAND_BINS, BIN_HZ, STEPS_PER_SYMBOL};
use crate::{BASE_FREQ_HZ, SYMBOL_COUNT};

/// Candidates below this normalized sync score are not worth a Fano attempt
pub const SCORE_THRESHOLD: f32 = 0.12;

/// Upper bound on candidates examined per decode
pub const MAX_CANDIDATES: usize = 200;

/// Start-time search range in frame steps (-1.02 s .. +2.05 s)
const FRAME_OFFSET_MIN: i32 = -3;
const FRAME_OFFSET_MAX: i32 = 6;

/// Drift search range: +-4 Hz total excursion in 0.25 Hz steps
const DRIFT_STEPS: i32 = 16;
const DRIFT_STEP_HZ: f32 = 0.25;

/// One coarse detection: the band bin of tone 0, the start-time frame
/// offset, the drift estimate and the normalized sync correlation.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub bin: usize,
    pub frame_offset: i32,
    pub drift: f32,
    pub score: f32,
}

impl Candidate {
    /// Frequency of tone 0 in Hz (absolute, audio band).
    pub fn tone0_freq(&self) -> f64 {
        Spectrogram::bin_freq(self.bin)
    }

    /// Centre of the four tones, the frequency the downconverter mixes to DC.
    pub fn center_freq(&self) -> f64 {
        self.tone0_freq() + 1.5 * crate::TONE_SPACING_HZ
    }
}

/// Score one (bin, frame offset, drift) hypothesis: power at the tone pair
/// selected by each sync bit minus power at the other pair, normalized by
/// total power. The four tones sit 2 bins apart; the sync bit selects odd
/// or even tones (mirrored in LSB mode).
fn sync_score(sg: &Spectrogram, bin: usize, frame_offset: i32, drift: f32, lsb: bool) -> f32 {
    let n_frames = sg.n_frames() as i32;
    let mut ss = 0.0f32;
    let mut total = 0.0f32;
    for (i, &sync) in SYNC_VECTOR.iter().enumerate() {
        let frame = frame_offset + (STEPS_PER_SYMBOL * i) as i32;
        if frame < 0 || frame >= n_frames {
            continue;
        }
        let shift = (drift as f64 * ((i as f64 - 81.0) / SYMBOL_COUNT as f64) / BIN_HZ).round()
            as i32;
        let b = bin as i32 + shift;
        if b < 0 || b as usize + 6 >= BAND_BINS {
            continue;
        }
        let b = b as usize;
        let frame = frame as usize;
        let p0 = sg.power(frame, b);
        let p1 = sg.power(frame, b + 2);
        let p2 = sg.power(frame, b + 4);
        let p3 = sg.power(frame, b + 6);
        let direction = if sync == 1 { 1.0 } else { -1.0 };
        let odd_minus_even = (p1 + p3) - (p0 + p2);
        ss += direction * if lsb { -odd_minus_even } else { odd_minus_even };
        total += p0 + p1 + p2 + p3;
    }
    if total > 0.0 {
        ss / total
    } else {
        0.0
    }
}

/// Scan the band and return candidates above threshold, strongest first,
/// pruned so no two sit within 2 bins of each other.
pub fn search(sg: &Spectrogram, lsb: bool) -> Vec<Candidate> {
    let mut raw: Vec<Candidate> = Vec::new();
    for bin in 0..BAND_BINS - 6 {
        let mut best: Option<Candidate> = None;
        for frame_offset in FRAME_OFFSET_MIN..=FRAME_OFFSET_MAX {
            for step in -DRIFT_STEPS..=DRIFT_STEPS {
                let drift = step as f32 * DRIFT_STEP_HZ;
                let score = sync_score(sg, bin, frame_offset, drift, lsb);
                if best.map_or(true, |b| score > b.score) {
                    best = Some(Candidate {
                        bin,
                        frame_offset,
                        drift,
                        score,
                    });
                }
            }
        }
        if let Some(c) = best {
            if c.score >= SCORE_THRESHOLD {
                raw.push(c);
            }
        }
    }
    // strongest first; ties go to the candidate nearer the band centre
    raw.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| center_distance(a).total_cmp(&center_distance(b)))
    });
    let mut picked: Vec<Candidate> = Vec::new();
    for c in raw {
        if picked.iter().all(|p| c.bin.abs_diff(p.bin) >= 2) {
            picked.push(c);
            if picked.len() >= MAX_CANDIDATES {
                break;
            }
        }
    }
    picked
}

fn center_distance(c: &Candidate) -> f64 {
    (c.center_freq() - BASE_FREQ_HZ).abs()
}

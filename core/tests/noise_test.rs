use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use wsprwave_core::{Decoder, Encoder, Message, DECODE_WINDOW_SAMPLES};

/// Mix a clean transmission into AWGN at the requested SNR (2500 Hz
/// reference bandwidth). The composite is scaled down so the noise never
/// clips the 16-bit range.
fn noisy_window(msg: &Message, offset_hz: i32, snr_db: f64, seed: u64) -> Vec<i16> {
    let clean = Encoder::new().encode_to_samples(msg, offset_hz, false).unwrap();
    let amplitude = 4095.0 / 16.0;
    let sigma = amplitude * (1.2 * 10f64.powf(-snr_db / 10.0)).sqrt();
    let normal = Normal::new(0.0, sigma).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..DECODE_WINDOW_SAMPLES)
        .map(|i| {
            let s = clean.get(i).copied().unwrap_or(0) as f64 / 16.0;
            (s + normal.sample(&mut rng)).round().clamp(-32768.0, 32767.0) as i16
        })
        .collect()
}

fn random_message(rng: &mut StdRng) -> Message {
    let callsign = format!(
        "{}{}{}{}",
        (b'A' + rng.gen_range(0..26)) as char,
        rng.gen_range(0..10),
        (b'A' + rng.gen_range(0..26)) as char,
        (b'A' + rng.gen_range(0..26)) as char,
    );
    let grid = format!(
        "{}{}{}{}",
        (b'A' + rng.gen_range(0..18)) as char,
        (b'A' + rng.gen_range(0..18)) as char,
        rng.gen_range(0..10),
        rng.gen_range(0..10),
    );
    let power = [0, 10, 23, 37, 47, 60][rng.gen_range(0..6)];
    Message::new(&callsign, &grid, power).unwrap()
}

#[test]
fn test_decode_at_minus_20_db() {
    let msg = Message::new("K1JT", "FN20", 37).unwrap();
    for seed in [1u64, 2] {
        let samples = noisy_window(&msg, 30, -20.0, seed);
        let mut decoder = Decoder::new();
        let records = decoder.decode_samples(&samples, 14.0956, false).unwrap();
        let hit = records
            .iter()
            .find(|r| r.callsign == "K1JT" && r.grid == "FN20" && r.power_dbm == 37)
            .unwrap_or_else(|| panic!("no decode at -20 dB with seed {seed}"));
        assert!((hit.freq_offset_hz - 30.0).abs() < 1.5);
        // the SNR estimate should be in the right neighbourhood
        assert!(
            hit.snr_db > -28.0 && hit.snr_db < -12.0,
            "snr estimate {} for a -20 dB signal",
            hit.snr_db
        );
    }
}

#[test]
fn test_decode_at_minus_26_db() {
    // deep in the noise individual realizations can still miss; two
    // independent windows and at least one decode keeps the test honest
    let msg = Message::new("K1JT", "FN20", 37).unwrap();
    let mut decodes = 0;
    for seed in [11u64, 12] {
        let samples = noisy_window(&msg, 30, -26.0, seed);
        let mut decoder = Decoder::new();
        let records = decoder.decode_samples(&samples, 14.0956, false).unwrap();
        if records
            .iter()
            .any(|r| r.callsign == "K1JT" && r.grid == "FN20" && r.power_dbm == 37)
        {
            decodes += 1;
        }
    }
    assert!(decodes >= 1, "no decode at -26 dB in two windows");
}

#[test]
fn test_noise_only_window_decodes_nothing() {
    let normal = Normal::<f64>::new(0.0, 2000.0).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let samples: Vec<i16> = (0..DECODE_WINDOW_SAMPLES)
        .map(|_| normal.sample(&mut rng).round() as i16)
        .collect();
    let mut decoder = Decoder::new();
    let records = decoder.decode_samples(&samples, 14.0956, false).unwrap();
    assert!(records.is_empty(), "false decode from pure noise: {:?}", records);
}

/// The decoder noise-floor property: at -28 dB (2500 Hz reference) at least
/// half of 1000 random messages must decode. This is ~1000 full decodes
/// (on the order of an hour); run it with `cargo test --release -- --ignored`
/// when touching the demodulator, metric tables or the Fano decoder.
#[test]
#[ignore]
fn test_noise_floor_minus_28_db_over_1000_messages() {
    let mut rng = StdRng::seed_from_u64(42);
    let trials = 1000;
    let mut decoded = 0usize;
    for t in 0..trials {
        let msg = random_message(&mut rng);
        let offset = rng.gen_range(-120..120);
        let samples = noisy_window(&msg, offset, -28.0, 1000 + t as u64);
        let mut decoder = Decoder::new();
        let records = decoder.decode_samples(&samples, 14.0956, false).unwrap();
        if records
            .iter()
            .any(|r| r.callsign == msg.callsign && r.grid == msg.grid)
        {
            decoded += 1;
        }
        if t % 50 == 49 {
            println!("{}/{} decoded after {} trials", decoded, t + 1, t + 1);
        }
    }
    assert!(
        decoded * 2 >= trials,
        "decoded only {decoded}/{trials} at -28 dB"
    );
}

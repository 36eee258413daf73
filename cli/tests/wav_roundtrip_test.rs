//! WAV round-trip through the same hound read/write path the CLI uses.

use hound::{SampleFormat, WavSpec};
use std::fs::File;
use wsprwave_core::{Decoder, Encoder, Message, DECODE_WINDOW_SAMPLES, SAMPLE_RATE};

#[test]
fn test_wav_file_roundtrip() {
    let msg = Message::new("K1JT", "FN20", 37).unwrap();
    let mut samples = Encoder::new().encode_to_samples(&msg, 40, false).unwrap();
    samples.resize(DECODE_WINDOW_SAMPLES, 0);

    let path = std::env::temp_dir().join("wsprwave_roundtrip_test.wav");
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(File::create(&path).unwrap(), spec).unwrap();
    for &s in &samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let mut reader = hound::WavReader::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(reader.spec().sample_rate, SAMPLE_RATE as u32);
    let read_back: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>().unwrap();
    assert_eq!(read_back, samples);

    let mut decoder = Decoder::new();
    let records = decoder.decode_samples(&read_back, 14.0956, false).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message_text, "K1JT FN20 37");

    std::fs::remove_file(&path).ok();
}

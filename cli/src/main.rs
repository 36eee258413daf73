use clap::{Parser, Subcommand};
use hound::WavSpec;
use std::fs::File;
use std::path::PathBuf;
use wsprwave_core::{Decoder, Encoder, Message, DECODE_WINDOW_SAMPLES, ENCODE_SAMPLES, SAMPLE_RATE};

#[derive(Parser)]
#[command(name = "wsprwave")]
#[command(about = "WSPR beacon encoder/decoder for 12 kHz WAV audio")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a station report to a WAV file
    Encode {
        /// Callsign (1-6 characters, digit at position 1 or 2)
        callsign: String,

        /// 4-character Maidenhead grid square
        grid: String,

        /// Power in dBm (0-60; snapped to the nearest 0/3/7 value)
        power: i32,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Frequency offset in Hz added to the 1500 Hz audio carrier
        #[arg(short, long, default_value = "0")]
        offset: i32,

        /// LSB mode (mirrors the tone order)
        #[arg(long)]
        lsb: bool,
    },

    /// Decode all WSPR transmissions from a WAV file
    Decode {
        /// Input WAV file (12 kHz, at least 114 s)
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Dial frequency in MHz, used to label the results
        #[arg(short, long, default_value = "14.0956")]
        dial: f64,

        /// LSB mode (mirrors the tone order)
        #[arg(long)]
        lsb: bool,
    },

    /// Print the 162 channel symbols or tone frequencies for a report
    Symbols {
        /// Callsign (1-6 characters, digit at position 1 or 2)
        callsign: String,

        /// 4-character Maidenhead grid square
        grid: String,

        /// Power in dBm (0-60)
        power: i32,

        /// Print tone frequencies in centihertz instead of symbol values
        #[arg(short, long)]
        frequencies: bool,

        /// Frequency offset in Hz (only affects --frequencies)
        #[arg(short, long, default_value = "0")]
        offset: i32,

        /// LSB mode (mirrors the tone order)
        #[arg(long)]
        lsb: bool,
    },
}

fn main() {
    let result = match Cli::parse().command {
        Commands::Encode {
            callsign,
            grid,
            power,
            output,
            offset,
            lsb,
        } => encode_command(&callsign, &grid, power, &output, offset, lsb),
        Commands::Decode { input, dial, lsb } => decode_command(&input, dial, lsb),
        Commands::Symbols {
            callsign,
            grid,
            power,
            frequencies,
            offset,
            lsb,
        } => symbols_command(&callsign, &grid, power, frequencies, offset, lsb),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn encode_command(
    callsign: &str,
    grid: &str,
    power: i32,
    output: &PathBuf,
    offset: i32,
    lsb: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let msg = Message::new(callsign, grid, power)?;
    let samples = Encoder::new().encode_to_samples(&msg, offset, lsb)?;
    println!(
        "Encoded \"{}\" to {} samples ({:.1} s)",
        msg,
        samples.len(),
        samples.len() as f64 / SAMPLE_RATE as f64
    );

    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let file = File::create(output)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn decode_command(input: &PathBuf, dial: f64, lsb: bool) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();
    println!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );
    if spec.sample_rate != SAMPLE_RATE as u32 {
        return Err(format!(
            "expected {} Hz input, got {} Hz (resample before decoding)",
            SAMPLE_RATE, spec.sample_rate
        )
        .into());
    }
    if spec.bits_per_sample != 16 {
        return Err(format!("expected 16-bit samples, got {}", spec.bits_per_sample).into());
    }

    let mut samples: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
    if spec.channels == 2 {
        println!("Converting stereo to mono...");
        samples = samples
            .chunks_exact(2)
            .map(|p| ((p[0] as i32 + p[1] as i32) / 2) as i16)
            .collect();
    } else if spec.channels != 1 {
        return Err(format!("unsupported channel count: {}", spec.channels).into());
    }

    // a recording holding a complete transmission (110.6 s) but short of the
    // 114 s analysis window is padded out with silence
    if samples.len() >= ENCODE_SAMPLES && samples.len() < DECODE_WINDOW_SAMPLES {
        samples.resize(DECODE_WINDOW_SAMPLES, 0);
    }

    let mut decoder = Decoder::new();
    let records = decoder.decode_samples(&samples, dial, lsb)?;
    if records.is_empty() {
        println!("No WSPR transmissions found");
        return Ok(());
    }
    println!("  SNR    DT     Freq        Drift  Message");
    for r in &records {
        println!(
            "{:6.1} {:5.2} {:12.6} {:6.2}  {}",
            r.snr_db, r.time_offset_s, r.freq_mhz, r.drift_hz_s, r.message_text
        );
    }
    println!("{} decode(s)", records.len());
    Ok(())
}

fn symbols_command(
    callsign: &str,
    grid: &str,
    power: i32,
    frequencies: bool,
    offset: i32,
    lsb: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let msg = Message::new(callsign, grid, power)?;
    let encoder = Encoder::new();
    if frequencies {
        let freqs = encoder.encode_to_frequencies(&msg, offset, lsb)?;
        for chunk in freqs.chunks(9) {
            let line: Vec<String> = chunk.iter().map(|f| f.to_string()).collect();
            println!("{}", line.join(" "));
        }
    } else {
        let symbols = encoder.encode_to_symbols(&msg)?;
        for chunk in symbols.chunks(27) {
            let line: Vec<String> = chunk.iter().map(|s| s.to_string()).collect();
            println!("{}", line.join(" "));
        }
    }
    Ok(())
}

//! Encode side: station report to channel symbols, PCM or tone frequencies.

use crate::coding::encode_symbols;
use crate::error::Result;
use crate::message::Message;
use crate::modulator::{samples_to_bytes, synthesize, tone_frequencies_centihz};
use crate::pack::pack_payload;
use crate::SYMBOL_COUNT;

pub struct Encoder;

impl Encoder {
    pub fn new() -> Self {
        Self
    }

    /// The 162 channel symbols for a report.
    pub fn encode_to_symbols(&self, msg: &Message) -> Result<[u8; SYMBOL_COUNT]> {
        let payload = pack_payload(msg)?;
        Ok(encode_symbols(&payload))
    }

    /// 12 kHz mono `i16` samples, 162 x 8192 of them (~110.6 s).
    pub fn encode_to_samples(&self, msg: &Message, offset_hz: i32, lsb: bool) -> Result<Vec<i16>> {
        let symbols = self.encode_to_symbols(msg)?;
        Ok(synthesize(&symbols, offset_hz, lsb))
    }

    /// Little-endian 16-bit PCM bytes (the raw wire format), 2,654,208 bytes.
    pub fn encode_to_pcm(&self, msg: &Message, offset_hz: i32, lsb: bool) -> Result<Vec<u8>> {
        Ok(samples_to_bytes(&self.encode_to_samples(msg, offset_hz, lsb)?))
    }

    /// Tone frequencies in centihertz for hardware transmitters that key an
    /// oscillator directly.
    pub fn encode_to_frequencies(
        &self,
        msg: &Message,
        offset_hz: i32,
        lsb: bool,
    ) -> Result<Vec<i64>> {
        let symbols = self.encode_to_symbols(msg)?;
        Ok(tone_frequencies_centihz(&symbols, offset_hz, lsb))
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

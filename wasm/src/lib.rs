//! WebAssembly bindings for the WSPR codec.
//!
//! Thin wrappers over the core encoder/decoder, exposing PCM byte buffers
//! and per-record accessors to JavaScript.

use wasm_bindgen::prelude::*;
use wsprwave_core::{DecodedRecord, Decoder, Encoder, Message};

/// One decoded transmission, exposed to JavaScript.
#[wasm_bindgen(getter_with_clone)]
pub struct WasmRecord {
    pub snr_db: f32,
    pub freq_offset_hz: f64,
    pub time_offset_s: f64,
    pub drift_hz_s: f32,
    pub message_text: String,
    pub callsign: String,
    pub grid: String,
    pub power_dbm: i32,
    pub freq_mhz: f64,
}

impl From<&DecodedRecord> for WasmRecord {
    fn from(r: &DecodedRecord) -> Self {
        WasmRecord {
            snr_db: r.snr_db,
            freq_offset_hz: r.freq_offset_hz,
            time_offset_s: r.time_offset_s,
            drift_hz_s: r.drift_hz_s,
            message_text: r.message_text.clone(),
            callsign: r.callsign.clone(),
            grid: r.grid.clone(),
            power_dbm: r.power_dbm,
            freq_mhz: r.freq_mhz,
        }
    }
}

#[wasm_bindgen]
pub struct WasmEncoder {
    inner: Encoder,
}

#[wasm_bindgen]
impl WasmEncoder {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmEncoder {
        WasmEncoder {
            inner: Encoder::new(),
        }
    }

    /// Encode a report to raw little-endian 16-bit PCM at 12 kHz.
    pub fn encode_to_pcm(
        &self,
        callsign: &str,
        grid: &str,
        power_dbm: i32,
        offset_hz: i32,
        lsb: bool,
    ) -> Result<Vec<u8>, JsValue> {
        let msg = Message::new(callsign, grid, power_dbm).map_err(to_js)?;
        self.inner.encode_to_pcm(&msg, offset_hz, lsb).map_err(to_js)
    }

    /// Tone frequencies in centihertz for hardware transmitters.
    pub fn encode_to_frequencies(
        &self,
        callsign: &str,
        grid: &str,
        power_dbm: i32,
        offset_hz: i32,
        lsb: bool,
    ) -> Result<Vec<i64>, JsValue> {
        let msg = Message::new(callsign, grid, power_dbm).map_err(to_js)?;
        self.inner
            .encode_to_frequencies(&msg, offset_hz, lsb)
            .map_err(to_js)
    }

    /// The 162 channel symbols (values 0-3).
    pub fn encode_to_symbols(
        &self,
        callsign: &str,
        grid: &str,
        power_dbm: i32,
    ) -> Result<Vec<u8>, JsValue> {
        let msg = Message::new(callsign, grid, power_dbm).map_err(to_js)?;
        Ok(self.inner.encode_to_symbols(&msg).map_err(to_js)?.to_vec())
    }
}

impl Default for WasmEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoder with a process-lifetime callsign hash table: keep one instance
/// around so Type 2/3 hash references resolve across decode calls.
#[wasm_bindgen]
pub struct WasmDecoder {
    inner: Decoder,
    records: Vec<DecodedRecord>,
}

#[wasm_bindgen]
impl WasmDecoder {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmDecoder {
        WasmDecoder {
            inner: Decoder::new(),
            records: Vec::new(),
        }
    }

    /// Decode a 114-second window of raw little-endian 16-bit PCM.
    /// Returns the number of transmissions found.
    pub fn decode(&mut self, pcm: &[u8], dial_freq_mhz: f64, lsb: bool) -> Result<u32, JsValue> {
        self.records = self.inner.decode_pcm(pcm, dial_freq_mhz, lsb).map_err(to_js)?;
        Ok(self.records.len() as u32)
    }

    /// Fetch one record from the last decode call.
    pub fn record(&self, index: u32) -> Option<WasmRecord> {
        self.records.get(index as usize).map(WasmRecord::from)
    }

    pub fn record_count(&self) -> u32 {
        self.records.len() as u32
    }
}

impl Default for WasmDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// 15-bit callsign hash as used by Type 3 messages.
#[wasm_bindgen]
pub fn callsign_hash(callsign: &str) -> u16 {
    wsprwave_core::callsign_hash(callsign)
}

/// Great-circle distance in km between two grid locators.
#[wasm_bindgen]
pub fn grid_distance_km(a: &str, b: &str) -> Result<f64, JsValue> {
    wsprwave_core::grid_distance_km(a, b).map_err(to_js)
}

/// 6-character grid locator for a latitude/longitude.
#[wasm_bindgen]
pub fn latlon_to_grid(lat: f64, lon: f64) -> Result<String, JsValue> {
    wsprwave_core::latlon_to_grid(lat, lon).map_err(to_js)
}

fn to_js(e: wsprwave_core::WsprError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

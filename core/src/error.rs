use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsprError {
    #[error("Invalid callsign: {0}")]
    InvalidCallsign(String),

    #[error("Invalid grid locator: {0}")]
    InvalidGrid(String),

    #[error("Power {0} dBm outside 0..=60")]
    InvalidPower(i32),

    #[error("Insufficient audio: got {got} samples, need {needed}")]
    InsufficientData { got: usize, needed: usize },

    #[error("PCM byte buffer length {0} is not a whole number of 16-bit samples")]
    MalformedPcm(usize),

    #[error("Coordinate out of domain: {0}")]
    CoordinateDomain(String),

    #[error("FFT error: {0}")]
    FftError(String),
}

pub type Result<T> = std::result::Result<T, WsprError>;

use thiserror::Error;

use crate::decoder::Status;

#[derive(Debug, Error)]
pub enum ModemError {
    #[error("message is {len} bytes, the payload field holds at most {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("callsign is {len} bytes, the callsign field holds at most {max}")]
    CallsignTooLong { len: usize, max: usize },

    #[error("unsupported sample rate {0} Sa/s")]
    UnsupportedRate(u32),

    #[error("carrier frequency {0} Hz does not fit the audio band at this rate")]
    CarrierOutOfBand(i32),

    #[error("not a RIFF/WAVE file")]
    BadMagic,

    #[error("unsupported WAV encoding, expected canonical 16-bit PCM")]
    UnsupportedEncoding,

    #[error("WAV file shorter than its declared size")]
    Truncated,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("audio ended before the decoder reached a verdict")]
    InsufficientData,

    #[error("decoding failed with status {}", .0.label())]
    DecodeFailed(Status),

    #[error("payload extraction failed after an otherwise complete frame")]
    FetchFailed,

    #[error("encoder produced no samples")]
    EmptyOutput,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;

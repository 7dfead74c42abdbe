//! Audio modem shell for short text transmissions in amateur/experimental radio
//!
//! Turns a message plus callsign into a PCM waveform (BPSK-OFDM with
//! Reed-Solomon FEC) and a captured waveform back into a message with
//! diagnostic metadata. Batch use goes through [`encode_to_wav`] and
//! [`decode_wav`]; incremental use goes through [`StreamingDecoder`].

pub mod channel;
pub mod decode;
pub mod decoder;
pub mod encode;
pub mod encoder;
pub mod error;
pub mod fec;
pub mod framing;
pub mod ofdm;
pub mod rate;
pub mod stream;
pub mod wav;

pub use decode::{decode_samples, decode_wav, DecodeOutcome};
pub use decoder::{Decoder, StagedInfo, Status, StreamDecoder};
pub use encode::{encode_samples, encode_to_wav, EncodeRequest};
pub use encoder::Encoder;
pub use error::{ModemError, Result};
pub use rate::{FrameGeometry, SampleRate};
pub use stream::{StreamEvent, StreamingDecoder};

/// Fixed payload field: up to 169 message bytes plus a NUL terminator.
pub const PAYLOAD_LEN: usize = 170;
/// Longest message that still leaves room for the terminator.
pub const MAX_MESSAGE_LEN: usize = PAYLOAD_LEN - 1;
/// Fixed callsign field, zero-padded.
pub const CALLSIGN_LEN: usize = 10;

/// Nominal carrier the receiver tunes to; staged carrier-offset estimates
/// are relative to this.
pub const DEFAULT_CARRIER_HZ: i32 = 1500;

//! Encode orchestration: validate a request, drive the block producer,
//! and assemble the finished sample buffer.

use std::path::Path;

use crate::channel::output_channels;
use crate::encoder::Encoder;
use crate::error::{ModemError, Result};
use crate::rate::SampleRate;
use crate::wav::write_wav;
use crate::{CALLSIGN_LEN, MAX_MESSAGE_LEN, PAYLOAD_LEN};

#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub message: String,
    pub callsign: String,
    pub carrier_frequency: i32,
    pub noise_symbols: i32,
    pub fancy_header: bool,
    pub sample_rate: u32,
    pub channel: i32,
}

impl Default for EncodeRequest {
    fn default() -> Self {
        EncodeRequest {
            message: String::new(),
            callsign: "N0CALL".to_string(),
            carrier_frequency: 1500,
            noise_symbols: 0,
            fancy_header: false,
            sample_rate: 48000,
            channel: 0,
        }
    }
}

/// Run one transmission through the producer protocol and return the
/// assembled interleaved sample buffer.
///
/// The producer contract: keep appending while `produce` reports more
/// blocks remain, then make exactly one further call and append its
/// output unconditionally, giving the transmission its silent tail block.
pub fn encode_samples(request: &EncodeRequest) -> Result<Vec<i16>> {
    let rate = SampleRate::from_hz(request.sample_rate)?;

    if request.message.len() > MAX_MESSAGE_LEN {
        return Err(ModemError::MessageTooLong {
            len: request.message.len(),
            max: MAX_MESSAGE_LEN,
        });
    }
    if request.callsign.len() > CALLSIGN_LEN {
        return Err(ModemError::CallsignTooLong {
            len: request.callsign.len(),
            max: CALLSIGN_LEN,
        });
    }
    let mut payload = [0u8; PAYLOAD_LEN];
    payload[..request.message.len()].copy_from_slice(request.message.as_bytes());
    let mut callsign = [0u8; CALLSIGN_LEN];
    callsign[..request.callsign.len()].copy_from_slice(request.callsign.as_bytes());

    let mut encoder = Encoder::new(rate);
    encoder.configure(
        &payload,
        &callsign,
        request.carrier_frequency,
        request.noise_symbols,
        request.fancy_header,
    )?;

    let stride = output_channels(request.channel) as usize;
    let mut block = vec![0i16; stride * rate.geometry().extended_len];
    let mut samples = Vec::new();
    while encoder.produce(&mut block, request.channel) {
        samples.extend_from_slice(&block);
    }
    encoder.produce(&mut block, request.channel);
    samples.extend_from_slice(&block);

    if samples.is_empty() {
        return Err(ModemError::EmptyOutput);
    }
    log::debug!(
        "encoded {} samples at {} Sa/s, {} channel(s)",
        samples.len(),
        rate.hz(),
        stride
    );
    Ok(samples)
}

/// Encode straight to a canonical WAV file. The file is written only
/// after the whole buffer is assembled.
pub fn encode_to_wav(request: &EncodeRequest, path: &Path) -> Result<()> {
    let samples = encode_samples(request)?;
    write_wav(
        path,
        &samples,
        request.sample_rate,
        output_channels(request.channel),
    )
}

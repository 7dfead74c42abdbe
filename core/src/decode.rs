//! Decode orchestration: chunk a finite capture through the streaming
//! decoder, stop on a terminal status, and assemble the outcome record.

use std::path::Path;

use crate::channel::resolve_channel_select;
use crate::decoder::{Decoder, StagedInfo, Status, StreamDecoder};
use crate::error::{ModemError, Result};
use crate::framing::trim_callsign;
use crate::rate::SampleRate;
use crate::wav::read_wav;
use crate::PAYLOAD_LEN;

#[derive(Debug, Clone)]
pub struct DecodeOutcome {
    pub status: Status,
    pub message: String,
    pub bit_flips: i32,
    pub callsign: String,
    pub mode: i32,
    pub carrier_offset: f32,
    pub sample_rate: u32,
    pub channels: u16,
    pub channel_select: i32,
}

/// Feed a finite capture in symbol-aligned chunks until the decoder
/// reaches a verdict. Okay and Sync keep the loop feeding; Done, Fail,
/// Nope and Ping stop it immediately, leaving any remaining audio
/// untouched.
fn run_loop<D: StreamDecoder>(
    decoder: &mut D,
    samples: &[i16],
    extended_len: usize,
    channels: u16,
    channel_select: i32,
) -> Status {
    let stride = channels.max(1) as usize;
    let mut status = Status::Okay;
    let mut offset = 0;
    while offset < samples.len() {
        let frames = extended_len.min((samples.len() - offset) / stride);
        if frames == 0 {
            break;
        }
        let chunk = frames * stride;
        let ready = decoder.feed(&samples[offset..offset + chunk], frames, channel_select);
        offset += chunk;
        if ready {
            status = decoder.process();
            if status.is_terminal() {
                break;
            }
        }
    }
    status
}

/// Decode a raw interleaved capture. A negative `channel_select`
/// auto-resolves against the channel layout.
pub fn decode_samples(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
    channel_select: i32,
) -> Result<DecodeOutcome> {
    let rate = SampleRate::from_hz(sample_rate)?;
    let select = resolve_channel_select(channel_select, channels);
    let mut decoder = Decoder::new(rate);
    let status = run_loop(
        &mut decoder,
        samples,
        rate.geometry().extended_len,
        channels,
        select,
    );

    let outcome = |staged: StagedInfo, message: String, bit_flips: i32| DecodeOutcome {
        status,
        message,
        bit_flips,
        callsign: trim_callsign(&staged.callsign),
        mode: staged.mode,
        carrier_offset: staged.carrier_offset,
        sample_rate,
        channels,
        channel_select: select,
    };

    match status {
        Status::Done => {
            let staged = decoder.staged();
            let mut payload = [0u8; PAYLOAD_LEN];
            let bit_flips = decoder.fetch(&mut payload);
            if bit_flips < 0 {
                return Err(ModemError::FetchFailed);
            }
            let end = payload.iter().position(|&b| b == 0).unwrap_or(PAYLOAD_LEN);
            let message = String::from_utf8_lossy(&payload[..end]).into_owned();
            Ok(outcome(staged, message, bit_flips))
        }
        Status::Nope | Status::Ping => Ok(outcome(decoder.staged(), String::new(), 0)),
        Status::Okay | Status::Sync => Err(ModemError::InsufficientData),
        Status::Fail | Status::Heap => Err(ModemError::DecodeFailed(status)),
    }
}

/// Decode a WAV capture from disk.
pub fn decode_wav(path: &Path, channel_select: i32) -> Result<DecodeOutcome> {
    let (samples, rate, channels) = read_wav(path)?;
    decode_samples(&samples, rate, channels, channel_select)
}

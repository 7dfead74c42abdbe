//! Persistent streaming adapter: one decoder slot keyed by the active
//! sample rate, fed a chunk at a time by a host runtime. Replaced
//! wholesale on rate change and after every terminal outcome; never
//! mutated in place across a reset.
//!
//! Not safe for concurrent callers. Anything sharing one
//! [`StreamingDecoder`] across threads must serialize access itself.

use crate::channel::resolve_channel_select;
use crate::decoder::{Decoder, Status, StreamDecoder};
use crate::error::Result;
use crate::framing::trim_callsign;
use crate::rate::SampleRate;
use crate::PAYLOAD_LEN;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// No event yet; keep feeding chunks.
    Pending,
    /// A status other than success surfaced: Sync as a diagnostic (the
    /// transmission continues), or a failure-class terminal status (the
    /// slot was reset).
    Diagnostic(Status),
    /// A transmission decoded; the slot was reset for the next one.
    Decoded { message: String, callsign: String },
}

pub struct StreamingDecoder {
    slot: Option<(SampleRate, Decoder)>,
}

impl StreamingDecoder {
    pub const fn new() -> Self {
        StreamingDecoder { slot: None }
    }

    pub fn active_rate(&self) -> Option<u32> {
        self.slot.as_ref().map(|(rate, _)| rate.hz())
    }

    fn reset(&mut self, rate: SampleRate) {
        self.slot = Some((rate, Decoder::new(rate)));
    }

    /// Feed one chunk and attempt one processing step. A rate change
    /// discards any in-flight state and starts a new transmission.
    pub fn feed_chunk(
        &mut self,
        samples: &[i16],
        sample_rate: u32,
        channels: u16,
        channel_select: i32,
    ) -> Result<StreamEvent> {
        let rate = SampleRate::from_hz(sample_rate)?;
        match &self.slot {
            Some((active, _)) if *active == rate => {}
            _ => self.reset(rate),
        }
        let select = resolve_channel_select(channel_select, channels);
        let stride = channels.max(1) as usize;
        let frames = samples.len() / stride;

        let Some((_, decoder)) = self.slot.as_mut() else {
            return Ok(StreamEvent::Pending);
        };
        if !decoder.feed(&samples[..frames * stride], frames, select) {
            return Ok(StreamEvent::Pending);
        }
        let status = decoder.process();
        match status {
            Status::Okay => Ok(StreamEvent::Pending),
            Status::Sync => Ok(StreamEvent::Diagnostic(Status::Sync)),
            Status::Done => {
                let staged = decoder.staged();
                let mut payload = [0u8; PAYLOAD_LEN];
                let bit_flips = decoder.fetch(&mut payload);
                self.reset(rate);
                if bit_flips < 0 {
                    // Framing completed but extraction failed; report it
                    // as a plain decode failure.
                    return Ok(StreamEvent::Diagnostic(Status::Fail));
                }
                let end = payload.iter().position(|&b| b == 0).unwrap_or(PAYLOAD_LEN);
                Ok(StreamEvent::Decoded {
                    message: String::from_utf8_lossy(&payload[..end]).into_owned(),
                    callsign: trim_callsign(&staged.callsign),
                })
            }
            Status::Fail | Status::Nope | Status::Ping | Status::Heap => {
                self.reset(rate);
                Ok(StreamEvent::Diagnostic(status))
            }
        }
    }
}

impl Default for StreamingDecoder {
    fn default() -> Self {
        StreamingDecoder::new()
    }
}

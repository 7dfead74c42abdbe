//! Streaming decoder: accumulates captured audio, consumes it one
//! extended block at a time, and walks sync → header → payload.

use crate::channel;
use crate::fec::{self, PayloadFec};
use crate::framing::{
    self, parse_header, unpack_chunk, HEADER_BYTES, MODE_PING, PAYLOAD_SYMBOLS, SYNC_MAX_ERRORS,
    SYNC_WORD, SYNC_WORD_FANCY,
};
use crate::ofdm::{self, OfdmDemodulator};
use crate::rate::{FrameGeometry, SampleRate};
use crate::{CALLSIGN_LEN, DEFAULT_CARRIER_HZ, PAYLOAD_LEN};

/// Decoder status protocol. The numeric encoding is part of the codec's
/// ABI and is what the streaming surface reports to foreign callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    Okay = 0,
    Fail = 1,
    Sync = 2,
    Done = 3,
    Heap = 4,
    Nope = 5,
    Ping = 6,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Okay => "okay",
            Status::Fail => "fail",
            Status::Sync => "sync",
            Status::Done => "done",
            Status::Heap => "heap",
            Status::Nope => "nope",
            Status::Ping => "ping",
        }
    }

    /// Statuses that end the decode loop. Okay and Sync keep feeding.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Fail | Status::Nope | Status::Ping)
    }
}

/// Metadata the decoder stages before (and independently of) payload
/// extraction: available on Done, Nope and Ping.
#[derive(Debug, Clone, Copy, Default)]
pub struct StagedInfo {
    pub carrier_offset: f32,
    pub mode: i32,
    pub callsign: [u8; CALLSIGN_LEN],
}

/// The decode-side codec contract the loop engine and streaming adapter
/// are written against.
pub trait StreamDecoder {
    /// Buffer `frames` interleaved frames, mixing down the selected
    /// channel(s). Returns true once a processing step can run.
    fn feed(&mut self, samples: &[i16], frames: usize, channel_select: i32) -> bool;
    /// Consume one buffered block and advance the state machine.
    fn process(&mut self) -> Status;
    fn staged(&mut self) -> StagedInfo;
    /// Extract the payload. Non-negative is the corrected-bit count;
    /// negative means extraction failed.
    fn fetch(&mut self, payload: &mut [u8; PAYLOAD_LEN]) -> i32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Search,
    Header,
    Payload,
    Finished,
}

pub struct Decoder {
    rate: SampleRate,
    geometry: FrameGeometry,
    demod: OfdmDemodulator,
    pending: Vec<f32>,
    phase: Phase,
    base_bin: usize,
    staged: StagedInfo,
    header_bytes: Vec<u8>,
    coded: Vec<u8>,
    erased: Vec<bool>,
    payload_complete: bool,
}

impl Decoder {
    pub fn new(rate: SampleRate) -> Self {
        let geometry = rate.geometry();
        Decoder {
            rate,
            geometry,
            demod: OfdmDemodulator::new(geometry),
            pending: Vec::new(),
            phase: Phase::Search,
            base_bin: 0,
            staged: StagedInfo::default(),
            header_bytes: Vec::with_capacity(HEADER_BYTES),
            coded: Vec::with_capacity(PAYLOAD_SYMBOLS * framing::CHUNK_DATA),
            erased: Vec::with_capacity(PAYLOAD_SYMBOLS * framing::CHUNK_DATA),
            payload_complete: false,
        }
    }

    /// Scan every candidate base bin for either sync word; the best match
    /// wins if it stays within the error budget.
    fn find_sync(&self, spectrum: &[rustfft::num_complex::Complex<f32>]) -> Option<(usize, bool)> {
        let mut best: Option<(u32, usize, bool)> = None;
        for base in ofdm::MIN_BASE_BIN..=ofdm::max_base_bin(self.geometry) {
            let bits = OfdmDemodulator::slice_bits(spectrum, base);
            for (word, fancy) in [(SYNC_WORD, false), (SYNC_WORD_FANCY, true)] {
                let errors = (bits ^ word).count_ones();
                if best.map_or(true, |(e, _, _)| errors < e) {
                    best = Some((errors, base, fancy));
                }
            }
        }
        match best {
            Some((errors, base, fancy)) if errors <= SYNC_MAX_ERRORS => Some((base, fancy)),
            _ => None,
        }
    }

    fn handle_header_symbol(&mut self, bits: u64) -> Status {
        self.header_bytes.extend_from_slice(&bits.to_le_bytes());
        if self.header_bytes.len() < HEADER_BYTES {
            return Status::Okay;
        }
        let mut raw = [0u8; HEADER_BYTES];
        raw.copy_from_slice(&self.header_bytes);
        let header = parse_header(&raw);
        self.staged.mode = header.mode as i32;
        self.staged.callsign = header.callsign;
        if !header.crc_ok {
            self.phase = Phase::Finished;
            return Status::Nope;
        }
        if header.mode == MODE_PING {
            self.phase = Phase::Finished;
            return Status::Ping;
        }
        self.phase = Phase::Payload;
        Status::Okay
    }

    fn handle_payload_symbol(&mut self, bits: u64) -> Status {
        let (data, crc_ok) = unpack_chunk(bits);
        self.coded.extend_from_slice(&data);
        self.erased
            .extend(std::iter::repeat(!crc_ok).take(data.len()));
        if self.coded.len() < PAYLOAD_SYMBOLS * framing::CHUNK_DATA {
            return Status::Okay;
        }
        self.payload_complete = true;
        self.phase = Phase::Finished;
        Status::Done
    }
}

impl StreamDecoder for Decoder {
    fn feed(&mut self, samples: &[i16], frames: usize, channel_select: i32) -> bool {
        if frames > 0 {
            let stride = samples.len() / frames;
            if stride > 0 {
                for frame in samples[..frames * stride].chunks_exact(stride) {
                    self.pending.push(channel::mix_frame(frame, channel_select));
                }
            }
        }
        self.pending.len() >= self.geometry.extended_len
    }

    fn process(&mut self) -> Status {
        let extended = self.geometry.extended_len;
        if self.pending.len() < extended {
            return Status::Okay;
        }
        let block: Vec<f32> = self.pending.drain(..extended).collect();
        let spectrum = self.demod.spectrum(&block);

        match self.phase {
            Phase::Search => match self.find_sync(&spectrum) {
                Some((base, fancy)) => {
                    self.base_bin = base;
                    let spacing = self.geometry.bin_spacing(self.rate);
                    self.staged.carrier_offset =
                        base as f32 * spacing - DEFAULT_CARRIER_HZ as f32;
                    log::debug!(
                        "sync at bin {base} ({} Hz offset, fancy={fancy})",
                        self.staged.carrier_offset
                    );
                    self.phase = Phase::Header;
                    Status::Sync
                }
                None => Status::Okay,
            },
            Phase::Header => {
                let bits = OfdmDemodulator::slice_bits(&spectrum, self.base_bin);
                self.handle_header_symbol(bits)
            }
            Phase::Payload => {
                let bits = OfdmDemodulator::slice_bits(&spectrum, self.base_bin);
                self.handle_payload_symbol(bits)
            }
            Phase::Finished => Status::Fail,
        }
    }

    fn staged(&mut self) -> StagedInfo {
        self.staged
    }

    fn fetch(&mut self, payload: &mut [u8; PAYLOAD_LEN]) -> i32 {
        if !self.payload_complete {
            return -1;
        }
        let fec = match PayloadFec::new() {
            Ok(fec) => fec,
            Err(_) => return -1,
        };
        match fec.restore(&self.coded[..fec::CODED_LEN], &self.erased[..fec::CODED_LEN]) {
            Ok((restored, bit_flips)) => {
                *payload = restored;
                bit_flips as i32
            }
            Err(_) => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_codec_abi() {
        assert_eq!(Status::Okay.code(), 0);
        assert_eq!(Status::Fail.code(), 1);
        assert_eq!(Status::Sync.code(), 2);
        assert_eq!(Status::Done.code(), 3);
        assert_eq!(Status::Heap.code(), 4);
        assert_eq!(Status::Nope.code(), 5);
        assert_eq!(Status::Ping.code(), 6);
    }

    #[test]
    fn terminal_statuses() {
        for status in [Status::Done, Status::Fail, Status::Nope, Status::Ping] {
            assert!(status.is_terminal());
        }
        for status in [Status::Okay, Status::Sync, Status::Heap] {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn feed_reports_readiness_at_one_extended_block() {
        let mut decoder = Decoder::new(SampleRate::R8000);
        let extended = SampleRate::R8000.geometry().extended_len;
        let chunk = vec![0i16; 1000];
        assert!(!decoder.feed(&chunk, 1000, 0));
        let rest = vec![0i16; extended - 1000];
        assert!(decoder.feed(&rest, extended - 1000, 0));
    }

    #[test]
    fn stereo_feed_counts_frames_not_samples() {
        let mut decoder = Decoder::new(SampleRate::R8000);
        let extended = SampleRate::R8000.geometry().extended_len;
        let chunk = vec![0i16; extended]; // extended/2 stereo frames
        assert!(!decoder.feed(&chunk, extended / 2, 3));
        assert!(decoder.feed(&chunk, extended / 2, 3));
    }

    #[test]
    fn silence_never_syncs() {
        let mut decoder = Decoder::new(SampleRate::R8000);
        let extended = SampleRate::R8000.geometry().extended_len;
        for _ in 0..4 {
            let ready = decoder.feed(&vec![0i16; extended], extended, 0);
            assert!(ready);
            assert_eq!(decoder.process(), Status::Okay);
        }
    }

    #[test]
    fn fetch_before_completion_fails() {
        let mut decoder = Decoder::new(SampleRate::R8000);
        let mut payload = [0u8; PAYLOAD_LEN];
        assert!(decoder.fetch(&mut payload) < 0);
    }
}

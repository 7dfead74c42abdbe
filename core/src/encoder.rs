//! Block-producing encoder. `configure` queues the symbol sequence for
//! one transmission; each `produce` call renders one extended block into
//! the caller's buffer until the queue runs dry.

use crate::framing::{
    self, noise_symbol, pack_chunk, pack_header, FLAG_FANCY, MODE_PING, MODE_TEXT, SYNC_WORD,
    SYNC_WORD_FANCY,
};
use crate::fec::PayloadFec;
use crate::error::Result;
use crate::ofdm::{base_bin_for_carrier, OfdmModulator};
use crate::rate::{FrameGeometry, SampleRate};
use crate::{CALLSIGN_LEN, PAYLOAD_LEN};

pub struct Encoder {
    geometry: FrameGeometry,
    rate: SampleRate,
    modulator: Option<OfdmModulator>,
    symbols: Vec<u64>,
    next: usize,
    scratch: Vec<f32>,
}

impl Encoder {
    pub fn new(rate: SampleRate) -> Self {
        let geometry = rate.geometry();
        Encoder {
            geometry,
            rate,
            modulator: None,
            symbols: Vec::new(),
            next: 0,
            scratch: vec![0.0; geometry.extended_len],
        }
    }

    /// Queue one transmission. An all-NUL payload field becomes a ping:
    /// sync and header only, no payload symbols.
    pub fn configure(
        &mut self,
        payload: &[u8; PAYLOAD_LEN],
        callsign: &[u8; CALLSIGN_LEN],
        carrier_hz: i32,
        noise_symbols: i32,
        fancy_header: bool,
    ) -> Result<()> {
        let base_bin = base_bin_for_carrier(carrier_hz, self.geometry, self.rate)?;
        self.modulator = Some(OfdmModulator::new(self.geometry, base_bin));

        let ping = payload.iter().all(|&b| b == 0);
        let mode = if ping { MODE_PING } else { MODE_TEXT };
        let flags = if fancy_header { FLAG_FANCY } else { 0 };

        self.symbols.clear();
        for i in 0..noise_symbols.max(0) as usize {
            self.symbols.push(noise_symbol(i));
        }
        self.symbols.push(if fancy_header { SYNC_WORD_FANCY } else { SYNC_WORD });
        for chunk in pack_header(mode, flags, callsign).chunks_exact(8) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            self.symbols.push(u64::from_le_bytes(bytes));
        }
        if !ping {
            let coded = PayloadFec::new()?.encode(payload)?;
            for chunk in coded.chunks(framing::CHUNK_DATA) {
                self.symbols.push(pack_chunk(chunk));
            }
        }
        self.next = 0;
        Ok(())
    }

    /// Symbols queued by the last `configure`.
    pub fn pending_symbols(&self) -> usize {
        self.symbols.len() - self.next
    }

    /// Write one block, routed across channels by the selector (1 = left,
    /// 2 = right, 4 = both, anything else mono). Returns true while a data
    /// block was written; once the queue is exhausted the block is zero
    /// filled and the call reports false.
    pub fn produce(&mut self, block: &mut [i16], channel: i32) -> bool {
        let stereo = matches!(channel, 1 | 2 | 4);
        debug_assert_eq!(
            block.len(),
            self.geometry.extended_len * if stereo { 2 } else { 1 }
        );

        let modulator = match &mut self.modulator {
            Some(modulator) if self.next < self.symbols.len() => modulator,
            _ => {
                block.fill(0);
                return false;
            }
        };

        modulator.modulate(self.symbols[self.next], &mut self.scratch);
        self.next += 1;

        for (i, &s) in self.scratch.iter().enumerate() {
            let v = (s * 32767.0) as i16;
            match channel {
                1 => {
                    block[2 * i] = v;
                    block[2 * i + 1] = 0;
                }
                2 => {
                    block[2 * i] = 0;
                    block[2 * i + 1] = v;
                }
                4 => {
                    block[2 * i] = v;
                    block[2 * i + 1] = v;
                }
                _ => block[i] = v,
            }
        }
        true
    }
}

use crate::error::{ModemError, Result};

/// The closed set of sample rates the modem is specialized for. Block
/// geometry is derived per rate; anything outside this set is rejected
/// rather than resampled.
pub const SUPPORTED_RATES: [u32; 5] = [8000, 16000, 32000, 44100, 48000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRate {
    R8000,
    R16000,
    R32000,
    R44100,
    R48000,
}

impl SampleRate {
    pub fn from_hz(hz: u32) -> Result<Self> {
        match hz {
            8000 => Ok(SampleRate::R8000),
            16000 => Ok(SampleRate::R16000),
            32000 => Ok(SampleRate::R32000),
            44100 => Ok(SampleRate::R44100),
            48000 => Ok(SampleRate::R48000),
            other => Err(ModemError::UnsupportedRate(other)),
        }
    }

    pub fn hz(self) -> u32 {
        match self {
            SampleRate::R8000 => 8000,
            SampleRate::R16000 => 16000,
            SampleRate::R32000 => 32000,
            SampleRate::R44100 => 44100,
            SampleRate::R48000 => 48000,
        }
    }

    pub fn geometry(self) -> FrameGeometry {
        FrameGeometry::new(self)
    }
}

/// Per-rate sample counts for one modulation symbol, its guard interval,
/// and their sum (one processing unit for both directions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub symbol_len: usize,
    pub guard_len: usize,
    pub extended_len: usize,
}

impl FrameGeometry {
    pub fn new(rate: SampleRate) -> Self {
        let symbol_len = 1280 * rate.hz() as usize / 8000;
        let guard_len = symbol_len / 8;
        FrameGeometry {
            symbol_len,
            guard_len,
            extended_len: symbol_len + guard_len,
        }
    }

    /// Spacing between adjacent carrier bins in Hz. The symbol length
    /// scales with the rate, so this is the same for every supported rate.
    pub fn bin_spacing(self, rate: SampleRate) -> f32 {
        rate.hz() as f32 / self.symbol_len as f32
    }
}

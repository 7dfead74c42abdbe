//! BPSK-OFDM modulation for one extended block at a time. Each symbol
//! carries [`DATA_CARRIERS`] bits on adjacent FFT bins starting at a base
//! bin derived from the carrier frequency; the guard interval is silent.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{ModemError, Result};
use crate::rate::{FrameGeometry, SampleRate};

/// Bits carried per symbol, one per carrier bin.
pub const DATA_CARRIERS: usize = 64;

/// Lowest usable base bin; keeps the signal clear of DC.
pub const MIN_BASE_BIN: usize = 8;

// Per-carrier amplitude. 64 carriers can add coherently, so the time-domain
// peak stays below 64/80 of full scale.
const CARRIER_AMPLITUDE: f32 = 1.0 / 80.0;

/// Highest base bin that still fits all carriers below Nyquist.
pub fn max_base_bin(geometry: FrameGeometry) -> usize {
    geometry.symbol_len / 2 - DATA_CARRIERS - 1
}

/// FFT bin of a carrier frequency, by the same integer arithmetic the
/// geometry uses.
pub fn base_bin_for_carrier(carrier_hz: i32, geometry: FrameGeometry, rate: SampleRate) -> Result<usize> {
    if carrier_hz <= 0 {
        return Err(ModemError::CarrierOutOfBand(carrier_hz));
    }
    let bin = carrier_hz as usize * geometry.symbol_len / rate.hz() as usize;
    if bin < MIN_BASE_BIN || bin > max_base_bin(geometry) {
        return Err(ModemError::CarrierOutOfBand(carrier_hz));
    }
    Ok(bin)
}

pub struct OfdmModulator {
    ifft: Arc<dyn Fft<f32>>,
    geometry: FrameGeometry,
    base_bin: usize,
    freq: Vec<Complex<f32>>,
}

impl OfdmModulator {
    pub fn new(geometry: FrameGeometry, base_bin: usize) -> Self {
        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(geometry.symbol_len);
        OfdmModulator {
            ifft,
            geometry,
            base_bin,
            freq: vec![Complex::new(0.0, 0.0); geometry.symbol_len],
        }
    }

    /// Render the 64-bit symbol into `out` (mono, `extended_len` samples):
    /// a silent guard interval followed by the OFDM symbol.
    pub fn modulate(&mut self, bits: u64, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.geometry.extended_len);
        self.freq.fill(Complex::new(0.0, 0.0));
        for i in 0..DATA_CARRIERS {
            let amplitude = if bits >> i & 1 == 1 {
                CARRIER_AMPLITUDE
            } else {
                -CARRIER_AMPLITUDE
            };
            self.freq[self.base_bin + i] = Complex::new(amplitude, 0.0);
        }
        self.ifft.process(&mut self.freq);

        let guard = self.geometry.guard_len;
        out[..guard].fill(0.0);
        for (dst, src) in out[guard..].iter_mut().zip(self.freq.iter()) {
            *dst = src.re;
        }
    }
}

pub struct OfdmDemodulator {
    fft: Arc<dyn Fft<f32>>,
    geometry: FrameGeometry,
}

impl OfdmDemodulator {
    pub fn new(geometry: FrameGeometry) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(geometry.symbol_len);
        OfdmDemodulator { fft, geometry }
    }

    /// Spectrum of the symbol part of one extended block.
    pub fn spectrum(&self, block: &[f32]) -> Vec<Complex<f32>> {
        debug_assert_eq!(block.len(), self.geometry.extended_len);
        let guard = self.geometry.guard_len;
        let mut buf: Vec<Complex<f32>> = block[guard..]
            .iter()
            .map(|&s| Complex::new(s, 0.0))
            .collect();
        self.fft.process(&mut buf);
        buf
    }

    /// Slice the 64 BPSK bits at a candidate base bin by sign.
    pub fn slice_bits(spectrum: &[Complex<f32>], base_bin: usize) -> u64 {
        let mut bits = 0u64;
        for i in 0..DATA_CARRIERS {
            if spectrum[base_bin + i].re > 0.0 {
                bits |= 1 << i;
            }
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> FrameGeometry {
        SampleRate::R8000.geometry()
    }

    #[test]
    fn modulate_demodulate_round_trip() {
        let g = geometry();
        let base = base_bin_for_carrier(1500, g, SampleRate::R8000).unwrap();
        let mut modulator = OfdmModulator::new(g, base);
        let demodulator = OfdmDemodulator::new(g);

        let mut block = vec![0.0f32; g.extended_len];
        for bits in [0u64, u64::MAX, 0xDEAD_BEEF_0BAD_F00D, 1, 1 << 63] {
            modulator.modulate(bits, &mut block);
            let spectrum = demodulator.spectrum(&block);
            assert_eq!(OfdmDemodulator::slice_bits(&spectrum, base), bits);
        }
    }

    #[test]
    fn round_trip_survives_i16_quantization() {
        let g = geometry();
        let base = base_bin_for_carrier(1500, g, SampleRate::R8000).unwrap();
        let mut modulator = OfdmModulator::new(g, base);
        let demodulator = OfdmDemodulator::new(g);

        let bits = 0x0123_4567_89AB_CDEF;
        let mut block = vec![0.0f32; g.extended_len];
        modulator.modulate(bits, &mut block);
        let quantized: Vec<f32> = block
            .iter()
            .map(|&s| (s * 32767.0) as i16 as f32 / 32768.0)
            .collect();
        let spectrum = demodulator.spectrum(&quantized);
        assert_eq!(OfdmDemodulator::slice_bits(&spectrum, base), bits);
    }

    #[test]
    fn samples_stay_inside_full_scale() {
        let g = geometry();
        let base = base_bin_for_carrier(1500, g, SampleRate::R8000).unwrap();
        let mut modulator = OfdmModulator::new(g, base);
        let mut block = vec![0.0f32; g.extended_len];
        // All-ones is the worst case for coherent addition at the guard edge.
        modulator.modulate(u64::MAX, &mut block);
        assert!(block.iter().all(|s| s.abs() < 1.0));
    }

    #[test]
    fn carrier_bin_bounds() {
        let g = geometry();
        assert_eq!(base_bin_for_carrier(1500, g, SampleRate::R8000).unwrap(), 240);
        assert!(base_bin_for_carrier(0, g, SampleRate::R8000).is_err());
        assert!(base_bin_for_carrier(-100, g, SampleRate::R8000).is_err());
        assert!(base_bin_for_carrier(3990, g, SampleRate::R8000).is_err());
    }

    #[test]
    fn carrier_bin_matches_across_rates() {
        // 6.25 Hz spacing at every rate puts the default carrier on bin 240.
        for hz in crate::rate::SUPPORTED_RATES {
            let rate = SampleRate::from_hz(hz).unwrap();
            let g = rate.geometry();
            assert_eq!(base_bin_for_carrier(1500, g, rate).unwrap(), 240);
        }
    }
}

//! C-ABI streaming surface for host runtimes with minimal
//! error-propagation machinery (audio worklets, embedded interpreters).
//!
//! Errors never cross the boundary as panics or exceptions; they map to
//! the signed return conventions below. The decoder slot is process-wide
//! and callers must not invoke [`tonegram_decode_chunk`] concurrently;
//! the internal mutex only keeps interleaved calls memory-safe, it does
//! not make interleaving them meaningful.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::Mutex;

use tonegram_core::{encode_samples, EncodeRequest, StreamEvent, StreamingDecoder};

static DECODER: Mutex<StreamingDecoder> = Mutex::new(StreamingDecoder::new());

/// Encode a transmission into the caller's sample buffer.
///
/// Returns the number of samples written (truncated to `max_samples`),
/// or 0 on any failure.
///
/// # Safety
/// `message` and `callsign` must be NUL-terminated strings; `out` must
/// point to at least `max_samples` writable i16 slots.
#[no_mangle]
pub unsafe extern "C" fn tonegram_encode(
    message: *const c_char,
    callsign: *const c_char,
    carrier_frequency: c_int,
    noise_symbols: c_int,
    fancy_header: c_int,
    sample_rate: c_int,
    channel: c_int,
    out: *mut i16,
    max_samples: c_int,
) -> c_int {
    if message.is_null() || callsign.is_null() || out.is_null() || max_samples <= 0 {
        return 0;
    }
    let request = EncodeRequest {
        message: CStr::from_ptr(message).to_string_lossy().into_owned(),
        callsign: CStr::from_ptr(callsign).to_string_lossy().into_owned(),
        carrier_frequency,
        noise_symbols,
        fancy_header: fancy_header != 0,
        sample_rate: sample_rate.max(0) as u32,
        channel,
    };
    let samples = match encode_samples(&request) {
        Ok(samples) => samples,
        Err(e) => {
            log::debug!("encode failed: {e}");
            return 0;
        }
    };
    let n = samples.len().min(max_samples as usize);
    std::ptr::copy_nonoverlapping(samples.as_ptr(), out, n);
    n as c_int
}

/// Feed one chunk of captured audio into the persistent decoder.
///
/// Returns 0 while nothing has happened yet, a negative status id for
/// sync and failure-class outcomes, or the decoded message length on
/// success, with the message and the trimmed callsign copied
/// NUL-terminated into the caller's buffers.
///
/// # Safety
/// `samples` must point to `count` readable i16 values; the output
/// buffers must be writable for their stated capacities.
#[no_mangle]
pub unsafe extern "C" fn tonegram_decode_chunk(
    samples: *const i16,
    count: c_int,
    sample_rate: c_int,
    channels: c_int,
    channel_select: c_int,
    out_message: *mut c_char,
    message_capacity: c_int,
    out_callsign: *mut c_char,
    callsign_capacity: c_int,
) -> c_int {
    if samples.is_null() || count <= 0 || channels <= 0 {
        return 0;
    }
    let chunk = std::slice::from_raw_parts(samples, count as usize);

    let mut decoder = DECODER.lock().unwrap_or_else(|e| e.into_inner());
    let event = match decoder.feed_chunk(
        chunk,
        sample_rate.max(0) as u32,
        channels as u16,
        channel_select,
    ) {
        Ok(event) => event,
        Err(e) => {
            log::debug!("decode chunk rejected: {e}");
            return 0;
        }
    };

    match event {
        StreamEvent::Pending => 0,
        StreamEvent::Diagnostic(status) => -status.code(),
        StreamEvent::Decoded { message, callsign } => {
            let written = write_cstr(out_message, message_capacity, message.as_bytes());
            write_cstr(out_callsign, callsign_capacity, callsign.as_bytes());
            written as c_int
        }
    }
}

/// Copy `data` NUL-terminated into a caller buffer, truncating to fit.
/// Returns the number of data bytes copied.
unsafe fn write_cstr(out: *mut c_char, capacity: c_int, data: &[u8]) -> usize {
    if out.is_null() || capacity <= 0 {
        return 0;
    }
    let n = data.len().min(capacity as usize - 1);
    std::ptr::copy_nonoverlapping(data.as_ptr(), out.cast::<u8>(), n);
    *out.add(n) = 0;
    n
}

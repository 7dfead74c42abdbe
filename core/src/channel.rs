//! Channel routing for both directions. Encode-side selectors choose how
//! the signal is laid out across output channels; decode-side selects
//! choose which channel(s) of the capture the decoder reads.

/// Output channel count for an encode routing selector. Selectors 1, 2
/// and 4 produce stereo (left only, right only, both); everything else
/// falls through to mono.
pub fn output_channels(selector: i32) -> u16 {
    match selector {
        1 | 2 | 4 => 2,
        _ => 1,
    }
}

/// Resolve a decode channel select against the source layout. Negative
/// means "auto": combined decode (3) for stereo sources, first channel (0)
/// for mono. Non-negative values pass through unchanged.
pub fn resolve_channel_select(select: i32, channels: u16) -> i32 {
    if select >= 0 {
        select
    } else if channels == 2 {
        3
    } else {
        0
    }
}

/// Mix one interleaved frame down to the mono sample the decoder consumes,
/// normalized to [-1, 1). Select 2 reads the second channel, 3 and 4
/// average both, everything else reads the first.
pub(crate) fn mix_frame(frame: &[i16], channel_select: i32) -> f32 {
    let sample = if frame.len() >= 2 {
        match channel_select {
            2 => frame[1] as f32,
            3 | 4 => (frame[0] as f32 + frame[1] as f32) / 2.0,
            _ => frame[0] as f32,
        }
    } else {
        frame[0] as f32
    };
    sample / 32768.0
}

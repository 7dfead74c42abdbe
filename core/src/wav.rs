//! Canonical WAV container: a fixed 44-byte header followed by raw
//! little-endian 16-bit PCM. Nothing else is accepted on read; extension
//! chunks, other bit depths, and compressed formats fail closed.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::error::{ModemError, Result};

pub const HEADER_LEN: usize = 44;

pub fn write_wav(path: &Path, samples: &[i16], rate: u32, channels: u16) -> Result<()> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = channels * 2;
    let byte_rate = rate * block_align as u32;

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(b"RIFF")?;
    out.write_all(&(36 + data_len).to_le_bytes())?;
    out.write_all(b"WAVE")?;
    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?;
    out.write_all(&channels.to_le_bytes())?;
    out.write_all(&rate.to_le_bytes())?;
    out.write_all(&byte_rate.to_le_bytes())?;
    out.write_all(&block_align.to_le_bytes())?;
    out.write_all(&16u16.to_le_bytes())?;
    out.write_all(b"data")?;
    out.write_all(&data_len.to_le_bytes())?;
    for &s in samples {
        out.write_all(&s.to_le_bytes())?;
    }
    out.flush()?;
    Ok(())
}

pub fn read_wav(path: &Path) -> Result<(Vec<i16>, u32, u16)> {
    let mut file = BufReader::new(File::open(path)?);
    let mut header = [0u8; HEADER_LEN];
    read_fully(&mut file, &mut header)?;

    if &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        return Err(ModemError::BadMagic);
    }
    if &header[12..16] != b"fmt " || &header[36..40] != b"data" {
        return Err(ModemError::BadMagic);
    }
    let fmt_size = u32::from_le_bytes([header[16], header[17], header[18], header[19]]);
    let audio_format = u16::from_le_bytes([header[20], header[21]]);
    let channels = u16::from_le_bytes([header[22], header[23]]);
    let rate = u32::from_le_bytes([header[24], header[25], header[26], header[27]]);
    let bits_per_sample = u16::from_le_bytes([header[34], header[35]]);
    if fmt_size != 16 || audio_format != 1 || bits_per_sample != 16 {
        return Err(ModemError::UnsupportedEncoding);
    }
    if !(1..=2).contains(&channels) {
        return Err(ModemError::UnsupportedEncoding);
    }

    let data_len = u32::from_le_bytes([header[40], header[41], header[42], header[43]]) as usize;
    let mut raw = vec![0u8; data_len];
    read_fully(&mut file, &mut raw)?;

    let samples = raw
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();
    Ok((samples, rate, channels))
}

fn read_fully(reader: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            ModemError::Truncated
        } else {
            ModemError::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn tmp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("tonegram-wav-tests");
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn round_trip_mono() {
        let path = tmp_path("round_trip_mono.wav");
        let samples: Vec<i16> = (0..1000).map(|i| (i * 17 % 20000) as i16 - 10000).collect();
        write_wav(&path, &samples, 8000, 1).unwrap();
        let (back, rate, channels) = read_wav(&path).unwrap();
        assert_eq!(back, samples);
        assert_eq!(rate, 8000);
        assert_eq!(channels, 1);
    }

    #[test]
    fn round_trip_stereo() {
        let path = tmp_path("round_trip_stereo.wav");
        let samples: Vec<i16> = (0..2048).map(|i| (i as i16).wrapping_mul(31)).collect();
        write_wav(&path, &samples, 48000, 2).unwrap();
        let (back, rate, channels) = read_wav(&path).unwrap();
        assert_eq!(back, samples);
        assert_eq!(rate, 48000);
        assert_eq!(channels, 2);
    }

    #[test]
    fn header_fields_are_derived() {
        let path = tmp_path("header_fields.wav");
        let samples = vec![0i16; 500];
        write_wav(&path, &samples, 44100, 2).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 1000);
        let riff_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(riff_size, 36 + 1000);
        let byte_rate = u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
        assert_eq!(byte_rate, 44100 * 4);
        let block_align = u16::from_le_bytes([bytes[32], bytes[33]]);
        assert_eq!(block_align, 4);
        let data_size = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
        assert_eq!(data_size, 1000);
    }

    #[test]
    fn corrupted_magic_is_rejected() {
        let path = tmp_path("bad_magic.wav");
        write_wav(&path, &[1, 2, 3], 8000, 1).unwrap();
        let mut bytes = fs::read(&path).unwrap();
        bytes[0] = b'X';
        fs::write(&path, &bytes).unwrap();
        assert!(matches!(read_wav(&path), Err(ModemError::BadMagic)));
    }

    #[test]
    fn non_pcm_format_is_rejected() {
        let path = tmp_path("non_pcm.wav");
        write_wav(&path, &[1, 2, 3], 8000, 1).unwrap();
        let mut bytes = fs::read(&path).unwrap();
        bytes[20] = 3; // IEEE float format code
        fs::write(&path, &bytes).unwrap();
        assert!(matches!(read_wav(&path), Err(ModemError::UnsupportedEncoding)));
    }

    #[test]
    fn extensible_fmt_chunk_is_rejected() {
        let path = tmp_path("extensible.wav");
        write_wav(&path, &[1, 2, 3], 8000, 1).unwrap();
        let mut bytes = fs::read(&path).unwrap();
        bytes[16] = 40; // fmt chunk size of WAVE_FORMAT_EXTENSIBLE
        fs::write(&path, &bytes).unwrap();
        assert!(matches!(read_wav(&path), Err(ModemError::UnsupportedEncoding)));
    }

    #[test]
    fn truncated_data_is_rejected() {
        let path = tmp_path("truncated.wav");
        write_wav(&path, &vec![7i16; 100], 8000, 1).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 50]).unwrap();
        assert!(matches!(read_wav(&path), Err(ModemError::Truncated)));
    }

    #[test]
    fn hound_reads_our_output() {
        let path = tmp_path("hound_cross_read.wav");
        let samples: Vec<i16> = (0..800).map(|i| (i * 3) as i16).collect();
        write_wav(&path, &samples, 16000, 1).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        let back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(back, samples);
    }

    #[test]
    fn we_read_hound_output() {
        let path = tmp_path("hound_cross_write.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 32000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let samples: Vec<i16> = (0..600).map(|i| (i as i16).wrapping_mul(-7)).collect();
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in &samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let (back, rate, channels) = read_wav(&path).unwrap();
        assert_eq!(back, samples);
        assert_eq!(rate, 32000);
        assert_eq!(channels, 2);
    }
}

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// Audio file loader supporting WAV natively and compressed formats
/// through Symphonia.
pub struct AudioLoader;

impl AudioLoader {
    /// Load an audio file and return decoded samples
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "wav" => Self::load_wav(path),
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::load_with_symphonia(path),
            _ => Err(AudioError::UnsupportedFormat { format: extension }.into()),
        }
    }

    /// Load WAV files using the hound crate
    fn load_wav(path: &Path) -> Result<AudioData> {
        let reader = hound::WavReader::open(path)
            .map_err(|_| AudioError::LoadFailed { path: path.display().to_string() })?;

        let spec = reader.spec();
        let sample_rate = spec.sample_rate;
        let channels = spec.channels;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| AudioError::LoadFailed { path: path.display().to_string() })?,
            hound::SampleFormat::Int => {
                let scale = match spec.bits_per_sample {
                    8 => 128.0,
                    16 => 32768.0,
                    24 => 8388608.0,
                    _ => 2147483648.0,
                };
                reader
                    .into_samples::<i32>()
                    .collect::<std::result::Result<Vec<i32>, _>>()
                    .map_err(|_| AudioError::LoadFailed { path: path.display().to_string() })?
                    .into_iter()
                    .map(|s| s as f32 / scale)
                    .collect()
            }
        };

        let duration = samples.len() as f64 / (sample_rate as u64 * channels as u64) as f64;

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            duration,
            file_path: path.to_path_buf(),
        })
    }

    /// Load compressed formats using Symphonia
    fn load_with_symphonia(path: &Path) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed { path: path.display().to_string() };

        let file = File::open(path).map_err(|_| load_failed())?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|_| load_failed())?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(load_failed)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params.sample_rate.ok_or_else(load_failed)?;
        let channels = codec_params.channels.ok_or_else(load_failed)?.count() as u16;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|_| load_failed())?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(_) => break, // end of stream
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let buf = sample_buf.get_or_insert_with(|| {
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
                    });
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(_) => break,
            }
        }

        if samples.is_empty() {
            return Err(load_failed().into());
        }

        let duration = samples.len() as f64 / (sample_rate as u64 * channels as u64) as f64;

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            duration,
            file_path: path.to_path_buf(),
        })
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_format_support() {
        assert!(AudioLoader::is_format_supported("wav"));
        assert!(AudioLoader::is_format_supported("FLAC"));
        assert!(!AudioLoader::is_format_supported("xyz"));
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.xyz");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"dummy content").unwrap();

        let result = AudioLoader::load(&file_path).await;
        match result {
            Err(crate::error::SyncError::Audio(AudioError::UnsupportedFormat { format })) => {
                assert_eq!(format, "xyz");
            }
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_wav_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&file_path, spec).unwrap();
        for i in 0..8000 {
            let t = i as f32 / 8000.0;
            let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            writer.write_sample((sample * 0.5 * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let audio = AudioLoader::load(&file_path).await.unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.channels, 1);
        assert!((audio.duration - 1.0).abs() < 1e-6);
        assert_eq!(audio.samples.len(), 8000);
    }
}

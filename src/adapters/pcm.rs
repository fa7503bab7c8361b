//! Decode container audio into the 16 kHz mono f32 stream whisper.cpp
//! consumes.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::domain::TranscribeError;

/// Sample rate whisper models are trained on.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

fn decode_error(stage: &str, detail: impl std::fmt::Display) -> TranscribeError {
    TranscribeError::UnsupportedFormat(format!("could not decode audio ({stage}): {detail}"))
}

/// Decode an in-memory audio payload (wav/mp3/m4a/ogg/webm) to 16 kHz mono
/// f32 samples, downmixing and resampling as needed.
pub fn decode_pcm_16k_mono(
    data: &[u8],
    extension_hint: Option<&str>,
) -> Result<Vec<f32>, TranscribeError> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension_hint {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error("probe", e))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| decode_error("probe", "no audio track found"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| decode_error("probe", "unknown sample rate"))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error("codec", e))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_error("demux", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(decode_error("decode", e)),
        };

        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let mut buffer = SampleBuffer::<f32>::new(frames as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);
        append_mono(&mut samples, buffer.samples(), channels);
    }

    if samples.is_empty() {
        return Err(decode_error("decode", "no audio samples produced"));
    }

    if source_rate != WHISPER_SAMPLE_RATE {
        samples = resample(&samples, source_rate, WHISPER_SAMPLE_RATE)?;
    }

    debug!(
        samples = samples.len(),
        source_rate = source_rate,
        channels = channels,
        duration_secs = samples.len() as f32 / WHISPER_SAMPLE_RATE as f32,
        "Audio decoded to 16kHz mono PCM"
    );

    Ok(samples)
}

/// Average interleaved frames down to a single channel.
fn append_mono(output: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        output.extend_from_slice(interleaved);
        return;
    }
    for frame in interleaved.chunks(channels) {
        output.push(frame.iter().sum::<f32>() / channels as f32);
    }
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, TranscribeError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let chunk_size = 1024;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| decode_error("resample", e))?;

    let mut output = Vec::with_capacity((samples.len() as f64 * ratio) as usize + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        let input = if chunk.len() < chunk_size {
            let mut padded = chunk.to_vec();
            padded.resize(chunk_size, 0.0);
            padded
        } else {
            chunk.to_vec()
        };

        let processed = resampler
            .process(&[input], None)
            .map_err(|e| decode_error("resample", e))?;

        if let Some(channel) = processed.first() {
            output.extend_from_slice(channel);
        }
    }

    // The sinc filter pads the tail; trim back to the expected length.
    output.truncate((samples.len() as f64 * ratio) as usize);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal 16-bit PCM WAV blob.
    fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let byte_rate = sample_rate * u32::from(channels) * 2;
        let block_align = channels * 2;

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_mono_wav_at_target_rate() {
        let bytes = wav_bytes(WHISPER_SAMPLE_RATE, 1, &[0, 16384, -16384, 32767]);
        let samples = decode_pcm_16k_mono(&bytes, Some("wav")).unwrap();

        assert_eq!(samples.len(), 4);
        assert!((samples[0] - 0.0).abs() < 0.001);
        assert!((samples[1] - 0.5).abs() < 0.001);
        assert!((samples[2] + 0.5).abs() < 0.001);
        assert!((samples[3] - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_decode_downmixes_stereo() {
        // L=0.5, R=-0.5 in every frame averages to silence.
        let bytes = wav_bytes(WHISPER_SAMPLE_RATE, 2, &[16384, -16384, 16384, -16384]);
        let samples = decode_pcm_16k_mono(&bytes, Some("wav")).unwrap();

        assert_eq!(samples.len(), 2);
        for sample in samples {
            assert!(sample.abs() < 0.001);
        }
    }

    #[test]
    fn test_decode_resamples_to_target_rate() {
        let source: Vec<i16> = vec![1000; 8000]; // one second at 8kHz
        let bytes = wav_bytes(8000, 1, &source);
        let samples = decode_pcm_16k_mono(&bytes, Some("wav")).unwrap();

        // One second of audio should come out near 16000 samples.
        assert_eq!(samples.len(), 16000);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_pcm_16k_mono(&[0u8; 64], None);
        assert!(matches!(
            result,
            Err(TranscribeError::UnsupportedFormat(_))
        ));
    }
}

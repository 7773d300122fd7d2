use std::path::Path;

use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;
use ffmpeg_next::software::resampling;
use ffmpeg_next::util::frame::audio::Audio;
use ffmpeg_next::ChannelLayout;

use crate::audio::domain::audio_reader::{AudioDecodeError, AudioReader};
use crate::audio::domain::audio_segment::AudioSegment;

/// Decodes any container ffmpeg understands into mono f32 PCM.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<AudioSegment, AudioDecodeError> {
        ffmpeg_next::init().map_err(decode_err)?;

        let mut ictx = ffmpeg_next::format::input(path).map_err(|e| AudioDecodeError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let audio_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| AudioDecodeError::NoAudioStream(path.to_path_buf()))?;
        let audio_stream_index = audio_stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())
                .map_err(decode_err)?;
        let mut decoder = codec_ctx.decoder().audio().map_err(decode_err)?;

        let mut resampler = resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            Sample::F32(SampleType::Planar),
            ChannelLayout::MONO,
            target_sample_rate,
        )
        .map_err(decode_err)?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = Audio::empty();
        let mut resampled = Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }
            decoder.send_packet(&packet).map_err(decode_err)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler
                    .run(&decoded, &mut resampled)
                    .map_err(decode_err)?;
                extract_f32_samples(&resampled, &mut samples);
            }
        }

        decoder.send_eof().map_err(decode_err)?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler
                .run(&decoded, &mut resampled)
                .map_err(decode_err)?;
            extract_f32_samples(&resampled, &mut samples);
        }

        // The resampler may still hold buffered samples
        if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
            if delay.output > 0 {
                extract_f32_samples(&resampled, &mut samples);
            }
        }

        log::debug!(
            "Decoded {} samples at {target_sample_rate} Hz from {}",
            samples.len(),
            path.display()
        );

        Ok(AudioSegment::new(samples, target_sample_rate))
    }
}

fn decode_err(e: ffmpeg_next::Error) -> AudioDecodeError {
    AudioDecodeError::Decode(e.to_string())
}

/// Copy samples out of a planar mono f32 frame.
fn extract_f32_samples(frame: &Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
    out.extend_from_slice(floats);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_audio_nonexistent_file_is_open_error() {
        let path = if cfg!(windows) {
            Path::new("Z:\\nonexistent\\clip.wav")
        } else {
            Path::new("/nonexistent/clip.wav")
        };
        let result = FfmpegAudioReader.read_audio(path, 16000);
        assert!(matches!(result, Err(AudioDecodeError::Open { .. })));
    }

    #[test]
    fn test_read_audio_garbage_file_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not audio").unwrap();
        let result = FfmpegAudioReader.read_audio(file.path(), 16000);
        assert!(result.is_err());
    }
}

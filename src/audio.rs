use crate::error::{PhonologyError, Result};
use crate::types::{AudioFormat, DecodedAudio};
use std::io::Cursor;

/// WAVバイト列をデコード
///
/// ファイル全体をメモリ上に展開する。整数PCMは元の整数値のまま、
/// 浮動小数点PCMは元の値のまま `f64` に変換する。
///
/// # Errors
///
/// WAVとして読めない、または途中で壊れている場合は `AudioDecode` を返す。
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| PhonologyError::AudioDecode(format!("WAVヘッダ読み込み失敗: {}", e)))?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(PhonologyError::AudioDecode(format!(
            "不正なフォーマット: {} Hz, {} ch",
            spec.sample_rate, spec.channels
        )));
    }

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .into_samples::<i32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<f64>, hound::Error>>(),
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<f64>, hound::Error>>(),
    }
    .map_err(|e| PhonologyError::AudioDecode(format!("サンプル読み込み失敗: {}", e)))?;

    let format = AudioFormat {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    };

    let audio = DecodedAudio::new(samples, format);
    log::trace!(
        "WAVデコード完了: {} Hz, {} ch, {} bit, {:.3} 秒",
        format.sample_rate,
        format.channels,
        spec.bits_per_sample,
        audio.duration_seconds()
    );

    Ok(audio)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 16bit PCMサンプル（インターリーブ済み）からWAVバイト列を生成
    pub(crate) fn pcm_to_wav(samples: &[i16], format: AudioFormat) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_mono_wav() {
        let samples: Vec<i16> = (0..16000)
            .map(|i| ((i as f32 * 0.1).sin() * 10000.0) as i16)
            .collect();
        let format = AudioFormat {
            sample_rate: 16000,
            channels: 1,
        };
        let wav = pcm_to_wav(&samples, format);

        let audio = decode_wav(&wav).unwrap();
        assert_eq!(audio.format, format);
        assert_eq!(audio.samples.len(), 16000);
        assert_eq!(audio.samples[1], samples[1] as f64);
        assert!((audio.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_stereo_keeps_interleaving() {
        let samples = vec![1i16, -1, 2, -2, 3, -3];
        let format = AudioFormat {
            sample_rate: 8000,
            channels: 2,
        };
        let wav = pcm_to_wav(&samples, format);

        let audio = decode_wav(&wav).unwrap();
        assert_eq!(audio.frame_count(), 3);
        assert_eq!(audio.samples, vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }

    #[test]
    fn test_decode_float_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(0.5f32).unwrap();
            writer.write_sample(-0.25f32).unwrap();
            writer.finalize().unwrap();
        }

        let audio = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(audio.samples, vec![0.5, -0.25]);
    }

    #[test]
    fn test_garbage_is_audio_decode_error() {
        let err = decode_wav(b"definitely not a RIFF file").unwrap_err();
        assert_eq!(err.kind(), "audio_decode");
    }

    #[test]
    fn test_truncated_wav_is_audio_decode_error() {
        let format = AudioFormat {
            sample_rate: 8000,
            channels: 1,
        };
        let wav = pcm_to_wav(&vec![100i16; 1000], format);
        let truncated = &wav[..wav.len() / 2];

        assert_eq!(decode_wav(truncated).unwrap_err().kind(), "audio_decode");
    }
}

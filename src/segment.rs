use crate::error::{PhonologyError, Result};
use crate::intensity::{IntensityMeasure, IntensityMetric};
use crate::types::{DecodedAudio, IntensityResult, Interval};
use std::ops::Range;

/// 最大強度区間・最長区間の検出器
///
/// # アルゴリズム
///
/// 1. 各区間 `[start, end)`（秒）をサンプル範囲に変換
/// 2. 区間ごとに強度を計算
/// 3. 強度・長さそれぞれの最大値を「より大きい場合のみ更新」で追跡
///    （同値の場合は先に現れた区間が勝つ）
/// 4. 最大強度をファイル全体の強度で割って比率を求める
///
/// # Examples
///
/// ```
/// # use phonology_stats::segment::SegmentLocator;
/// # use phonology_stats::intensity::IntensityMetric;
/// # use phonology_stats::types::{AudioFormat, DecodedAudio, Interval};
/// let locator = SegmentLocator::new(IntensityMetric::Rms);
/// let mut samples = vec![1.0; 100];
/// samples.extend(vec![4.0; 100]);
/// let audio = DecodedAudio::new(samples, AudioFormat { sample_rate: 100, channels: 1 });
///
/// let intervals = vec![Interval::new(0.0, 1.5, "a"), Interval::new(1.5, 2.0, "b")];
/// let result = locator.locate(&audio, &intervals).unwrap();
/// assert_eq!(result.max_intensity_index, 1);
/// assert_eq!(result.max_length_index, 0);
/// ```
pub struct SegmentLocator {
    measure: Box<dyn IntensityMeasure>,
}

impl SegmentLocator {
    pub fn new(metric: IntensityMetric) -> Self {
        Self {
            measure: metric.build(),
        }
    }

    /// 指標名から作成
    ///
    /// # Errors
    ///
    /// 未知の指標名は `Config` エラー
    pub fn from_metric_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    /// 使用中の強度指標名
    pub fn metric_name(&self) -> &'static str {
        self.measure.name()
    }

    /// 秒単位の区間をサンプル範囲に変換
    ///
    /// フレーム位置は `floor(秒 × サンプリングレート)` でバッファ長にクランプする。
    /// 範囲は全チャンネル分のサンプルを含む。
    pub fn sample_range(audio: &DecodedAudio, interval: &Interval) -> Range<usize> {
        let rate = audio.format.sample_rate as f64;
        let frames = audio.frame_count();
        let channels = audio.format.channels.max(1) as usize;

        let to_frame = |seconds: f64| -> usize {
            let frame = (seconds * rate).floor();
            if frame <= 0.0 {
                0
            } else {
                (frame as usize).min(frames)
            }
        };

        let start = to_frame(interval.start);
        let end = to_frame(interval.end).max(start);
        start * channels..end * channels
    }

    /// 区間の強度
    pub fn interval_intensity(&self, audio: &DecodedAudio, interval: &Interval) -> f64 {
        let range = Self::sample_range(audio, interval);
        self.measure.measure(&audio.samples[range])
    }

    /// 最大強度区間と最長区間を検出
    ///
    /// # Errors
    ///
    /// - 区間が空の場合は `EmptyInput`
    /// - ファイル全体の強度が 0 の場合は `DegenerateAudio`
    pub fn locate(&self, audio: &DecodedAudio, intervals: &[Interval]) -> Result<IntensityResult> {
        if intervals.is_empty() {
            return Err(PhonologyError::EmptyInput);
        }

        let mut max_intensity: Option<(usize, f64)> = None;
        let mut max_length: Option<(usize, f64)> = None;

        for (index, interval) in intervals.iter().enumerate() {
            let intensity = self.interval_intensity(audio, interval);
            let length = interval.duration();

            if max_intensity.map_or(true, |(_, max)| intensity > max) {
                max_intensity = Some((index, intensity));
            }
            if max_length.map_or(true, |(_, max)| length > max) {
                max_length = Some((index, length));
            }
        }

        // intervals が空でないので必ず Some
        let (Some((max_intensity_index, max_intensity)), Some((max_length_index, max_length))) =
            (max_intensity, max_length)
        else {
            return Err(PhonologyError::EmptyInput);
        };

        let whole = self.measure.measure(&audio.samples);
        if whole == 0.0 {
            return Err(PhonologyError::DegenerateAudio);
        }

        log::trace!(
            "区間検出 ({}): 最大強度 #{} ({:.3} / {:.3}), 最長 #{} ({:.3}s)",
            self.measure.name(),
            max_intensity_index,
            max_intensity,
            whole,
            max_length_index,
            max_length
        );

        Ok(IntensityResult {
            max_intensity_index,
            max_intensity_ratio: max_intensity / whole,
            max_length_index,
            max_length_seconds: max_length,
        })
    }
}

use crate::audio;
use crate::encoding::EncodingDetector;
use crate::error::Result;
use crate::fetch::ResourceFetcher;
use crate::segment::SegmentLocator;
use crate::textgrid;
use crate::types::{transcription_of, AnalysisRecord, CorpusEntry, EntryOutcome, Interval};
use std::sync::Arc;

/// 母音記号の参照セット
///
/// 文字列を構成するコードポイント単位で判定するため、
/// 結合文字（U+0308, U+033D）もセットに含まれる。
pub const VOWELS: &str = "iyɨʉɯuɪʏɪ̈ʊ̈ɯ̽ʊeøɘɵɤoəɛœɜɞʌɔæɐaɶɑɒ";

/// トランスクリプションに母音記号が含まれるか
pub fn contains_vowel(transcription: &str) -> bool {
    transcription.chars().any(|c| VOWELS.contains(c))
}

/// `index` 番目の区間のラベルがトランスクリプション中で何文字目から始まるか（1始まり）
pub fn label_position(intervals: &[Interval], index: usize) -> usize {
    intervals[..index]
        .iter()
        .map(|interval| interval.label.chars().count())
        .sum::<usize>()
        + 1
}

/// 1エントリ分の解析パイプライン
///
/// アノテーション取得 → 文字コード判定・パース → 母音フィルタ →
/// 音声取得・デコード → 区間検出 → 記述文字列の整形
///
/// リトライはしない。失敗はすべて呼び出し側（バッチ）に返す。
pub struct EntryAnalyzer {
    fetcher: Arc<dyn ResourceFetcher>,
    detector: Box<dyn EncodingDetector>,
    locator: SegmentLocator,
}

impl EntryAnalyzer {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        detector: Box<dyn EncodingDetector>,
        locator: SegmentLocator,
    ) -> Self {
        Self {
            fetcher,
            detector,
            locator,
        }
    }

    /// 使用中の強度指標名
    pub fn metric_name(&self) -> &'static str {
        self.locator.metric_name()
    }

    /// アノテーションのバイト列を区間列にパース
    pub fn parse_markup(&self, markup: &[u8]) -> Result<Vec<Interval>> {
        let encoding = self.detector.detect(markup);
        textgrid::parse(markup, encoding)
    }

    /// エントリを解析
    ///
    /// # Returns
    ///
    /// - `EntryOutcome::Analyzed` - 解析成功
    /// - `EntryOutcome::NoVowel` - 母音を含まないため対象外（音声は取得しない）
    ///
    /// # Errors
    ///
    /// 取得・パース・デコード・区間検出の各段階のエラーをそのまま返す。
    pub async fn analyze(&self, entry: &CorpusEntry) -> Result<EntryOutcome> {
        let markup = self.fetcher.fetch(&entry.markup).await?;
        let intervals = self.parse_markup(&markup)?;
        let transcription = transcription_of(&intervals);

        if !contains_vowel(&transcription) {
            return Ok(EntryOutcome::NoVowel { transcription });
        }

        let sound = self.fetcher.fetch(&entry.sound).await?;
        let audio = audio::decode_wav(&sound)?;
        let result = self.locator.locate(&audio, &intervals)?;

        let length_interval = &intervals[result.max_length_index];
        let intensity_interval = &intervals[result.max_intensity_index];

        let length_descriptor = format!(
            "{} {:.3} [{}]",
            length_interval.label,
            result.max_length_seconds,
            label_position(&intervals, result.max_length_index)
        );

        let sign = if result.max_intensity_index == result.max_length_index {
            '+'
        } else {
            '-'
        };
        let intensity_descriptor = format!(
            "{} {}{:.3} [{}]",
            intensity_interval.label,
            sign,
            result.max_intensity_ratio,
            label_position(&intervals, result.max_intensity_index)
        );

        Ok(EntryOutcome::Analyzed(AnalysisRecord {
            transcription,
            length_descriptor,
            intensity_descriptor,
        }))
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// 時間区間（TextGridのインターバル1つ分）
///
/// `[start, end)` の範囲（秒）とラベル文字列を保持する。
///
/// # Examples
///
/// ```
/// # use phonology_stats::types::Interval;
/// let interval = Interval::new(0.1, 0.4, "i");
/// assert!((interval.duration() - 0.3).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interval {
    /// 開始時刻（秒）
    pub start: f64,

    /// 終了時刻（秒）
    ///
    /// 常に `start` より大きい
    pub end: f64,

    /// 区間ラベル
    pub label: String,
}

impl Interval {
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// 区間の長さ（秒）
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// 全区間ラベルを順に連結した文字列（トランスクリプション）
pub fn transcription_of(intervals: &[Interval]) -> String {
    intervals.iter().map(|interval| interval.label.as_str()).collect()
}

/// オーディオフォーマット情報
///
/// 音声データのサンプリングレートとチャンネル数を保持する。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    /// サンプリングレート (Hz)
    pub sample_rate: u32,

    /// チャンネル数
    ///
    /// 1: モノラル, 2: ステレオ
    pub channels: u16,
}

/// デコード済みの音声データ
///
/// サンプルはチャンネルがインターリーブされたまま保持する。
/// 整数PCMは元の整数スケールのまま（正規化しない）。
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    /// インターリーブされたサンプル列
    pub samples: Vec<f64>,

    /// オーディオフォーマット情報
    pub format: AudioFormat,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f64>, format: AudioFormat) -> Self {
        Self { samples, format }
    }

    /// フレーム数（1フレーム = 全チャンネル分のサンプル）
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.format.channels.max(1) as usize
    }

    /// 再生時間（秒）
    pub fn duration_seconds(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.format.sample_rate as f64
    }
}

/// 最大強度区間と最長区間の検出結果
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityResult {
    /// 強度が最大の区間のインデックス
    pub max_intensity_index: usize,

    /// 最大強度区間の強度 / ファイル全体の強度
    pub max_intensity_ratio: f64,

    /// 最長区間のインデックス
    pub max_length_index: usize,

    /// 最長区間の長さ（秒）
    pub max_length_seconds: f64,
}

/// 1エントリ分の解析結果（出力テーブルの1行）
///
/// # JSON出力例
///
/// ```json
/// {
///   "transcription": "pilka",
///   "length_descriptor": "i 0.072 [2]",
///   "intensity_descriptor": "i +1.667 [2]"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisRecord {
    pub transcription: String,
    pub length_descriptor: String,
    pub intensity_descriptor: String,
}

/// エントリ解析の（エラー以外の）結果
#[derive(Clone, Debug, PartialEq)]
pub enum EntryOutcome {
    /// 解析成功
    Analyzed(AnalysisRecord),

    /// トランスクリプションに母音が含まれない
    ///
    /// エラーではなく、正当なフィルタリング結果として扱う
    NoVowel { transcription: String },
}

/// コーパスの1エントリ
///
/// アノテーション（TextGrid）と、それに対応する音声への参照の組。
/// 参照は `http(s)://` URL、`file://` URL、ローカルパスのいずれか。
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CorpusEntry {
    /// 識別子（ログ表示用、省略可能）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// アノテーションの参照
    pub markup: String,

    /// 音声の参照
    pub sound: String,
}

impl CorpusEntry {
    pub fn new(markup: impl Into<String>, sound: impl Into<String>) -> Self {
        Self {
            id: None,
            markup: markup.into(),
            sound: sound.into(),
        }
    }
}

impl fmt::Display for CorpusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "{}", self.markup),
        }
    }
}

/// バッチ処理の停止条件
///
/// 値が `None`（または 0）の条件は無制限として扱う。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Limits {
    /// 調査するエントリ総数の上限
    pub overall: Option<usize>,

    /// 例外件数の上限
    pub exception: Option<usize>,

    /// 母音なしエントリ件数の上限
    pub no_vowel: Option<usize>,

    /// 解析結果件数の上限
    pub result: Option<usize>,
}

impl Limits {
    /// 0 は無制限として扱う
    fn effective(limit: Option<usize>) -> Option<usize> {
        limit.filter(|&n| n > 0)
    }

    pub fn overall(&self) -> Option<usize> {
        Self::effective(self.overall)
    }

    pub fn exception(&self) -> Option<usize> {
        Self::effective(self.exception)
    }

    pub fn no_vowel(&self) -> Option<usize> {
        Self::effective(self.no_vowel)
    }

    pub fn result(&self) -> Option<usize> {
        Self::effective(self.result)
    }
}

/// バッチ処理のカウンタ
///
/// 1回の実行内でのみ有効で、単調増加する。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// 調査済みエントリ数
    pub examined: usize,
    pub result_count: usize,
    pub no_vowel_count: usize,
    pub exception_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_concatenates_labels_in_order() {
        let intervals = vec![
            Interval::new(0.0, 0.1, "p"),
            Interval::new(0.1, 0.2, "i"),
            Interval::new(0.2, 0.3, "l"),
            Interval::new(0.3, 0.4, "k"),
            Interval::new(0.4, 0.5, "a"),
        ];
        assert_eq!(transcription_of(&intervals), "pilka");
        assert_eq!(transcription_of(&[]), "");
    }

    #[test]
    fn test_decoded_audio_duration() {
        let audio = DecodedAudio::new(
            vec![0.0; 32000],
            AudioFormat {
                sample_rate: 16000,
                channels: 2,
            },
        );
        assert_eq!(audio.frame_count(), 16000);
        assert!((audio.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_limit_is_unbounded() {
        let limits = Limits {
            overall: Some(0),
            exception: Some(3),
            no_vowel: None,
            result: Some(0),
        };
        assert_eq!(limits.overall(), None);
        assert_eq!(limits.exception(), Some(3));
        assert_eq!(limits.no_vowel(), None);
        assert_eq!(limits.result(), None);
    }

    #[test]
    fn test_corpus_entry_display() {
        let mut entry = CorpusEntry::new("markup.TextGrid", "sound.wav");
        assert_eq!(entry.to_string(), "markup.TextGrid");
        entry.id = Some("345/2".to_string());
        assert_eq!(entry.to_string(), "345/2");
    }

    #[test]
    fn test_analysis_record_json_serialization() {
        let record = AnalysisRecord {
            transcription: "pil".to_string(),
            length_descriptor: "i 0.300 [2]".to_string(),
            intensity_descriptor: "i +1.667 [2]".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["transcription"], "pil");
        assert_eq!(parsed["length_descriptor"], "i 0.300 [2]");
        assert_eq!(parsed["intensity_descriptor"], "i +1.667 [2]");
    }
}

use crate::analyzer::EntryAnalyzer;
use crate::config::Config;
use crate::encoding::{EncodingDetector, FixedEncoding, SniffingDetector};
use crate::error::{PhonologyError, Result};
use crate::fetch::ResourceFetcher;
use crate::segment::SegmentLocator;
use crate::types::{AnalysisRecord, CorpusEntry, Counters, EntryOutcome, Limits};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// バッチ処理が停止した理由
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 解析結果件数が上限に到達
    ResultLimit,
    /// 例外件数が上限に到達
    ExceptionLimit,
    /// 母音なし件数が上限に到達
    NoVowelLimit,
    /// 調査エントリ総数が上限に到達
    OverallLimit,
    /// 中断シグナルを受信
    Interrupted,
    /// 全エントリを処理し終えた
    Exhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::ResultLimit => "解析結果件数の上限",
            StopReason::ExceptionLimit => "例外件数の上限",
            StopReason::NoVowelLimit => "母音なし件数の上限",
            StopReason::OverallLimit => "エントリ総数の上限",
            StopReason::Interrupted => "中断",
            StopReason::Exhausted => "全エントリ処理済み",
        };
        write!(f, "{}", text)
    }
}

/// 失敗したエントリ
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    /// ソース順のインデックス（0始まり）
    pub index: usize,
    /// エントリの表示名
    pub entry: String,
    /// エラー種別
    pub kind: &'static str,
    pub message: String,
}

/// 結果が1件もなかった場合の出力
///
/// # JSON出力例
///
/// ```json
/// {
///   "kind": "no_results",
///   "error": "no markups for this query",
///   "exception_count": 3,
///   "no_vowel_count": 1
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NoResults {
    pub kind: &'static str,
    pub error: &'static str,
    pub exception_count: usize,
    pub no_vowel_count: usize,
}

/// バッチ実行の最終結果
pub enum BatchOutcome<'a> {
    /// 解析結果なし
    NoResults(NoResults),
    /// 解析結果（ソース順）
    Records(&'a [AnalysisRecord]),
}

/// 1回のバッチ実行のレポート
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchReport {
    pub records: Vec<AnalysisRecord>,
    pub counters: Counters,
    pub stop_reason: StopReason,
    pub failures: Vec<FailedEntry>,
}

impl BatchReport {
    pub fn outcome(&self) -> BatchOutcome<'_> {
        if self.records.is_empty() {
            BatchOutcome::NoResults(NoResults {
                kind: "no_results",
                error: "no markups for this query",
                exception_count: self.counters.exception_count,
                no_vowel_count: self.counters.no_vowel_count,
            })
        } else {
            BatchOutcome::Records(&self.records)
        }
    }
}

/// 1回の実行の状態
///
/// カウンタと結果はこの構造体だけが更新する。
struct RunState {
    limits: Limits,
    counters: Counters,
    records: Vec<AnalysisRecord>,
    failures: Vec<FailedEntry>,
}

impl RunState {
    fn new(limits: Limits) -> Self {
        Self {
            limits,
            counters: Counters::default(),
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn record(&mut self, index: usize, entry: &CorpusEntry, outcome: Result<EntryOutcome>) {
        self.counters.examined += 1;

        match outcome {
            Ok(EntryOutcome::Analyzed(record)) => {
                log::debug!(
                    "{}:\n{}\n{}\n({:?}, {:?}, {:?})",
                    index,
                    entry.markup,
                    entry.sound,
                    record.transcription,
                    record.length_descriptor,
                    record.intensity_descriptor
                );
                self.records.push(record);
                self.counters.result_count += 1;
            }
            Ok(EntryOutcome::NoVowel { transcription }) => {
                log::debug!("{}: 母音なし {:?} ({})", index, transcription, entry);
                self.counters.no_vowel_count += 1;
            }
            Err(error) => {
                log::warn!("{}: {} の処理に失敗 [{}]: {}", index, entry, error.kind(), error);
                self.counters.exception_count += 1;
                self.failures.push(FailedEntry {
                    index,
                    entry: entry.to_string(),
                    kind: error.kind(),
                    message: error.to_string(),
                });
            }
        }
    }

    /// 停止条件の判定
    ///
    /// 全条件をエントリごとに評価し、最初に満たされたものを返す。
    fn stop_reason(&self) -> Option<StopReason> {
        let reached = |limit: Option<usize>, count: usize| limit.is_some_and(|n| count >= n);

        if reached(self.limits.result(), self.counters.result_count) {
            Some(StopReason::ResultLimit)
        } else if reached(self.limits.exception(), self.counters.exception_count) {
            Some(StopReason::ExceptionLimit)
        } else if reached(self.limits.no_vowel(), self.counters.no_vowel_count) {
            Some(StopReason::NoVowelLimit)
        } else if reached(self.limits.overall(), self.counters.examined) {
            Some(StopReason::OverallLimit)
        } else {
            None
        }
    }

    fn finish(self, stop_reason: StopReason) -> BatchReport {
        BatchReport {
            records: self.records,
            counters: self.counters,
            stop_reason,
            failures: self.failures,
        }
    }
}

/// コーパス全体のバッチ処理
///
/// 最大 `workers` 件のエントリを並行に解析し、結果はソース順に1件ずつ
/// 集計する。停止条件はソース順で調査したエントリに対して評価されるため、
/// 完了順が入れ替わっても結果は変わらない。停止後は新しいエントリを投入せず、
/// 実行中の解析結果は破棄する。
pub struct BatchController {
    analyzer: EntryAnalyzer,
    workers: usize,
    interrupt: Option<Arc<AtomicBool>>,
}

impl BatchController {
    pub fn new(analyzer: EntryAnalyzer, workers: usize) -> Self {
        Self {
            analyzer,
            workers: workers.max(1),
            interrupt: None,
        }
    }

    /// 設定からバッチを構築
    ///
    /// # Errors
    ///
    /// 強度指標名または文字コードラベルが不正な場合は `Config` エラー。
    /// 実行全体の設定ミスなので、呼び出し側で即座に終了すること。
    pub fn from_config(config: &Config, fetcher: Arc<dyn ResourceFetcher>) -> Result<Self> {
        let locator = SegmentLocator::from_metric_name(&config.analysis.metric)?;

        let detector: Box<dyn EncodingDetector> = match &config.analysis.encoding {
            Some(label) => Box::new(FixedEncoding::from_label(label).ok_or_else(|| {
                PhonologyError::Config(format!("未知の文字コードです: {:?}", label))
            })?),
            None => Box::new(SniffingDetector),
        };

        Ok(Self::new(
            EntryAnalyzer::new(fetcher, detector, locator),
            config.batch.workers,
        ))
    }

    /// 中断フラグを設定（true になると新しいエントリを投入しない）
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// バッチを実行
    ///
    /// `entries` は必要になった時点で1件ずつ取り出される。
    /// `overall` 上限がある場合、それを超えるエントリは投入すらしない。
    pub async fn run<I>(&self, entries: I, limits: Limits) -> BatchReport
    where
        I: IntoIterator<Item = CorpusEntry>,
    {
        log::info!(
            "バッチ開始: 指標 {}, 並列数 {}, 停止条件 {:?}",
            self.analyzer.metric_name(),
            self.workers,
            limits
        );

        let mut state = RunState::new(limits);
        let cap = limits.overall().unwrap_or(usize::MAX);
        let analyzer = &self.analyzer;

        let source = entries
            .into_iter()
            .take(cap)
            .take_while(|_| !self.interrupted())
            .enumerate();

        let analyses = stream::iter(source)
            .map(|(index, entry)| async move {
                let outcome = analyzer.analyze(&entry).await;
                (index, entry, outcome)
            })
            .buffered(self.workers);
        tokio::pin!(analyses);

        let mut stop_reason = StopReason::Exhausted;
        while let Some((index, entry, outcome)) = analyses.next().await {
            state.record(index, &entry, outcome);

            if let Some(reason) = state.stop_reason() {
                stop_reason = reason;
                break;
            }
            if self.interrupted() {
                stop_reason = StopReason::Interrupted;
                break;
            }
        }
        if stop_reason == StopReason::Exhausted && self.interrupted() {
            stop_reason = StopReason::Interrupted;
        }

        if stop_reason != StopReason::Exhausted {
            log::info!("停止: {} (調査済み {} 件)", stop_reason, state.counters.examined);
        }

        let report = state.finish(stop_reason);
        log::info!(
            "解析結果 {} 件, 母音なし {} 件, 例外 {} 件",
            report.counters.result_count,
            report.counters.no_vowel_count,
            report.counters.exception_count
        );
        report
    }
}

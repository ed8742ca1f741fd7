//! phonology-stats - 音声コーパスの韻律的卓立の統計
//!
//! このクレートは、TextGridでアノテーションされた音声コーパスの各エントリについて、
//! 強度が最大の区間と長さが最大の区間を求め、比較レコードを出力します。
//! 辞書・コーパスの見出し語の強勢位置を監査する言語研究者向けのツールです。
//!
//! # 主な機能
//!
//! - **TextGridパース**: 長形式・短形式のPraatテキスト形式、文字コード自動判定
//! - **強度計算**: RMS または平均絶対振幅
//! - **区間検出**: 最大強度区間・最長区間（同値の場合は先の区間が優先）
//! - **母音フィルタ**: 母音記号を含まないトランスクリプションは対象外
//! - **バッチ処理**: 並行取得しつつソース順で集計、4種類の停止条件
//!
//! # アーキテクチャ
//!
//! ```text
//! [Corpus Entries] → [BatchController] ──(×W 並行)──→ [EntryAnalyzer]
//!                          ↑                              │
//!                          │                  ┌───────────┼────────────┐
//!                          │                  ↓           ↓            ↓
//!                          │            [ResourceFetcher] [textgrid] [SegmentLocator]
//!                          │                                           │
//!                          │                                    [IntensityMeasure]
//!                          │                                           │
//!                          └──────────── AnalysisRecord ←──────────────┘
//!                                              │
//!                                              ↓
//!                                        [ReportSink]
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! use phonology_stats::batch::BatchController;
//! use phonology_stats::config::Config;
//! use phonology_stats::fetch::HttpFetcher;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load_or_default("config.toml")?;
//! let entries = phonology_stats::corpus::load_manifest("entries.json")?;
//! let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
//!
//! let controller = BatchController::from_config(&config, fetcher)?;
//! let report = controller.run(entries, config.batch.limits()).await;
//! println!("{} 件", report.records.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod audio;
pub mod batch;
pub mod config;
pub mod corpus;
pub mod encoding;
pub mod error;
pub mod fetch;
pub mod intensity;
pub mod segment;
pub mod sinks;
pub mod textgrid;
pub mod types;

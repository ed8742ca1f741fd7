//! 解析結果テーブルの出力先

mod jsonl;
mod sink_trait;
mod tsv;

pub use jsonl::JsonLinesSink;
pub use sink_trait::{write_all, ReportSink};
pub use tsv::TsvSink;

use crate::config::OutputFormat;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// 出力ファイルのパスを決定
///
/// `path` が既存のディレクトリなら、その中に
/// `phonology_YYYYmmdd_HHMMSS.<拡張子>` を作成する。
pub fn resolve_table_path<P: AsRef<Path>>(path: P, format: OutputFormat) -> PathBuf {
    let path = path.as_ref();
    if !path.is_dir() {
        return path.to_path_buf();
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let extension = match format {
        OutputFormat::Tsv => "tsv",
        OutputFormat::Jsonl => "jsonl",
    };
    path.join(format!("phonology_{}.{}", timestamp, extension))
}

/// 形式に応じたファイル出力先を作成
pub fn create_sink<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<Box<dyn ReportSink>> {
    let sink: Box<dyn ReportSink> = match format {
        OutputFormat::Tsv => Box::new(TsvSink::create(path)?),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(path)?),
    };
    Ok(sink)
}

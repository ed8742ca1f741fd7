use super::ReportSink;
use crate::types::AnalysisRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// タブ区切りテーブル出力
///
/// セル内のタブ・改行は空白に置き換える。ヘッダ行は出力しない。
pub struct TsvSink<W: Write> {
    writer: W,
    rows_written: usize,
}

impl TsvSink<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("出力ファイルの作成に失敗: {:?}", path.as_ref()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn cell(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

impl<W: Write> ReportSink for TsvSink<W> {
    fn write(&mut self, record: &AnalysisRecord) -> Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}",
            cell(&record.transcription),
            cell(&record.length_descriptor),
            cell(&record.intensity_descriptor)
        )
        .context("TSV書き込み失敗")?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("TSVのフラッシュに失敗")?;
        log::info!("テーブル書き込み完了: {} 行", self.rows_written);
        Ok(())
    }
}

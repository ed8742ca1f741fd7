use super::ReportSink;
use crate::types::AnalysisRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSON Lines 出力（1行1レコード）
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("出力ファイルの作成に失敗: {:?}", path.as_ref()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn write(&mut self, record: &AnalysisRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("JSONシリアライズ失敗")?;
        self.writer.write_all(b"\n").context("JSON Lines 書き込み失敗")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("JSON Lines のフラッシュに失敗")
    }
}

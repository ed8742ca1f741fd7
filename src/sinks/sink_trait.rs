use crate::types::AnalysisRecord;
use anyhow::Result;

/// 解析結果の出力先
///
/// 1レコード = 1行。列は transcription, length_descriptor, intensity_descriptor の順。
pub trait ReportSink {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn write(&mut self, record: &AnalysisRecord) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 全レコードを書き出す
pub fn write_all(sink: &mut dyn ReportSink, records: &[AnalysisRecord]) -> Result<()> {
    sink.start()?;
    for record in records {
        sink.write(record)?;
    }
    sink.finish()
}

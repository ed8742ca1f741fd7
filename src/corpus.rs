use crate::types::CorpusEntry;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// コーパスのエントリ一覧を読み込み
///
/// JSON配列、または1行1エントリの JSON Lines に対応する。
///
/// ```json
/// [
///   { "id": "345/2", "markup": "https://example.org/a.TextGrid", "sound": "https://example.org/a.wav" },
///   { "markup": "data/b.TextGrid", "sound": "data/b.wav" }
/// ]
/// ```
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusEntry>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("エントリ一覧の読み込みに失敗: {:?}", path.as_ref()))?;
    parse_manifest(&content)
        .with_context(|| format!("エントリ一覧のパースに失敗: {:?}", path.as_ref()))
}

/// エントリ一覧の文字列をパース
pub fn parse_manifest(content: &str) -> Result<Vec<CorpusEntry>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).context("JSON配列として読めません");
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<CorpusEntry>(line)
                .with_context(|| format!("{} 行目が不正です", number + 1))
        })
        .collect()
}

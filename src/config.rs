use crate::types::Limits;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// 解析設定
///
/// # デフォルト値
///
/// - `metric`: "rms"
/// - `encoding`: なし（自動判定）
///
/// `metric` は文字列のまま保持し、実行開始時に検証する
/// （未知の値は実行全体の `Config` エラー）。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_metric")]
    pub metric: String,
    /// アノテーションの文字コードを固定する場合のラベル
    pub encoding: Option<String>,
}

/// バッチ設定
///
/// 並列度と停止条件。停止条件は省略または 0 で無制限。
///
/// # デフォルト値
///
/// - `workers`: 4
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// 調査するエントリ総数の上限
    pub limit: Option<usize>,
    pub limit_exception: Option<usize>,
    pub limit_no_vowel: Option<usize>,
    pub limit_result: Option<usize>,
}

/// 取得設定
///
/// # デフォルト値
///
/// - `timeout_seconds`: 30 秒
/// - `user_agent`: "phonology-stats/<version>"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 出力形式
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// タブ区切りテーブル
    Tsv,
    /// JSON Lines
    Jsonl,
}

/// 出力設定
///
/// # デフォルト値
///
/// - `table_path`: "./phonology.tsv"
/// - `format`: tsv
///
/// `table_path` がディレクトリの場合は、その中にタイムスタンプ付きのファイルを作成する。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_table_path")]
    pub table_path: String,
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

// Default functions
fn default_metric() -> String {
    "rms".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("phonology-stats/{}", env!("CARGO_PKG_VERSION"))
}

fn default_table_path() -> String {
    "./phonology.tsv".to_string()
}

fn default_format() -> OutputFormat {
    OutputFormat::Tsv
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            metric: default_metric(),
            encoding: None,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            limit: None,
            limit_exception: None,
            limit_no_vowel: None,
            limit_result: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table_path: default_table_path(),
            format: default_format(),
        }
    }
}

impl BatchConfig {
    /// 停止条件を取り出す
    pub fn limits(&self) -> Limits {
        Limits {
            overall: self.limit,
            exception: self.limit_exception,
            no_vowel: self.limit_no_vowel,
            result: self.limit_result,
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// TOML形式の設定ファイルをパースしてConfig構造体を生成する。
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use phonology_stats::config::Config;
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// 既存のファイルは上書きされる。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Errors
    ///
    /// ファイルが存在するがパースに失敗した場合にエラーを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.metric, "rms");
        assert!(config.analysis.encoding.is_none());
        assert_eq!(config.batch.workers, 4);
        assert_eq!(config.batch.limits(), Limits::default());
        assert_eq!(config.fetch.timeout_seconds, 30);
        assert!(config.fetch.user_agent.starts_with("phonology-stats/"));
        assert_eq!(config.output.format, OutputFormat::Tsv);
    }

    #[test]
    fn test_write_and_read_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        Config::write_default(path).unwrap();

        let config = Config::from_file(path).unwrap();
        assert_eq!(config.analysis.metric, "rms");
        assert_eq!(config.output.table_path, "./phonology.tsv");
    }

    #[test]
    fn test_custom_config() {
        let toml_content = r#"
[analysis]
metric = "mean_abs"
encoding = "windows-1251"

[batch]
workers = 8
limit = 100
limit_exception = 10
limit_no_vowel = 20
limit_result = 50

[fetch]
timeout_seconds = 5
user_agent = "lingvo-audit"

[output]
table_path = "/tmp/out.jsonl"
format = "jsonl"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.analysis.metric, "mean_abs");
        assert_eq!(config.analysis.encoding.as_deref(), Some("windows-1251"));
        assert_eq!(config.batch.workers, 8);
        assert_eq!(
            config.batch.limits(),
            Limits {
                overall: Some(100),
                exception: Some(10),
                no_vowel: Some(20),
                result: Some(50),
            }
        );
        assert_eq!(config.fetch.timeout_seconds, 5);
        assert_eq!(config.fetch.user_agent, "lingvo-audit");
        assert_eq!(config.output.table_path, "/tmp/out.jsonl");
        assert_eq!(config.output.format, OutputFormat::Jsonl);
    }

    #[test]
    fn test_load_or_default_nonexistent() {
        let config = Config::load_or_default("nonexistent_file.toml").unwrap();
        assert_eq!(config.batch.workers, 4);
    }

    #[test]
    fn test_partial_config() {
        // 一部の設定のみ記述した場合、残りはデフォルト値が使われる
        let toml_content = r#"
[batch]
limit_result = 5
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.batch.limit_result, Some(5));
        assert_eq!(config.batch.workers, 4);
        assert_eq!(config.analysis.metric, "rms");
        assert_eq!(config.fetch.timeout_seconds, 30);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[output]\nformat = \"xls\"\n")
            .unwrap();
        temp_file.flush().unwrap();

        assert!(Config::from_file(temp_file.path()).is_err());
    }
}

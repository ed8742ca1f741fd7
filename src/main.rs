use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use phonology_stats::batch::{BatchController, BatchOutcome};
use phonology_stats::config::{Config, OutputFormat};
use phonology_stats::fetch::HttpFetcher;
use phonology_stats::{corpus, sinks};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// TextGrid付き音声コーパスの最大強度区間・最長区間を集計する
#[derive(Debug, Parser)]
#[command(name = "phonology-stats", version, about)]
struct Cli {
    /// エントリ一覧（JSON配列 または JSON Lines）
    #[arg(required_unless_present = "generate_config")]
    manifest: Option<PathBuf>,

    /// 設定ファイルのパス
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// デフォルト設定ファイルを生成して終了
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "config.toml")]
    generate_config: Option<PathBuf>,

    /// 強度指標 (rms | mean_abs)
    #[arg(long)]
    metric: Option<String>,

    /// 並列数
    #[arg(long)]
    workers: Option<usize>,

    /// 調査するエントリ総数の上限
    #[arg(long)]
    limit: Option<usize>,

    /// 例外件数の上限
    #[arg(long)]
    limit_exception: Option<usize>,

    /// 母音なし件数の上限
    #[arg(long)]
    limit_no_vowel: Option<usize>,

    /// 解析結果件数の上限
    #[arg(long)]
    limit_result: Option<usize>,

    /// アノテーションの文字コードを固定（省略時は自動判定）
    #[arg(long)]
    encoding: Option<String>,

    /// 出力ファイル（ディレクトリ指定時はタイムスタンプ付きファイル名）
    #[arg(short, long)]
    output: Option<String>,

    /// 出力形式
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// デバッグログを出力
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// コマンドライン引数で設定を上書き
    fn apply(&self, config: &mut Config) {
        if let Some(metric) = &self.metric {
            config.analysis.metric = metric.clone();
        }
        if let Some(encoding) = &self.encoding {
            config.analysis.encoding = Some(encoding.clone());
        }
        if let Some(workers) = self.workers {
            config.batch.workers = workers;
        }
        if self.limit.is_some() {
            config.batch.limit = self.limit;
        }
        if self.limit_exception.is_some() {
            config.batch.limit_exception = self.limit_exception;
        }
        if self.limit_no_vowel.is_some() {
            config.batch.limit_no_vowel = self.limit_no_vowel;
        }
        if self.limit_result.is_some() {
            config.batch.limit_result = self.limit_result;
        }
        if let Some(output) = &self.output {
            config.output.table_path = output.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ロガーを初期化
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .filter_module("hyper_util", log::LevelFilter::Info)
        .filter_module("reqwest", log::LevelFilter::Info)
        .init();

    // 設定ファイル生成モード
    if let Some(path) = &cli.generate_config {
        Config::write_default(path)?;
        println!("設定ファイルを生成しました: {}", path.display());
        return Ok(());
    }

    let manifest = cli
        .manifest
        .as_ref()
        .context("エントリ一覧のパスを指定してください")?;

    // 設定を読み込み
    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply(&mut config);

    log::info!("phonology-stats を起動します");
    log::debug!("設定: {:?}", config);

    let entries = corpus::load_manifest(manifest)?;
    log::info!("エントリ {} 件を読み込みました: {:?}", entries.len(), manifest);

    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);

    // Ctrl+C ハンドラを設定
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        log::info!("停止シグナルを受信しました。新しいエントリの投入を止めます...");
        interrupted_clone.store(true, Ordering::SeqCst);
    })?;

    let controller = BatchController::from_config(&config, fetcher)
        .context("設定が不正です")?
        .with_interrupt(interrupted);

    let report = controller.run(entries, config.batch.limits()).await;

    match report.outcome() {
        BatchOutcome::NoResults(no_results) => {
            // 結果なし: 失敗件数と母音なし件数を出力
            println!("{}", serde_json::to_string(&no_results)?);
        }
        BatchOutcome::Records(records) => {
            let path = sinks::resolve_table_path(&config.output.table_path, config.output.format);
            let mut sink = sinks::create_sink(&path, config.output.format)?;
            sinks::write_all(sink.as_mut(), records)?;
            log::info!("結果を書き出しました: {:?}", path);
        }
    }

    Ok(())
}

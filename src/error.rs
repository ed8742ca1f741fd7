use thiserror::Error;

/// 解析パイプラインのエラー
///
/// `Config` のみ実行全体を中断させる。それ以外はエントリ単位で回収され、
/// バッチ側で例外件数としてカウントされる。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhonologyError {
    /// TextGridの構造が不正
    #[error("アノテーションのパースに失敗: {0}")]
    Parse(String),

    /// 指定された文字コードでデコードできない
    #[error("文字コード {0} でのデコードに失敗")]
    Decode(String),

    /// 設定値が不正（強度指標名など）
    #[error("設定エラー: {0}")]
    Config(String),

    /// 解析対象の区間がない
    #[error("解析対象の区間がありません")]
    EmptyInput,

    /// ファイル全体の強度が 0 で比率が定義できない
    #[error("音声全体の強度が 0 です（無音ファイル）")]
    DegenerateAudio,

    /// アノテーションまたは音声の取得失敗（タイムアウト含む）
    #[error("取得に失敗: {0}")]
    Fetch(String),

    /// 音声データが読めない、または壊れている
    #[error("音声のデコードに失敗: {0}")]
    AudioDecode(String),
}

impl PhonologyError {
    /// ログやレポートで使う種別名
    pub fn kind(&self) -> &'static str {
        match self {
            PhonologyError::Parse(_) => "parse",
            PhonologyError::Decode(_) => "decode",
            PhonologyError::Config(_) => "config",
            PhonologyError::EmptyInput => "empty_input",
            PhonologyError::DegenerateAudio => "degenerate_audio",
            PhonologyError::Fetch(_) => "fetch",
            PhonologyError::AudioDecode(_) => "audio_decode",
        }
    }
}

pub type Result<T> = std::result::Result<T, PhonologyError>;

use crate::error::{PhonologyError, Result};
use crate::types::Interval;
use encoding_rs::Encoding;
use std::borrow::Cow;

/// 1区間をテキストで表すのに必要な最小バイト数
const MIN_INTERVAL_BYTES: usize = 5;

/// TextGridのトークン
#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    /// `<exists>` = true, `<absent>` = false
    Flag(bool),
}

/// Praatテキスト形式のトークナイザ
///
/// 長形式（`xmin = 0` のようなキー付き）と短形式（値のみ）の両方を同じ
/// トークン列に落とす。キー名、`[1]` のような添字、`!` 以降のコメントは読み飛ばす。
struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    /// 未読のバイト数
    fn remaining(&self) -> usize {
        self.src.len() - self.pos
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_until(&mut self, end: char) {
        while let Some(c) = self.bump() {
            if c == end {
                break;
            }
        }
    }

    fn read_string(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    // "" は引用符1つのエスケープ
                    if self.peek_char() == Some('"') {
                        self.bump();
                        text.push('"');
                    } else {
                        return Ok(text);
                    }
                }
                Some(c) => text.push(c),
                None => {
                    return Err(PhonologyError::Parse(
                        "文字列が閉じられていません".to_string(),
                    ))
                }
            }
        }
    }

    fn read_number(&mut self) -> Result<f64> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E') {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.src[start..self.pos];
        literal
            .parse::<f64>()
            .map_err(|_| PhonologyError::Parse(format!("数値として読めません: {:?}", literal)))
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        while let Some(c) = self.peek_char() {
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '"' => {
                    self.bump();
                    return self.read_string().map(|text| Some(Token::Text(text)));
                }
                '!' => self.skip_until('\n'),
                '[' => self.skip_until(']'),
                '<' => {
                    self.bump();
                    let start = self.pos;
                    self.skip_until('>');
                    let flag = self.src[start..self.pos].trim_end_matches('>');
                    match flag {
                        "exists" => return Ok(Some(Token::Flag(true))),
                        "absent" => return Ok(Some(Token::Flag(false))),
                        other => log::debug!("未知のフラグを無視: <{}>", other),
                    }
                }
                c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                    return self.read_number().map(|n| Some(Token::Number(n)));
                }
                _ => {
                    // キー名などの単語
                    while let Some(c) = self.peek_char() {
                        if c.is_whitespace() || matches!(c, '"' | '[' | '<' | '!') {
                            break;
                        }
                        self.bump();
                    }
                }
            }
        }
        Ok(None)
    }
}

/// トークン列から値を順に取り出すリーダー
struct Reader<'a> {
    tokens: Tokenizer<'a>,
}

impl<'a> Reader<'a> {
    fn next(&mut self, what: &str) -> Result<Token> {
        self.tokens.next_token()?.ok_or_else(|| {
            PhonologyError::Parse(format!("{} の途中でファイルが終了しました", what))
        })
    }

    fn number(&mut self, what: &str) -> Result<f64> {
        match self.next(what)? {
            Token::Number(n) => Ok(n),
            other => Err(PhonologyError::Parse(format!(
                "{} に数値が必要です: {:?}",
                what, other
            ))),
        }
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let n = self.number(what)?;
        if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
            return Err(PhonologyError::Parse(format!(
                "{} は0以上の整数である必要があります: {}",
                what, n
            )));
        }
        Ok(n as usize)
    }

    fn text(&mut self, what: &str) -> Result<String> {
        match self.next(what)? {
            Token::Text(text) => Ok(text),
            other => Err(PhonologyError::Parse(format!(
                "{} に文字列が必要です: {:?}",
                what, other
            ))),
        }
    }
}

/// 指定の文字コードでバイト列をデコード
///
/// 先頭のBOMが指定の文字コードと一致する場合は取り除く。
fn decode<'b>(bytes: &'b [u8], encoding: &'static Encoding) -> Result<Cow<'b, str>> {
    let body = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| PhonologyError::Decode(encoding.name().to_string()))
}

/// TextGridの最初のティアを区間列としてパース
///
/// 区間はファイルに書かれた順（時間順）のまま返す。結合やフィルタリングはしない。
///
/// # Errors
///
/// - 指定の文字コードでデコードできない場合は `Decode`
/// - TextGridとして不正な場合、最初のティアが IntervalTier でない場合、
///   開始時刻が負または `end <= start` の区間がある場合、
///   区間数が入力の長さに見合わない場合は `Parse`
///
/// # Examples
///
/// ```
/// # use phonology_stats::textgrid::parse;
/// let src = "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n\
///            0\n0.5\n<exists>\n1\n\"IntervalTier\"\n\"words\"\n0\n0.5\n\
///            2\n0\n0.2\n\"p\"\n0.2\n0.5\n\"a\"\n";
/// let intervals = parse(src.as_bytes(), encoding_rs::UTF_8).unwrap();
/// assert_eq!(intervals.len(), 2);
/// assert_eq!(intervals[1].label, "a");
/// ```
pub fn parse(bytes: &[u8], encoding: &'static Encoding) -> Result<Vec<Interval>> {
    if bytes.is_empty() {
        return Err(PhonologyError::Parse("アノテーションが空です".to_string()));
    }
    if bytes.starts_with(b"ooBinaryFile") {
        return Err(PhonologyError::Parse(
            "バイナリ形式のTextGridには対応していません".to_string(),
        ));
    }

    let text = decode(bytes, encoding)?;
    let mut reader = Reader {
        tokens: Tokenizer::new(&text),
    };

    let file_type = reader.text("File type")?;
    if !file_type.starts_with("ooTextFile") {
        return Err(PhonologyError::Parse(format!(
            "Praatテキスト形式ではありません: {:?}",
            file_type
        )));
    }
    let object_class = reader.text("Object class")?;
    if object_class != "TextGrid" {
        return Err(PhonologyError::Parse(format!(
            "TextGridではありません: {:?}",
            object_class
        )));
    }

    reader.number("xmin")?;
    reader.number("xmax")?;
    match reader.next("tiers")? {
        Token::Flag(true) => {}
        Token::Flag(false) => {
            return Err(PhonologyError::Parse("ティアがありません".to_string()));
        }
        other => {
            return Err(PhonologyError::Parse(format!(
                "tiers フラグが必要です: {:?}",
                other
            )));
        }
    }
    if reader.count("size")? == 0 {
        return Err(PhonologyError::Parse("ティアがありません".to_string()));
    }

    let class = reader.text("class")?;
    if class != "IntervalTier" {
        return Err(PhonologyError::Parse(format!(
            "最初のティアが IntervalTier ではありません: {:?}",
            class
        )));
    }
    let name = reader.text("name")?;
    reader.number("tier xmin")?;
    reader.number("tier xmax")?;
    let size = reader.count("intervals size")?;

    // 1区間は最短でも `0 1""` の5バイト
    let remaining = reader.tokens.remaining();
    if size > remaining / MIN_INTERVAL_BYTES {
        return Err(PhonologyError::Parse(format!(
            "区間数 {} が残りの入力 ({} バイト) に収まりません",
            size, remaining
        )));
    }

    let mut intervals = Vec::with_capacity(size);
    for _ in 0..size {
        let start = reader.number("interval xmin")?;
        let end = reader.number("interval xmax")?;
        let label = reader.text("interval text")?;
        if !(start >= 0.0) {
            return Err(PhonologyError::Parse(format!(
                "区間の開始時刻が負です: {}",
                start
            )));
        }
        if !(end > start) {
            return Err(PhonologyError::Parse(format!(
                "区間の終了時刻が開始時刻以前です: {} - {}",
                start, end
            )));
        }
        intervals.push(Interval { start, end, label });
    }

    log::trace!(
        "TextGrid パース完了: ティア {:?}, {} 区間 ({})",
        name,
        intervals.len(),
        encoding.name()
    );

    Ok(intervals)
}

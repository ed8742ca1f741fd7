use encoding_rs::Encoding;

/// 文字コード判定の共通トレイト
pub trait EncodingDetector: Send + Sync {
    /// バイト列の文字コードを推定する
    fn detect(&self, bytes: &[u8]) -> &'static Encoding;
}

/// BOM → 統計的推定 の順で判定する既定の実装
///
/// PraatはASCII外の文字を含むTextGridをBOM付きUTF-16で書き出すため、
/// BOMがあればそれを最優先する。
#[derive(Debug, Default, Clone, Copy)]
pub struct SniffingDetector;

impl EncodingDetector for SniffingDetector {
    fn detect(&self, bytes: &[u8]) -> &'static Encoding {
        if let Some((encoding, _)) = Encoding::for_bom(bytes) {
            return encoding;
        }

        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(bytes, true);
        detector.guess(None, true)
    }
}

/// 設定で固定された文字コードを常に返す実装
#[derive(Debug, Clone, Copy)]
pub struct FixedEncoding(pub &'static Encoding);

impl FixedEncoding {
    /// ラベル（"utf-8", "windows-1251" など）から作成
    pub fn from_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(FixedEncoding)
    }
}

impl EncodingDetector for FixedEncoding {
    fn detect(&self, _bytes: &[u8]) -> &'static Encoding {
        self.0
    }
}

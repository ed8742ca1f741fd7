use crate::config::FetchConfig;
use crate::error::{PhonologyError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// リソース取得の共通トレイト
///
/// アノテーションと音声の取得に使う。失敗（タイムアウトを含む）は
/// すべて `Fetch` エラーとして返す。
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>>;
}

/// 参照の種類
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Http(reqwest::Url),
    File(PathBuf),
}

fn locate(reference: &str) -> Result<Location> {
    let reference = reference.trim();
    let is_url = ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| reference.starts_with(scheme));

    if !is_url {
        return Ok(Location::File(PathBuf::from(reference)));
    }

    // URL解析時に非ASCII文字はパーセントエンコードされる
    let url = reqwest::Url::parse(reference)
        .map_err(|e| PhonologyError::Fetch(format!("{}: 不正なURL: {}", reference, e)))?;

    if url.scheme() == "file" {
        let path = url
            .to_file_path()
            .map_err(|_| PhonologyError::Fetch(format!("{}: 不正なファイルURL", reference)))?;
        Ok(Location::File(path))
    } else {
        Ok(Location::Http(url))
    }
}

/// HTTP(S) とローカルファイルに対応した取得クライアント
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("HTTPクライアント作成失敗")?;

        Ok(Self { client })
    }

    async fn fetch_http(&self, url: reqwest::Url) -> Result<Vec<u8>> {
        let describe = |e: reqwest::Error| {
            if e.is_timeout() {
                PhonologyError::Fetch(format!("{}: タイムアウト", url))
            } else {
                PhonologyError::Fetch(format!("{}: {}", url, e))
            }
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(describe)?;

        if !response.status().is_success() {
            return Err(PhonologyError::Fetch(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response.bytes().await.map_err(describe)?;
        log::trace!("取得完了: {} ({} バイト)", url, body.len());
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        match locate(reference)? {
            Location::Http(url) => self.fetch_http(url).await,
            Location::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| PhonologyError::Fetch(format!("{:?}: {}", path, e))),
        }
    }
}

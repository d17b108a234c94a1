use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client as HttpClient, StatusCode};

pub mod parse;
pub mod types;

pub use types::Entry;

pub const USER_AGENT: &str = "MeTubeManager/1.0 (metube-feeder)";
const FETCH_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self, feed_url: &str) -> Result<Vec<Entry>, FetchError>;
}

#[derive(Clone)]
pub struct HttpFeedSource {
    http: HttpClient,
}

impl HttpFeedSource {
    pub fn new() -> Result<Self, FetchError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self { http })
    }

    /// The feed's own title (RSS channel or Atom feed), used to name new feeds.
    pub async fn fetch_title(&self, feed_url: &str) -> Result<Option<String>, FetchError> {
        let body = self.get_body(feed_url).await?;
        parse::parse_title(&body)
    }

    async fn get_body(&self, feed_url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .http
            .get(feed_url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        response.bytes().await.map_err(FetchError::from_reqwest)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_entries(&self, feed_url: &str) -> Result<Vec<Entry>, FetchError> {
        let body = self.get_body(feed_url).await?;
        parse::parse_entries(&body)
    }
}

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Timeout,
    Status(StatusCode),
    Malformed(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Http(err) }
    }

    /// Transport failures and bad statuses; everything except a parse failure.
    pub fn is_unreachable(&self) -> bool {
        !matches!(self, FetchError::Malformed(_))
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "unreachable: {err}"),
            FetchError::Timeout => write!(f, "unreachable: request timed out"),
            FetchError::Status(status) => write!(f, "unreachable: status {status}"),
            FetchError::Malformed(msg) => write!(f, "malformed feed: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_http::{closed_port_url, OneShotServer};

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title> Some Channel </title><link>https://e.com</link><description>d</description>
<item><title>new</title><link>https://www.youtube.com/watch?v=v2</link></item>
<item><title>old</title><link>https://www.youtube.com/watch?v=v1</link></item>
</channel></rss>"#;

    #[tokio::test]
    async fn fetches_entries_with_user_agent() {
        let server = OneShotServer::start(200, "OK", "application/rss+xml", RSS).await;
        let source = HttpFeedSource::new().unwrap();

        let entries = source.fetch_entries(&server.url("/feed.xml")).await.unwrap();
        let links: Vec<&str> = entries.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(links, vec!["https://www.youtube.com/watch?v=v2", "https://www.youtube.com/watch?v=v1"]);

        let request = server.request().await.to_ascii_lowercase();
        assert!(request.starts_with("get /feed.xml http/1.1"));
        assert!(request.contains("user-agent: metubemanager/1.0 (metube-feeder)"));
    }

    #[tokio::test]
    async fn server_error_is_status() {
        let server = OneShotServer::start(500, "Internal Server Error", "text/plain", "boom").await;
        let err = HttpFeedSource::new().unwrap().fetch_entries(&server.url("/feed.xml")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR));
        assert!(err.is_unreachable());
        server.request().await;
    }

    #[tokio::test]
    async fn html_page_is_malformed() {
        let server = OneShotServer::start(200, "OK", "text/html", "<html><body>login wall</body></html>").await;
        let err = HttpFeedSource::new().unwrap().fetch_entries(&server.url("/feed.xml")).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        server.request().await;
    }

    #[tokio::test]
    async fn closed_port_is_transport_error() {
        let url = closed_port_url("/feed.xml").await;
        let err = HttpFeedSource::new().unwrap().fetch_entries(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn title_is_read_from_the_feed() {
        let server = OneShotServer::start(200, "OK", "application/rss+xml", RSS).await;
        let title = HttpFeedSource::new().unwrap().fetch_title(&server.url("/feed.xml")).await.unwrap();
        assert_eq!(title.as_deref(), Some("Some Channel"));
        server.request().await;
    }

    #[test]
    fn display_classifies() {
        assert_eq!(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR).to_string(), "unreachable: status 500 Internal Server Error");
        assert_eq!(FetchError::Timeout.to_string(), "unreachable: request timed out");
        assert!(FetchError::Timeout.is_unreachable());
        assert_eq!(FetchError::Malformed("eof".into()).to_string(), "malformed feed: eof");
    }
}

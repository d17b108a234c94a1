use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Serialize;

use crate::config::{FeederConfig, Quality};

pub const DEFAULT_FORMAT: &str = "mp4";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct MetubeClientConfig {
    pub add_endpoint: String,
    pub quality: Quality,
    pub format: String,
    pub timeout: Duration,
}

impl MetubeClientConfig {
    /// None when no MeTube URL is configured.
    pub fn from_config(cfg: &FeederConfig) -> Option<Self> {
        let add_endpoint = cfg.add_endpoint()?;
        Some(Self {
            add_endpoint,
            quality: cfg.quality,
            format: DEFAULT_FORMAT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// Body of `POST {base}/add`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AddRequest {
    pub url: String,
    pub quality: String,
    pub format: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Accepted {
    pub status: StatusCode,
}

#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, video_url: &str) -> Result<Accepted, SubmitError>;
}

#[derive(Clone)]
pub struct MetubeClient {
    http: HttpClient,
    cfg: MetubeClientConfig,
}

impl MetubeClient {
    pub fn new(cfg: MetubeClientConfig) -> Result<Self, SubmitError> {
        let http = HttpClient::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(SubmitError::from_reqwest)?;
        Ok(Self { http, cfg })
    }

    fn build_request(&self, video_url: &str) -> AddRequest {
        AddRequest {
            url: video_url.to_string(),
            quality: self.cfg.quality.as_str().to_string(),
            format: self.cfg.format.clone(),
        }
    }
}

#[async_trait]
impl Submitter for MetubeClient {
    async fn submit(&self, video_url: &str) -> Result<Accepted, SubmitError> {
        let body = self.build_request(video_url);
        let response = self
            .http
            .post(&self.cfg.add_endpoint)
            .json(&body)
            .send()
            .await
            .map_err(SubmitError::from_reqwest)?;

        let status = response.status();
        if is_accepted(status) {
            return Ok(Accepted { status });
        }
        // body is diagnostic only; a read failure must not mask the status
        let text = response.text().await.unwrap_or_default();
        Err(SubmitError::Rejected { status, body: excerpt(&text) })
    }
}

pub fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[derive(Debug)]
pub enum SubmitError {
    Http(reqwest::Error),
    Timeout,
    Rejected {
        status: StatusCode,
        body: String,
    },
}

impl SubmitError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() { SubmitError::Timeout } else { SubmitError::Http(err) }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, SubmitError::Http(_) | SubmitError::Timeout)
    }
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Http(err) => write!(f, "metube unreachable: {err}"),
            SubmitError::Timeout => write!(f, "metube unreachable: request timed out"),
            SubmitError::Rejected { status, body } => write!(f, "metube rejected {status}: {body}"),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Http(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
impl MetubeClient {
    pub(crate) fn build_request_for_tests(&self, video_url: &str) -> AddRequest {
        self.build_request(video_url)
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    /// Records every request; answers 201 unless a status is scripted for the URL.
    #[derive(Debug)]
    pub struct MockSubmitter {
        quality: Quality,
        scripted: Mutex<HashMap<String, VecDeque<StatusCode>>>,
        calls: Mutex<Vec<AddRequest>>,
    }

    impl MockSubmitter {
        pub fn new(quality: Quality) -> Self {
            Self { quality, scripted: Mutex::new(HashMap::new()), calls: Mutex::new(Vec::new()) }
        }

        pub fn push_status(&self, url: &str, status: StatusCode) {
            self.scripted.lock().unwrap().entry(url.to_string()).or_default().push_back(status);
        }

        pub fn calls(&self) -> Vec<AddRequest> { self.calls.lock().unwrap().clone() }

        pub fn submitted_urls(&self) -> Vec<String> {
            self.calls().into_iter().map(|r| r.url).collect()
        }
    }

    #[async_trait]
    impl Submitter for MockSubmitter {
        async fn submit(&self, video_url: &str) -> Result<Accepted, SubmitError> {
            self.calls.lock().unwrap().push(AddRequest {
                url: video_url.to_string(),
                quality: self.quality.as_str().to_string(),
                format: DEFAULT_FORMAT.to_string(),
            });
            let status = self
                .scripted
                .lock()
                .unwrap()
                .get_mut(video_url)
                .and_then(|q| q.pop_front())
                .unwrap_or(StatusCode::CREATED);
            if is_accepted(status) {
                Ok(Accepted { status })
            } else {
                Err(SubmitError::Rejected { status, body: "scripted".into() })
            }
        }
    }
}

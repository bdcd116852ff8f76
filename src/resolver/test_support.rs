// Scripted collaborators for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::encoder::{EncodeError, EncodeJob, Encoder};
use super::http::{HttpClient, HttpError, HttpResponse};

/// Answers GETs from a fixed route table and counts calls per URL.
/// Unknown URLs fail like an unreachable host.
#[derive(Default)]
pub struct StubHttp {
    routes: HashMap<String, HttpResponse>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, response: HttpResponse) -> Self {
        self.routes.insert(url.to_string(), response);
        self
    }

    pub fn with_redirect(self, url: &str, final_url: &str) -> Self {
        let response = HttpResponse {
            final_url: final_url.to_string(),
            status: 200,
            content_type: Some("text/html".to_string()),
            body: b"<html></html>".to_vec(),
        };
        self.with_response(url, response)
    }

    pub fn with_json(self, url: &str, body: serde_json::Value) -> Self {
        let response = HttpResponse {
            final_url: url.to_string(),
            status: 200,
            content_type: Some("application/json".to_string()),
            body: body.to_string().into_bytes(),
        };
        self.with_response(url, response)
    }

    pub fn with_bytes(self, url: &str, content_type: &str, body: &[u8]) -> Self {
        let response = HttpResponse {
            final_url: url.to_string(),
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
        };
        self.with_response(url, response)
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        let response = HttpResponse {
            final_url: url.to_string(),
            status,
            content_type: Some("text/plain".to_string()),
            body: b"error".to_vec(),
        };
        self.with_response(url, response)
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl HttpClient for StubHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        self.routes.get(url).cloned().ok_or_else(|| HttpError::Request {
            url: url.to_string(),
            message: "connection refused".to_string(),
        })
    }
}

/// Writes fixed bytes to the job output, or fails leaving a partial file
pub struct StubEncoder {
    output: Option<Vec<u8>>,
    delay: Option<Duration>,
    runs: AtomicUsize,
    last_job: Mutex<Option<EncodeJob>>,
}

impl StubEncoder {
    pub fn succeeding(output: &[u8]) -> Self {
        Self {
            output: Some(output.to_vec()),
            delay: None,
            runs: AtomicUsize::new(0),
            last_job: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            output: None,
            delay: None,
            runs: AtomicUsize::new(0),
            last_job: Mutex::new(None),
        }
    }

    /// Keep running this long after the output is written
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn last_job(&self) -> Option<EncodeJob> {
        self.last_job.lock().unwrap().clone()
    }
}

#[async_trait]
impl Encoder for StubEncoder {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn encode(&self, job: &EncodeJob) -> Result<(), EncodeError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        *self.last_job.lock().unwrap() = Some(job.clone());

        match &self.output {
            Some(bytes) => {
                tokio::fs::write(&job.output, bytes)
                    .await
                    .map_err(|e| EncodeError::Spawn(e.to_string()))?;
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(())
            }
            None => {
                // Leave a partial output behind, as a crashed encoder would
                let _ = tokio::fs::write(&job.output, b"partial").await;
                Err(EncodeError::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found when processing input".to_string(),
                })
            }
        }
    }
}

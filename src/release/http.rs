//! HTTP access for the verifier.
//!
//! Verification logic only talks to [`HttpProbe`], so tests can substitute
//! canned responses for the release API and the CDN.

use std::time::{Duration, Instant};

use anyhow::Result;
use log::debug;

use super::{VerifyError, VerifyResult};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Status and body of a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Trait for the network operations the verifier performs.
///
/// Implementations must be shareable across the check threads.
pub trait HttpProbe: Sync {
    /// Issue a HEAD request and return the response status.
    fn head(&self, url: &str) -> VerifyResult<u16>;

    /// Issue a GET request, optionally with a bearer token, and return status and body.
    fn get(&self, url: &str, bearer_token: Option<&str>) -> VerifyResult<HttpResponse>;
}

/// Real probe backed by a blocking reqwest client.
pub struct ReqwestProbe {
    client: reqwest::blocking::Client,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("release-verify/{}", env!("RELEASE_VERIFY_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

impl HttpProbe for ReqwestProbe {
    fn head(&self, url: &str) -> VerifyResult<u16> {
        let start = Instant::now();
        let response = self.client.head(url).send().map_err(|e| {
            debug!("HEAD {} failed after {:?}: {}", url, start.elapsed(), e);
            VerifyError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        debug!("HEAD {} -> {} in {:?}", url, status, start.elapsed());
        Ok(status)
    }

    fn get(&self, url: &str, bearer_token: Option<&str>) -> VerifyResult<HttpResponse> {
        let start = Instant::now();
        let mut request = self.client.get(url);
        if let Some(token) = bearer_token {
            request = request
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json");
        }

        let response = request.send().map_err(|e| {
            debug!("GET {} failed after {:?}: {}", url, start.elapsed(), e);
            VerifyError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| VerifyError::Transport(format!("failed to read body of {}: {}", url, e)))?;
        debug!(
            "GET {} -> {} ({} bytes) in {:?}",
            url,
            status,
            body.len(),
            start.elapsed()
        );

        Ok(HttpResponse { status, body })
    }
}

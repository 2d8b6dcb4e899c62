//! Reachability probes against parse endpoints.
use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::endpoints::Endpoint;
use crate::sync::RetryPolicy;

/// Result of a single probe. Failed probes report the configured timeout as
/// their latency so quick failures do not look fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub success: bool,
    pub latency: Duration,
}

impl ProbeOutcome {
    pub fn success(latency: Duration) -> Self {
        Self {
            success: true,
            latency,
        }
    }

    pub fn failure(timeout: Duration) -> Self {
        Self {
            success: false,
            latency: timeout,
        }
    }
}

/// A probe never errors: every failure path resolves to a failed outcome.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &Endpoint, test_url: &str) -> ProbeOutcome;
}

/// Probes with HTTP HEAD requests; only a 200 response counts as success.
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpProber {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vip-parser/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, timeout, retry))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            client,
            timeout,
            retry,
        }
    }

    async fn attempt(&self, target: &str) -> Result<Duration> {
        let started = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.client.head(target).send()).await;
        match response {
            Err(_) => bail!("timed out after {:?}", self.timeout),
            Ok(Err(e)) => bail!("request failed: {}", e),
            Ok(Ok(resp)) if resp.status() == StatusCode::OK => Ok(started.elapsed()),
            Ok(Ok(resp)) => bail!("unexpected status {}", resp.status()),
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &Endpoint, test_url: &str) -> ProbeOutcome {
        let target = endpoint.request_url(test_url);
        trace!("Probing {} at {}", endpoint.name, target);

        match self.retry.retry(|| self.attempt(&target)).await {
            Ok(latency) => {
                debug!("Probe of {} succeeded in {:?}", endpoint.name, latency);
                ProbeOutcome::success(latency)
            }
            Err(e) => {
                debug!("Probe of {} failed: {}", endpoint.name, e);
                ProbeOutcome::failure(self.timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves every connection with a fixed status line, then closes it.
    async fn serve_status(status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        status
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}/?url=", addr)
    }

    fn prober(timeout_ms: u64) -> HttpProber {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpProber::with_client(
            client,
            Duration::from_millis(timeout_ms),
            RetryPolicy::new(2, Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn test_ok_status_is_success() {
        let base = serve_status("200 OK").await;
        let endpoint = Endpoint::new("local", base);

        let outcome = prober(2000).probe(&endpoint, "https://v.qq.com/x").await;
        assert!(outcome.success);
        assert!(outcome.latency < Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_non_ok_status_is_failure_with_timeout_latency() {
        let base = serve_status("404 Not Found").await;
        let endpoint = Endpoint::new("local", base);

        let outcome = prober(1500).probe(&endpoint, "https://v.qq.com/x").await;
        assert_eq!(outcome, ProbeOutcome::failure(Duration::from_millis(1500)));
    }

    #[tokio::test]
    async fn test_silent_server_times_out_within_bound() {
        // Accepts connections and holds them open without replying.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let endpoint = Endpoint::new("silent", format!("http://{}/?url=", addr));

        let started = Instant::now();
        let outcome = prober(300).probe(&endpoint, "https://v.qq.com/x").await;

        assert_eq!(outcome, ProbeOutcome::failure(Duration::from_millis(300)));
        // Two attempts of 300ms plus a 10ms pause, with scheduling slack.
        assert!(started.elapsed() >= Duration::from_millis(600));
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = Endpoint::new("dead", format!("http://127.0.0.1:{}/?url=", port));

        let outcome = prober(1000).probe(&endpoint, "https://v.qq.com/x").await;
        assert!(!outcome.success);
        assert_eq!(outcome.latency, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_malformed_url_is_failure() {
        let endpoint = Endpoint::new("broken", "not a url ");
        let outcome = prober(500).probe(&endpoint, "").await;
        assert_eq!(outcome, ProbeOutcome::failure(Duration::from_millis(500)));
    }
}

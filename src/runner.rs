use chrono::Utc;
use futures::future::join_all;
use log::error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::probe::{ProbeResult, Prober};

/// How a batch dispatches its probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Execution {
    #[default]
    Concurrent,
    Sequential,
}

/// Fans a list of URLs out to probes and collects results in input order.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    prober: Prober,
    limit: Option<Arc<Semaphore>>,
}

impl BatchRunner {
    /// `max_concurrency` of `None` means one in-flight probe per URL.
    #[must_use]
    pub fn new(prober: Prober, max_concurrency: Option<usize>) -> Self {
        Self {
            prober,
            limit: max_concurrency.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    pub async fn run(&self, urls: &[String], execution: Execution) -> Vec<ProbeResult> {
        match execution {
            Execution::Concurrent => self.run_concurrent(urls).await,
            Execution::Sequential => self.run_sequential(urls).await,
        }
    }

    /// Spawns one task per URL and waits for all of them.
    /// `results[i]` always belongs to `urls[i]`, whatever the completion order.
    pub async fn run_concurrent(&self, urls: &[String]) -> Vec<ProbeResult> {
        let handles = urls.iter().map(|url| {
            let prober = self.prober.clone();
            let limit = self.limit.clone();
            let url = url.clone();
            tokio::spawn(async move {
                let _permit = match limit {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                prober.probe(&url).await
            })
        });

        join_all(handles)
            .await
            .into_iter()
            .zip(urls)
            .map(|(joined, url)| {
                joined.unwrap_or_else(|e| {
                    error!("Probe task for {url} failed: {e}");
                    aborted(url, &e.to_string())
                })
            })
            .collect()
    }

    pub async fn run_sequential(&self, urls: &[String]) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            results.push(self.prober.probe(url).await);
        }
        results
    }
}

fn aborted(url: &str, reason: &str) -> ProbeResult {
    ProbeResult {
        url: url.to_string(),
        status_code: None,
        response_time: Duration::ZERO,
        is_up: false,
        error: Some(format!("probe aborted: {reason}")),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeMethod;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn delayed(server: &MockServer, route: &str, status: u16, delay_ms: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(status).set_delay(Duration::from_millis(delay_ms)),
            )
            .mount(server)
            .await;
    }

    fn runner(max_concurrency: Option<usize>) -> BatchRunner {
        let prober = Prober::new(Duration::from_secs(5), ProbeMethod::Get).unwrap();
        BatchRunner::new(prober, max_concurrency)
    }

    #[tokio::test]
    async fn test_results_follow_input_order_not_completion_order() {
        let server = MockServer::start().await;
        delayed(&server, "/slow", 200, 400).await;
        delayed(&server, "/medium", 500, 200).await;
        delayed(&server, "/fast", 404, 0).await;

        let urls: Vec<String> = ["/slow", "/medium", "/fast"]
            .iter()
            .map(|p| format!("{}{p}", server.uri()))
            .collect();

        let results = runner(None).run(&urls, Execution::Concurrent).await;

        assert_eq!(results.len(), 3);
        for (result, url) in results.iter().zip(&urls) {
            assert_eq!(&result.url, url);
        }
        assert_eq!(results[0].status_code, Some(200));
        assert_eq!(results[1].status_code, Some(500));
        assert_eq!(results[2].status_code, Some(404));
    }

    #[tokio::test]
    async fn test_concurrent_probes_overlap() {
        let server = MockServer::start().await;
        delayed(&server, "/a", 200, 300).await;
        delayed(&server, "/b", 200, 300).await;
        delayed(&server, "/c", 200, 300).await;

        let urls: Vec<String> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| format!("{}{p}", server.uri()))
            .collect();

        let start = Instant::now();
        let results = runner(None).run(&urls, Execution::Concurrent).await;

        assert!(results.iter().all(|r| r.is_up));
        assert!(
            start.elapsed() < Duration::from_millis(850),
            "probes should not run back to back"
        );
    }

    #[tokio::test]
    async fn test_concurrency_cap_serializes_probes() {
        let server = MockServer::start().await;
        delayed(&server, "/a", 200, 150).await;
        delayed(&server, "/b", 200, 150).await;
        delayed(&server, "/c", 200, 150).await;

        let urls: Vec<String> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| format!("{}{p}", server.uri()))
            .collect();

        let start = Instant::now();
        let results = runner(Some(1)).run(&urls, Execution::Concurrent).await;

        assert!(start.elapsed() >= Duration::from_millis(450));
        for (result, url) in results.iter().zip(&urls) {
            assert_eq!(&result.url, url);
        }
    }

    #[tokio::test]
    async fn test_sequential_preserves_order() {
        let server = MockServer::start().await;
        delayed(&server, "/one", 200, 50).await;
        delayed(&server, "/two", 503, 0).await;

        let urls = vec![
            format!("{}/one", server.uri()),
            format!("{}/two", server.uri()),
        ];

        let results = runner(None).run(&urls, Execution::Sequential).await;

        assert_eq!(results[0].url, urls[0]);
        assert!(results[0].is_up);
        assert_eq!(results[1].url, urls[1]);
        assert!(!results[1].is_up);
    }

    #[tokio::test]
    async fn test_duplicate_urls_are_checked_independently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let urls = vec![server.uri(), server.uri()];
        let results = runner(None).run(&urls, Execution::Concurrent).await;

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = runner(None).run(&[], Execution::Concurrent).await;
        assert!(results.is_empty());
    }
}

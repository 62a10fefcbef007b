//! Mock HTTP client for testing.
//!
//! Responses are scripted per URL. Queued responses are consumed in order;
//! once a URL's queue is empty its sticky response (if any) is returned, then
//! the client-wide default.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::{HttpClient, HttpError, HttpRequest, Response};

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response
    Success(Response),
    /// Fail at the transport level
    Error(HttpError),
}

#[derive(Debug, Default)]
struct Route {
    queue: VecDeque<MockResponse>,
    sticky: Option<MockResponse>,
}

impl Route {
    fn next(&mut self) -> Option<MockResponse> {
        self.queue.pop_front().or_else(|| self.sticky.clone())
    }
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use sessionlink::adapters::mock::MockHttpClient;
/// use sessionlink::traits::{HttpError, Response};
///
/// let client = MockHttpClient::new();
/// client.push_error("https://api.example.com/data", HttpError::Timeout("30s".into()));
/// client.push_response("https://api.example.com/data", Response::json_body(200, &json!({})));
///
/// // First call times out, second succeeds.
/// assert_eq!(client.request_count("https://api.example.com/data"), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Scripted responses by URL (exact, then prefix match)
    routes: Arc<Mutex<HashMap<String, Route>>>,
    /// Response when no route matches
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    /// Simulated round-trip time
    latency: Arc<Mutex<Option<Duration>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn push_response(&self, url: &str, response: Response) {
        self.push(url, MockResponse::Success(response));
    }

    /// Queue a transport failure for `url`.
    pub fn push_error(&self, url: &str, error: HttpError) {
        self.push(url, MockResponse::Error(error));
    }

    /// Response returned for `url` whenever its queue is empty.
    pub fn set_response(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .sticky = Some(MockResponse::Success(response));
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests whose URL is exactly `url`.
    pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }

    /// Number of requests sent to exactly `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests_to(url).len()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn push(&self, url: &str, response: MockResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .queue
            .push_back(response);
    }

    fn next_response(&self, url: &str) -> Option<MockResponse> {
        let mut routes = self.routes.lock().unwrap();

        if let Some(response) = routes.get_mut(url).and_then(Route::next) {
            return Some(response);
        }

        // Longest prefix wins so "/users/1" beats "/users".
        let mut prefixes: Vec<&String> = routes
            .keys()
            .filter(|pattern| url.starts_with(pattern.as_str()) && pattern.as_str() != url)
            .collect();
        prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
        let prefixes: Vec<String> = prefixes.into_iter().cloned().collect();
        for prefix in prefixes {
            if let Some(response) = routes.get_mut(&prefix).and_then(Route::next) {
                return Some(response);
            }
        }

        self.default_response.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: &HttpRequest) -> Result<Response, HttpError> {
        self.requests.lock().unwrap().push(request.clone());

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match self.next_response(&request.url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!(
                "No mock response for URL: {}",
                request.url
            ))),
        }
    }
}

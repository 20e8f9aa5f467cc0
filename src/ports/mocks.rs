use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::http::{HttpMethod, HttpPort, HttpRequest, HttpResponse, TransportError};

#[derive(Debug, Clone)]
enum MockReply {
    Response { status: u16, body: String },
    Transport(TransportError),
}

/// Mock HTTP port that records requests and replays scripted responses.
///
/// Replies are keyed by method and URL (query excluded). Several replies for
/// the same route are served in order; the last one repeats once the queue
/// is down to a single entry. Unscripted routes fail with a connect error.
#[derive(Debug, Default, Clone)]
pub struct MockHttp {
    calls: Arc<Mutex<Vec<HttpRequest>>>,
    routes: Arc<Mutex<HashMap<(&'static str, String), VecDeque<MockReply>>>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, method: HttpMethod, url: &str, reply: MockReply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method.as_str(), url.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Script a JSON reply for `GET url`
    pub fn on_get_json(self, url: &str, status: u16, body: Value) -> Self {
        self.push(HttpMethod::Get, url, MockReply::Response { status, body: body.to_string() })
    }

    /// Script a raw text reply for `GET url`
    pub fn on_get_text(self, url: &str, status: u16, body: &str) -> Self {
        self.push(HttpMethod::Get, url, MockReply::Response { status, body: body.to_string() })
    }

    /// Script a JSON reply for `POST url`
    pub fn on_post_json(self, url: &str, status: u16, body: Value) -> Self {
        self.push(HttpMethod::Post, url, MockReply::Response { status, body: body.to_string() })
    }

    /// Script a raw text reply for `POST url`
    pub fn on_post_text(self, url: &str, status: u16, body: &str) -> Self {
        self.push(HttpMethod::Post, url, MockReply::Response { status, body: body.to_string() })
    }

    /// Script a transport failure for any method on `url`
    pub fn on_transport_error(self, method: HttpMethod, url: &str, error: TransportError) -> Self {
        self.push(method, url, MockReply::Transport(error))
    }

    /// All recorded requests, in send order
    pub fn get_calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded requests sent to `url`, in send order
    pub fn calls_to(&self, url: &str) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpPort for MockHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = (request.method.as_str(), request.url.clone());
        self.calls.lock().unwrap().push(request.clone());

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(MockReply::Response { status, body }) => Ok(HttpResponse {
                url: request.full_url(),
                status,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body,
            }),
            Some(MockReply::Transport(e)) => Err(e),
            None => Err(TransportError::Connect(format!(
                "no mock route for {} {}",
                key.0, key.1
            ))),
        }
    }
}

/// Captures formatted `tracing` output for the current thread.
///
/// Install with `LogCapture::install(level)` and keep the returned guard
/// alive for the duration of the test; events up to `level` are recorded
/// without ANSI colours.
#[derive(Debug, Default, Clone)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn install(level: tracing::Level) -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    /// Everything logged so far
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).to_string()
    }

    /// Logged lines at `level` ("ERROR", "WARN", "INFO", ...)
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        let tag = format!(" {} ", level);
        self.output()
            .lines()
            .filter(|l| l.contains(&tag))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_replays_in_order_then_repeats_last() {
        let mock = MockHttp::new()
            .on_post_json("http://local/add", 503, json!({"error": "busy"}))
            .on_post_json("http://local/add", 200, json!({"ok": true}));

        let first = mock.send(HttpRequest::post("http://local/add")).await.unwrap();
        let second = mock.send(HttpRequest::post("http://local/add")).await.unwrap();
        let third = mock.send(HttpRequest::post("http://local/add")).await.unwrap();

        assert_eq!(first.status, 503);
        assert_eq!(second.status, 200);
        assert_eq!(third.status, 200);
        assert_eq!(mock.get_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_unscripted_route_is_transport_error() {
        let mock = MockHttp::new();
        let result = mock.send(HttpRequest::get("http://nowhere/x")).await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
        assert_eq!(mock.calls_to("http://nowhere/x").len(), 1);
    }

    #[tokio::test]
    async fn test_mock_method_is_part_of_route() {
        let mock = MockHttp::new().on_get_text("http://svc/a", 200, "hello");

        assert!(mock.send(HttpRequest::get("http://svc/a")).await.is_ok());
        assert!(mock.send(HttpRequest::post("http://svc/a")).await.is_err());
    }
}

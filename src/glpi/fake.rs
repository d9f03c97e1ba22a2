use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::ExtractionError;
use crate::glpi::transport::{ApiRequest, ApiResponse, GlpiTransport};

/// Scripted transport for tests: responses are queued per path and
/// every request is recorded.
///
/// When a path has a single response left it keeps being returned;
/// unscripted paths answer `404`.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<ApiResponse, ExtractionError>>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: &str, response: Result<ApiResponse, ExtractionError>) -> &Self {
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn push_json(&self, path: &str, status: u16, body: serde_json::Value) -> &Self {
        self.push(path, Ok(ApiResponse::new(status, body.to_string())))
    }

    /// A successful `initSession` answer carrying `token`.
    pub fn with_session(self, token: &str) -> Self {
        self.push_json(
            "initSession",
            200,
            serde_json::json!({ "session_token": token }),
        );
        self.push_json("killSession", 200, serde_json::json!([]));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

impl GlpiTransport for FakeTransport {
    fn get(&self, request: &ApiRequest) -> Result<ApiResponse, ExtractionError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.get_mut(&request.path) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Ok(ApiResponse::new(404, "[]"))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(ApiResponse::new(404, "[]"))),
            None => Ok(ApiResponse::new(404, "[]")),
        }
    }
}

use std::time::Duration;

use crate::error::ExtractionError;

/// One GET call against the GLPI REST API. `path` is relative to the API root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(path: &str) -> Self {
        ApiRequest {
            path: path.to_string(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    /// 2xx, including 206 Partial Content returned for ranged pages.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking request/response seam between the extractor and the network.
pub trait GlpiTransport {
    fn get(&self, request: &ApiRequest) -> Result<ApiResponse, ExtractionError>;
}

/// Real transport on top of `reqwest::blocking`.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractionError::Transport(format!("cliente HTTP: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl GlpiTransport for HttpTransport {
    fn get(&self, request: &ApiRequest) -> Result<ApiResponse, ExtractionError> {
        let url = format!("{}/{}", self.base_url, request.path);

        let mut builder = self.client.get(&url).query(&request.query);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Timeout(request.path.clone())
            } else {
                ExtractionError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Timeout(request.path.clone())
            } else {
                ExtractionError::Transport(e.to_string())
            }
        })?;

        log::debug!("GET {} -> {}", request.path, status);
        Ok(ApiResponse { status, body })
    }
}

use serde::Deserialize;

use crate::config::mask_token;
use crate::error::ExtractionError;
use crate::glpi::transport::{ApiRequest, ApiResponse, GlpiTransport};

#[derive(Deserialize)]
struct InitSessionBody {
    session_token: Option<String>,
}

/// An authenticated GLPI session.
///
/// `killSession` is sent exactly once, either by [`GlpiSession::close`] or
/// when the value is dropped (early return, `?`, panic unwinding).
pub struct GlpiSession<'t, T: GlpiTransport + ?Sized> {
    transport: &'t T,
    app_token: String,
    session_token: String,
    closed: bool,
}

impl<'t, T: GlpiTransport + ?Sized> GlpiSession<'t, T> {
    pub fn open(transport: &'t T, app_token: &str, user_token: &str) -> Result<Self, ExtractionError> {
        let request = ApiRequest::new("initSession")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("user_token {}", user_token))
            .header("App-Token", app_token);

        let response = transport
            .get(&request)
            .map_err(|e| ExtractionError::SessionInit(e.to_string()))?;

        if !response.is_success() {
            return Err(ExtractionError::SessionInit(format!(
                "HTTP {}: {}",
                response.status,
                response.body.chars().take(200).collect::<String>()
            )));
        }

        let body: InitSessionBody = serde_json::from_str(&response.body)
            .map_err(|e| ExtractionError::SessionInit(format!("corpo inválido: {}", e)))?;
        let session_token = body
            .session_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExtractionError::SessionInit("session_token ausente".to_string()))?;

        log::info!("Sessão GLPI iniciada (token {})", mask_token(&session_token));

        Ok(GlpiSession {
            transport,
            app_token: app_token.to_string(),
            session_token,
            closed: false,
        })
    }

    fn authenticated(&self, path: &str) -> ApiRequest {
        ApiRequest::new(path)
            .header("Content-Type", "application/json")
            .header("Session-Token", self.session_token.as_str())
            .header("App-Token", self.app_token.as_str())
    }

    /// Raw GET with session headers; the caller decides what a status means.
    pub fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, ExtractionError> {
        let mut request = self.authenticated(path);
        for (key, value) in query {
            request = request.query(key, value.clone());
        }
        self.transport.get(&request)
    }

    /// GET one ranged page and decode it as a list of JSON rows.
    ///
    /// Non-2xx answers become [`ExtractionError::Status`].
    pub fn get_rows(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<serde_json::Value>, ExtractionError> {
        let response = self.get(path, query)?;
        if !response.is_success() {
            return Err(ExtractionError::Status {
                status: response.status,
                path: path.to_string(),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&response.body).map_err(|e| ExtractionError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        match value {
            serde_json::Value::Array(rows) => Ok(rows),
            other => Err(ExtractionError::Decode {
                path: path.to_string(),
                message: format!("esperava uma lista, recebeu {}", json_kind(&other)),
            }),
        }
    }

    pub fn close(mut self) {
        self.kill();
    }

    fn kill(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.get("killSession", &[]) {
            Ok(resp) if resp.is_success() => log::info!("Sessão GLPI encerrada"),
            Ok(resp) => log::warn!("Falha ao encerrar sessão GLPI: HTTP {}", resp.status),
            Err(e) => log::warn!("Falha ao encerrar sessão GLPI: {}", e),
        }
    }
}

impl<T: GlpiTransport + ?Sized> Drop for GlpiSession<'_, T> {
    fn drop(&mut self) {
        self.kill();
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "booleano",
        serde_json::Value::Number(_) => "número",
        serde_json::Value::String(_) => "texto",
        serde_json::Value::Array(_) => "lista",
        serde_json::Value::Object(_) => "objeto",
    }
}

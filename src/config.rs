use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const DEFAULT_RANGE_LIMIT: usize = 1000;
const DEFAULT_RELATION_RANGE_LIMIT: usize = 50_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OUTPUT_DIR: &str = "dados";

/// Prefix of the environment overrides (`GLPI_API_URL`, `GLPI_RANGE_LIMIT`, ...).
const ENV_PREFIX: &str = "GLPI";

/// Every layer as loose text, so a bad number falls back to its default
/// instead of failing the whole load.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    api_url: Option<String>,
    app_token: Option<String>,
    user_token: Option<String>,
    range_limit: Option<String>,
    relation_range_limit: Option<String>,
    request_timeout_secs: Option<String>,
    /// `GLPI_REQUEST_TIMEOUT`
    request_timeout: Option<String>,
    output_dir: Option<String>,
}

impl RawSettings {
    fn into_pairs(self) -> Vec<(&'static str, String)> {
        [
            ("api_url", self.api_url),
            ("app_token", self.app_token),
            ("user_token", self.user_token),
            ("range_limit", self.range_limit),
            ("relation_range_limit", self.relation_range_limit),
            ("request_timeout_secs", self.request_timeout.or(self.request_timeout_secs)),
            ("output_dir", self.output_dir),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_url: String,
    pub app_token: String,
    pub user_token: String,
    /// Page size for `range=start-end` requests.
    pub range_limit: usize,
    /// Upper bound of the single relation-table request.
    pub relation_range_limit: usize,
    pub request_timeout_secs: u64,
    pub output_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: String::new(),
            app_token: String::new(),
            user_token: String::new(),
            range_limit: DEFAULT_RANGE_LIMIT,
            relation_range_limit: DEFAULT_RELATION_RANGE_LIMIT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

impl AppConfig {
    /// Apply `key = value` pairs on top of the current values.
    /// Unknown keys are ignored; unparseable numbers fall back to the defaults.
    pub fn apply_pairs<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                "api_url" => self.api_url = value.trim_end_matches('/').to_string(),
                "app_token" => self.app_token = value.to_string(),
                "user_token" => self.user_token = value.to_string(),
                "range_limit" => {
                    self.range_limit = value
                        .parse()
                        .ok()
                        .filter(|&n| n > 0)
                        .unwrap_or(DEFAULT_RANGE_LIMIT)
                }
                "relation_range_limit" => {
                    self.relation_range_limit = value
                        .parse()
                        .ok()
                        .filter(|&n| n > 0)
                        .unwrap_or(DEFAULT_RELATION_RANGE_LIMIT)
                }
                "request_timeout_secs" => {
                    self.request_timeout_secs =
                        value.parse().unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                }
                "output_dir" => {
                    if !value.is_empty() {
                        self.output_dir = value.to_string();
                    }
                }
                _ => {}
            }
        }
    }

    /// Defaults, then the optional JSON file (flat object), then `GLPI_*`
    /// environment variables. Connection settings are not checked; offline
    /// analysis needs none.
    pub fn load_unvalidated(path: Option<&Path>) -> Result<AppConfig, AppError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path).format(::config::FileFormat::Json),
            );
        }
        let raw: RawSettings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        if let Some(path) = path {
            log::info!("Configuração carregada de {}", path.display());
        }
        let mut config = AppConfig::default();
        config.apply_pairs(raw.into_pairs());
        Ok(config)
    }

    /// [`AppConfig::load_unvalidated`] plus [`AppConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("api_url", self.api_url.is_empty()),
            ("app_token", self.app_token.is_empty()),
            ("user_token", self.user_token.is_empty()),
        ]
        .iter()
        .filter(|(_, empty)| *empty)
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "parâmetros ausentes: {}",
                missing.join(", ")
            )));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(AppError::Config(format!("api_url inválida: {}", self.api_url)));
        }
        Ok(())
    }
}

/// Shows only the first characters of a token, for log lines.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(6).collect();
    format!("{}…", visible)
}

use thiserror::Error;

/// Errors raised while talking to the GLPI REST API.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("Erro de transporte: {0}")]
    Transport(String),

    #[error("Tempo limite excedido em {0}")]
    Timeout(String),

    #[error("Resposta HTTP {status} em {path}")]
    Status { status: u16, path: String },

    #[error("Resposta inválida de {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Falha ao iniciar sessão: {0}")]
    SessionInit(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de entrada/saída: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Erro de serialização JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Erro de serialização YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Colunas obrigatórias ausentes: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Arquivo vazio ou sem dados")]
    EmptyFile,

    #[error("Configuração inválida: {0}")]
    Config(String),

    #[error("Erro ao ler configuração: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("Nenhum ticket encontrado no período {0}")]
    NoTicketsInWindow(String),

    #[error("Execução já em andamento (lock: {0})")]
    AlreadyRunning(String),

    #[error("{0}")]
    Custom(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = AppError::MissingColumns(vec!["ID".into(), "Status".into()]);
        assert_eq!(err.to_string(), "Colunas obrigatórias ausentes: ID, Status");
    }

    #[test]
    fn test_extraction_error_is_transparent() {
        let err: AppError = ExtractionError::SessionInit("401".into()).into();
        assert_eq!(err.to_string(), "Falha ao iniciar sessão: 401");
    }

    #[test]
    fn test_serialize_as_string() {
        let err = AppError::NoTicketsInWindow("01/01/2025 a 31/01/2025".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Nenhum ticket encontrado no período 01/01/2025 a 31/01/2025\"");
    }
}

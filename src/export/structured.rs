use crate::analyzer::MetricsModel;
use crate::error::AppError;

/// Pretty-printed JSON document of the whole model.
pub fn metrics_json(model: &MetricsModel) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(model)?)
}

pub fn metrics_yaml(model: &MetricsModel) -> Result<String, AppError> {
    Ok(serde_yaml::to_string(model)?)
}

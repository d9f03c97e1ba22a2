use serde::{Deserialize, Serialize};

use crate::parser::deserializers::de;

/// A ticket row as returned by `GET /Ticket`. Reference fields are still ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTicket {
    #[serde(deserialize_with = "de::id_string")]
    pub id: String,
    #[serde(default, rename = "name", deserialize_with = "de::lenient_string")]
    pub title: Option<String>,
    #[serde(default, rename = "content", deserialize_with = "de::lenient_string")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub priority: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub urgency: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub impact: Option<i64>,
    #[serde(default, rename = "itilcategories_id", deserialize_with = "de::lenient_string")]
    pub category_id: Option<String>,
    #[serde(default, rename = "entities_id", deserialize_with = "de::lenient_string")]
    pub entity_id: Option<String>,
    #[serde(default, rename = "locations_id", deserialize_with = "de::lenient_string")]
    pub location_id: Option<String>,
    #[serde(default, rename = "date", deserialize_with = "de::lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, rename = "date_mod", deserialize_with = "de::lenient_string")]
    pub updated_at: Option<String>,
    #[serde(default, rename = "solvedate", deserialize_with = "de::lenient_string")]
    pub solved_at: Option<String>,
    #[serde(default, rename = "closedate", deserialize_with = "de::lenient_string")]
    pub closed_at: Option<String>,
    #[serde(default, rename = "solve_delay_stat", deserialize_with = "de::lenient_i64")]
    pub solve_delay: Option<i64>,
}

/// Ticket after reference resolution and sanitation: the unit fed to the analyzer
/// and written as one row of the flat ticket table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTicket {
    pub id: String,
    pub titulo: String,
    pub entidade: String,
    pub status: String,
    pub ultima_atualizacao: String,
    pub data_abertura: String,
    pub requerente: String,
    pub tecnico_atribuido: String,
    pub grupo_tecnico: String,
    pub categoria: String,
    pub localizacao: String,
    pub descricao: String,
    /// Resolution (or closure) timestamp, canonical. Not part of the flat table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_solucao: Option<String>,
}

impl EnrichedTicket {
    pub fn is_resolved(&self) -> bool {
        is_resolved_status(&self.status)
    }
}

/// Labels of the resolved/closed set.
pub const STATUS_RESOLVIDOS: &[&str] = &["Solucionado", "Fechado"];

pub fn is_resolved_status(label: &str) -> bool {
    STATUS_RESOLVIDOS.contains(&label.trim())
}

/// GLPI status code → label.
pub fn status_label(code: Option<i64>) -> String {
    match code {
        Some(1) => "Novo".to_string(),
        Some(2) => "Em andamento (atribuído)".to_string(),
        Some(3) => "Em andamento (planejado)".to_string(),
        Some(4) => "Pendente".to_string(),
        Some(5) => "Solucionado".to_string(),
        Some(6) => "Fechado".to_string(),
        Some(other) => format!("Status {}", other),
        None => "Status desconhecido".to_string(),
    }
}

/// Which optional fields the input carried. Sub-metrics depending on an
/// absent field are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldAvailability {
    pub entidade: bool,
    pub categoria: bool,
    pub tecnico: bool,
    pub grupo: bool,
    pub localizacao: bool,
    pub ultima_atualizacao: bool,
}

impl FieldAvailability {
    pub fn all() -> Self {
        FieldAvailability {
            entidade: true,
            categoria: true,
            tecnico: true,
            grupo: true,
            localizacao: true,
            ultima_atualizacao: true,
        }
    }
}

impl Default for FieldAvailability {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

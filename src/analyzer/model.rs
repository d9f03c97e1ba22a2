//! The aggregate every serializer consumes. Built once per analysis run and
//! never mutated afterwards.

use serde::Serialize;

use super::backlog::BacklogAge;
use super::distribution::{Contagem, Distribuicao};
use super::integrity::IntegrityReport;
use super::sla::SlaMetrics;
use super::temporal::TemporalMetrics;
use super::ttr::TtrMetrics;
use crate::parser::types::FieldAvailability;

// ─── Data Structures ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsModel {
    pub metadata: Metadata,
    pub general: GeneralMetrics,
    pub temporal: TemporalMetrics,
    pub performance: PerformanceMetrics,
    /// None when no TTR end timestamp is available at all.
    pub ttr: Option<TtrMetrics>,
    /// None when the category or TTR input is missing.
    pub sla: Option<SlaMetrics>,
    pub backlog_age: BacklogAge,
    pub integrity: IntegrityReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub fonte: String,
    pub periodo: Option<String>,
    /// Analysis timestamp, `DD/MM/YYYY HH:MM:SS`.
    pub data_analise: String,
    pub total_registros: usize,
    pub campos_disponiveis: FieldAvailability,
    /// Sub-metrics left out because an input column was absent.
    pub submetricas_ignoradas: Vec<String>,
    pub calculo_duracao_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralMetrics {
    pub total_tickets: usize,
    pub resolvidos: Contagem,
    pub abertos: Contagem,
    pub status: Distribuicao,
    pub entidades: Option<Distribuicao>,
    pub grupos: Option<Distribuicao>,
    pub categorias: Option<Distribuicao>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    /// Leaderboard of assigned technicians; shares are of all tickets.
    pub tecnicos: Option<Distribuicao>,
    pub sem_tecnico: Option<Contagem>,
    /// Known locations; shares are of all tickets.
    pub localizacoes: Option<Distribuicao>,
    pub sem_localizacao: Option<Contagem>,
}

/// TTR and SLA compliance of one category, side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoriaTtrSla {
    pub categoria: String,
    pub nivel: String,
    pub limite_horas: f64,
    pub total: usize,
    pub media_horas: Option<f64>,
    pub mediana_horas: Option<f64>,
    pub percentual_sla: f64,
}

impl MetricsModel {
    /// SLA categories (volume order) joined with their TTR by category label.
    /// Empty when SLA was not computed.
    pub fn categoria_ttr_sla(&self) -> Vec<CategoriaTtrSla> {
        let Some(sla) = &self.sla else {
            return Vec::new();
        };
        let ttr = self
            .ttr
            .as_ref()
            .and_then(|t| t.por_categoria.as_deref())
            .unwrap_or(&[]);

        sla.por_categoria
            .iter()
            .map(|c| {
                let t = ttr.iter().find(|t| t.label.trim() == c.label.trim());
                CategoriaTtrSla {
                    categoria: c.label.clone(),
                    nivel: c.nivel.clone(),
                    limite_horas: c.limite_horas,
                    total: c.total,
                    media_horas: t.map(|t| t.media_horas),
                    mediana_horas: t.map(|t| t.mediana_horas),
                    percentual_sla: c.percentual_sla,
                }
            })
            .collect()
    }

    /// Copy without the wall-clock fields, for equality checks across runs.
    pub fn without_timing(&self) -> MetricsModel {
        let mut copy = self.clone();
        copy.metadata.data_analise = String::new();
        copy.metadata.calculo_duracao_ms = 0;
        copy
    }
}

use std::collections::HashMap;

use serde::Serialize;

use super::stats::{media, mediana, round2, ResumoEstatistico};
use crate::parser::deserializers::parse_any_datetime;
use crate::parser::types::EnrichedTicket;

/// Raw TTR in hours: resolution timestamp (else last update) minus creation.
/// None when either side is missing or unparseable. May be zero or negative.
pub fn ttr_horas(ticket: &EnrichedTicket) -> Option<f64> {
    let created = parse_any_datetime(&ticket.data_abertura)?;
    let end_raw = ticket
        .data_solucao
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&ticket.ultima_atualizacao);
    let end = parse_any_datetime(end_raw)?;
    Some((end - created).num_seconds() as f64 / 3600.0)
}

/// TTR that may enter statistics: strictly positive.
pub fn ttr_valido(ticket: &EnrichedTicket) -> Option<f64> {
    ttr_horas(ticket).filter(|h| *h > 0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtrPorDimensao {
    pub label: String,
    pub quantidade: usize,
    pub media_horas: f64,
    pub mediana_horas: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtrMetrics {
    pub total_resolvidos: usize,
    pub ttr_validos: usize,
    pub ttr_invalidos: usize,
    /// None when no resolved ticket has a valid TTR.
    pub estatisticas: Option<ResumoEstatistico>,
    pub por_categoria: Option<Vec<TtrPorDimensao>>,
    pub por_grupo: Option<Vec<TtrPorDimensao>>,
}

/// Mean/median per label, biggest groups first; ties by label.
pub fn agrupar(pares: &[(&str, f64)], top_n: Option<usize>) -> Vec<TtrPorDimensao> {
    let mut grupos: HashMap<&str, Vec<f64>> = HashMap::new();
    for (label, horas) in pares {
        grupos.entry(*label).or_default().push(*horas);
    }
    let mut out: Vec<TtrPorDimensao> = grupos
        .into_iter()
        .map(|(label, valores)| TtrPorDimensao {
            label: label.to_string(),
            quantidade: valores.len(),
            media_horas: round2(media(&valores)),
            mediana_horas: round2(mediana(&valores)),
        })
        .collect();
    out.sort_by(|a, b| {
        b.quantidade
            .cmp(&a.quantidade)
            .then_with(|| a.label.cmp(&b.label))
    });
    if let Some(n) = top_n {
        out.truncate(n);
    }
    out
}

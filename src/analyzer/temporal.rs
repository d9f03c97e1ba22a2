use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use super::stats::{pct, round2};

/// Weekday order of every report, Monday first.
pub const DIAS_SEMANA: [&str; 7] = [
    "Segunda", "Terça", "Quarta", "Quinta", "Sexta", "Sábado", "Domingo",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContagemPeriodo {
    pub periodo: String,
    pub quantidade: usize,
    pub percentual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalMetrics {
    /// `YYYY-MM`, ascending.
    pub por_mes: Vec<ContagemPeriodo>,
    /// Always seven entries in [`DIAS_SEMANA`] order.
    pub por_dia_semana: Vec<ContagemPeriodo>,
    pub datas_invalidas: usize,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    pub periodo_dias: Option<i64>,
    pub media_diaria: Option<f64>,
}

/// Bucket creation timestamps by month and by weekday. Percentages are of
/// `total` tickets, so unparseable dates lower every share.
pub fn build_temporal(created: &[Option<NaiveDateTime>], total: usize) -> TemporalMetrics {
    let mut por_mes: BTreeMap<String, usize> = BTreeMap::new();
    let mut por_dia = [0usize; 7];
    let mut invalidas = 0usize;
    let mut inicio: Option<NaiveDateTime> = None;
    let mut fim: Option<NaiveDateTime> = None;

    for dt in created {
        let Some(dt) = dt else {
            invalidas += 1;
            continue;
        };
        *por_mes.entry(dt.format("%Y-%m").to_string()).or_insert(0) += 1;
        por_dia[dt.weekday().num_days_from_monday() as usize] += 1;
        inicio = Some(inicio.map_or(*dt, |i| i.min(*dt)));
        fim = Some(fim.map_or(*dt, |f| f.max(*dt)));
    }

    let periodo_dias = match (inicio, fim) {
        (Some(i), Some(f)) => Some((f - i).num_days()),
        _ => None,
    };
    let validas = total - invalidas.min(total);
    let media_diaria = periodo_dias.map(|dias| {
        if dias > 0 {
            round2(validas as f64 / dias as f64)
        } else {
            validas as f64
        }
    });

    TemporalMetrics {
        por_mes: por_mes
            .into_iter()
            .map(|(periodo, quantidade)| ContagemPeriodo {
                periodo,
                quantidade,
                percentual: pct(quantidade, total),
            })
            .collect(),
        por_dia_semana: DIAS_SEMANA
            .iter()
            .zip(por_dia)
            .map(|(dia, quantidade)| ContagemPeriodo {
                periodo: dia.to_string(),
                quantidade,
                percentual: pct(quantidade, total),
            })
            .collect(),
        datas_invalidas: invalidas,
        data_inicio: inicio.map(|d| d.format("%d/%m/%Y").to_string()),
        data_fim: fim.map(|d| d.format("%d/%m/%Y").to_string()),
        periodo_dias,
        media_diaria,
    }
}

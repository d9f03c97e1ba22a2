//! Metrics aggregation: one pass over the enriched tickets per section.
use std::time::Instant;

use chrono::NaiveDateTime;

use super::backlog::build_backlog;
use super::distribution::{distribuicao, distribuicao_sobre, Contagem};
use super::integrity::{build_integrity, sem_categoria, sem_tecnico};
use super::model::{GeneralMetrics, Metadata, MetricsModel, PerformanceMetrics};
use super::sla::build_sla;
use super::stats::ResumoEstatistico;
use super::temporal::build_temporal;
use super::ttr::{agrupar, ttr_valido, TtrMetrics};
use crate::extractor::cache::SEM_LOCALIZACAO;
use crate::parser::deserializers::{parse_any_datetime, CANONICAL_DT_FMT};
use crate::parser::types::{EnrichedTicket, FieldAvailability};

pub const TOP_ENTIDADES: usize = 15;
pub const TOP_CATEGORIAS: usize = 15;
pub const TOP_TECNICOS: usize = 10;
pub const TOP_LOCALIZACOES: usize = 10;
pub const TOP_SLA_CATEGORIAS: usize = 10;
pub const TOP_TTR_CATEGORIAS: usize = 10;

/// Everything the aggregation needs besides the tickets.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub fonte: String,
    pub periodo: Option<String>,
    pub availability: FieldAvailability,
    /// Reference instant for the analysis timestamp and backlog ages.
    pub now: NaiveDateTime,
}

fn ignorar(ignoradas: &mut Vec<String>, submetrica: &str, coluna: &str) {
    log::warn!("Submétrica '{}' ignorada: coluna {} ausente", submetrica, coluna);
    ignoradas.push(submetrica.to_string());
}

/// Build the full metrics model. Apart from `ctx.now`-relative fields the
/// result depends only on the ticket collection.
pub fn build_metrics(tickets: &[EnrichedTicket], ctx: &AnalysisContext) -> MetricsModel {
    let start = Instant::now();
    let total = tickets.len();
    let av = ctx.availability;
    let mut ignoradas: Vec<String> = Vec::new();

    log::info!("Calculando métricas para {} tickets", total);

    // ── General ──────────────────────────────────────────────────────────────

    let resolvidos = tickets.iter().filter(|t| t.is_resolved()).count();
    let general = GeneralMetrics {
        total_tickets: total,
        resolvidos: Contagem::of(resolvidos, total),
        abertos: Contagem::of(total - resolvidos, total),
        status: distribuicao(tickets.iter().map(|t| t.status.as_str()), None),
        entidades: if av.entidade {
            Some(distribuicao(
                tickets.iter().map(|t| t.entidade.as_str()),
                Some(TOP_ENTIDADES),
            ))
        } else {
            ignorar(&mut ignoradas, "general.entidades", "Entidade");
            None
        },
        grupos: if av.grupo {
            Some(distribuicao(tickets.iter().map(|t| t.grupo_tecnico.as_str()), None))
        } else {
            ignorar(&mut ignoradas, "general.grupos", "Grupo_tecnico");
            None
        },
        categorias: if av.categoria {
            Some(distribuicao(
                tickets.iter().map(|t| t.categoria.as_str()),
                Some(TOP_CATEGORIAS),
            ))
        } else {
            ignorar(&mut ignoradas, "general.categorias", "Categoria");
            None
        },
    };

    // ── Temporal ─────────────────────────────────────────────────────────────

    let created: Vec<Option<NaiveDateTime>> = tickets
        .iter()
        .map(|t| parse_any_datetime(&t.data_abertura))
        .collect();
    let temporal = build_temporal(&created, total);

    // ── Performance ──────────────────────────────────────────────────────────

    let (tecnicos, sem_tecnico_count) = if av.tecnico {
        let sem = tickets.iter().filter(|t| sem_tecnico(t)).count();
        let board = distribuicao_sobre(
            tickets
                .iter()
                .filter(|t| !sem_tecnico(t))
                .map(|t| t.tecnico_atribuido.as_str()),
            Some(TOP_TECNICOS),
            total,
        );
        (Some(board), Some(Contagem::of(sem, total)))
    } else {
        ignorar(&mut ignoradas, "performance.tecnicos", "Tecnico_atribuido");
        (None, None)
    };

    let (localizacoes, sem_localizacao) = if av.localizacao {
        let sem_loc = |t: &&EnrichedTicket| {
            let l = t.localizacao.trim();
            l.is_empty() || l == SEM_LOCALIZACAO
        };
        let sem = tickets.iter().filter(sem_loc).count();
        let dist = distribuicao_sobre(
            tickets
                .iter()
                .filter(|t| !sem_loc(t))
                .map(|t| t.localizacao.as_str()),
            Some(TOP_LOCALIZACOES),
            total,
        );
        (Some(dist), Some(Contagem::of(sem, total)))
    } else {
        ignorar(&mut ignoradas, "performance.localizacoes", "Localizacao");
        (None, None)
    };

    let performance = PerformanceMetrics {
        tecnicos,
        sem_tecnico: sem_tecnico_count,
        localizacoes,
        sem_localizacao,
    };

    // ── TTR & SLA ────────────────────────────────────────────────────────────

    let has_end = av.ultima_atualizacao || tickets.iter().any(|t| t.data_solucao.is_some());
    let resolved: Vec<&EnrichedTicket> = tickets.iter().filter(|t| t.is_resolved()).collect();
    let validos: Vec<(&EnrichedTicket, f64)> = if has_end {
        resolved
            .iter()
            .filter_map(|t| ttr_valido(t).map(|h| (*t, h)))
            .collect()
    } else {
        Vec::new()
    };

    let ttr = if has_end {
        let horas: Vec<f64> = validos.iter().map(|(_, h)| *h).collect();
        let por_categoria = if av.categoria {
            let pares: Vec<(&str, f64)> = validos
                .iter()
                .filter(|(t, _)| !sem_categoria(t))
                .map(|(t, h)| (t.categoria.trim(), *h))
                .collect();
            Some(agrupar(&pares, Some(TOP_TTR_CATEGORIAS)))
        } else {
            ignorar(&mut ignoradas, "ttr.por_categoria", "Categoria");
            None
        };
        let por_grupo = if av.grupo {
            let pares: Vec<(&str, f64)> = validos
                .iter()
                .map(|(t, h)| (t.grupo_tecnico.trim(), *h))
                .collect();
            Some(agrupar(&pares, None))
        } else {
            ignorar(&mut ignoradas, "ttr.por_grupo", "Grupo_tecnico");
            None
        };
        Some(TtrMetrics {
            total_resolvidos: resolved.len(),
            ttr_validos: validos.len(),
            ttr_invalidos: resolved.len() - validos.len(),
            estatisticas: ResumoEstatistico::from_values(&horas),
            por_categoria,
            por_grupo,
        })
    } else {
        ignorar(&mut ignoradas, "ttr", "Ultima_atualizacao");
        None
    };

    let sla = if has_end && av.categoria {
        let amostras: Vec<(Option<&str>, f64)> = validos
            .iter()
            .map(|(t, h)| {
                let categoria = if sem_categoria(t) {
                    None
                } else {
                    Some(t.categoria.as_str())
                };
                (categoria, *h)
            })
            .collect();
        Some(build_sla(&amostras, TOP_SLA_CATEGORIAS))
    } else {
        let coluna = if has_end { "Categoria" } else { "Ultima_atualizacao" };
        ignorar(&mut ignoradas, "sla", coluna);
        None
    };

    // ── Backlog ──────────────────────────────────────────────────────────────

    let idades: Vec<Option<f64>> = tickets
        .iter()
        .zip(&created)
        .filter(|(t, _)| !t.is_resolved())
        .map(|(_, c)| c.map(|c| (ctx.now - c).num_seconds() as f64 / 3600.0))
        .collect();
    let backlog_age = build_backlog(&idades);

    // ── Integrity ────────────────────────────────────────────────────────────

    let integrity = build_integrity(tickets, validos.len());

    let metadata = Metadata {
        fonte: ctx.fonte.clone(),
        periodo: ctx.periodo.clone(),
        data_analise: ctx.now.format(CANONICAL_DT_FMT).to_string(),
        total_registros: total,
        campos_disponiveis: av,
        submetricas_ignoradas: ignoradas,
        calculo_duracao_ms: start.elapsed().as_millis() as u64,
    };

    log::info!(
        "Métricas calculadas: {} resolvidos, {} abertos, {} TTR válidos ({} ms)",
        integrity.total_resolvidos,
        integrity.tickets_abertos,
        integrity.ttr_validos,
        metadata.calculo_duracao_ms
    );

    MetricsModel {
        metadata,
        general,
        temporal,
        performance,
        ttr,
        sla,
        backlog_age,
        integrity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        parse_any_datetime("31/03/2025 12:00:00").unwrap()
    }

    fn ticket(
        id: &str,
        status: &str,
        abertura: &str,
        atualizacao: &str,
        categoria: &str,
        tecnico: &str,
    ) -> EnrichedTicket {
        EnrichedTicket {
            id: id.into(),
            titulo: format!("Ticket {}", id),
            entidade: "Sede".into(),
            status: status.into(),
            ultima_atualizacao: atualizacao.into(),
            data_abertura: abertura.into(),
            requerente: "Usuário 1".into(),
            tecnico_atribuido: tecnico.into(),
            grupo_tecnico: "N1".into(),
            categoria: categoria.into(),
            localizacao: "Sem Localização".into(),
            descricao: String::new(),
            data_solucao: None,
        }
    }

    fn sample() -> Vec<EnrichedTicket> {
        vec![
            ticket("1", "Fechado", "10/03/2025 08:00:00", "10/03/2025 09:00:00", "Reset de Senha", "Ana"),
            ticket("2", "Solucionado", "11/03/2025 08:00:00", "14/03/2025 08:00:00", "WIFI", "Ana"),
            ticket("3", "Fechado", "12/03/2025 08:00:00", "12/03/2025 08:00:00", "Hardware", "Bruno"),
            ticket("4", "Fechado", "13/03/2025 08:00:00", "15/03/2025 08:00:00", "Sem Categoria", "Bruno"),
            ticket("5", "Novo", "30/03/2025 12:00:00", "30/03/2025 12:00:00", "WIFI", "Não Atribuído"),
            ticket("6", "Pendente", "01/02/2025 12:00:00", "02/02/2025 12:00:00", "Categoria X", "Ana"),
        ]
    }

    fn ctx(availability: FieldAvailability) -> AnalysisContext {
        AnalysisContext {
            fonte: "teste".into(),
            periodo: Some("ultimo_mes".into()),
            availability,
            now: now(),
        }
    }

    #[test]
    fn test_build_metrics_sections() {
        let m = build_metrics(&sample(), &ctx(FieldAvailability::all()));

        assert_eq!(m.metadata.total_registros, 6);
        assert_eq!(m.metadata.data_analise, "31/03/2025 12:00:00");
        assert!(m.metadata.submetricas_ignoradas.is_empty());
        assert_eq!(m.general.resolvidos.quantidade, 4);
        assert_eq!(m.general.abertos.quantidade, 2);

        let ttr = m.ttr.as_ref().unwrap();
        assert_eq!(ttr.total_resolvidos, 4);
        assert_eq!(ttr.ttr_validos, 3);
        assert_eq!(ttr.ttr_invalidos, 1);
        let est = ttr.estatisticas.as_ref().unwrap();
        assert_eq!(est.minimo, 1.0);
        assert_eq!(est.maximo, 72.0);

        let sla = m.sla.as_ref().unwrap();
        assert_eq!(sla.total_analisado, 3);
        // Reset de Senha 1h <= 2h, WIFI 72h <= 72h, uncategorized 48h > 24h
        assert_eq!(sla.dentro_sla, 2);
        assert_eq!(sla.tickets_sem_categoria_excluidos, 1);
        assert_eq!(sla.por_categoria.len(), 2);

        let tecnicos = m.performance.tecnicos.as_ref().unwrap();
        assert_eq!(tecnicos.itens[0].label, "Ana");
        assert_eq!(tecnicos.itens[0].quantidade, 3);
        assert_eq!(tecnicos.itens[0].percentual, 50.0);
        assert_eq!(m.performance.sem_tecnico.as_ref().unwrap().quantidade, 1);
        assert_eq!(m.performance.sem_localizacao.as_ref().unwrap().quantidade, 6);

        assert_eq!(m.backlog_age.tickets_abertos, 2);
        let counts: Vec<usize> = m.backlog_age.faixas.iter().map(|f| f.quantidade).collect();
        assert_eq!(counts, vec![0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_category_ttr_joined_with_sla() {
        let m = build_metrics(&sample(), &ctx(FieldAvailability::all()));
        let linhas = m.categoria_ttr_sla();
        assert_eq!(linhas.len(), 2);

        let wifi = linhas.iter().find(|l| l.categoria == "WIFI").unwrap();
        assert_eq!(wifi.nivel, "BAIXA");
        assert_eq!(wifi.limite_horas, 72.0);
        assert_eq!(wifi.total, 1);
        assert_eq!(wifi.media_horas, Some(72.0));
        assert_eq!(wifi.percentual_sla, 100.0);

        let mut av = FieldAvailability::all();
        av.categoria = false;
        assert!(build_metrics(&sample(), &ctx(av)).categoria_ttr_sla().is_empty());
    }

    #[test]
    fn test_integrity_invariant_holds() {
        let m = build_metrics(&sample(), &ctx(FieldAvailability::all()));
        let i = &m.integrity;
        assert_eq!(i.total_tickets, i.total_resolvidos + i.tickets_abertos);
        assert_eq!(i.ttr_invalidos, 1);
        assert_eq!(i.tickets_sem_categoria, 1);
        assert_eq!(i.tickets_categoria_consolidado, 3);
    }

    #[test]
    fn test_weekday_section_has_seven_entries() {
        let m = build_metrics(&sample(), &ctx(FieldAvailability::all()));
        assert_eq!(m.temporal.por_dia_semana.len(), 7);
        assert_eq!(m.temporal.por_dia_semana[0].periodo, "Segunda");
        let months: Vec<&str> = m.temporal.por_mes.iter().map(|p| p.periodo.as_str()).collect();
        assert_eq!(months, vec!["2025-02", "2025-03"]);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let tickets = sample();
        let a = build_metrics(&tickets, &ctx(FieldAvailability::all()));
        let b = build_metrics(&tickets, &ctx(FieldAvailability::all()));
        assert_eq!(a.without_timing(), b.without_timing());

        let mut reversed = tickets.clone();
        reversed.reverse();
        let c = build_metrics(&reversed, &ctx(FieldAvailability::all()));
        assert_eq!(a.general, c.general);
        assert_eq!(a.sla, c.sla);
        assert_eq!(a.integrity, c.integrity);
    }

    #[test]
    fn test_missing_columns_skip_dependent_submetrics() {
        let mut av = FieldAvailability::all();
        av.categoria = false;
        av.tecnico = false;
        let m = build_metrics(&sample(), &ctx(av));

        assert!(m.general.categorias.is_none());
        assert!(m.performance.tecnicos.is_none());
        assert!(m.sla.is_none());
        assert!(m.ttr.as_ref().unwrap().por_categoria.is_none());
        assert!(m.ttr.as_ref().unwrap().estatisticas.is_some());
        assert!(m.general.entidades.is_some());
        assert_eq!(
            m.metadata.submetricas_ignoradas,
            vec!["general.categorias", "performance.tecnicos", "ttr.por_categoria", "sla"]
        );
    }

    #[test]
    fn test_no_end_timestamp_skips_ttr() {
        let mut av = FieldAvailability::all();
        av.ultima_atualizacao = false;
        let m = build_metrics(&sample(), &ctx(av));
        assert!(m.ttr.is_none());
        assert!(m.sla.is_none());
        assert_eq!(m.integrity.ttr_validos, 0);
    }

    #[test]
    fn test_empty_collection() {
        let m = build_metrics(&[], &ctx(FieldAvailability::all()));
        assert_eq!(m.general.total_tickets, 0);
        assert_eq!(m.general.resolvidos.percentual, 0.0);
        assert!(m.ttr.as_ref().unwrap().estatisticas.is_none());
        assert_eq!(m.sla.as_ref().unwrap().percentual_sla, 0.0);
    }
}

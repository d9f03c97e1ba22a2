use std::fmt::Write;

use crate::analyzer::distribution::Distribuicao;
use crate::analyzer::MetricsModel;

const LINHA: &str = "======================================================================";

fn secao(out: &mut String, titulo: &str) {
    let _ = writeln!(out, "\n{}\n{}\n{}", LINHA, titulo, LINHA);
}

fn lista(out: &mut String, titulo: &str, d: &Distribuicao) {
    let _ = writeln!(out, "\n{}:", titulo);
    for item in &d.itens {
        let _ = writeln!(
            out,
            "   • {}: {} ({:.1}%)",
            item.label, item.quantidade, item.percentual
        );
    }
    if let Some(r) = &d.restante {
        let _ = writeln!(out, "   • {}", r.descricao);
    }
}

/// Human-readable report of the model, section by section.
pub fn render_text_report(m: &MetricsModel) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "RELATÓRIO DE MÉTRICAS DE TICKETS");
    let _ = writeln!(out, "Fonte: {}", m.metadata.fonte);
    if let Some(periodo) = &m.metadata.periodo {
        let _ = writeln!(out, "Período: {}", periodo);
    }
    let _ = writeln!(out, "Data da análise: {}", m.metadata.data_analise);
    for ignorada in &m.metadata.submetricas_ignoradas {
        let _ = writeln!(out, "Aviso: submétrica {} não calculada (coluna ausente)", ignorada);
    }

    secao(&mut out, "MÉTRICAS GERAIS");
    let g = &m.general;
    let _ = writeln!(out, "Total de tickets: {}", g.total_tickets);
    let _ = writeln!(
        out,
        "Resolvidos: {} ({:.1}%) | Em aberto: {} ({:.1}%)",
        g.resolvidos.quantidade, g.resolvidos.percentual, g.abertos.quantidade, g.abertos.percentual
    );
    lista(&mut out, "Distribuição por status", &g.status);
    if let Some(d) = &g.entidades {
        lista(&mut out, "Distribuição por entidade", d);
    }
    if let Some(d) = &g.grupos {
        lista(&mut out, "Distribuição por grupo técnico", d);
    }
    if let Some(d) = &g.categorias {
        lista(&mut out, "Principais categorias", d);
    }

    secao(&mut out, "MÉTRICAS TEMPORAIS");
    let t = &m.temporal;
    if let (Some(inicio), Some(fim)) = (&t.data_inicio, &t.data_fim) {
        let _ = writeln!(out, "Período analisado: {} até {}", inicio, fim);
    }
    if let Some(media) = t.media_diaria {
        let _ = writeln!(out, "Média diária: {:.2} tickets", media);
    }
    if t.datas_invalidas > 0 {
        let _ = writeln!(out, "Datas de abertura inválidas: {}", t.datas_invalidas);
    }
    let _ = writeln!(out, "\nPor mês:");
    for p in &t.por_mes {
        let _ = writeln!(out, "   • {}: {} ({:.1}%)", p.periodo, p.quantidade, p.percentual);
    }
    let _ = writeln!(out, "\nPor dia da semana:");
    for p in &t.por_dia_semana {
        let _ = writeln!(out, "   • {}: {} ({:.1}%)", p.periodo, p.quantidade, p.percentual);
    }

    secao(&mut out, "MÉTRICAS DE PERFORMANCE");
    if let Some(d) = &m.performance.tecnicos {
        lista(&mut out, "Top técnicos por volume", d);
    }
    if let Some(sem) = &m.performance.sem_tecnico {
        let _ = writeln!(
            out,
            "Tickets sem técnico atribuído: {} ({:.1}%)",
            sem.quantidade, sem.percentual
        );
    }
    if let Some(d) = &m.performance.localizacoes {
        lista(&mut out, "Principais localizações", d);
    }

    secao(&mut out, "TEMPO DE RESOLUÇÃO (TTR)");
    match &m.ttr {
        Some(ttr) => {
            let _ = writeln!(
                out,
                "Resolvidos: {} | TTR válidos: {} | TTR inválidos: {}",
                ttr.total_resolvidos, ttr.ttr_validos, ttr.ttr_invalidos
            );
            if let Some(e) = &ttr.estatisticas {
                let _ = writeln!(
                    out,
                    "Média: {:.2}h | Mediana: {:.2}h | Mín: {:.2}h | Máx: {:.2}h",
                    e.media, e.mediana, e.minimo, e.maximo
                );
                let _ = writeln!(
                    out,
                    "P25: {:.2}h | P75: {:.2}h | P90: {:.2}h | P95: {:.2}h",
                    e.p25, e.p75, e.p90, e.p95
                );
            }
            if let Some(cats) = &ttr.por_categoria {
                let _ = writeln!(out, "\nTTR por categoria:");
                for c in cats {
                    let _ = writeln!(
                        out,
                        "   • {}: {} tickets, média {:.2}h, mediana {:.2}h",
                        c.label, c.quantidade, c.media_horas, c.mediana_horas
                    );
                }
            }
            if let Some(grupos) = &ttr.por_grupo {
                let _ = writeln!(out, "\nTTR por grupo:");
                for c in grupos {
                    let _ = writeln!(
                        out,
                        "   • {}: {} tickets, média {:.2}h, mediana {:.2}h",
                        c.label, c.quantidade, c.media_horas, c.mediana_horas
                    );
                }
            }
        }
        None => {
            let _ = writeln!(out, "Não calculado: datas de solução ausentes");
        }
    }

    secao(&mut out, "SLA POR COMPLEXIDADE");
    match &m.sla {
        Some(sla) => {
            let _ = writeln!(
                out,
                "Conformidade geral: {:.1}% ({} de {})",
                sla.percentual_sla, sla.dentro_sla, sla.total_analisado
            );
            for c in &sla.por_complexidade {
                let _ = writeln!(
                    out,
                    "   • {} (≤ {}h): {:.1}% ({}/{})",
                    c.label, c.limite_horas, c.percentual_sla, c.dentro_sla, c.total
                );
            }
            let _ = writeln!(out, "\nSLA por categoria:");
            for c in &sla.por_categoria {
                let _ = writeln!(
                    out,
                    "   • {} [{}]: {:.1}% ({}/{})",
                    c.label, c.nivel, c.percentual_sla, c.dentro_sla, c.total
                );
            }
        }
        None => {
            let _ = writeln!(out, "Não calculado: categoria ou datas ausentes");
        }
    }

    secao(&mut out, "IDADE DO BACKLOG");
    let b = &m.backlog_age;
    let _ = writeln!(out, "Tickets em aberto: {}", b.tickets_abertos);
    for f in &b.faixas {
        let _ = writeln!(out, "   • {}: {} ({:.1}%)", f.label, f.quantidade, f.percentual);
    }
    if let (Some(media), Some(mediana), Some(maxima)) =
        (b.idade_media_horas, b.idade_mediana_horas, b.idade_maxima_horas)
    {
        let _ = writeln!(
            out,
            "Idade média: {:.1}h | mediana: {:.1}h | máxima: {:.1}h",
            media, mediana, maxima
        );
    }

    secao(&mut out, "INTEGRIDADE DOS DADOS");
    let i = &m.integrity;
    let _ = writeln!(
        out,
        "Total: {} = Resolvidos {} + Em aberto {} ({})",
        i.total_tickets,
        i.total_resolvidos,
        i.tickets_abertos,
        if i.totais_conferem { "confere" } else { "NÃO confere" }
    );
    let _ = writeln!(
        out,
        "Sem categoria: {} | Sem técnico: {} | Sem grupo: {}",
        i.tickets_sem_categoria, i.tickets_sem_tecnico, i.tickets_sem_grupo
    );
    for e in &i.exclusoes {
        let _ = writeln!(out, "   • {}: {} ({:.1}%)", e.motivo, e.quantidade, e.percentual);
    }
    if i.alertas.is_empty() {
        let _ = writeln!(out, "\nNenhum alerta.");
    } else {
        let _ = writeln!(out, "\nAlertas:");
        for a in &i.alertas {
            let _ = writeln!(out, "   ⚠ {}", a);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{build_metrics, AnalysisContext};
    use crate::parser::deserializers::parse_any_datetime;
    use crate::parser::types::{EnrichedTicket, FieldAvailability};

    fn ticket(id: &str, status: &str) -> EnrichedTicket {
        EnrichedTicket {
            id: id.into(),
            titulo: String::new(),
            entidade: "Sede".into(),
            status: status.into(),
            ultima_atualizacao: "06/01/2025 12:00:00".into(),
            data_abertura: "06/01/2025 08:00:00".into(),
            requerente: String::new(),
            tecnico_atribuido: "Ana".into(),
            grupo_tecnico: "N1".into(),
            categoria: "".into(),
            localizacao: String::new(),
            descricao: String::new(),
            data_solucao: None,
        }
    }

    #[test]
    fn test_report_sections_and_alerts() {
        let tickets = vec![ticket("1", "Fechado"), ticket("2", "Novo")];
        let ctx = AnalysisContext {
            fonte: "tickets.csv".into(),
            periodo: Some("ultimo_mes".into()),
            availability: FieldAvailability::all(),
            now: parse_any_datetime("10/01/2025 00:00:00").unwrap(),
        };
        let report = render_text_report(&build_metrics(&tickets, &ctx));

        assert!(report.contains("Fonte: tickets.csv"));
        assert!(report.contains("MÉTRICAS GERAIS"));
        assert!(report.contains("   • Segunda: 2 (100.0%)"));
        assert!(report.contains("Total: 2 = Resolvidos 1 + Em aberto 1 (confere)"));
        assert!(report.contains("Alto percentual de tickets sem categoria (100.0%)"));
        assert!(report.contains("Alto percentual de tickets em aberto (50.0%)"));
    }
}

//! Reconciliation of totals and transparency about what every metric left out.

use serde::Serialize;

use super::stats::pct;
use crate::extractor::cache::SEM_CATEGORIA;
use crate::extractor::relations::{NAO_ATRIBUIDO, SEM_GRUPO};
use crate::parser::types::EnrichedTicket;

/// Alert thresholds, in percent of all tickets.
pub const LIMITE_SEM_CATEGORIA: f64 = 10.0;
pub const LIMITE_TTR_INVALIDO: f64 = 5.0;
pub const LIMITE_ABERTOS: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusao {
    pub motivo: String,
    pub quantidade: usize,
    pub percentual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub total_tickets: usize,
    pub total_resolvidos: usize,
    pub tickets_abertos: usize,
    pub tickets_sem_categoria: usize,
    pub tickets_sem_tecnico: usize,
    pub tickets_sem_grupo: usize,
    pub ttr_validos: usize,
    pub ttr_invalidos: usize,
    /// Resolved tickets that carry a category.
    pub tickets_categoria_consolidado: usize,
    /// Resolved tickets that entered the complexity breakdown.
    pub tickets_complexidade_consolidado: usize,
    pub totais_conferem: bool,
    pub exclusoes: Vec<Exclusao>,
    pub alertas: Vec<String>,
}

fn ausente(valor: &str, sentinela: &str) -> bool {
    let v = valor.trim();
    v.is_empty() || v == sentinela
}

pub fn sem_categoria(t: &EnrichedTicket) -> bool {
    ausente(&t.categoria, SEM_CATEGORIA)
}

pub fn sem_tecnico(t: &EnrichedTicket) -> bool {
    ausente(&t.tecnico_atribuido, NAO_ATRIBUIDO)
}

pub fn sem_grupo(t: &EnrichedTicket) -> bool {
    ausente(&t.grupo_tecnico, SEM_GRUPO)
}

/// `ttr_validos` comes from the TTR pass so both reports agree.
pub fn build_integrity(tickets: &[EnrichedTicket], ttr_validos: usize) -> IntegrityReport {
    let total = tickets.len();
    let resolvidos: Vec<&EnrichedTicket> = tickets.iter().filter(|t| t.is_resolved()).collect();
    let total_resolvidos = resolvidos.len();
    let abertos = total - total_resolvidos;

    let tickets_sem_categoria = tickets.iter().filter(|t| sem_categoria(t)).count();
    let tickets_sem_tecnico = tickets.iter().filter(|t| sem_tecnico(t)).count();
    let tickets_sem_grupo = tickets.iter().filter(|t| sem_grupo(t)).count();
    let resolvidos_sem_categoria = resolvidos.iter().filter(|t| sem_categoria(t)).count();
    let ttr_invalidos = total_resolvidos - ttr_validos.min(total_resolvidos);

    let exclusoes = vec![
        Exclusao {
            motivo: "Tickets em aberto excluídos do TTR".to_string(),
            quantidade: abertos,
            percentual: pct(abertos, total),
        },
        Exclusao {
            motivo: "TTR inválido (não positivo ou sem data) excluído das estatísticas".to_string(),
            quantidade: ttr_invalidos,
            percentual: pct(ttr_invalidos, total),
        },
        Exclusao {
            motivo: "Tickets resolvidos sem categoria excluídos do SLA por categoria".to_string(),
            quantidade: resolvidos_sem_categoria,
            percentual: pct(resolvidos_sem_categoria, total),
        },
        Exclusao {
            motivo: "Tickets resolvidos fora da análise de backlog".to_string(),
            quantidade: total_resolvidos,
            percentual: pct(total_resolvidos, total),
        },
    ];

    let mut alertas = Vec::new();
    let pct_sem_categoria = pct(tickets_sem_categoria, total);
    if pct_sem_categoria > LIMITE_SEM_CATEGORIA {
        alertas.push(format!(
            "Alto percentual de tickets sem categoria ({:.1}%)",
            pct_sem_categoria
        ));
    }
    let pct_ttr_invalido = pct(ttr_invalidos, total);
    if pct_ttr_invalido > LIMITE_TTR_INVALIDO {
        alertas.push(format!(
            "Alto percentual de TTR inválidos ({:.1}%)",
            pct_ttr_invalido
        ));
    }
    let pct_abertos = pct(abertos, total);
    if pct_abertos > LIMITE_ABERTOS {
        alertas.push(format!(
            "Alto percentual de tickets em aberto ({:.1}%)",
            pct_abertos
        ));
    }
    for alerta in &alertas {
        log::warn!("{}", alerta);
    }

    IntegrityReport {
        total_tickets: total,
        total_resolvidos,
        tickets_abertos: abertos,
        tickets_sem_categoria,
        tickets_sem_tecnico,
        tickets_sem_grupo,
        ttr_validos,
        ttr_invalidos,
        tickets_categoria_consolidado: total_resolvidos - resolvidos_sem_categoria,
        tickets_complexidade_consolidado: ttr_validos,
        totais_conferem: total == total_resolvidos + abertos,
        exclusoes,
        alertas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(status: &str, categoria: &str, tecnico: &str, grupo: &str) -> EnrichedTicket {
        EnrichedTicket {
            id: "1".into(),
            titulo: String::new(),
            entidade: String::new(),
            status: status.into(),
            ultima_atualizacao: String::new(),
            data_abertura: String::new(),
            requerente: String::new(),
            tecnico_atribuido: tecnico.into(),
            grupo_tecnico: grupo.into(),
            categoria: categoria.into(),
            localizacao: String::new(),
            descricao: String::new(),
            data_solucao: None,
        }
    }

    #[test]
    fn test_sentinels_count_as_missing() {
        let t = ticket("Novo", "Sem Categoria", "Não Atribuído", "");
        assert!(sem_categoria(&t));
        assert!(sem_tecnico(&t));
        assert!(sem_grupo(&t));
        let t = ticket("Novo", "WIFI", "Ana", "N1");
        assert!(!sem_categoria(&t) && !sem_tecnico(&t) && !sem_grupo(&t));
    }

    #[test]
    fn test_reconciliation_and_alerts() {
        let tickets = vec![
            ticket("Fechado", "WIFI", "Ana", "N1"),
            ticket("Solucionado", "Sem Categoria", "Ana", "N1"),
            ticket("Fechado", "Hardware", "Não Atribuído", "Sem Grupo"),
            ticket("Novo", "WIFI", "Ana", "N1"),
            ticket("Pendente", "", "Ana", "N1"),
        ];
        let r = build_integrity(&tickets, 2);

        assert_eq!(r.total_tickets, 5);
        assert_eq!(r.total_resolvidos, 3);
        assert_eq!(r.tickets_abertos, 2);
        assert_eq!(r.total_tickets, r.total_resolvidos + r.tickets_abertos);
        assert!(r.totais_conferem);
        assert_eq!(r.tickets_sem_categoria, 2);
        assert_eq!(r.tickets_sem_tecnico, 1);
        assert_eq!(r.tickets_sem_grupo, 1);
        assert_eq!(r.ttr_invalidos, 1);
        assert_eq!(r.tickets_categoria_consolidado, 2);
        assert_eq!(r.tickets_complexidade_consolidado, 2);

        assert_eq!(r.alertas.len(), 3);
        assert_eq!(r.alertas[0], "Alto percentual de tickets sem categoria (40.0%)");
        assert_eq!(r.alertas[1], "Alto percentual de TTR inválidos (20.0%)");
        assert_eq!(r.alertas[2], "Alto percentual de tickets em aberto (40.0%)");
        assert_eq!(r.exclusoes[0].quantidade, 2);
    }

    #[test]
    fn test_no_alerts_when_clean() {
        let tickets: Vec<EnrichedTicket> =
            (0..10).map(|_| ticket("Fechado", "WIFI", "Ana", "N1")).collect();
        let r = build_integrity(&tickets, 10);
        assert!(r.alertas.is_empty());
        assert_eq!(r.ttr_invalidos, 0);
    }

    #[test]
    fn test_empty_input() {
        let r = build_integrity(&[], 0);
        assert_eq!(r.total_tickets, 0);
        assert!(r.totais_conferem);
        assert!(r.alertas.is_empty());
        assert!(r.exclusoes.iter().all(|e| e.percentual == 0.0));
    }
}

//! Category → complexity tier lookup and SLA compliance.

use std::collections::HashMap;

use serde::Serialize;

use super::stats::pct;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NivelSla {
    pub nome: &'static str,
    pub horas: f64,
    pub categorias: &'static [&'static str],
}

pub const NIVEIS: [NivelSla; 5] = [
    NivelSla {
        nome: "CRÍTICA",
        horas: 2.0,
        categorias: &["RESET DE SENHA", "LIBERAÇÃO DE ACESSO"],
    },
    NivelSla {
        nome: "ALTA",
        horas: 8.0,
        categorias: &["ATENDIMENTO AO USUÁRIO", "NOVO USUÁRIO", "OFFICE 365"],
    },
    NivelSla {
        nome: "MÉDIA",
        horas: 24.0,
        categorias: &["OUTROS", "IMPRESSORA", "HARDWARE"],
    },
    NivelSla {
        nome: "BAIXA",
        horas: 72.0,
        categorias: &["INSTALAÇÃO", "NOVO PONTO DE REDE", "WIFI"],
    },
    NivelSla {
        nome: "COMPLEXA",
        horas: 120.0,
        categorias: &["ACESSO A SISTEMAS", "DEVOLUÇÃO", "SOLICITAÇÃO"],
    },
];

const NIVEL_PADRAO: usize = 2;

/// Tier of a category. Unknown or blank categories fall back to MÉDIA.
pub fn nivel_da_categoria(categoria: &str) -> &'static NivelSla {
    let chave = categoria.trim().to_uppercase();
    NIVEIS
        .iter()
        .find(|n| n.categorias.contains(&chave.as_str()))
        .unwrap_or(&NIVEIS[NIVEL_PADRAO])
}

pub fn dentro_do_sla(ttr_horas: f64, nivel: &NivelSla) -> bool {
    ttr_horas <= nivel.horas
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConformidadeSla {
    pub label: String,
    /// Tier name; for tiers themselves this repeats the label.
    pub nivel: String,
    pub limite_horas: f64,
    pub total: usize,
    pub dentro_sla: usize,
    pub fora_sla: usize,
    pub percentual_sla: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaMetrics {
    pub total_analisado: usize,
    pub dentro_sla: usize,
    pub fora_sla: usize,
    pub percentual_sla: f64,
    /// All five tiers, in table order, including empty ones.
    pub por_complexidade: Vec<ConformidadeSla>,
    pub por_categoria: Vec<ConformidadeSla>,
    pub tickets_sem_categoria_excluidos: usize,
}

#[derive(Default)]
struct Acumulador {
    total: usize,
    dentro: usize,
}

impl Acumulador {
    fn add(&mut self, ok: bool) {
        self.total += 1;
        if ok {
            self.dentro += 1;
        }
    }

    fn into_conformidade(self, label: String, nivel: &NivelSla) -> ConformidadeSla {
        ConformidadeSla {
            label,
            nivel: nivel.nome.to_string(),
            limite_horas: nivel.horas,
            total: self.total,
            dentro_sla: self.dentro,
            fora_sla: self.total - self.dentro,
            percentual_sla: pct(self.dentro, self.total),
        }
    }
}

/// Compliance over `(categoria, ttr_horas)` pairs of resolved tickets with a
/// valid TTR. `categoria` is None for uncategorized tickets: they count under
/// the default tier but not in the per-category table.
pub fn build_sla(amostras: &[(Option<&str>, f64)], top_n: usize) -> SlaMetrics {
    let mut por_nivel: Vec<Acumulador> = NIVEIS.iter().map(|_| Acumulador::default()).collect();
    let mut por_categoria: HashMap<&str, Acumulador> = HashMap::new();
    let mut sem_categoria = 0usize;
    let mut dentro_total = 0usize;

    for (categoria, horas) in amostras {
        let nivel = nivel_da_categoria(categoria.unwrap_or(""));
        let ok = dentro_do_sla(*horas, nivel);
        if ok {
            dentro_total += 1;
        }
        if let Some(idx) = NIVEIS.iter().position(|n| n.nome == nivel.nome) {
            por_nivel[idx].add(ok);
        }
        match categoria {
            Some(c) => por_categoria.entry(c.trim()).or_default().add(ok),
            None => sem_categoria += 1,
        }
    }

    let por_complexidade = NIVEIS
        .iter()
        .zip(por_nivel)
        .map(|(nivel, acc)| acc.into_conformidade(nivel.nome.to_string(), nivel))
        .collect();

    let mut categorias: Vec<ConformidadeSla> = por_categoria
        .into_iter()
        .map(|(c, acc)| acc.into_conformidade(c.to_string(), nivel_da_categoria(c)))
        .collect();
    categorias.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
    categorias.truncate(top_n);

    let total = amostras.len();
    SlaMetrics {
        total_analisado: total,
        dentro_sla: dentro_total,
        fora_sla: total - dentro_total,
        percentual_sla: pct(dentro_total, total),
        por_complexidade,
        por_categoria: categorias,
        tickets_sem_categoria_excluidos: sem_categoria,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories() {
        assert_eq!(nivel_da_categoria("Reset de Senha").nome, "CRÍTICA");
        assert_eq!(nivel_da_categoria("  wifi ").nome, "BAIXA");
        assert_eq!(nivel_da_categoria("Acesso a Sistemas").nome, "COMPLEXA");
        assert_eq!(nivel_da_categoria("liberação de acesso").horas, 2.0);
    }

    #[test]
    fn test_unknown_category_defaults_to_media() {
        let nivel = nivel_da_categoria("Categoria Inexistente");
        assert_eq!(nivel.nome, "MÉDIA");
        assert_eq!(nivel.horas, 24.0);
        assert_eq!(nivel_da_categoria("").nome, "MÉDIA");
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let critica = &NIVEIS[0];
        assert!(dentro_do_sla(2.0, critica));
        assert!(!dentro_do_sla(2.01, critica));
    }

    #[test]
    fn test_build_sla() {
        let amostras = [
            (Some("WIFI"), 10.0),          // BAIXA 72h: ok
            (Some("WIFI"), 100.0),         // BAIXA: late
            (Some("Reset de Senha"), 1.0), // CRÍTICA: ok
            (None, 30.0),                  // MÉDIA 24h: late
        ];
        let sla = build_sla(&amostras, 10);

        assert_eq!(sla.total_analisado, 4);
        assert_eq!(sla.dentro_sla, 2);
        assert_eq!(sla.fora_sla, 2);
        assert_eq!(sla.percentual_sla, 50.0);
        assert_eq!(sla.tickets_sem_categoria_excluidos, 1);

        let nomes: Vec<&str> = sla.por_complexidade.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(nomes, vec!["CRÍTICA", "ALTA", "MÉDIA", "BAIXA", "COMPLEXA"]);
        assert_eq!(sla.por_complexidade[1].total, 0);
        assert_eq!(sla.por_complexidade[1].percentual_sla, 0.0);
        assert_eq!(sla.por_complexidade[2].total, 1);
        assert_eq!(sla.por_complexidade[3].dentro_sla, 1);

        assert_eq!(sla.por_categoria.len(), 2);
        assert_eq!(sla.por_categoria[0].label, "WIFI");
        assert_eq!(sla.por_categoria[0].nivel, "BAIXA");
        assert_eq!(sla.por_categoria[0].percentual_sla, 50.0);
    }

    #[test]
    fn test_percentages_bounded() {
        let amostras: Vec<(Option<&str>, f64)> = (0..50)
            .map(|i| (Some(if i % 3 == 0 { "Hardware" } else { "Outros" }), i as f64))
            .collect();
        let sla = build_sla(&amostras, 10);
        for c in sla.por_complexidade.iter().chain(sla.por_categoria.iter()) {
            assert!(c.dentro_sla <= c.total);
            assert!((0.0..=100.0).contains(&c.percentual_sla));
        }
    }
}

use std::collections::HashMap;

use serde::Serialize;

use super::stats::pct;

/// Label used when a categorical value is blank.
pub const NAO_INFORMADO: &str = "Não informado";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDistribuicao {
    pub label: String,
    pub quantidade: usize,
    pub percentual: f64,
}

/// What a top-N cut left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restante {
    pub entradas: usize,
    pub tickets: usize,
    pub percentual: f64,
    pub descricao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribuicao {
    pub total: usize,
    pub distintos: usize,
    pub itens: Vec<ItemDistribuicao>,
    pub restante: Option<Restante>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contagem {
    pub quantidade: usize,
    pub percentual: f64,
}

impl Contagem {
    pub fn of(quantidade: usize, total: usize) -> Self {
        Contagem {
            quantidade,
            percentual: pct(quantidade, total),
        }
    }
}

/// Count values, most frequent first; ties by label.
pub fn contar<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        let label = match v.trim() {
            "" => NAO_INFORMADO,
            s => s,
        };
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

/// Group-count with percentages of the total. With `top_n`, entries past the
/// cut are folded into [`Restante`] instead of being dropped.
pub fn distribuicao<'a, I>(values: I, top_n: Option<usize>) -> Distribuicao
where
    I: IntoIterator<Item = &'a str>,
{
    let counts = contar(values);
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    montar(counts, top_n, total)
}

/// Same as [`distribuicao`] but percentages are taken over `base` tickets,
/// for leaderboards that leave some tickets out (e.g. unassigned ones).
pub fn distribuicao_sobre<'a, I>(values: I, top_n: Option<usize>, base: usize) -> Distribuicao
where
    I: IntoIterator<Item = &'a str>,
{
    montar(contar(values), top_n, base)
}

fn montar(counts: Vec<(String, usize)>, top_n: Option<usize>, total: usize) -> Distribuicao {
    let distintos = counts.len();
    let cut = top_n.unwrap_or(distintos).min(distintos);

    let itens = counts[..cut]
        .iter()
        .map(|(label, quantidade)| ItemDistribuicao {
            label: label.clone(),
            quantidade: *quantidade,
            percentual: pct(*quantidade, total),
        })
        .collect();

    let restante = if cut < distintos {
        let entradas = distintos - cut;
        let tickets: usize = counts[cut..].iter().map(|(_, c)| c).sum();
        Some(Restante {
            entradas,
            tickets,
            percentual: pct(tickets, total),
            descricao: format!("... e mais {} entradas ({} tickets)", entradas, tickets),
        })
    } else {
        None
    };

    Distribuicao {
        total,
        distintos,
        itens,
        restante,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contar_orders_by_count_then_label() {
        let counts = contar(["b", "a", "b", "c", "a", "d"]);
        assert_eq!(
            counts,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 2),
                ("c".to_string(), 1),
                ("d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_blank_values_are_labelled() {
        let counts = contar(["", "  ", "x"]);
        assert_eq!(counts[0], (NAO_INFORMADO.to_string(), 2));
    }

    #[test]
    fn test_distribuicao_without_cut() {
        let d = distribuicao(["Novo", "Fechado", "Fechado", "Fechado"], None);
        assert_eq!(d.total, 4);
        assert_eq!(d.distintos, 2);
        assert_eq!(d.itens[0].label, "Fechado");
        assert_eq!(d.itens[0].percentual, 75.0);
        assert!(d.restante.is_none());
    }

    #[test]
    fn test_distribuicao_remainder_line() {
        let values = ["a", "a", "a", "b", "b", "c", "d", "e"];
        let d = distribuicao(values, Some(2));
        assert_eq!(d.itens.len(), 2);
        let r = d.restante.unwrap();
        assert_eq!(r.entradas, 3);
        assert_eq!(r.tickets, 3);
        assert_eq!(r.percentual, 37.5);
        assert_eq!(r.descricao, "... e mais 3 entradas (3 tickets)");

        let shown: usize = d.itens.iter().map(|i| i.quantidade).sum();
        assert_eq!(shown + r.tickets, d.total);
    }

    #[test]
    fn test_distribuicao_sobre_base() {
        let d = distribuicao_sobre(["Ana", "Ana", "Bruno"], Some(10), 6);
        assert_eq!(d.total, 6);
        assert_eq!(d.itens[0].percentual, 33.33);
        assert_eq!(d.itens[1].percentual, 16.67);
    }

    #[test]
    fn test_distribuicao_cut_larger_than_distinct() {
        let d = distribuicao(["a", "b"], Some(15));
        assert_eq!(d.itens.len(), 2);
        assert!(d.restante.is_none());
    }

    #[test]
    fn test_distribuicao_empty() {
        let d = distribuicao(std::iter::empty::<&str>(), Some(10));
        assert_eq!(d.total, 0);
        assert!(d.itens.is_empty());
        assert!(d.restante.is_none());
    }
}

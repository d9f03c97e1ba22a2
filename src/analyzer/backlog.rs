use serde::Serialize;

use super::stats::{media, mediana, pct, round2};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaixaIdade {
    pub label: String,
    /// Exclusive upper bound in hours; None for the last bucket.
    pub limite_horas: Option<f64>,
    pub quantidade: usize,
    pub percentual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacklogAge {
    pub tickets_abertos: usize,
    pub idades_validas: usize,
    pub idades_invalidas: usize,
    pub faixas: Vec<FaixaIdade>,
    pub idade_media_horas: Option<f64>,
    pub idade_mediana_horas: Option<f64>,
    pub idade_maxima_horas: Option<f64>,
}

const FAIXAS: [(&str, Option<f64>); 5] = [
    ("< 1 dia", Some(24.0)),
    ("1-3 dias", Some(72.0)),
    ("3-7 dias", Some(168.0)),
    ("1-4 semanas", Some(720.0)),
    ("> 4 semanas", None),
];

/// Bucket ages (hours) of unresolved tickets. `None` and non-positive ages are
/// invalid and stay out of the bucket percentages.
pub fn build_backlog(idades: &[Option<f64>]) -> BacklogAge {
    let validas: Vec<f64> = idades.iter().flatten().copied().filter(|h| *h > 0.0).collect();
    let mut contagens = [0usize; 5];

    for &h in &validas {
        let idx = FAIXAS
            .iter()
            .position(|(_, limite)| limite.map_or(true, |l| h < l))
            .unwrap_or(FAIXAS.len() - 1);
        contagens[idx] += 1;
    }

    let total = validas.len();
    let faixas = FAIXAS
        .iter()
        .zip(contagens)
        .map(|((label, limite), quantidade)| FaixaIdade {
            label: label.to_string(),
            limite_horas: *limite,
            quantidade,
            percentual: pct(quantidade, total),
        })
        .collect();

    let (media_h, mediana_h, maxima_h) = if validas.is_empty() {
        (None, None, None)
    } else {
        let maxima = validas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (
            Some(round2(media(&validas))),
            Some(round2(mediana(&validas))),
            Some(round2(maxima)),
        )
    };

    BacklogAge {
        tickets_abertos: idades.len(),
        idades_validas: total,
        idades_invalidas: idades.len() - total,
        faixas,
        idade_media_horas: media_h,
        idade_mediana_horas: mediana_h,
        idade_maxima_horas: maxima_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_empty() {
        let b = build_backlog(&[]);
        assert_eq!(b.tickets_abertos, 0);
        assert_eq!(b.faixas.len(), 5);
        assert!(b.faixas.iter().all(|f| f.quantidade == 0 && f.percentual == 0.0));
        assert!(b.idade_media_horas.is_none());
    }

    #[test]
    fn test_backlog_bucket_bounds() {
        let idades = [
            Some(23.9),
            Some(24.0),
            Some(71.9),
            Some(72.0),
            Some(167.0),
            Some(168.0),
            Some(719.0),
            Some(720.0),
        ];
        let b = build_backlog(&idades);
        let counts: Vec<usize> = b.faixas.iter().map(|f| f.quantidade).collect();
        assert_eq!(counts, vec![1, 2, 2, 2, 1]);
        assert_eq!(b.faixas[4].label, "> 4 semanas");
        assert_eq!(b.idade_maxima_horas, Some(720.0));
    }

    #[test]
    fn test_backlog_invalid_ages_excluded() {
        let b = build_backlog(&[Some(10.0), Some(0.0), Some(-5.0), None]);
        assert_eq!(b.tickets_abertos, 4);
        assert_eq!(b.idades_validas, 1);
        assert_eq!(b.idades_invalidas, 3);
        assert_eq!(b.faixas[0].percentual, 100.0);
    }

    #[test]
    fn test_backlog_percentages_sum() {
        let idades: Vec<Option<f64>> = (1..=40).map(|i| Some(i as f64 * 20.0)).collect();
        let b = build_backlog(&idades);
        let total: usize = b.faixas.iter().map(|f| f.quantidade).sum();
        assert_eq!(total, 40);
        let sum: f64 = b.faixas.iter().map(|f| f.percentual).sum();
        assert!((sum - 100.0).abs() < 0.1);
    }
}

//! Reusable statistical functions for ticket metrics.

use serde::Serialize;

/// Arithmetic mean. Returns 0.0 if the slice is empty.
pub fn media(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Percentile with linear interpolation. `p` is in [0, 100].
/// Returns 0.0 if the slice is empty.
pub fn percentil(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    // Rank (0-based fractional index)
    let rank = p / 100.0 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Median. Returns 0.0 if the slice is empty.
pub fn mediana(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Population standard deviation. Returns 0.0 if the slice is empty.
pub fn desvio_padrao(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = media(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Share of `count` in `total`, in percent, 2 decimals. Zero when `total` is zero.
pub fn pct(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(count as f64 / total as f64 * 100.0)
    }
}

/// Descriptive statistics of a sample, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumoEstatistico {
    pub amostra: usize,
    pub media: f64,
    pub mediana: f64,
    pub minimo: f64,
    pub maximo: f64,
    pub desvio_padrao: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

impl ResumoEstatistico {
    /// None for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let minimo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let maximo = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(ResumoEstatistico {
            amostra: values.len(),
            media: round2(media(values)),
            mediana: round2(mediana(values)),
            minimo: round2(minimo),
            maximo: round2(maximo),
            desvio_padrao: round2(desvio_padrao(values)),
            p25: round2(percentil(values, 25.0)),
            p75: round2(percentil(values, 75.0)),
            p90: round2(percentil(values, 90.0)),
            p95: round2(percentil(values, 95.0)),
        })
    }
}

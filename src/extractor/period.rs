use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::error::AppError;

/// Inclusive creation-date window applied while paging tickets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Short name used in file names (`ultimos_6_meses`, `personalizado`).
    pub name: String,
    /// Human label for logs and reports.
    pub descricao: String,
}

impl DateWindow {
    pub fn contains(&self, dt: &NaiveDateTime) -> bool {
        self.start <= *dt && *dt <= self.end
    }

    /// Custom window from `DD/MM/YYYY` bounds; the end extends to 23:59:59.
    pub fn custom(data_inicial: &str, data_final: &str) -> Result<DateWindow, AppError> {
        let start = parse_br_date(data_inicial)?;
        let end = parse_br_date(data_final)?;
        if start > end {
            return Err(AppError::Custom(format!(
                "Data inicial {} posterior à data final {}",
                data_inicial, data_final
            )));
        }
        Ok(DateWindow {
            start: start.and_hms_opt(0, 0, 0).unwrap_or_default(),
            end: end.and_hms_opt(23, 59, 59).unwrap_or_default(),
            name: "personalizado".to_string(),
            descricao: format!("{} a {}", data_inicial.trim(), data_final.trim()),
        })
    }

    pub fn label(&self) -> String {
        format!(
            "{} ({} a {})",
            self.descricao,
            self.start.format("%d/%m/%Y"),
            self.end.format("%d/%m/%Y")
        )
    }
}

fn parse_br_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y")
        .map_err(|_| AppError::Custom(format!("Data inválida (use DD/MM/AAAA): {}", s)))
}

/// Predefined extraction periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    UltimoMes,
    UltimosTresMeses,
    #[default]
    UltimosSeisMeses,
    UltimoAno,
    AnoAtual,
    AnoPassado,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::UltimoMes,
        Period::UltimosTresMeses,
        Period::UltimosSeisMeses,
        Period::UltimoAno,
        Period::AnoAtual,
        Period::AnoPassado,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Period::UltimoMes => "ultimo_mes",
            Period::UltimosTresMeses => "ultimos_3_meses",
            Period::UltimosSeisMeses => "ultimos_6_meses",
            Period::UltimoAno => "ultimo_ano",
            Period::AnoAtual => "ano_atual",
            Period::AnoPassado => "ano_passado",
        }
    }

    /// Window ending at `now` (or at the end of last year for `AnoPassado`).
    pub fn window(&self, now: NaiveDateTime) -> DateWindow {
        let days_back = |days: i64, descricao: &str| DateWindow {
            start: now - Duration::days(days),
            end: now,
            name: self.key().to_string(),
            descricao: descricao.to_string(),
        };

        match self {
            Period::UltimoMes => days_back(30, "Último mês"),
            Period::UltimosTresMeses => days_back(90, "Últimos 3 meses"),
            Period::UltimosSeisMeses => days_back(180, "Últimos 6 meses"),
            Period::UltimoAno => days_back(365, "Último ano"),
            Period::AnoAtual => DateWindow {
                start: year_start(now.year()),
                end: now,
                name: self.key().to_string(),
                descricao: format!("Ano atual ({})", now.year()),
            },
            Period::AnoPassado => {
                let year = now.year() - 1;
                DateWindow {
                    start: year_start(year),
                    end: year_start(year + 1) - Duration::seconds(1),
                    name: self.key().to_string(),
                    descricao: format!("Ano passado ({})", year),
                }
            }
        }
    }
}

fn year_start(year: i32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .iter()
            .find(|p| p.key() == s.trim())
            .copied()
            .ok_or_else(|| {
                let keys: Vec<&str> = Period::ALL.iter().map(|p| p.key()).collect();
                AppError::Custom(format!(
                    "Período desconhecido '{}' (opções: {})",
                    s,
                    keys.join(", ")
                ))
            })
    }
}

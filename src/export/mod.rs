pub mod structured;
pub mod tables_csv;
pub mod text_report;
pub mod tickets_csv;
pub mod workbook;

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDateTime;
use rust_xlsxwriter::{
    ConditionalFormatCell, ConditionalFormatCellRule, Format, FormatBorder, Worksheet, XlsxError,
};
use serde::Serialize;

use crate::error::AppError;

/// One file written to the output directory.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub path: String,
    pub size_bytes: u64,
    pub duration_ms: u64,
}

/// Output formats of the metrics model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsFormat {
    Json,
    Yaml,
    Csv,
    Xlsx,
    Txt,
}

impl MetricsFormat {
    pub const ALL: [MetricsFormat; 5] = [
        MetricsFormat::Json,
        MetricsFormat::Yaml,
        MetricsFormat::Csv,
        MetricsFormat::Xlsx,
        MetricsFormat::Txt,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            MetricsFormat::Json => "json",
            MetricsFormat::Yaml => "yaml",
            MetricsFormat::Csv => "csv",
            MetricsFormat::Xlsx => "xlsx",
            MetricsFormat::Txt => "txt",
        }
    }
}

impl std::str::FromStr for MetricsFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(MetricsFormat::Json),
            "yaml" | "yml" => Ok(MetricsFormat::Yaml),
            "csv" => Ok(MetricsFormat::Csv),
            "xlsx" | "excel" => Ok(MetricsFormat::Xlsx),
            "txt" | "texto" => Ok(MetricsFormat::Txt),
            other => Err(AppError::Custom(format!(
                "Formato desconhecido: {} (json, yaml, csv, xlsx, txt)",
                other
            ))),
        }
    }
}

// ── File naming ──────────────────────────────────────────────────────────────

pub fn timestamp_suffix(now: &NaiveDateTime) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// `metricas_{periodo}_{YYYYMMDD_HHMMSS}.{ext}`
pub fn metrics_file_name(periodo: &str, now: &NaiveDateTime, ext: &str) -> String {
    format!("metricas_{}_{}.{}", periodo, timestamp_suffix(now), ext)
}

/// `tickets_api_glpi_{periodo}_{YYYYMMDD_HHMMSS}.csv`
pub fn tickets_file_name(periodo: &str, now: &NaiveDateTime) -> String {
    format!("tickets_api_glpi_{}_{}.csv", periodo, timestamp_suffix(now))
}

/// Write `bytes` to `dir/name`, creating `dir` when needed.
pub fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<ExportResult, AppError> {
    let start = Instant::now();
    std::fs::create_dir_all(dir)?;
    let path: PathBuf = dir.join(name);
    std::fs::write(&path, bytes)?;
    log::info!("Arquivo gerado: {} ({} bytes)", path.display(), bytes.len());
    Ok(ExportResult {
        path: path.to_string_lossy().into_owned(),
        size_bytes: bytes.len() as u64,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

// ── Workbook formats ─────────────────────────────────────────────────────────

/// Blue header #2C5F8A, white bold text, thin border.
pub fn create_header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color("2C5F8A")
        .set_font_color("FFFFFF")
        .set_font_size(11)
        .set_border(FormatBorder::Thin)
        .set_text_wrap()
}

/// #,##0.00
pub fn create_number_format() -> Format {
    Format::new().set_num_format("#,##0.00")
}

pub fn create_integer_format() -> Format {
    Format::new().set_num_format("#,##0")
}

/// 0.0%; cells hold fractions, not percents.
pub fn create_percent_format() -> Format {
    Format::new().set_num_format("0.0%")
}

/// Green/yellow/red fill on a compliance column holding fractions.
/// Green ≥ 0.9 | Yellow 0.7..0.9 | Red < 0.7
pub fn apply_compliance_conditional_format(
    ws: &mut Worksheet,
    first_row: u32,
    col: u16,
    last_row: u32,
) -> Result<(), XlsxError> {
    let green = Format::new()
        .set_background_color("C6EFCE")
        .set_font_color("006100");
    let yellow = Format::new()
        .set_background_color("FFEB9C")
        .set_font_color("9C6500");
    let red = Format::new()
        .set_background_color("FFC7CE")
        .set_font_color("9C0006");

    ws.add_conditional_format(
        first_row,
        col,
        last_row,
        col,
        &ConditionalFormatCell::new()
            .set_rule(ConditionalFormatCellRule::GreaterThanOrEqualTo(0.9))
            .set_format(&green),
    )?;
    ws.add_conditional_format(
        first_row,
        col,
        last_row,
        col,
        &ConditionalFormatCell::new()
            .set_rule(ConditionalFormatCellRule::Between(0.7, 0.8999))
            .set_format(&yellow),
    )?;
    ws.add_conditional_format(
        first_row,
        col,
        last_row,
        col,
        &ConditionalFormatCell::new()
            .set_rule(ConditionalFormatCellRule::LessThan(0.7))
            .set_format(&red),
    )?;

    Ok(())
}

pub(crate) fn xlsx_err(e: XlsxError) -> AppError {
    AppError::Custom(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::deserializers::parse_any_datetime;

    #[test]
    fn test_file_names() {
        let now = parse_any_datetime("05/03/2025 14:07:09").unwrap();
        assert_eq!(
            metrics_file_name("ultimo_mes", &now, "json"),
            "metricas_ultimo_mes_20250305_140709.json"
        );
        assert_eq!(
            tickets_file_name("ano_atual", &now),
            "tickets_api_glpi_ano_atual_20250305_140709.csv"
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<MetricsFormat>().unwrap(), MetricsFormat::Json);
        assert_eq!("yml".parse::<MetricsFormat>().unwrap(), MetricsFormat::Yaml);
        assert!("pdf".parse::<MetricsFormat>().is_err());
    }

    #[test]
    fn test_write_artifact_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("saida");
        let res = write_artifact(&dir, "a.txt", b"ok").unwrap();
        assert_eq!(res.size_bytes, 2);
        assert_eq!(std::fs::read(dir.join("a.txt")).unwrap(), b"ok");
    }
}

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::analyzer::{build_metrics, AnalysisContext, MetricsModel};
use crate::error::AppError;
use crate::export::structured::{metrics_json, metrics_yaml};
use crate::export::tables_csv::metric_tables;
use crate::export::text_report::render_text_report;
use crate::export::workbook::generate_metrics_workbook;
use crate::export::{
    metrics_file_name, timestamp_suffix, write_artifact, ExportResult, MetricsFormat,
};
use crate::parser::pipeline::read_ticket_table;
use crate::parser::types::{EnrichedTicket, FieldAvailability};

#[derive(Debug, Serialize)]
pub struct AnalyzeResult {
    pub total_tickets: usize,
    pub skipped_rows: usize,
    pub warnings: usize,
    pub submetricas_ignoradas: Vec<String>,
    pub alertas: Vec<String>,
    pub exports: Vec<ExportResult>,
}

/// Render the model in every requested format into `output_dir`.
pub fn write_metrics(
    model: &MetricsModel,
    output_dir: &Path,
    periodo: &str,
    formats: &[MetricsFormat],
    now: &NaiveDateTime,
) -> Result<Vec<ExportResult>, AppError> {
    let mut exports = Vec::new();
    for format in formats {
        let name = metrics_file_name(periodo, now, format.extension());
        match format {
            MetricsFormat::Json => {
                exports.push(write_artifact(output_dir, &name, metrics_json(model)?.as_bytes())?)
            }
            MetricsFormat::Yaml => {
                exports.push(write_artifact(output_dir, &name, metrics_yaml(model)?.as_bytes())?)
            }
            MetricsFormat::Txt => exports.push(write_artifact(
                output_dir,
                &name,
                render_text_report(model).as_bytes(),
            )?),
            MetricsFormat::Xlsx => {
                exports.push(write_artifact(output_dir, &name, &generate_metrics_workbook(model)?)?)
            }
            MetricsFormat::Csv => {
                for (tabela, bytes) in metric_tables(model)? {
                    let name = format!(
                        "metricas_{}_{}_{}.csv",
                        periodo,
                        timestamp_suffix(now),
                        tabela
                    );
                    exports.push(write_artifact(output_dir, &name, &bytes)?);
                }
            }
        }
    }
    Ok(exports)
}

/// Aggregate an in-memory collection and write the metrics artifacts.
pub fn analyze_tickets(
    tickets: &[EnrichedTicket],
    availability: FieldAvailability,
    fonte: &str,
    periodo: &str,
    output_dir: &Path,
    formats: &[MetricsFormat],
    now: NaiveDateTime,
) -> Result<(MetricsModel, Vec<ExportResult>), AppError> {
    let ctx = AnalysisContext {
        fonte: fonte.to_string(),
        periodo: Some(periodo.to_string()),
        availability,
        now,
    };
    let model = build_metrics(tickets, &ctx);
    let exports = write_metrics(&model, output_dir, periodo, formats, &now)?;
    Ok((model, exports))
}

/// Reload a flat ticket table and analyze it.
pub fn analyze_table(
    input: &Path,
    periodo: &str,
    output_dir: &Path,
    formats: &[MetricsFormat],
    now: NaiveDateTime,
) -> Result<AnalyzeResult, AppError> {
    log::info!("Analisando {}", input.display());
    let table = read_ticket_table(input)?;
    if table.tickets.is_empty() {
        return Err(AppError::EmptyFile);
    }

    let fonte = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let (model, exports) = analyze_tickets(
        &table.tickets,
        table.availability,
        &fonte,
        periodo,
        output_dir,
        formats,
        now,
    )?;

    Ok(AnalyzeResult {
        total_tickets: model.general.total_tickets,
        skipped_rows: table.skipped_rows,
        warnings: table.warnings.len(),
        submetricas_ignoradas: model.metadata.submetricas_ignoradas.clone(),
        alertas: model.integrity.alertas.clone(),
        exports,
    })
}

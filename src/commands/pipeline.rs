use std::path::Path;
use std::sync::atomic::AtomicBool;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use super::analyze::{analyze_tickets, AnalyzeResult};
use super::extract::{extract_tickets, ExtractResult};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::export::MetricsFormat;
use crate::extractor::{DateWindow, Period};
use crate::glpi::GlpiTransport;
use crate::parser::types::FieldAvailability;
use crate::scheduler::{run_scheduled, InstanceGuard, Schedule, ScheduleSummary};

#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub extract: ExtractResult,
    pub analyze: AnalyzeResult,
}

/// Extract then analyze under the single-instance guard of `config.output_dir`.
pub fn run_pipeline<T: GlpiTransport + ?Sized>(
    transport: &T,
    config: &AppConfig,
    window: Option<DateWindow>,
    formats: &[MetricsFormat],
    now: NaiveDateTime,
) -> Result<PipelineResult, AppError> {
    let output_dir = Path::new(&config.output_dir);
    let _guard = InstanceGuard::acquire(output_dir)?;

    let extract = extract_tickets(transport, config, window, output_dir, now)?;
    let fonte = format!("API GLPI ({})", config.api_url);
    let (model, exports) = analyze_tickets(
        &extract.tickets,
        FieldAvailability::all(),
        &fonte,
        &extract.periodo,
        output_dir,
        formats,
        now,
    )?;

    let analyze = AnalyzeResult {
        total_tickets: model.general.total_tickets,
        skipped_rows: extract.stats.registros_ignorados,
        warnings: extract.warnings.len(),
        submetricas_ignoradas: model.metadata.submetricas_ignoradas.clone(),
        alertas: model.integrity.alertas.clone(),
        exports,
    };
    log::info!(
        "Pipeline concluído: {} tickets, {} arquivos de métricas",
        analyze.total_tickets,
        analyze.exports.len()
    );
    Ok(PipelineResult { extract, analyze })
}

/// Re-run the pipeline every interval over a rolling `period` window.
pub fn watch<T: GlpiTransport + ?Sized>(
    transport: &T,
    config: &AppConfig,
    period: Period,
    formats: &[MetricsFormat],
    schedule: &Schedule,
    stop: &AtomicBool,
) -> ScheduleSummary {
    run_scheduled(schedule, stop, |_| {
        let now = Local::now().naive_local();
        run_pipeline(transport, config, Some(period.window(now)), formats, now).map(|_| ())
    })
}

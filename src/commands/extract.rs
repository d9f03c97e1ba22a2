use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::export::tickets_csv::tickets_csv_bytes;
use crate::export::{tickets_file_name, write_artifact, ExportResult};
use crate::extractor::{run_extraction, DateWindow, ExtractionStats};
use crate::glpi::GlpiTransport;
use crate::parser::types::{EnrichedTicket, ParseWarning};

#[derive(Debug, Serialize)]
pub struct ExtractResult {
    pub periodo: String,
    pub stats: ExtractionStats,
    pub warnings: Vec<ParseWarning>,
    pub export: ExportResult,
    /// Kept in memory so a following analysis needs no reload.
    #[serde(skip)]
    pub tickets: Vec<EnrichedTicket>,
}

/// Period key used in file names; `completo` without a window.
pub fn period_key(window: Option<&DateWindow>) -> String {
    window
        .map(|w| w.name.clone())
        .unwrap_or_else(|| "completo".to_string())
}

/// Extract tickets for `window` and write the flat ticket table to
/// `output_dir`.
pub fn extract_tickets<T: GlpiTransport + ?Sized>(
    transport: &T,
    config: &AppConfig,
    window: Option<DateWindow>,
    output_dir: &Path,
    now: NaiveDateTime,
) -> Result<ExtractResult, AppError> {
    let periodo = period_key(window.as_ref());
    let output = run_extraction(transport, config, window)?;

    let bytes = tickets_csv_bytes(&output.tickets)?;
    let export = write_artifact(output_dir, &tickets_file_name(&periodo, &now), &bytes)?;

    Ok(ExtractResult {
        periodo,
        stats: output.stats,
        warnings: output.warnings,
        export,
        tickets: output.tickets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glpi::FakeTransport;
    use crate::parser::deserializers::parse_any_datetime;
    use crate::parser::pipeline::read_ticket_table;
    use serde_json::json;

    fn config() -> AppConfig {
        let mut c = AppConfig::default();
        c.apply_pairs([
            ("api_url", "https://glpi.local/apirest.php"),
            ("app_token", "app"),
            ("user_token", "user"),
        ]);
        c
    }

    #[test]
    fn test_extract_writes_ticket_table() {
        let fake = FakeTransport::new().with_session("tok");
        fake.push_json("ITILCategory", 200, json!([{"id": 3, "name": "WIFI"}]));
        fake.push_json("Ticket", 200, json!([
            {"id": 1, "name": "Sem \"rede\"", "status": 5, "itilcategories_id": 3,
             "date": "2025-01-10 08:00:00", "date_mod": "2025-01-10 10:00:00"},
            {"id": 2, "name": "Outro", "status": 1, "date": "2025-01-11 08:00:00"}
        ]));

        let tmp = tempfile::tempdir().unwrap();
        let now = parse_any_datetime("31/01/2025 18:00:00").unwrap();
        let window = DateWindow::custom("01/01/2025", "31/01/2025").unwrap();
        let result = extract_tickets(&fake, &config(), Some(window), tmp.path(), now).unwrap();

        assert_eq!(result.periodo, "personalizado");
        assert_eq!(result.tickets.len(), 2);
        assert!(result
            .export
            .path
            .ends_with("tickets_api_glpi_personalizado_20250131_180000.csv"));

        let reloaded = read_ticket_table(Path::new(&result.export.path)).unwrap();
        assert_eq!(reloaded.tickets.len(), 2);
        assert_eq!(reloaded.tickets[0].titulo, "Sem \"rede\"");
        assert_eq!(reloaded.tickets[0].categoria, "WIFI");
        assert_eq!(reloaded.tickets[0].data_abertura, "10/01/2025 08:00:00");
    }

    #[test]
    fn test_period_key() {
        assert_eq!(period_key(None), "completo");
    }
}

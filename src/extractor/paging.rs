use crate::extractor::period::DateWindow;
use crate::extractor::{ExtractionPhase, ExtractionRun};
use crate::glpi::{GlpiSession, GlpiTransport};
use crate::parser::deserializers::parse_glpi_datetime;
use crate::parser::types::{ParseWarning, RawTicket};

/// Outcome of the window check for one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCheck {
    Inside,
    Outside,
    /// Creation date missing or unparseable: kept (fail-open).
    Unparseable,
}

/// Keep a ticket when its creation date is inside the window. A date that
/// cannot be parsed keeps the ticket; this is intentional, ambiguous rows
/// are never dropped silently.
pub fn check_window(raw: &RawTicket, window: &DateWindow) -> WindowCheck {
    match raw.created_at.as_deref().and_then(parse_glpi_datetime) {
        Some(created) if window.contains(&created) => WindowCheck::Inside,
        Some(_) => WindowCheck::Outside,
        None => WindowCheck::Unparseable,
    }
}

impl ExtractionRun {
    /// Request `range=start-end` pages of tickets until a page is shorter than
    /// the page size. A failed page ends paging; tickets already kept stay.
    pub(crate) fn page_tickets<T: GlpiTransport + ?Sized>(&mut self, session: &GlpiSession<'_, T>) {
        let page_size = self.page_size;
        let mut start = 0usize;
        let mut page = 0usize;

        loop {
            self.advance(ExtractionPhase::Paging { page });
            let range = format!("{}-{}", start, start + page_size - 1);
            let query = [
                ("range", range.clone()),
                ("expand_dropdowns", "false".to_string()),
                ("get_hateoas", "false".to_string()),
            ];

            let rows = match session.get_rows("Ticket", &query) {
                Ok(rows) => rows,
                Err(e) => {
                    log::error!("Erro ao buscar tickets (faixa {}), interrompendo: {}", range, e);
                    break;
                }
            };

            let count = rows.len();
            self.stats.paginas += 1;
            self.stats.registros_recebidos += count;
            let before = self.records.len();

            for (offset, row) in rows.into_iter().enumerate() {
                self.accept_row(row, start + offset);
            }

            log::info!(
                "Página {} ({}): {} recebidos, {} mantidos (total {})",
                page + 1,
                range,
                count,
                self.records.len() - before,
                self.records.len()
            );

            if count < page_size {
                break;
            }
            start += page_size;
            page += 1;
        }

        self.advance(ExtractionPhase::Exhausted);
    }

    fn accept_row(&mut self, row: serde_json::Value, position: usize) {
        let raw: RawTicket = match serde_json::from_value(row.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                let id = row
                    .get("id")
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                log::warn!("Ticket {} ignorado: {}", id, e);
                self.warnings.push(ParseWarning {
                    line: position + 1,
                    message: format!("ticket {}: {}", id, e),
                });
                self.stats.registros_ignorados += 1;
                return;
            }
        };

        if let Some(window) = &self.window {
            match check_window(&raw, window) {
                WindowCheck::Inside => {}
                WindowCheck::Outside => {
                    self.stats.fora_do_periodo += 1;
                    return;
                }
                WindowCheck::Unparseable => {
                    log::debug!("Ticket {} com data de abertura inválida, mantido", raw.id);
                    self.stats.datas_invalidas_incluidas += 1;
                }
            }
        }

        self.records.push(raw);
    }
}

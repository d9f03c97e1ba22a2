//! Extraction engine: session lifecycle, reference caches, ticket paging,
//! relation folding and enrichment for one run.

pub mod cache;
pub mod enrich;
pub mod paging;
pub mod period;
pub mod relations;

use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::glpi::{GlpiSession, GlpiTransport};
use crate::parser::types::{EnrichedTicket, ParseWarning, RawTicket};

pub use cache::ReferenceCache;
pub use enrich::enrich_ticket;
pub use period::{DateWindow, Period};
pub use relations::RelationshipBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPhase {
    Unauthenticated,
    SessionActive,
    Paging { page: usize },
    Exhausted,
    SessionClosed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    pub paginas: usize,
    pub registros_recebidos: usize,
    pub fora_do_periodo: usize,
    /// Kept despite an unparseable creation date.
    pub datas_invalidas_incluidas: usize,
    pub registros_ignorados: usize,
    pub tickets_extraidos: usize,
    pub duracao_ms: u64,
}

/// Result of a successful extraction. Caches and relations are gone by now.
#[derive(Debug)]
pub struct ExtractionOutput {
    pub tickets: Vec<EnrichedTicket>,
    pub stats: ExtractionStats,
    pub warnings: Vec<ParseWarning>,
    pub window: Option<DateWindow>,
}

/// State owned by one extraction run.
pub struct ExtractionRun {
    page_size: usize,
    relation_limit: usize,
    window: Option<DateWindow>,
    phase: ExtractionPhase,
    transitions: Vec<ExtractionPhase>,
    cache: ReferenceCache,
    relations: RelationshipBundle,
    records: Vec<RawTicket>,
    stats: ExtractionStats,
    warnings: Vec<ParseWarning>,
}

impl ExtractionRun {
    pub fn new(config: &AppConfig, window: Option<DateWindow>) -> Self {
        ExtractionRun {
            page_size: config.range_limit.max(1),
            relation_limit: config.relation_range_limit.max(1),
            window,
            phase: ExtractionPhase::Unauthenticated,
            transitions: vec![ExtractionPhase::Unauthenticated],
            cache: ReferenceCache::default(),
            relations: RelationshipBundle::default(),
            records: Vec::new(),
            stats: ExtractionStats::default(),
            warnings: Vec::new(),
        }
    }

    pub fn phase(&self) -> ExtractionPhase {
        self.phase
    }

    /// Every phase entered so far, in order.
    pub fn transitions(&self) -> &[ExtractionPhase] {
        &self.transitions
    }

    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    fn advance(&mut self, next: ExtractionPhase) {
        log::debug!("Extração: {:?} -> {:?}", self.phase, next);
        self.phase = next;
        self.transitions.push(next);
    }

    /// Open a session, extract and enrich, then close the session on every
    /// path. Session-init failure and an empty result are run-level errors.
    pub fn run<T: GlpiTransport + ?Sized>(
        &mut self,
        transport: &T,
        app_token: &str,
        user_token: &str,
    ) -> Result<Vec<EnrichedTicket>, AppError> {
        let session = GlpiSession::open(transport, app_token, user_token)?;
        self.advance(ExtractionPhase::SessionActive);

        let result = self.extract(&session);

        session.close();
        self.advance(ExtractionPhase::SessionClosed);
        result
    }

    fn extract<T: GlpiTransport + ?Sized>(
        &mut self,
        session: &GlpiSession<'_, T>,
    ) -> Result<Vec<EnrichedTicket>, AppError> {
        log::info!("Carregando caches de referência");
        self.cache = ReferenceCache::load(session, self.page_size);

        match &self.window {
            Some(w) => log::info!("Buscando tickets: {}", w.label()),
            None => log::info!("Buscando tickets sem filtro de data"),
        }
        self.page_tickets(session);

        if self.records.is_empty() {
            let periodo = self
                .window
                .as_ref()
                .map(DateWindow::label)
                .unwrap_or_else(|| "completo".to_string());
            return Err(AppError::NoTicketsInWindow(periodo));
        }

        let ticket_ids: HashSet<String> = self.records.iter().map(|r| r.id.clone()).collect();
        self.relations =
            RelationshipBundle::resolve(session, &self.cache, &ticket_ids, self.relation_limit);

        let tickets: Vec<EnrichedTicket> = self
            .records
            .iter()
            .map(|raw| enrich_ticket(raw, &self.cache, &self.relations))
            .collect();
        self.stats.tickets_extraidos = tickets.len();
        Ok(tickets)
    }

    pub fn into_output(self, tickets: Vec<EnrichedTicket>) -> ExtractionOutput {
        ExtractionOutput {
            tickets,
            stats: self.stats,
            warnings: self.warnings,
            window: self.window,
        }
    }
}

/// Full extraction for one window (or all tickets when `window` is None).
pub fn run_extraction<T: GlpiTransport + ?Sized>(
    transport: &T,
    config: &AppConfig,
    window: Option<DateWindow>,
) -> Result<ExtractionOutput, AppError> {
    let start = Instant::now();
    let mut run = ExtractionRun::new(config, window);
    let tickets = run.run(transport, &config.app_token, &config.user_token)?;

    let mut output = run.into_output(tickets);
    output.stats.duracao_ms = start.elapsed().as_millis() as u64;
    log::info!(
        "Extração concluída: {} tickets, {} páginas, {} fora do período, {} ignorados ({} ms)",
        output.stats.tickets_extraidos,
        output.stats.paginas,
        output.stats.fora_do_periodo,
        output.stats.registros_ignorados,
        output.stats.duracao_ms
    );
    Ok(output)
}

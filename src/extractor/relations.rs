use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::ExtractionError;
use crate::extractor::cache::ReferenceCache;
use crate::glpi::{GlpiSession, GlpiTransport};
use crate::parser::deserializers::de;

pub const SEM_REQUERENTE: &str = "Sem Requerente";
pub const NAO_ATRIBUIDO: &str = "Não Atribuído";
pub const SEM_GRUPO: &str = "Sem Grupo";

/// `Ticket_User.type`
const TIPO_REQUERENTE: i64 = 1;
const TIPO_TECNICO: i64 = 2;
/// `Group_Ticket.type`
const TIPO_GRUPO_TECNICO: i64 = 2;

#[derive(Debug, Deserialize)]
struct TicketUserRow {
    #[serde(rename = "tickets_id", deserialize_with = "de::id_string")]
    ticket_id: String,
    #[serde(rename = "users_id", deserialize_with = "de::id_string")]
    user_id: String,
    #[serde(rename = "type", default, deserialize_with = "de::lenient_i64")]
    role: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GroupTicketRow {
    #[serde(rename = "tickets_id", deserialize_with = "de::id_string")]
    ticket_id: String,
    #[serde(rename = "groups_id", deserialize_with = "de::id_string")]
    group_id: String,
    #[serde(rename = "type", default, deserialize_with = "de::lenient_i64")]
    role: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RelationEntry {
    requerente: Option<String>,
    tecnico: Option<String>,
    grupo: Option<String>,
}

/// Resolved people and group of one ticket, defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRelations {
    pub requerente: String,
    pub tecnico: String,
    pub grupo: String,
}

/// Per-ticket requester / assignee / technical group for the current batch.
#[derive(Debug, Clone, Default)]
pub struct RelationshipBundle {
    entries: HashMap<String, RelationEntry>,
}

impl RelationshipBundle {
    /// Fetch both relation tables in one bounded request each and keep only
    /// rows of tickets in `ticket_ids`. A failing table is logged and skipped.
    pub fn resolve<T: GlpiTransport + ?Sized>(
        session: &GlpiSession<'_, T>,
        cache: &ReferenceCache,
        ticket_ids: &HashSet<String>,
        relation_limit: usize,
    ) -> Self {
        let mut bundle = RelationshipBundle::default();
        let range = format!("0-{}", relation_limit.max(1) - 1);

        match fetch::<T, TicketUserRow>(session, "Ticket_User", &range) {
            Ok(rows) => {
                let kept = bundle.apply_user_rows(rows, cache, ticket_ids);
                log::info!("{} relações ticket-usuário aplicadas", kept);
            }
            Err(e) => log::error!("Falha ao buscar relações ticket-usuário: {}", e),
        }

        match fetch::<T, GroupTicketRow>(session, "Group_Ticket", &range) {
            Ok(rows) => {
                let kept = bundle.apply_group_rows(rows, cache, ticket_ids);
                log::info!("{} relações ticket-grupo aplicadas", kept);
            }
            Err(e) => log::error!("Falha ao buscar relações ticket-grupo: {}", e),
        }

        bundle
    }

    fn apply_user_rows(
        &mut self,
        rows: Vec<TicketUserRow>,
        cache: &ReferenceCache,
        ticket_ids: &HashSet<String>,
    ) -> usize {
        let mut kept = 0;
        for row in rows {
            if !matches!(row.role, Some(TIPO_REQUERENTE | TIPO_TECNICO))
                || !ticket_ids.contains(&row.ticket_id)
            {
                continue;
            }
            let entry = self.entries.entry(row.ticket_id).or_default();
            let slot = if row.role == Some(TIPO_REQUERENTE) {
                &mut entry.requerente
            } else {
                &mut entry.tecnico
            };
            *slot = Some(cache.user_name(&row.user_id));
            kept += 1;
        }
        kept
    }

    fn apply_group_rows(
        &mut self,
        rows: Vec<GroupTicketRow>,
        cache: &ReferenceCache,
        ticket_ids: &HashSet<String>,
    ) -> usize {
        let mut kept = 0;
        for row in rows {
            if row.role != Some(TIPO_GRUPO_TECNICO) || !ticket_ids.contains(&row.ticket_id) {
                continue;
            }
            let entry = self.entries.entry(row.ticket_id).or_default();
            entry.grupo = Some(cache.group_name(&row.group_id));
            kept += 1;
        }
        kept
    }

    /// Relations of one ticket; absent roles fall back to their sentinel.
    pub fn get(&self, ticket_id: &str) -> TicketRelations {
        let entry = self.entries.get(ticket_id).cloned().unwrap_or_default();
        TicketRelations {
            requerente: entry.requerente.unwrap_or_else(|| SEM_REQUERENTE.to_string()),
            tecnico: entry.tecnico.unwrap_or_else(|| NAO_ATRIBUIDO.to_string()),
            grupo: entry.grupo.unwrap_or_else(|| SEM_GRUPO.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One relation table page. Rows that do not decode are skipped.
fn fetch<T, R>(
    session: &GlpiSession<'_, T>,
    path: &str,
    range: &str,
) -> Result<Vec<R>, ExtractionError>
where
    T: GlpiTransport + ?Sized,
    R: for<'de> Deserialize<'de>,
{
    let rows = session.get_rows(path, &[("range", range.to_string())])?;
    let total = rows.len();
    let parsed: Vec<R> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if parsed.len() < total {
        log::warn!("{}: {} linha(s) inválida(s) ignorada(s)", path, total - parsed.len());
    }
    Ok(parsed)
}

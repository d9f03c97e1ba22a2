use crate::extractor::cache::ReferenceCache;
use crate::extractor::relations::RelationshipBundle;
use crate::parser::deserializers::format_glpi_date;
use crate::parser::sanitize::{clean_description, clean_field};
use crate::parser::types::{status_label, EnrichedTicket, RawTicket};

/// Resolve names, sanitize text and reformat dates. Never fails: a field
/// that cannot be resolved degrades to its sentinel or to an empty string.
pub fn enrich_ticket(
    raw: &RawTicket,
    cache: &ReferenceCache,
    relations: &RelationshipBundle,
) -> EnrichedTicket {
    let rel = relations.get(&raw.id);
    let text = |v: &Option<String>| clean_field(v.as_deref().unwrap_or(""));
    let date = |v: &Option<String>| format_glpi_date(v.as_deref().unwrap_or(""));

    let data_solucao = [&raw.solved_at, &raw.closed_at]
        .into_iter()
        .map(date)
        .find(|d| !d.is_empty());

    EnrichedTicket {
        id: raw.id.clone(),
        titulo: text(&raw.title),
        entidade: clean_field(&cache.entity_name(raw.entity_id.as_deref())),
        status: status_label(raw.status),
        ultima_atualizacao: date(&raw.updated_at),
        data_abertura: date(&raw.created_at),
        requerente: clean_field(&rel.requerente),
        tecnico_atribuido: clean_field(&rel.tecnico),
        grupo_tecnico: clean_field(&rel.grupo),
        categoria: clean_field(&cache.category_name(raw.category_id.as_deref())),
        localizacao: clean_field(&cache.location_name(raw.location_id.as_deref())),
        descricao: clean_description(raw.body.as_deref().unwrap_or("")),
        data_solucao,
    }
}

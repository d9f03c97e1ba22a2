use std::io::Read;
use std::path::Path;
use std::time::Instant;

use crate::error::AppError;
use crate::parser::columns::{
    validate_columns, ColumnMap, COL_CATEGORIA, COL_DATA_ABERTURA, COL_DESCRICAO, COL_ENTIDADE,
    COL_GRUPO, COL_ID, COL_LOCALIZACAO, COL_REQUERENTE, COL_STATUS, COL_TECNICO, COL_TITULO,
    COL_ULTIMA_ATUALIZACAO,
};
use crate::parser::types::{EnrichedTicket, FieldAvailability, ParseWarning};

/// Output of `read_ticket_table`: tickets rebuilt from a flat ticket table.
#[derive(Debug)]
pub struct TableOutput {
    pub tickets: Vec<EnrichedTicket>,
    pub warnings: Vec<ParseWarning>,
    pub total_rows_processed: usize,
    pub skipped_rows: usize,
    pub detected_columns: Vec<String>,
    pub missing_optional_columns: Vec<String>,
    pub availability: FieldAvailability,
    pub parse_duration_ms: u64,
}

pub fn read_ticket_table(path: &Path) -> Result<TableOutput, AppError> {
    let file = std::fs::File::open(path)?;
    read_ticket_table_reader(std::io::BufReader::new(file))
}

/// Core reading logic, accepts any `Read` source.
pub fn read_ticket_table_reader<R: Read>(reader: R) -> Result<TableOutput, AppError> {
    let start = Instant::now();

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .double_quote(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::EmptyFile);
    }
    let col_map = ColumnMap::from_headers(&headers);
    let validation = validate_columns(&col_map)?;

    let availability = FieldAvailability {
        entidade: col_map.has(COL_ENTIDADE),
        categoria: col_map.has(COL_CATEGORIA),
        tecnico: col_map.has(COL_TECNICO),
        grupo: col_map.has(COL_GRUPO),
        localizacao: col_map.has(COL_LOCALIZACAO),
        ultima_atualizacao: col_map.has(COL_ULTIMA_ATUALIZACAO),
    };
    if !validation.missing_optional.is_empty() {
        log::warn!(
            "Colunas opcionais ausentes: {}",
            validation.missing_optional.join(", ")
        );
    }

    let mut tickets: Vec<EnrichedTicket> = Vec::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut skipped = 0usize;
    let mut row_idx = 0usize;

    for result in rdr.records() {
        row_idx += 1;
        match result {
            Ok(record) => match record_to_ticket(&col_map, &record) {
                Ok(ticket) => tickets.push(ticket),
                Err(msg) => {
                    warnings.push(ParseWarning {
                        line: row_idx + 1, // +1 for the header row
                        message: msg,
                    });
                    skipped += 1;
                }
            },
            Err(err) => {
                warnings.push(ParseWarning {
                    line: row_idx + 1,
                    message: err.to_string(),
                });
                skipped += 1;
            }
        }
    }

    if row_idx == 0 {
        return Err(AppError::EmptyFile);
    }
    if skipped > 0 {
        log::warn!("{} linha(s) ignorada(s) na leitura da tabela", skipped);
    }

    Ok(TableOutput {
        tickets,
        warnings,
        total_rows_processed: row_idx,
        skipped_rows: skipped,
        detected_columns: validation.present,
        missing_optional_columns: validation.missing_optional,
        availability,
        parse_duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn record_to_ticket(col_map: &ColumnMap, record: &csv::StringRecord) -> Result<EnrichedTicket, String> {
    let get = |col: &str| -> String {
        col_map
            .get(record, col)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let id = get(COL_ID);
    if id.is_empty() {
        return Err("ID vazio".to_string());
    }

    Ok(EnrichedTicket {
        id,
        titulo: get(COL_TITULO),
        entidade: get(COL_ENTIDADE),
        status: get(COL_STATUS),
        ultima_atualizacao: get(COL_ULTIMA_ATUALIZACAO),
        data_abertura: get(COL_DATA_ABERTURA),
        requerente: get(COL_REQUERENTE),
        tecnico_atribuido: get(COL_TECNICO),
        grupo_tecnico: get(COL_GRUPO),
        categoria: get(COL_CATEGORIA),
        localizacao: get(COL_LOCALIZACAO),
        descricao: get(COL_DESCRICAO),
        data_solucao: None,
    })
}

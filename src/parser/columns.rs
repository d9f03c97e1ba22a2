use std::collections::HashMap;

use crate::error::AppError;
use crate::parser::types::EnrichedTicket;

pub const COL_ID: &str = "ID";
pub const COL_TITULO: &str = "Titulo";
pub const COL_ENTIDADE: &str = "Entidade";
pub const COL_STATUS: &str = "Status";
pub const COL_ULTIMA_ATUALIZACAO: &str = "Ultima_atualizacao";
pub const COL_DATA_ABERTURA: &str = "Data_abertura";
pub const COL_REQUERENTE: &str = "Requerente";
pub const COL_TECNICO: &str = "Tecnico_atribuido";
pub const COL_GRUPO: &str = "Grupo_tecnico";
pub const COL_CATEGORIA: &str = "Categoria";
pub const COL_LOCALIZACAO: &str = "Localizacao";
pub const COL_DESCRICAO: &str = "Descricao";

/// Fixed column set of the flat ticket table, in output order.
pub const TICKET_COLUMNS: [&str; 12] = [
    COL_ID,
    COL_TITULO,
    COL_ENTIDADE,
    COL_STATUS,
    COL_ULTIMA_ATUALIZACAO,
    COL_DATA_ABERTURA,
    COL_REQUERENTE,
    COL_TECNICO,
    COL_GRUPO,
    COL_CATEGORIA,
    COL_LOCALIZACAO,
    COL_DESCRICAO,
];

/// Colunas obrigatórias: a leitura falha se uma delas estiver ausente.
const REQUIRED: &[&str] = &[COL_ID, COL_STATUS, COL_DATA_ABERTURA];

/// Colunas opcionais: ausentes desativam a sub-métrica correspondente.
const OPTIONAL: &[&str] = &[
    COL_TITULO,
    COL_ENTIDADE,
    COL_ULTIMA_ATUALIZACAO,
    COL_REQUERENTE,
    COL_TECNICO,
    COL_GRUPO,
    COL_CATEGORIA,
    COL_LOCALIZACAO,
    COL_DESCRICAO,
];

/// Row values of a ticket in [`TICKET_COLUMNS`] order.
pub fn ticket_row(t: &EnrichedTicket) -> [&str; 12] {
    [
        t.id.as_str(),
        t.titulo.as_str(),
        t.entidade.as_str(),
        t.status.as_str(),
        t.ultima_atualizacao.as_str(),
        t.data_abertura.as_str(),
        t.requerente.as_str(),
        t.tecnico_atribuido.as_str(),
        t.grupo_tecnico.as_str(),
        t.categoria.as_str(),
        t.localizacao.as_str(),
        t.descricao.as_str(),
    ]
}

/// Maps column names to their index in a CSV record.
pub struct ColumnMap {
    indices: HashMap<String, usize>,
    headers: Vec<String>,
}

impl ColumnMap {
    /// Header fields are trimmed and stripped of a leading BOM.
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut indices = HashMap::new();
        let mut header_list = Vec::new();
        for (i, field) in headers.iter().enumerate() {
            let name = field.trim_start_matches('\u{FEFF}').trim().to_string();
            indices.insert(name.clone(), i);
            header_list.push(name);
        }
        ColumnMap {
            indices,
            headers: header_list,
        }
    }

    pub fn get<'a>(&self, record: &'a csv::StringRecord, col: &str) -> Option<&'a str> {
        self.indices.get(col).and_then(|&i| record.get(i))
    }

    pub fn has(&self, col: &str) -> bool {
        self.indices.contains_key(col)
    }

    pub fn all_headers(&self) -> &[String] {
        &self.headers
    }
}

#[derive(Debug)]
pub struct ColumnValidation {
    pub present: Vec<String>,
    pub missing_optional: Vec<String>,
}

/// Returns `AppError::MissingColumns` if any required column is absent.
pub fn validate_columns(col_map: &ColumnMap) -> Result<ColumnValidation, AppError> {
    let missing_required: Vec<String> = REQUIRED
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    if !missing_required.is_empty() {
        return Err(AppError::MissingColumns(missing_required));
    }

    let missing_optional = OPTIONAL
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    Ok(ColumnValidation {
        present: col_map.all_headers().to_vec(),
        missing_optional,
    })
}

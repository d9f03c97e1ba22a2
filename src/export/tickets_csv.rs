use std::io::Write;

use csv::{QuoteStyle, WriterBuilder};

use crate::error::AppError;
use crate::parser::columns::{ticket_row, TICKET_COLUMNS};
use crate::parser::types::EnrichedTicket;

/// Flat ticket table: header plus one row per ticket, every field quoted and
/// embedded quotes doubled.
pub fn write_tickets_csv<W: Write>(writer: W, tickets: &[EnrichedTicket]) -> Result<(), AppError> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b',')
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .from_writer(writer);

    wtr.write_record(TICKET_COLUMNS)?;
    for t in tickets {
        wtr.write_record(ticket_row(t))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn tickets_csv_bytes(tickets: &[EnrichedTicket]) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    write_tickets_csv(&mut buf, tickets)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pipeline::read_ticket_table_reader;

    fn ticket(id: &str, titulo: &str, descricao: &str) -> EnrichedTicket {
        EnrichedTicket {
            id: id.into(),
            titulo: titulo.into(),
            entidade: "Sede".into(),
            status: "Fechado".into(),
            ultima_atualizacao: "10/01/2025 10:00:00".into(),
            data_abertura: "10/01/2025 08:00:00".into(),
            requerente: "Ana Souza".into(),
            tecnico_atribuido: "Não Atribuído".into(),
            grupo_tecnico: "N1".into(),
            categoria: "WIFI".into(),
            localizacao: "Sem Localização".into(),
            descricao: descricao.into(),
            data_solucao: Some("10/01/2025 09:00:00".into()),
        }
    }

    #[test]
    fn test_every_field_quoted() {
        let bytes = tickets_csv_bytes(&[ticket("7", "Sem rede", "ok")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"ID\",\"Titulo\",\"Entidade\",\"Status\",\"Ultima_atualizacao\",\"Data_abertura\",\
             \"Requerente\",\"Tecnico_atribuido\",\"Grupo_tecnico\",\"Categoria\",\"Localizacao\",\"Descricao\""
        );
        assert!(lines.next().unwrap().starts_with("\"7\",\"Sem rede\",\"Sede\""));
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        let bytes = tickets_csv_bytes(&[ticket("1", "Erro \"fatal\"", "a, b")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"Erro \"\"fatal\"\"\""));
        assert!(text.contains("\"a, b\""));
    }

    #[test]
    fn test_table_reloads_to_same_tickets() {
        let original = vec![ticket("1", "Erro \"fatal\"", "linha1 linha2"), ticket("2", "B", "")];
        let bytes = tickets_csv_bytes(&original).unwrap();
        let out = read_ticket_table_reader(bytes.as_slice()).unwrap();

        assert_eq!(out.tickets.len(), 2);
        assert_eq!(out.tickets[0].titulo, "Erro \"fatal\"");
        assert_eq!(out.tickets[0].requerente, "Ana Souza");
        // resolution timestamp is not part of the flat table
        assert!(out.tickets[0].data_solucao.is_none());
        assert!(out.missing_optional_columns.is_empty());
    }
}

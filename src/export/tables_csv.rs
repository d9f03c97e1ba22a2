//! Metrics as small flat tables, one CSV per table.

use csv::{QuoteStyle, Writer, WriterBuilder};

use crate::analyzer::distribution::Distribuicao;
use crate::analyzer::MetricsModel;
use crate::error::AppError;

fn writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new())
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    wtr.into_inner()
        .map_err(|e| AppError::Custom(format!("Erro ao finalizar CSV: {}", e)))
}

fn distribution_table(d: &Distribuicao, label: &str) -> Result<Vec<u8>, AppError> {
    let mut wtr = writer();
    wtr.write_record([label, "Quantidade", "Percentual"])?;
    for item in &d.itens {
        wtr.write_record([
            item.label.clone(),
            item.quantidade.to_string(),
            format!("{:.2}", item.percentual),
        ])?;
    }
    if let Some(r) = &d.restante {
        wtr.write_record([
            r.descricao.clone(),
            r.tickets.to_string(),
            format!("{:.2}", r.percentual),
        ])?;
    }
    finish(wtr)
}

/// `(table name, CSV bytes)` for every table the model can fill. Tables whose
/// sub-metric was skipped are left out.
pub fn metric_tables(model: &MetricsModel) -> Result<Vec<(&'static str, Vec<u8>)>, AppError> {
    let mut tables = Vec::new();

    tables.push(("status", distribution_table(&model.general.status, "Status")?));

    if let Some(d) = &model.general.entidades {
        tables.push(("entidades", distribution_table(d, "Entidade")?));
    }
    if let Some(d) = &model.performance.tecnicos {
        tables.push(("tecnicos", distribution_table(d, "Tecnico")?));
    }

    if let Some(sla) = &model.sla {
        let mut wtr = writer();
        wtr.write_record([
            "Categoria",
            "Complexidade",
            "Limite_horas",
            "Total",
            "Dentro_SLA",
            "Fora_SLA",
            "Percentual_SLA",
        ])?;
        for c in sla.por_complexidade.iter().chain(sla.por_categoria.iter()) {
            wtr.write_record([
                c.label.clone(),
                c.nivel.clone(),
                format!("{}", c.limite_horas),
                c.total.to_string(),
                c.dentro_sla.to_string(),
                c.fora_sla.to_string(),
                format!("{:.2}", c.percentual_sla),
            ])?;
        }
        tables.push(("sla", finish(wtr)?));

        let mut wtr = writer();
        wtr.write_record([
            "Categoria",
            "Complexidade",
            "Limite_horas",
            "Total",
            "TTR_medio_horas",
            "TTR_mediano_horas",
            "Percentual_SLA",
        ])?;
        for c in model.categoria_ttr_sla() {
            wtr.write_record([
                c.categoria,
                c.nivel,
                format!("{}", c.limite_horas),
                c.total.to_string(),
                c.media_horas.map(|h| format!("{:.2}", h)).unwrap_or_default(),
                c.mediana_horas.map(|h| format!("{:.2}", h)).unwrap_or_default(),
                format!("{:.2}", c.percentual_sla),
            ])?;
        }
        tables.push(("categoria_ttr_sla", finish(wtr)?));
    }

    if let Some(grupos) = model.ttr.as_ref().and_then(|t| t.por_grupo.as_ref()) {
        let mut wtr = writer();
        wtr.write_record(["Grupo", "Quantidade", "Media_horas", "Mediana_horas"])?;
        for g in grupos {
            wtr.write_record([
                g.label.clone(),
                g.quantidade.to_string(),
                format!("{:.2}", g.media_horas),
                format!("{:.2}", g.mediana_horas),
            ])?;
        }
        tables.push(("ttr_grupos", finish(wtr)?));
    }

    let mut wtr = writer();
    wtr.write_record(["Faixa", "Quantidade", "Percentual"])?;
    for f in &model.backlog_age.faixas {
        wtr.write_record([
            f.label.clone(),
            f.quantidade.to_string(),
            format!("{:.2}", f.percentual),
        ])?;
    }
    tables.push(("backlog", finish(wtr)?));

    let i = &model.integrity;
    let mut wtr = writer();
    wtr.write_record(["Indicador", "Valor"])?;
    let rows: [(&str, usize); 10] = [
        ("Total de tickets", i.total_tickets),
        ("Resolvidos", i.total_resolvidos),
        ("Em aberto", i.tickets_abertos),
        ("Sem categoria", i.tickets_sem_categoria),
        ("Sem técnico", i.tickets_sem_tecnico),
        ("Sem grupo", i.tickets_sem_grupo),
        ("TTR válidos", i.ttr_validos),
        ("TTR inválidos", i.ttr_invalidos),
        ("Consolidado por categoria", i.tickets_categoria_consolidado),
        ("Consolidado por complexidade", i.tickets_complexidade_consolidado),
    ];
    for (label, value) in rows {
        wtr.write_record([label.to_string(), value.to_string()])?;
    }
    for alerta in &i.alertas {
        wtr.write_record(["Alerta".to_string(), alerta.clone()])?;
    }
    tables.push(("integridade", finish(wtr)?));

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{build_metrics, AnalysisContext};
    use crate::parser::deserializers::parse_any_datetime;
    use crate::parser::types::{EnrichedTicket, FieldAvailability};

    fn ticket(id: &str, status: &str, tecnico: &str) -> EnrichedTicket {
        EnrichedTicket {
            id: id.into(),
            titulo: String::new(),
            entidade: "Sede, Centro".into(),
            status: status.into(),
            ultima_atualizacao: "02/01/2025 08:00:00".into(),
            data_abertura: "01/01/2025 08:00:00".into(),
            requerente: String::new(),
            tecnico_atribuido: tecnico.into(),
            grupo_tecnico: "N1".into(),
            categoria: "WIFI".into(),
            localizacao: String::new(),
            descricao: String::new(),
            data_solucao: None,
        }
    }

    fn ctx(availability: FieldAvailability) -> AnalysisContext {
        AnalysisContext {
            fonte: "t".into(),
            periodo: None,
            availability,
            now: parse_any_datetime("10/01/2025 00:00:00").unwrap(),
        }
    }

    #[test]
    fn test_all_tables_present() {
        let tickets = vec![ticket("1", "Fechado", "Ana"), ticket("2", "Novo", "Ana")];
        let model = build_metrics(&tickets, &ctx(FieldAvailability::all()));
        let tables = metric_tables(&model).unwrap();
        let names: Vec<&str> = tables.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "status",
                "entidades",
                "tecnicos",
                "sla",
                "categoria_ttr_sla",
                "ttr_grupos",
                "backlog",
                "integridade"
            ]
        );

        let table = |name: &str| {
            let (_, bytes) = tables.iter().find(|(n, _)| *n == name).unwrap();
            String::from_utf8(bytes.clone()).unwrap()
        };
        assert!(table("entidades").contains("\"Sede, Centro\",2,100.00"));
        assert!(table("integridade").contains("Total de tickets,2"));
        // WIFI: 24h TTR, BAIXA tier (72h)
        assert!(table("categoria_ttr_sla").contains("WIFI,BAIXA,72,1,24.00,24.00,100.00"));
        let backlog = table("backlog");
        assert_eq!(backlog.lines().count(), 6);
        assert!(backlog.lines().any(|l| l.ends_with(",1,100.00")));
    }

    #[test]
    fn test_skipped_submetrics_drop_tables() {
        let mut av = FieldAvailability::all();
        av.tecnico = false;
        av.categoria = false;
        let model = build_metrics(&[ticket("1", "Fechado", "Ana")], &ctx(av));
        let names: Vec<&str> = metric_tables(&model)
            .unwrap()
            .iter()
            .map(|(n, _)| *n)
            .collect();
        assert_eq!(
            names,
            vec!["status", "entidades", "ttr_grupos", "backlog", "integridade"]
        );
    }
}

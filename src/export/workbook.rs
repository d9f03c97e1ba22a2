use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::analyzer::distribution::Distribuicao;
use crate::analyzer::MetricsModel;
use crate::error::AppError;
use crate::export::{
    apply_compliance_conditional_format, create_header_format, create_integer_format,
    create_number_format, create_percent_format, xlsx_err,
};

/// Metrics workbook as bytes. Sheets: Resumo, Status, SLA, TTR x SLA,
/// TTR por grupo, Backlog, Integridade.
pub fn generate_metrics_workbook(model: &MetricsModel) -> Result<Vec<u8>, AppError> {
    let mut wb = build_workbook(model).map_err(xlsx_err)?;
    wb.save_to_buffer().map_err(xlsx_err)
}

fn build_workbook(model: &MetricsModel) -> Result<Workbook, XlsxError> {
    let mut wb = Workbook::new();
    write_resumo(&mut wb, model)?;
    write_status(&mut wb, &model.general.status)?;
    write_sla(&mut wb, model)?;
    write_categoria_ttr_sla(&mut wb, model)?;
    write_ttr_grupos(&mut wb, model)?;
    write_backlog(&mut wb, model)?;
    write_integridade(&mut wb, model)?;
    Ok(wb)
}

fn write_headers(ws: &mut Worksheet, headers: &[&str], hdr: &Format) -> Result<(), XlsxError> {
    for (col, h) in headers.iter().enumerate() {
        ws.write_with_format(0, col as u16, *h, hdr)?;
    }
    Ok(())
}

// ── Sheet 1: Resumo ──────────────────────────────────────────────────────────

fn write_resumo(wb: &mut Workbook, m: &MetricsModel) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("Resumo")?;

    let hdr = create_header_format();
    let num = create_number_format();

    write_headers(ws, &["Indicador", "Valor"], &hdr)?;

    let mut kpis: Vec<(&str, f64)> = vec![
        ("Total de tickets", m.general.total_tickets as f64),
        ("Resolvidos", m.general.resolvidos.quantidade as f64),
        ("Em aberto", m.general.abertos.quantidade as f64),
        ("Taxa de resolução (%)", m.general.resolvidos.percentual),
    ];
    if let Some(media) = m.temporal.media_diaria {
        kpis.push(("Média diária de abertura", media));
    }
    if let Some(est) = m.ttr.as_ref().and_then(|t| t.estatisticas.as_ref()) {
        kpis.push(("TTR médio (h)", est.media));
        kpis.push(("TTR mediano (h)", est.mediana));
        kpis.push(("TTR P90 (h)", est.p90));
    }
    if let Some(sla) = &m.sla {
        kpis.push(("Conformidade SLA (%)", sla.percentual_sla));
    }
    if let Some(media) = m.backlog_age.idade_media_horas {
        kpis.push(("Idade média do backlog (h)", media));
    }

    for (i, (label, val)) in kpis.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, 0, *label)?;
        ws.write_with_format(row, 1, *val, &num)?;
    }

    let info_row = (kpis.len() + 2) as u32;
    ws.write(info_row, 0, "Fonte")?;
    ws.write(info_row, 1, m.metadata.fonte.as_str())?;
    ws.write(info_row + 1, 0, "Data da análise")?;
    ws.write(info_row + 1, 1, m.metadata.data_analise.as_str())?;
    if let Some(periodo) = &m.metadata.periodo {
        ws.write(info_row + 2, 0, "Período")?;
        ws.write(info_row + 2, 1, periodo.as_str())?;
    }

    ws.set_column_width(0, 30)?;
    ws.set_column_width(1, 24)?;
    Ok(())
}

// ── Sheet 2: Status ──────────────────────────────────────────────────────────

fn write_status(wb: &mut Workbook, d: &Distribuicao) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("Status")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let pct = create_percent_format();

    write_headers(ws, &["Status", "Tickets", "%"], &hdr)?;
    for (i, item) in d.itens.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, 0, item.label.as_str())?;
        ws.write_with_format(row, 1, item.quantidade as f64, &int)?;
        ws.write_with_format(row, 2, item.percentual / 100.0, &pct)?;
    }

    ws.set_column_width(0, 28)?;
    ws.set_column_width(1, 12)?;
    ws.set_column_width(2, 10)?;
    Ok(())
}

// ── Sheet 3: SLA ─────────────────────────────────────────────────────────────

fn write_sla(wb: &mut Workbook, m: &MetricsModel) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("SLA")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let pct = create_percent_format();

    let headers = [
        "Categoria / Complexidade",
        "Complexidade",
        "Limite (h)",
        "Total",
        "Dentro",
        "Fora",
        "Conformidade",
    ];
    write_headers(ws, &headers, &hdr)?;

    let Some(sla) = &m.sla else {
        ws.write(1, 0, "SLA não calculado: categoria ou datas ausentes")?;
        return Ok(());
    };

    let rows: Vec<_> = sla
        .por_complexidade
        .iter()
        .chain(sla.por_categoria.iter())
        .collect();
    for (i, c) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, 0, c.label.as_str())?;
        ws.write(row, 1, c.nivel.as_str())?;
        ws.write_with_format(row, 2, c.limite_horas, &int)?;
        ws.write_with_format(row, 3, c.total as f64, &int)?;
        ws.write_with_format(row, 4, c.dentro_sla as f64, &int)?;
        ws.write_with_format(row, 5, c.fora_sla as f64, &int)?;
        ws.write_with_format(row, 6, c.percentual_sla / 100.0, &pct)?;
    }

    if !rows.is_empty() {
        let last_row = rows.len() as u32;
        ws.set_freeze_panes(1, 0)?;
        ws.autofilter(0, 0, last_row, (headers.len() - 1) as u16)?;
        apply_compliance_conditional_format(ws, 1, 6, last_row)?;
    }

    ws.set_column_width(0, 30)?;
    ws.set_column_width(1, 14)?;
    for col in 2..=6u16 {
        ws.set_column_width(col, 12)?;
    }
    Ok(())
}

// ── Sheet 4: TTR x SLA por categoria ────────────────────────────────────────

fn write_categoria_ttr_sla(wb: &mut Workbook, m: &MetricsModel) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("TTR x SLA")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let num = create_number_format();
    let pct = create_percent_format();

    let headers = [
        "Categoria",
        "Complexidade",
        "Limite (h)",
        "Tickets",
        "TTR médio (h)",
        "TTR mediano (h)",
        "Conformidade",
    ];
    write_headers(ws, &headers, &hdr)?;

    let linhas = m.categoria_ttr_sla();
    for (i, c) in linhas.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, 0, c.categoria.as_str())?;
        ws.write(row, 1, c.nivel.as_str())?;
        ws.write_with_format(row, 2, c.limite_horas, &int)?;
        ws.write_with_format(row, 3, c.total as f64, &int)?;
        if let Some(h) = c.media_horas {
            ws.write_with_format(row, 4, h, &num)?;
        }
        if let Some(h) = c.mediana_horas {
            ws.write_with_format(row, 5, h, &num)?;
        }
        ws.write_with_format(row, 6, c.percentual_sla / 100.0, &pct)?;
    }

    if !linhas.is_empty() {
        let last_row = linhas.len() as u32;
        ws.set_freeze_panes(1, 0)?;
        apply_compliance_conditional_format(ws, 1, 6, last_row)?;
    }

    ws.set_column_width(0, 30)?;
    ws.set_column_width(1, 14)?;
    for col in 2..=6u16 {
        ws.set_column_width(col, 14)?;
    }
    Ok(())
}

// ── Sheet 5: TTR por grupo ───────────────────────────────────────────────────

fn write_ttr_grupos(wb: &mut Workbook, m: &MetricsModel) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("TTR por grupo")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let num = create_number_format();

    let headers = ["Grupo", "Tickets", "Média (h)", "Mediana (h)"];
    write_headers(ws, &headers, &hdr)?;

    let grupos = m
        .ttr
        .as_ref()
        .and_then(|t| t.por_grupo.as_deref())
        .unwrap_or(&[]);
    for (i, g) in grupos.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, 0, g.label.as_str())?;
        ws.write_with_format(row, 1, g.quantidade as f64, &int)?;
        ws.write_with_format(row, 2, g.media_horas, &num)?;
        ws.write_with_format(row, 3, g.mediana_horas, &num)?;
    }

    if !grupos.is_empty() {
        ws.set_freeze_panes(1, 0)?;
        ws.autofilter(0, 0, grupos.len() as u32, (headers.len() - 1) as u16)?;
    }

    ws.set_column_width(0, 30)?;
    ws.set_column_width(1, 12)?;
    ws.set_column_width(2, 12)?;
    ws.set_column_width(3, 12)?;
    Ok(())
}

// ── Sheet 6: Backlog ─────────────────────────────────────────────────────────

fn write_backlog(wb: &mut Workbook, m: &MetricsModel) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("Backlog")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let num = create_number_format();
    let pct = create_percent_format();
    let b = &m.backlog_age;

    write_headers(ws, &["Idade", "Tickets", "%"], &hdr)?;
    for (i, f) in b.faixas.iter().enumerate() {
        let row = (i + 1) as u32;
        ws.write(row, 0, f.label.as_str())?;
        ws.write_with_format(row, 1, f.quantidade as f64, &int)?;
        ws.write_with_format(row, 2, f.percentual / 100.0, &pct)?;
    }

    let mut row = (b.faixas.len() + 2) as u32;
    ws.write(row, 0, "Tickets em aberto")?;
    ws.write_with_format(row, 1, b.tickets_abertos as f64, &int)?;
    for (label, valor) in [
        ("Idade média (h)", b.idade_media_horas),
        ("Idade mediana (h)", b.idade_mediana_horas),
        ("Idade máxima (h)", b.idade_maxima_horas),
    ] {
        if let Some(v) = valor {
            row += 1;
            ws.write(row, 0, label)?;
            ws.write_with_format(row, 1, v, &num)?;
        }
    }

    ws.set_column_width(0, 24)?;
    ws.set_column_width(1, 12)?;
    ws.set_column_width(2, 10)?;
    Ok(())
}

// ── Sheet 7: Integridade ─────────────────────────────────────────────────────

fn write_integridade(wb: &mut Workbook, m: &MetricsModel) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("Integridade")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let pct = create_percent_format();
    let i = &m.integrity;

    write_headers(ws, &["Indicador", "Valor"], &hdr)?;
    let rows: [(&str, usize); 8] = [
        ("Total de tickets", i.total_tickets),
        ("Resolvidos", i.total_resolvidos),
        ("Em aberto", i.tickets_abertos),
        ("Sem categoria", i.tickets_sem_categoria),
        ("Sem técnico", i.tickets_sem_tecnico),
        ("Sem grupo", i.tickets_sem_grupo),
        ("TTR válidos", i.ttr_validos),
        ("TTR inválidos", i.ttr_invalidos),
    ];
    for (idx, (label, value)) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        ws.write(row, 0, *label)?;
        ws.write_with_format(row, 1, *value as f64, &int)?;
    }

    let mut row = (rows.len() + 2) as u32;
    ws.write_with_format(row, 0, "Exclusão", &hdr)?;
    ws.write_with_format(row, 1, "Tickets", &hdr)?;
    ws.write_with_format(row, 2, "%", &hdr)?;
    for e in &i.exclusoes {
        row += 1;
        ws.write(row, 0, e.motivo.as_str())?;
        ws.write_with_format(row, 1, e.quantidade as f64, &int)?;
        ws.write_with_format(row, 2, e.percentual / 100.0, &pct)?;
    }

    if !i.alertas.is_empty() {
        row += 2;
        ws.write_with_format(row, 0, "Alertas", &hdr)?;
        for alerta in &i.alertas {
            row += 1;
            ws.write(row, 0, alerta.as_str())?;
        }
    }

    ws.set_column_width(0, 60)?;
    ws.set_column_width(1, 12)?;
    ws.set_column_width(2, 10)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{build_metrics, AnalysisContext};
    use crate::parser::deserializers::parse_any_datetime;
    use crate::parser::types::{EnrichedTicket, FieldAvailability};

    fn ticket(id: &str, status: &str, categoria: &str) -> EnrichedTicket {
        EnrichedTicket {
            id: id.into(),
            titulo: String::new(),
            entidade: "Sede".into(),
            status: status.into(),
            ultima_atualizacao: "01/01/2025 10:00:00".into(),
            data_abertura: "01/01/2025 08:00:00".into(),
            requerente: String::new(),
            tecnico_atribuido: "Ana".into(),
            grupo_tecnico: "N1".into(),
            categoria: categoria.into(),
            localizacao: String::new(),
            descricao: String::new(),
            data_solucao: None,
        }
    }

    fn ctx(availability: FieldAvailability) -> AnalysisContext {
        AnalysisContext {
            fonte: "t".into(),
            periodo: Some("ultimo_mes".into()),
            availability,
            now: parse_any_datetime("10/01/2025 00:00:00").unwrap(),
        }
    }

    #[test]
    fn test_workbook_is_xlsx() {
        let tickets = vec![
            ticket("1", "Fechado", "WIFI"),
            ticket("2", "Novo", "Sem Categoria"),
            ticket("3", "Solucionado", "Reset de Senha"),
        ];
        let model = build_metrics(&tickets, &ctx(FieldAvailability::all()));
        let bytes = generate_metrics_workbook(&model).unwrap();
        // XLSX is a zip container
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_workbook_sheets() {
        let tickets = vec![ticket("1", "Fechado", "WIFI"), ticket("2", "Novo", "WIFI")];
        let model = build_metrics(&tickets, &ctx(FieldAvailability::all()));
        let mut wb = build_workbook(&model).unwrap();
        for name in [
            "Resumo",
            "Status",
            "SLA",
            "TTR x SLA",
            "TTR por grupo",
            "Backlog",
            "Integridade",
        ] {
            assert!(wb.worksheet_from_name(name).is_ok(), "missing sheet {}", name);
        }
    }

    #[test]
    fn test_workbook_without_sla() {
        let mut av = FieldAvailability::all();
        av.categoria = false;
        let model = build_metrics(&[ticket("1", "Fechado", "")], &ctx(av));
        assert!(model.sla.is_none());
        let bytes = generate_metrics_workbook(&model).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }
}

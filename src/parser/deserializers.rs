use chrono::{NaiveDate, NaiveDateTime};

/// Remote GLPI representation.
pub const GLPI_DT_FMT: &str = "%Y-%m-%d %H:%M:%S";
pub const GLPI_DATE_FMT: &str = "%Y-%m-%d";

/// Canonical representation written to the flat ticket table.
pub const CANONICAL_DT_FMT: &str = "%d/%m/%Y %H:%M:%S";
pub const CANONICAL_DATE_FMT: &str = "%d/%m/%Y";

/// Parse the GLPI creation timestamp (`YYYY-MM-DD HH:MM:SS`).
/// Returns None for empty or unparseable strings.
pub fn parse_glpi_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, GLPI_DT_FMT).ok()
}

/// Parse any timestamp the pipeline may carry: canonical (`DD/MM/YYYY[ HH:MM:SS]`)
/// or remote (`YYYY-MM-DD[ HH:MM:SS]`, also with a `T` separator).
/// Date-only values are taken at midnight.
pub fn parse_any_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    const DT_FORMATS: &[&str] = &[
        CANONICAL_DT_FMT,
        GLPI_DT_FMT,
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%Y-%m-%d %H:%M",
    ];
    const DATE_FORMATS: &[&str] = &[CANONICAL_DATE_FMT, GLPI_DATE_FMT];

    DT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Reformat a remote date to the canonical form.
/// "" and "NULL" become ""; anything unparseable passes through unchanged.
pub fn format_glpi_date(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return String::new();
    }
    if trimmed.contains(' ') {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, GLPI_DT_FMT) {
            return dt.format(CANONICAL_DT_FMT).to_string();
        }
    } else if let Ok(d) = NaiveDate::parse_from_str(trimmed, GLPI_DATE_FMT) {
        return d.format(CANONICAL_DATE_FMT).to_string();
    }
    s.to_string()
}

/// Serde-compatible deserializers for GLPI JSON rows, where the same field
/// may arrive as a number, a string or null depending on the server version.
pub mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// 42 / "42" → "42" (obrigatório, não vazio)
    pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value_to_string(value) {
            Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            _ => Err(serde::de::Error::custom("id ausente ou vazio")),
        }
    }

    /// null → None, "x" → Some("x"), 3 → Some("3")
    pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(value_to_string))
    }

    /// null → None, 5 → Some(5), "5" → Some(5), "abc" → None
    pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
    }
}

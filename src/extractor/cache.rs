use std::collections::HashMap;

use serde_json::Value;

use crate::error::ExtractionError;
use crate::glpi::{GlpiSession, GlpiTransport};

pub const SEM_ENTIDADE: &str = "Sem Entidade";
pub const SEM_CATEGORIA: &str = "Sem Categoria";
pub const SEM_LOCALIZACAO: &str = "Sem Localização";

/// Lookup entities cached once per extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    User,
    Entity,
    Category,
    Location,
    Group,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 5] = [
        ReferenceKind::User,
        ReferenceKind::Entity,
        ReferenceKind::Category,
        ReferenceKind::Location,
        ReferenceKind::Group,
    ];

    pub fn endpoint(&self) -> &'static str {
        match self {
            ReferenceKind::User => "User",
            ReferenceKind::Entity => "Entity",
            ReferenceKind::Category => "ITILCategory",
            ReferenceKind::Location => "Location",
            ReferenceKind::Group => "Group",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReferenceKind::User => "usuários",
            ReferenceKind::Entity => "entidades",
            ReferenceKind::Category => "categorias",
            ReferenceKind::Location => "localizações",
            ReferenceKind::Group => "grupos",
        }
    }

    /// Display name of one reference row. Users are `firstname realname`,
    /// falling back to `Usuário {id}` when both are blank.
    fn display_name(&self, id: &str, row: &Value) -> Option<String> {
        match self {
            ReferenceKind::User => {
                let first = row.get("firstname").and_then(Value::as_str).unwrap_or("");
                let last = row.get("realname").and_then(Value::as_str).unwrap_or("");
                let full = format!("{} {}", first.trim(), last.trim()).trim().to_string();
                if full.is_empty() {
                    Some(format!("Usuário {}", id))
                } else {
                    Some(full)
                }
            }
            _ => row
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// `id → display name` per reference kind. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCache {
    users: HashMap<String, String>,
    entities: HashMap<String, String>,
    categories: HashMap<String, String>,
    locations: HashMap<String, String>,
    groups: HashMap<String, String>,
}

impl ReferenceCache {
    /// Load every kind. A failing kind is logged and left empty; the others
    /// are still loaded.
    pub fn load<T: GlpiTransport + ?Sized>(session: &GlpiSession<'_, T>, page_size: usize) -> Self {
        let mut cache = ReferenceCache::default();
        for kind in ReferenceKind::ALL {
            match load_kind(session, kind, page_size) {
                Ok(map) => {
                    log::info!("{} {} carregados", map.len(), kind.label());
                    *cache.map_mut(kind) = map;
                }
                Err(e) => {
                    log::error!("Falha ao carregar {}: {} (usando valores padrão)", kind.label(), e);
                }
            }
        }
        cache
    }

    fn map(&self, kind: ReferenceKind) -> &HashMap<String, String> {
        match kind {
            ReferenceKind::User => &self.users,
            ReferenceKind::Entity => &self.entities,
            ReferenceKind::Category => &self.categories,
            ReferenceKind::Location => &self.locations,
            ReferenceKind::Group => &self.groups,
        }
    }

    fn map_mut(&mut self, kind: ReferenceKind) -> &mut HashMap<String, String> {
        match kind {
            ReferenceKind::User => &mut self.users,
            ReferenceKind::Entity => &mut self.entities,
            ReferenceKind::Category => &mut self.categories,
            ReferenceKind::Location => &mut self.locations,
            ReferenceKind::Group => &mut self.groups,
        }
    }

    pub fn insert(&mut self, kind: ReferenceKind, id: &str, name: &str) {
        self.map_mut(kind).insert(id.to_string(), name.to_string());
    }

    pub fn len(&self, kind: ReferenceKind) -> usize {
        self.map(kind).len()
    }

    pub fn lookup(&self, kind: ReferenceKind, id: Option<&str>) -> Option<&str> {
        id.map(str::trim)
            .and_then(|id| self.map(kind).get(id))
            .map(String::as_str)
    }

    pub fn entity_name(&self, id: Option<&str>) -> String {
        self.lookup(ReferenceKind::Entity, id)
            .unwrap_or(SEM_ENTIDADE)
            .to_string()
    }

    pub fn category_name(&self, id: Option<&str>) -> String {
        self.lookup(ReferenceKind::Category, id)
            .unwrap_or(SEM_CATEGORIA)
            .to_string()
    }

    pub fn location_name(&self, id: Option<&str>) -> String {
        self.lookup(ReferenceKind::Location, id)
            .unwrap_or(SEM_LOCALIZACAO)
            .to_string()
    }

    pub fn user_name(&self, id: &str) -> String {
        self.lookup(ReferenceKind::User, Some(id))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Usuário {}", id))
    }

    pub fn group_name(&self, id: &str) -> String {
        self.lookup(ReferenceKind::Group, Some(id))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Grupo {}", id))
    }
}

/// Page through one reference endpoint until a short page.
///
/// A non-2xx answer ends the loop and keeps what was merged so far;
/// transport and decode errors discard the kind entirely.
fn load_kind<T: GlpiTransport + ?Sized>(
    session: &GlpiSession<'_, T>,
    kind: ReferenceKind,
    page_size: usize,
) -> Result<HashMap<String, String>, ExtractionError> {
    let mut map = HashMap::new();
    let mut start = 0usize;

    loop {
        let range = format!("{}-{}", start, start + page_size - 1);
        let rows = match session.get_rows(kind.endpoint(), &[("range", range)]) {
            Ok(rows) => rows,
            Err(ExtractionError::Status { status, .. }) => {
                log::warn!(
                    "HTTP {} ao buscar {} (faixa a partir de {}), interrompendo",
                    status,
                    kind.label(),
                    start
                );
                break;
            }
            Err(e) => return Err(e),
        };

        let count = rows.len();
        for row in &rows {
            if let Some(id) = row_id(row) {
                if let Some(name) = kind.display_name(&id, row) {
                    map.insert(id, name);
                }
            }
        }

        if count < page_size {
            break;
        }
        start += page_size;
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glpi::FakeTransport;
    use serde_json::json;

    fn open(fake: &FakeTransport) -> GlpiSession<'_, FakeTransport> {
        GlpiSession::open(fake, "app", "user").unwrap()
    }

    #[test]
    fn test_user_display_names() {
        let row = json!({"id": 3, "firstname": " Ana ", "realname": "Souza"});
        assert_eq!(ReferenceKind::User.display_name("3", &row).unwrap(), "Ana Souza");

        let only_last = json!({"id": 4, "firstname": null, "realname": "Lima"});
        assert_eq!(ReferenceKind::User.display_name("4", &only_last).unwrap(), "Lima");

        let blank = json!({"id": 5, "firstname": "", "realname": ""});
        assert_eq!(ReferenceKind::User.display_name("5", &blank).unwrap(), "Usuário 5");
    }

    #[test]
    fn test_sentinels_on_miss() {
        let mut cache = ReferenceCache::default();
        cache.insert(ReferenceKind::Entity, "1", "Sede");
        assert_eq!(cache.entity_name(Some("1")), "Sede");
        assert_eq!(cache.entity_name(Some("99")), "Sem Entidade");
        assert_eq!(cache.entity_name(None), "Sem Entidade");
        assert_eq!(cache.category_name(Some("0")), "Sem Categoria");
        assert_eq!(cache.location_name(None), "Sem Localização");
        assert_eq!(cache.user_name("8"), "Usuário 8");
        assert_eq!(cache.group_name("9"), "Grupo 9");
    }

    #[test]
    fn test_load_pages_until_short_page() {
        let fake = FakeTransport::new().with_session("t");
        fake.push_json("User", 206, json!([
            {"id": 1, "firstname": "Ana", "realname": "Souza"},
            {"id": 2, "firstname": "Bruno", "realname": "Reis"}
        ]));
        fake.push_json("User", 200, json!([{"id": 3, "firstname": "Caio", "realname": ""}]));
        fake.push_json("Entity", 200, json!([{"id": 0, "name": "Raiz"}]));

        let session = open(&fake);
        let cache = ReferenceCache::load(&session, 2);
        drop(session);

        assert_eq!(cache.len(ReferenceKind::User), 3);
        assert_eq!(cache.user_name("3"), "Caio");
        assert_eq!(fake.calls_to("User"), 2);
        assert_eq!(cache.entity_name(Some("0")), "Raiz");

        let user_ranges: Vec<String> = fake
            .requests()
            .iter()
            .filter(|r| r.path == "User")
            .filter_map(|r| r.query_value("range").map(str::to_string))
            .collect();
        assert_eq!(user_ranges, vec!["0-1", "2-3"]);
    }

    #[test]
    fn test_failing_kind_does_not_abort_others() {
        let fake = FakeTransport::new().with_session("t");
        fake.push(
            "Entity",
            Err(ExtractionError::Transport("conexão recusada".into())),
        );
        fake.push_json("ITILCategory", 200, json!([{"id": 12, "name": "WIFI"}]));
        fake.push_json("Group", 200, json!([{"id": 7, "name": "Suporte N1"}]));

        let session = open(&fake);
        let cache = ReferenceCache::load(&session, 1000);

        assert_eq!(cache.len(ReferenceKind::Entity), 0);
        assert_eq!(cache.entity_name(Some("1")), "Sem Entidade");
        assert_eq!(cache.category_name(Some("12")), "WIFI");
        assert_eq!(cache.group_name("7"), "Suporte N1");
    }

    #[test]
    fn test_decode_error_empties_partially_loaded_kind() {
        let fake = FakeTransport::new().with_session("t");
        fake.push_json("Location", 200, json!([{"id": 1, "name": "A"}]));
        fake.push("Location", Ok(crate::glpi::ApiResponse::new(200, "<html>")));

        let session = open(&fake);
        let cache = ReferenceCache::load(&session, 1);
        assert_eq!(cache.len(ReferenceKind::Location), 0);
    }

    #[test]
    fn test_status_error_keeps_loaded_pages() {
        let fake = FakeTransport::new().with_session("t");
        fake.push_json("Group", 200, json!([{"id": 1, "name": "A"}]));
        fake.push_json("Group", 500, json!([]));

        let session = open(&fake);
        let cache = ReferenceCache::load(&session, 1);
        assert_eq!(cache.len(ReferenceKind::Group), 1);
        assert_eq!(fake.calls_to("Group"), 2);
    }
}

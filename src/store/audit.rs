use std::sync::RwLock;

use chrono::Utc;
use cyder_tools::log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::Display;

use super::ListResult;
use crate::utils::ID_GENERATOR;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    Login,
    Logout,
    Create,
    Update,
    Delete,
    ToggleFeatured,
    UpdateStatus,
    UpdatePermissions,
    UpdateConfiguration,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityType {
    Admin,
    Category,
    Provider,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub admin_id: i64,
    pub action: AuditAction,
    pub details: String,
    pub timestamp: i64,
    pub entity_type: EntityType,
    pub entity_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<FieldChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQueryPayload {
    pub entity_type: Option<EntityType>,
    pub action: Option<AuditAction>,
    pub admin_id: Option<i64>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Field-level diff of two records: one entry per field of the new record,
/// compared by deep equality against the old one. No-change entries are
/// kept here and filtered out at display time.
pub fn diff_records<T: Serialize>(old: &T, new: &T) -> Vec<FieldChange> {
    let old_value = serde_json::to_value(old).unwrap_or(Value::Null);
    let new_value = serde_json::to_value(new).unwrap_or(Value::Null);

    let (Value::Object(old_map), Value::Object(new_map)) = (old_value, new_value) else {
        return Vec::new();
    };

    new_map
        .into_iter()
        .map(|(field, after)| FieldChange {
            before: old_map.get(&field).cloned().unwrap_or(Value::Null),
            after,
            field,
        })
        .collect()
}

/// Append-only, newest-first record of admin mutations. Recording is a
/// best-effort side effect: it never blocks or fails the mutation that
/// triggered it.
pub struct AuditTrail {
    entries: RwLock<Vec<AuditLog>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn push(&self, entry: AuditLog) {
        match self.entries.write() {
            Ok(mut entries) => entries.insert(0, entry),
            Err(e) => warn!("failed to record audit log entry: {}", e),
        }
    }

    fn record(
        &self,
        action: AuditAction,
        admin_id: i64,
        entity_type: EntityType,
        entity_id: i64,
        details: String,
        changes: Option<Vec<FieldChange>>,
        metadata: Option<Map<String, Value>>,
    ) {
        self.push(AuditLog {
            id: ID_GENERATOR.generate_id(),
            admin_id,
            action,
            details,
            timestamp: Utc::now().timestamp_millis(),
            entity_type,
            entity_id,
            changes,
            metadata,
        });
    }

    pub fn record_create(
        &self,
        admin_id: i64,
        entity_type: EntityType,
        entity_id: i64,
        details: String,
        metadata: Map<String, Value>,
    ) {
        self.record(
            AuditAction::Create,
            admin_id,
            entity_type,
            entity_id,
            details,
            None,
            Some(metadata),
        );
    }

    pub fn record_update<T: Serialize>(
        &self,
        admin_id: i64,
        entity_type: EntityType,
        entity_id: i64,
        details: String,
        old: &T,
        new: &T,
    ) {
        self.record(
            AuditAction::Update,
            admin_id,
            entity_type,
            entity_id,
            details,
            Some(diff_records(old, new)),
            None,
        );
    }

    pub fn record_delete(
        &self,
        admin_id: i64,
        entity_type: EntityType,
        entity_id: i64,
        details: String,
        metadata: Map<String, Value>,
    ) {
        self.record(
            AuditAction::Delete,
            admin_id,
            entity_type,
            entity_id,
            details,
            None,
            Some(metadata),
        );
    }

    /// Records one of the narrower mutation actions (featured toggle,
    /// status or permission updates).
    pub fn record_action(
        &self,
        action: AuditAction,
        admin_id: i64,
        entity_type: EntityType,
        entity_id: i64,
        details: String,
        metadata: Map<String, Value>,
    ) {
        self.record(
            action,
            admin_id,
            entity_type,
            entity_id,
            details,
            None,
            Some(metadata),
        );
    }

    pub fn get_by_id(&self, id: i64) -> Option<AuditLog> {
        self.entries
            .read()
            .ok()?
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    pub fn list(&self, payload: &AuditLogQueryPayload) -> ListResult<AuditLog> {
        let entries = match self.entries.read() {
            Ok(entries) => entries.clone(),
            Err(e) => {
                warn!("failed to read audit log entries: {}", e);
                Vec::new()
            }
        };

        let filtered: Vec<AuditLog> = entries
            .into_iter()
            .filter(|entry| {
                payload
                    .entity_type
                    .map_or(true, |t| entry.entity_type == t)
                    && payload.action.map_or(true, |a| entry.action == a)
                    && payload.admin_id.map_or(true, |id| entry.admin_id == id)
                    && payload.search.as_deref().map_or(true, |needle| {
                        entry
                            .details
                            .to_lowercase()
                            .contains(&needle.to_lowercase())
                    })
            })
            .collect();

        ListResult::paginate(filtered, payload.page, payload.page_size)
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        count: i64,
    }

    fn metadata(name: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), json!(name));
        map
    }

    #[test]
    fn test_entries_are_newest_first() {
        let trail = AuditTrail::new();
        trail.record_create(1, EntityType::Provider, 10, "first".to_string(), metadata("a"));
        trail.record_create(1, EntityType::Provider, 11, "second".to_string(), metadata("b"));

        let page = trail.list(&AuditLogQueryPayload::default());
        assert_eq!(page.items()[0].details, "second");
        assert_eq!(page.items()[1].details, "first");
    }

    #[test]
    fn test_diff_keeps_no_op_entries() {
        let old = Sample {
            name: "a".to_string(),
            count: 1,
        };
        let new = Sample {
            name: "a".to_string(),
            count: 2,
        };

        let changes = diff_records(&old, &new);
        assert_eq!(changes.len(), 2);
        let name_change = changes.iter().find(|c| c.field == "name").unwrap();
        assert_eq!(name_change.before, name_change.after);
        let count_change = changes.iter().find(|c| c.field == "count").unwrap();
        assert_eq!(count_change.before, json!(1));
        assert_eq!(count_change.after, json!(2));
    }

    #[test]
    fn test_list_filters_are_conjunctive() {
        let trail = AuditTrail::new();
        trail.record_create(1, EntityType::Provider, 10, "Created API: GPT-4".to_string(), metadata("GPT-4"));
        trail.record_create(2, EntityType::Category, 20, "Created category: Text".to_string(), metadata("Text"));
        trail.record_delete(1, EntityType::Provider, 10, "Deleted API: GPT-4".to_string(), metadata("GPT-4"));

        let page = trail.list(&AuditLogQueryPayload {
            entity_type: Some(EntityType::Provider),
            action: Some(AuditAction::Create),
            ..Default::default()
        });
        assert_eq!(page.total(), 1);
        assert_eq!(page.items()[0].details, "Created API: GPT-4");
    }
}

//! Attribute-level change detection.
//!
//! Pure functions over JSON snapshots of an entity taken before and after a
//! mutation. Only keys present in the submitted payload are candidates, and
//! candidates are visited in payload order.

use serde_json::Value;

use super::fields::{lookup, FieldKind, ItemField, Tracked, TrackedField};
use super::AuditValue;
use crate::types::DbId;

/// Attribute map of an entity (or one of its sub-resources).
pub type Snapshot = serde_json::Map<String, Value>;

/// One detected attribute change.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDiff {
    pub attribute: String,
    pub old: AuditValue,
    pub new: AuditValue,
    /// Recorded even when `old == new` (secrets are never compared).
    pub forced: bool,
}

impl AttributeDiff {
    pub fn is_change(&self) -> bool {
        self.forced || self.old != self.new
    }
}

/// Before/after state of one item in a batch operation.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub id: DbId,
    pub before: Snapshot,
    pub after: Snapshot,
}

/// Compute the changed attributes for `payload` against `before` and `after`.
pub fn detect(
    table: &[Tracked],
    payload: &Snapshot,
    before: &Snapshot,
    after: &Snapshot,
) -> Vec<AttributeDiff> {
    let mut diffs = Vec::new();

    for (key, submitted) in payload {
        match lookup(table, key) {
            Some(Tracked::Field(field)) => {
                if let Some(diff) = diff_field(field, submitted, before, after) {
                    diffs.push(diff);
                }
            }
            Some(Tracked::Bag { container, fields }) => {
                let Value::Object(inner_payload) = submitted else {
                    continue;
                };
                let empty = Snapshot::new();
                let inner_before = nested(before, container).unwrap_or(&empty);
                let inner_after = nested(after, container).unwrap_or(&empty);

                for (inner_key, inner_submitted) in inner_payload {
                    let Some(field) = fields.iter().find(|f| f.input == inner_key.as_str()) else {
                        continue;
                    };
                    if let Some(diff) =
                        diff_field(field, inner_submitted, inner_before, inner_after)
                    {
                        diffs.push(diff);
                    }
                }
            }
            None => {}
        }
    }

    diffs
}

/// Compute one diff per item whose tracked field changed.
pub fn detect_items(item: &ItemField, items: &[ItemSnapshot]) -> Vec<AttributeDiff> {
    let attribute = item.attribute();
    let id_key = item.id_key();
    let value_key = item.value_key();

    items
        .iter()
        .filter_map(|snapshot| {
            let old = snapshot.before.get(item.field.stored).cloned().unwrap_or(Value::Null);
            let new = snapshot.after.get(item.field.stored).cloned().unwrap_or(Value::Null);
            if old == new {
                return None;
            }
            Some(AttributeDiff {
                attribute: attribute.clone(),
                old: AuditValue::Structured(item_value(&id_key, &value_key, snapshot.id, old)),
                new: AuditValue::Structured(item_value(&id_key, &value_key, snapshot.id, new)),
                forced: false,
            })
        })
        .collect()
}

fn diff_field(
    field: &TrackedField,
    submitted: &Value,
    before: &Snapshot,
    after: &Snapshot,
) -> Option<AttributeDiff> {
    if !field.is_submitted(submitted) {
        return None;
    }

    let old = field.render(before.get(field.stored));
    let new = field.render(after.get(field.stored));
    let forced = field.kind == FieldKind::Secret;
    if !forced && old == new {
        return None;
    }

    // Record a flag the way it was typed once the stored value confirms it.
    let new = field.as_submitted(submitted, &new).unwrap_or(new);
    Some(AttributeDiff {
        attribute: field.attribute.to_string(),
        old,
        new,
        forced,
    })
}

fn nested<'a>(snapshot: &'a Snapshot, container: &str) -> Option<&'a Snapshot> {
    match snapshot.get(container) {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn item_value(id_key: &str, value_key: &str, id: DbId, value: Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(id_key.to_string(), Value::from(id));
    map.insert(value_key.to_string(), value);
    Value::Object(map)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

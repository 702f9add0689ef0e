//! Audit trail vocabulary, change detection, and record building.
//!
//! Every successful mutation of a project (or one of its task settings) is
//! turned into one audit entry per changed attribute. Creation and deletion
//! are recorded as a single lifecycle marker on the `project` attribute.
//!
//! - [`fields`] -- the explicit tables of tracked attributes per entity.
//! - [`diff`] -- the change detector (pure).
//! - [`record`] -- turns diffs and lifecycle events into [`record::NewAuditEntry`].

pub mod diff;
pub mod fields;
pub mod record;

use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use diff::{detect, detect_items, AttributeDiff, ItemSnapshot, Snapshot};
pub use fields::{FieldKind, ItemField, Tracked, TrackedField, WhenAbsent};
pub use record::{build_lifecycle, build_update, AuditContext, LifecycleEvent, NewAuditEntry};

// ---------------------------------------------------------------------------
// Sentinel strings
// ---------------------------------------------------------------------------

/// Legacy sentinel strings persisted in `old_value` / `new_value`.
///
/// Consumers of the audit trail compare against these literally.
pub mod sentinels {
    /// The entity did not exist before the event.
    pub const NOTHING: &str = "Nothing";
    /// New value of the create lifecycle marker.
    pub const NEW_PROJECT: &str = "New project";
    /// Old value of the delete lifecycle marker.
    pub const SAVED: &str = "Saved";
    /// New value of the delete lifecycle marker.
    pub const DELETED: &str = "Deleted";
    /// The stored column was NULL.
    pub const NULL: &str = "null";
    /// The stored value was absent or empty.
    pub const EMPTY: &str = "";
}

/// Attribute name used by lifecycle markers.
pub const LIFECYCLE_ATTRIBUTE: &str = "project";

// ---------------------------------------------------------------------------
// Caller / action
// ---------------------------------------------------------------------------

/// Which interface triggered a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCaller {
    Api,
    Web,
}

impl AuditCaller {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditCaller::Api => "api",
            AuditCaller::Web => "web",
        }
    }
}

/// Kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditCaller {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(AuditCaller::Api),
            "web" => Ok(AuditCaller::Web),
            other => Err(AuditError::UnknownCaller(other.to_string())),
        }
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            other => Err(AuditError::UnknownAction(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// One side of an attribute change, before it is persisted.
///
/// The absence variants are kept apart internally and only collapse into the
/// legacy sentinel strings in [`AuditValue::to_stored`].
#[derive(Debug, Clone, PartialEq)]
pub enum AuditValue {
    /// The entity did not exist (`"Nothing"`).
    NoPriorEntity,
    /// The stored column was NULL (`"null"`).
    NullStoredValue,
    /// The stored value was absent or empty (`""`).
    EmptyStoredValue,
    /// An optional attribute that was never set; persisted as SQL NULL.
    Unset,
    /// A scalar rendered as text.
    Text(String),
    /// A structured value, persisted as canonical JSON.
    Structured(serde_json::Value),
}

impl AuditValue {
    /// Serialize to the exact string stored in the audit table.
    ///
    /// Structured values are written with object keys sorted so equal values
    /// always produce equal text.
    pub fn to_stored(&self) -> Result<Option<String>, AuditError> {
        let stored = match self {
            AuditValue::NoPriorEntity => Some(sentinels::NOTHING.to_string()),
            AuditValue::NullStoredValue => Some(sentinels::NULL.to_string()),
            AuditValue::EmptyStoredValue => Some(sentinels::EMPTY.to_string()),
            AuditValue::Unset => None,
            AuditValue::Text(text) => Some(text.clone()),
            AuditValue::Structured(value) => Some(canonical_json(value)?),
        };
        Ok(stored)
    }
}

/// Serialize a JSON value with object keys in sorted order.
///
/// Separators are `", "` and `": "`, e.g. `{"task_id": 1, "task_priority_0": 0.5}`.
/// Stored values are compared as exact strings, so this layout is fixed.
pub fn canonical_json(value: &serde_json::Value) -> Result<String, AuditError> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    sorted(value)
        .serialize(&mut serializer)
        .map_err(AuditError::Serialization)?;
    String::from_utf8(out).map_err(|e| AuditError::Encoding(e.to_string()))
}

/// Single-line JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn sorted(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, inner) in entries {
                out.insert(key.clone(), sorted(inner));
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(sorted).collect())
        }
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to serialize audit value: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Audit value is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Unknown audit caller: {0}")]
    UnknownCaller(String),

    #[error("Unknown audit action: {0}")]
    UnknownAction(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Tables of tracked attributes, one per mutation entry point.
//!
//! A payload key that does not appear in the relevant table is never diffed,
//! even if the stored entity has a column of that name.

use serde_json::Value;

use super::AuditValue;
use crate::scheduler;

/// How a stored value is rendered into an [`AuditValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text; empty strings render as the empty sentinel.
    Text,
    /// Boolean, rendered as `true` / `false`.
    Flag,
    /// Whole number, rendered in decimal.
    Integer,
    /// Floating point number.
    Number,
    /// Any JSON value, persisted as canonical JSON text.
    Structured,
    /// Opaque hash of a secret. Always reported when submitted.
    Secret,
}

/// What to record when the stored value is NULL or missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenAbsent {
    Null,
    Empty,
    Unset,
    Default(&'static str),
}

impl WhenAbsent {
    pub fn value(self) -> AuditValue {
        match self {
            WhenAbsent::Null => AuditValue::NullStoredValue,
            WhenAbsent::Empty => AuditValue::EmptyStoredValue,
            WhenAbsent::Unset => AuditValue::Unset,
            WhenAbsent::Default(text) => AuditValue::Text(text.to_string()),
        }
    }
}

/// A single tracked attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedField {
    /// Key in the submitted payload.
    pub input: &'static str,
    /// Key in the before/after snapshots.
    pub stored: &'static str,
    /// Name written to the `attribute` column.
    pub attribute: &'static str,
    pub kind: FieldKind,
    pub when_absent: WhenAbsent,
}

impl TrackedField {
    const fn named(name: &'static str, kind: FieldKind, when_absent: WhenAbsent) -> Self {
        Self {
            input: name,
            stored: name,
            attribute: name,
            kind,
            when_absent,
        }
    }

    /// Render a snapshot value for this field.
    pub fn render(&self, value: Option<&Value>) -> AuditValue {
        let value = match value {
            None | Some(Value::Null) => return self.when_absent.value(),
            Some(v) => v,
        };

        match self.kind {
            FieldKind::Structured => AuditValue::Structured(value.clone()),
            FieldKind::Text | FieldKind::Secret => match value {
                Value::String(s) if s.is_empty() => self.empty_value(),
                Value::String(s) => AuditValue::Text(s.clone()),
                Value::Object(_) | Value::Array(_) => AuditValue::Structured(value.clone()),
                other => AuditValue::Text(other.to_string()),
            },
            FieldKind::Flag => match value {
                Value::Bool(b) => flag_text(*b),
                Value::Number(n) => flag_text(n.as_f64() != Some(0.0)),
                Value::String(s) => match parse_flag(s) {
                    Some(b) => flag_text(b),
                    None => AuditValue::Text(s.clone()),
                },
                other => AuditValue::Text(other.to_string()),
            },
            FieldKind::Integer => match value {
                Value::String(s) => match s.trim().parse::<i64>() {
                    Ok(n) => AuditValue::Text(n.to_string()),
                    Err(_) if s.trim().is_empty() => self.when_absent.value(),
                    Err(_) => AuditValue::Text(s.clone()),
                },
                other => AuditValue::Text(other.to_string()),
            },
            FieldKind::Number => match value {
                Value::String(s) => match s.trim().parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                    Some(n) => AuditValue::Text(n.to_string()),
                    None => AuditValue::Text(s.clone()),
                },
                other => AuditValue::Text(other.to_string()),
            },
        }
    }

    /// The submitted text of a flag, kept as typed when it spells the value
    /// that was actually stored (`"False"`, `"off"`, ...).
    pub fn as_submitted(&self, submitted: &Value, stored: &AuditValue) -> Option<AuditValue> {
        if self.kind != FieldKind::Flag {
            return None;
        }
        let Value::String(text) = submitted else {
            return None;
        };
        let spelled = flag_text(parse_flag(text)?);
        (spelled == *stored).then(|| AuditValue::Text(text.clone()))
    }

    /// Secrets are only considered submitted when the payload carries a
    /// non-empty value.
    pub fn is_submitted(&self, payload_value: &Value) -> bool {
        match (self.kind, payload_value) {
            (_, Value::Null) => self.kind != FieldKind::Secret,
            (FieldKind::Secret, Value::String(s)) => !s.is_empty(),
            _ => true,
        }
    }

    fn empty_value(&self) -> AuditValue {
        match self.when_absent {
            WhenAbsent::Unset => AuditValue::Unset,
            WhenAbsent::Default(text) => AuditValue::Text(text.to_string()),
            WhenAbsent::Null | WhenAbsent::Empty => AuditValue::EmptyStoredValue,
        }
    }
}

/// An entry in a tracking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracked {
    Field(TrackedField),
    /// A nested JSON object whose keys are tracked individually and logged
    /// under their leaf name.
    Bag {
        container: &'static str,
        fields: &'static [TrackedField],
    },
}

impl Tracked {
    pub fn input(&self) -> &'static str {
        match self {
            Tracked::Field(field) => field.input,
            Tracked::Bag { container, .. } => container,
        }
    }
}

/// A field changed on several items of one entity type in a single request.
///
/// The attribute is `<entity>.<field>` and the values embed the item id, e.g.
/// `{"task_id":1,"task_priority_0":0.5}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemField {
    pub entity: &'static str,
    pub field: TrackedField,
}

impl ItemField {
    pub fn attribute(&self) -> String {
        format!("{}.{}", self.entity, self.field.attribute)
    }

    pub fn id_key(&self) -> String {
        format!("{}_id", self.entity)
    }

    pub fn value_key(&self) -> String {
        format!("{}_{}", self.entity, self.field.attribute)
    }
}

/// Look up the table entry for a payload key.
pub fn lookup<'a>(table: &'a [Tracked], input: &str) -> Option<&'a Tracked> {
    table.iter().find(|t| t.input() == input)
}

/// Stored booleans are recorded as `True` / `False`.
fn flag_text(value: bool) -> AuditValue {
    AuditValue::Text(if value { "True" } else { "False" }.to_string())
}

/// Parse the boolean spellings accepted from forms and JSON strings.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" | "y" => Some(true),
        "false" | "0" | "off" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

const NAME: TrackedField = TrackedField::named("name", FieldKind::Text, WhenAbsent::Empty);
const SHORT_NAME: TrackedField =
    TrackedField::named("short_name", FieldKind::Text, WhenAbsent::Empty);
const DESCRIPTION: TrackedField =
    TrackedField::named("description", FieldKind::Text, WhenAbsent::Empty);
const LONG_DESCRIPTION: TrackedField =
    TrackedField::named("long_description", FieldKind::Text, WhenAbsent::Empty);
const ALLOW_ANONYMOUS: TrackedField = TrackedField::named(
    "allow_anonymous_contributors",
    FieldKind::Flag,
    WhenAbsent::Null,
);
const HIDDEN: TrackedField = TrackedField::named("hidden", FieldKind::Flag, WhenAbsent::Null);
const WEBHOOK: TrackedField = TrackedField::named("webhook", FieldKind::Text, WhenAbsent::Empty);
const CATEGORY_ID: TrackedField =
    TrackedField::named("category_id", FieldKind::Integer, WhenAbsent::Null);
const PASSWORD: TrackedField = TrackedField {
    input: "password",
    stored: "passwd_hash",
    attribute: "passwd_hash",
    kind: FieldKind::Secret,
    when_absent: WhenAbsent::Null,
};

/// Keys of the project `info` bag tracked through the JSON API.
pub const PROJECT_INFO: &[TrackedField] = &[
    TrackedField::named("task_presenter", FieldKind::Structured, WhenAbsent::Null),
    TrackedField::named("sched", FieldKind::Structured, WhenAbsent::Null),
];

/// Project attributes tracked on `PUT /api/app/{id}`.
pub const PROJECT_API: &[Tracked] = &[
    Tracked::Field(NAME),
    Tracked::Field(SHORT_NAME),
    Tracked::Field(DESCRIPTION),
    Tracked::Field(LONG_DESCRIPTION),
    Tracked::Field(ALLOW_ANONYMOUS),
    Tracked::Field(HIDDEN),
    Tracked::Field(WEBHOOK),
    Tracked::Field(CATEGORY_ID),
    Tracked::Field(PASSWORD),
    Tracked::Bag {
        container: "info",
        fields: PROJECT_INFO,
    },
];

/// Project attributes tracked on the web settings form.
pub const PROJECT_WEB: &[Tracked] = &[
    Tracked::Field(NAME),
    Tracked::Field(SHORT_NAME),
    Tracked::Field(DESCRIPTION),
    Tracked::Field(LONG_DESCRIPTION),
    Tracked::Field(ALLOW_ANONYMOUS),
    Tracked::Field(HIDDEN),
    Tracked::Field(WEBHOOK),
    Tracked::Field(CATEGORY_ID),
    Tracked::Field(PASSWORD),
];

/// The task presenter editor form. Snapshots are the project `info` bag.
pub const TASK_PRESENTER_WEB: &[Tracked] = &[Tracked::Field(TrackedField {
    input: "editor",
    stored: "task_presenter",
    attribute: "task_presenter",
    kind: FieldKind::Text,
    when_absent: WhenAbsent::Unset,
})];

/// The scheduler form. Snapshots are the project `info` bag.
pub const SCHEDULER_WEB: &[Tracked] = &[Tracked::Field(TrackedField {
    input: "sched",
    stored: "sched",
    attribute: "sched",
    kind: FieldKind::Text,
    when_absent: WhenAbsent::Default(scheduler::DEFAULT),
})];

/// The redundancy form. Snapshots carry the project's task redundancy.
pub const TASK_REDUNDANCY_WEB: &[Tracked] = &[Tracked::Field(TrackedField {
    input: "n_answers",
    stored: "n_answers",
    attribute: "task.n_answers",
    kind: FieldKind::Integer,
    when_absent: WhenAbsent::Null,
})];

/// Per-task priority set through the priority form.
pub const TASK_PRIORITY: ItemField = ItemField {
    entity: "task",
    field: TrackedField::named("priority_0", FieldKind::Number, WhenAbsent::Null),
};

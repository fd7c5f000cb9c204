use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::model::data::TodoData;
use crate::model::tag::{Tag, TagColor};
use crate::model::task::{Priority, Task};
use crate::parse::timestamp::{format_timestamp, parse_timestamp};

/// Error type for encoding and decoding the persisted container
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed timestamp in {field}: {value:?}")]
    MalformedTimestamp { field: &'static str, value: String },
    #[error("unknown {field} value: {value:?}")]
    UnknownVariant { field: &'static str, value: String },
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: Uuid },
}

/// Which optional fields were filled with defaults while decoding.
///
/// Older data files predate most per-task fields; the report lets a caller see
/// how much of a file was written by an older schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    defaulted: BTreeMap<&'static str, usize>,
}

impl DecodeReport {
    fn record(&mut self, field: &'static str) {
        *self.defaulted.entry(field).or_insert(0) += 1;
    }

    /// True when every optional field was present
    pub fn is_clean(&self) -> bool {
        self.defaulted.is_empty()
    }

    /// How many records had `field` defaulted
    pub fn count(&self, field: &str) -> usize {
        self.defaulted.get(field).copied().unwrap_or(0)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.defaulted.iter().map(|(k, v)| (*k, *v))
    }
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ContainerOut<'a> {
    version: u32,
    todos: Vec<TaskOut<'a>>,
    tags: Vec<TagOut<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskOut<'a> {
    id: Uuid,
    title: &'a str,
    detail: &'a str,
    is_completed: bool,
    priority: Priority,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<String>,
    updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    sort_order: i64,
    tag_ids: &'a IndexSet<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagOut<'a> {
    id: Uuid,
    name: &'a str,
    color: TagColor,
    created_at: String,
}

#[derive(Deserialize)]
struct ContainerIn {
    version: u32,
    todos: Vec<TaskIn>,
    #[serde(default)]
    tags: Option<Vec<TagIn>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskIn {
    id: Uuid,
    title: String,
    #[serde(default)]
    detail: Option<String>,
    is_completed: bool,
    #[serde(default)]
    priority: Option<String>,
    created_at: String,
    #[serde(default)]
    completed_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    sort_order: Option<i64>,
    #[serde(default)]
    tag_ids: Option<IndexSet<Uuid>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagIn {
    id: Uuid,
    name: String,
    #[serde(default)]
    color: Option<String>,
    created_at: String,
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encode the container as pretty JSON with keys sorted at every level.
pub fn encode(data: &TodoData) -> Result<Vec<u8>, CodecError> {
    let out = ContainerOut {
        version: data.version,
        todos: data.todos.iter().map(task_out).collect(),
        tags: data.tags.iter().map(tag_out).collect(),
    };
    let value = sort_keys(serde_json::to_value(&out)?);
    let mut bytes = serde_json::to_vec_pretty(&value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn task_out(task: &Task) -> TaskOut<'_> {
    TaskOut {
        id: task.id,
        title: &task.title,
        detail: &task.detail,
        is_completed: task.is_completed,
        priority: task.priority,
        created_at: format_timestamp(&task.created_at),
        completed_at: task.completed_at.as_ref().map(format_timestamp),
        updated_at: format_timestamp(&task.updated_at),
        due_date: task.due_date.as_ref().map(format_timestamp),
        sort_order: task.sort_order,
        tag_ids: &task.tag_ids,
    }
}

fn tag_out(tag: &Tag) -> TagOut<'_> {
    TagOut {
        id: tag.id,
        name: &tag.name,
        color: tag.color,
        created_at: format_timestamp(&tag.created_at),
    }
}

/// Rebuild every object with its keys in lexicographic order
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decode a container, defaulting absent optional fields.
pub fn decode(bytes: &[u8]) -> Result<TodoData, CodecError> {
    decode_with_report(bytes).map(|(data, _)| data)
}

/// Decode a container and report which optional fields were defaulted.
pub fn decode_with_report(bytes: &[u8]) -> Result<(TodoData, DecodeReport), CodecError> {
    let raw: ContainerIn = serde_json::from_slice(bytes)?;
    let mut report = DecodeReport::default();

    let todos = raw
        .todos
        .into_iter()
        .map(|t| task_in(t, &mut report))
        .collect::<Result<Vec<_>, _>>()?;

    let tags = match raw.tags {
        Some(tags) => tags
            .into_iter()
            .map(|t| tag_in(t, &mut report))
            .collect::<Result<Vec<_>, _>>()?,
        None => {
            report.record("tags");
            Vec::new()
        }
    };

    ensure_unique_ids("task", todos.iter().map(|t| t.id))?;
    ensure_unique_ids("tag", tags.iter().map(|t| t.id))?;

    Ok((
        TodoData {
            version: raw.version,
            todos,
            tags,
        },
        report,
    ))
}

fn ensure_unique_ids(kind: &'static str, ids: impl Iterator<Item = Uuid>) -> Result<(), CodecError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CodecError::DuplicateId { kind, id });
        }
    }
    Ok(())
}

fn task_in(raw: TaskIn, report: &mut DecodeReport) -> Result<Task, CodecError> {
    let created_at = timestamp("createdAt", &raw.created_at)?;
    let updated_at = match raw.updated_at {
        Some(s) => timestamp("updatedAt", &s)?,
        None => {
            report.record("updatedAt");
            created_at
        }
    };
    let priority = match raw.priority {
        Some(s) => priority_in(&s)?,
        None => {
            report.record("priority");
            Priority::None
        }
    };
    let detail = raw.detail.unwrap_or_else(|| {
        report.record("detail");
        String::new()
    });
    let sort_order = raw.sort_order.unwrap_or_else(|| {
        report.record("sortOrder");
        0
    });
    let tag_ids = raw.tag_ids.unwrap_or_else(|| {
        report.record("tagIds");
        IndexSet::new()
    });

    Ok(Task {
        id: raw.id,
        title: raw.title,
        detail,
        is_completed: raw.is_completed,
        priority,
        created_at,
        completed_at: optional_timestamp("completedAt", raw.completed_at)?,
        updated_at,
        due_date: optional_timestamp("dueDate", raw.due_date)?,
        sort_order,
        tag_ids,
    })
}

fn tag_in(raw: TagIn, report: &mut DecodeReport) -> Result<Tag, CodecError> {
    let color = match raw.color {
        Some(s) => match TagColor::ALL.into_iter().find(|c| c.as_str() == s) {
            Some(color) => color,
            None => {
                return Err(CodecError::UnknownVariant {
                    field: "color",
                    value: s,
                });
            }
        },
        None => {
            report.record("color");
            TagColor::default()
        }
    };
    Ok(Tag {
        id: raw.id,
        name: raw.name,
        color,
        created_at: timestamp("createdAt", &raw.created_at)?,
    })
}

fn priority_in(s: &str) -> Result<Priority, CodecError> {
    Priority::ALL
        .into_iter()
        .find(|p| p.as_str() == s)
        .ok_or_else(|| CodecError::UnknownVariant {
            field: "priority",
            value: s.to_string(),
        })
}

fn timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, CodecError> {
    parse_timestamp(value).ok_or_else(|| CodecError::MalformedTimestamp {
        field,
        value: value.to_string(),
    })
}

fn optional_timestamp(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, CodecError> {
    value.map(|v| timestamp(field, &v)).transpose()
}

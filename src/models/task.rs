use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::warn;

use crate::error::{AppError, AppResult};

/// A task entry as supplied by the persistence layer. The analytics engine
/// only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub create_time: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<FixedOffset>>,
}

impl TaskRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        create_time: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            completed: false,
            create_time,
            update_time: None,
        }
    }

    /// Instant the task was completed, when known.
    pub fn completion_time(&self) -> Option<DateTime<FixedOffset>> {
        if self.completed {
            self.update_time
        } else {
            None
        }
    }

    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }

    /// Builds a record collection from loosely-typed JSON.
    ///
    /// A payload that is not an array, or an item without an `id` or a
    /// readable `createTime`, rejects the whole collection. Optional fields
    /// fall back to neutral defaults; an unreadable `updateTime` is dropped.
    pub fn collection_from_json(value: &JsonValue) -> AppResult<Vec<TaskRecord>> {
        let items = value.as_array().ok_or_else(|| {
            AppError::validation_with_details(
                "任务集合必须是数组",
                json!({ "received": json_kind(value) }),
            )
        })?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| record_from_json(index, item))
            .collect()
    }
}

fn record_from_json(index: usize, item: &JsonValue) -> AppResult<TaskRecord> {
    let object = item.as_object().ok_or_else(|| {
        AppError::validation_with_details(
            "任务记录必须是对象",
            json!({ "index": index, "received": json_kind(item) }),
        )
    })?;

    let id = match object.get("id") {
        Some(JsonValue::String(value)) if !value.is_empty() => value.clone(),
        Some(JsonValue::Number(value)) => value.to_string(),
        _ => {
            return Err(AppError::validation_with_details(
                "任务记录缺少 id",
                json!({ "index": index }),
            ))
        }
    };

    let create_time = object
        .get("createTime")
        .and_then(parse_timestamp)
        .ok_or_else(|| {
            AppError::validation_with_details(
                "任务记录缺少有效的 createTime",
                json!({ "index": index, "id": id }),
            )
        })?;

    let update_time = match object.get("updateTime") {
        None | Some(JsonValue::Null) => None,
        Some(raw) => {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!(
                    target: "app::analytics",
                    index,
                    id = %id,
                    "ignoring unreadable updateTime"
                );
            }
            parsed
        }
    };

    Ok(TaskRecord {
        id,
        title: object
            .get("title")
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string(),
        description: object
            .get("description")
            .and_then(|value| value.as_str())
            .map(|value| value.to_string()),
        completed: object
            .get("completed")
            .and_then(|value| value.as_bool())
            .unwrap_or(false),
        create_time,
        update_time,
    })
}

/// Accepts RFC 3339 strings or epoch milliseconds.
fn parse_timestamp(value: &JsonValue) -> Option<DateTime<FixedOffset>> {
    match value {
        JsonValue::String(raw) => DateTime::parse_from_rfc3339(raw).ok(),
        JsonValue::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .map(DateTime::<FixedOffset>::from),
        _ => None,
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

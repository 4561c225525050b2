use serde_json::Value;
use thiserror::Error;

use crate::model::{Agenda, Block, Priority};
use crate::wall_clock::pad_wall_clock;
use crate::FOCUS_MAX_CHARS;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("schema violation at `{field}`: {reason}")]
/// First schema violation found while validating a candidate agenda object.
pub struct SchemaError {
    pub field: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl Agenda {
    /// Validates a parsed JSON object against the canonical schema.
    ///
    /// `date` and `blocks` are required; each block requires `start`, `end`
    /// and `task`; `priority` defaults to `S` when absent and is rejected
    /// when outside the closed set. Validation stops at the first violation.
    /// Blocks whose start/end cannot be normalized to `HH:MM` are dropped.
    pub fn from_value(value: &Value, target_date: &str) -> Result<Agenda, SchemaError> {
        let object = value
            .as_object()
            .ok_or_else(|| SchemaError::new("$", "expected a JSON object"))?;

        let date = require_string(object, "date")?;
        if date != target_date {
            return Err(SchemaError::new(
                "date",
                format!("expected target date {target_date}, got {date}"),
            ));
        }

        let focus: String = require_string(object, "focus")?
            .chars()
            .take(FOCUS_MAX_CHARS)
            .collect();

        let raw_blocks = object
            .get("blocks")
            .ok_or_else(|| SchemaError::new("blocks", "missing required field"))?
            .as_array()
            .ok_or_else(|| SchemaError::new("blocks", "expected an array"))?;

        let mut blocks = Vec::with_capacity(raw_blocks.len());
        for (index, raw) in raw_blocks.iter().enumerate() {
            if let Some(block) = validate_block(raw, index)? {
                blocks.push(block);
            }
        }

        let reminders = optional_string_list(object, "reminders")?;
        let risks = optional_string_list(object, "risks")?;

        Ok(Agenda {
            date: date.to_string(),
            focus,
            blocks,
            reminders,
            risks,
        })
    }
}

/// Returns `Ok(None)` for a block whose times cannot normalize; such blocks
/// are dropped instead of failing the whole agenda.
fn validate_block(raw: &Value, index: usize) -> Result<Option<Block>, SchemaError> {
    let field = |name: &str| format!("blocks[{index}].{name}");

    let object = raw
        .as_object()
        .ok_or_else(|| SchemaError::new(format!("blocks[{index}]"), "expected an object"))?;

    let start = require_string_at(object, "start", &field("start"))?;
    let end = require_string_at(object, "end", &field("end"))?;
    let task = require_string_at(object, "task", &field("task"))?;

    let priority = match object.get("priority") {
        None => Priority::default(),
        Some(Value::String(raw)) => Priority::parse(raw).ok_or_else(|| {
            SchemaError::new(field("priority"), format!("`{raw}` is not one of M, S, C"))
        })?,
        Some(_) => {
            return Err(SchemaError::new(field("priority"), "expected a string"));
        }
    };

    let checklist = optional_string_list_at(object, "checklist", &field("checklist"))?;

    let (Some(start), Some(end)) = (pad_wall_clock(start), pad_wall_clock(end)) else {
        return Ok(None);
    };

    Ok(Some(Block {
        start,
        end,
        task: task.to_string(),
        priority,
        checklist,
    }))
}

fn require_string<'a>(
    object: &'a serde_json::Map<String, Value>,
    name: &str,
) -> Result<&'a str, SchemaError> {
    require_string_at(object, name, name)
}

fn require_string_at<'a>(
    object: &'a serde_json::Map<String, Value>,
    name: &str,
    field: &str,
) -> Result<&'a str, SchemaError> {
    match object.get(name) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(SchemaError::new(field, "expected a string")),
        None => Err(SchemaError::new(field, "missing required field")),
    }
}

fn optional_string_list(
    object: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<Vec<String>, SchemaError> {
    optional_string_list_at(object, name, name)
}

fn optional_string_list_at(
    object: &serde_json::Map<String, Value>,
    name: &str,
    field: &str,
) -> Result<Vec<String>, SchemaError> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let Value::String(text) = item else {
                    return Err(SchemaError::new(
                        format!("{field}[{index}]"),
                        "expected a string",
                    ));
                };
                values.push(text.clone());
            }
            Ok(values)
        }
        Some(_) => Err(SchemaError::new(field, "expected an array of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DATE: &str = "2024-01-01";

    fn minimal() -> Value {
        json!({
            "date": DATE,
            "focus": "deep work",
            "blocks": [
                {"start": "09:00", "end": "10:00", "task": "writing"}
            ]
        })
    }

    #[test]
    fn accepts_minimal_agenda_and_defaults_priority() {
        let agenda = Agenda::from_value(&minimal(), DATE).expect("valid");
        assert_eq!(agenda.blocks.len(), 1);
        assert_eq!(agenda.blocks[0].priority, Priority::Should);
        assert!(agenda.reminders.is_empty());
        assert!(agenda.risks.is_empty());
    }

    #[test]
    fn rejects_missing_required_fields() {
        let err = Agenda::from_value(&json!({"focus": "x", "blocks": []}), DATE).unwrap_err();
        assert_eq!(err.field, "date");

        let err = Agenda::from_value(&json!({"date": DATE, "blocks": []}), DATE).unwrap_err();
        assert_eq!(err.field, "focus");

        let err = Agenda::from_value(&json!({"date": DATE, "focus": "x"}), DATE).unwrap_err();
        assert_eq!(err.field, "blocks");
    }

    #[test]
    fn rejects_date_not_matching_target() {
        let err = Agenda::from_value(&minimal(), "2024-02-02").unwrap_err();
        assert_eq!(err.field, "date");
    }

    #[test]
    fn rejects_priority_outside_closed_set() {
        let mut value = minimal();
        value["blocks"][0]["priority"] = json!("high");
        let err = Agenda::from_value(&value, DATE).unwrap_err();
        assert_eq!(err.field, "blocks[0].priority");
    }

    #[test]
    fn rejects_block_missing_task() {
        let value = json!({
            "date": DATE,
            "focus": "x",
            "blocks": [{"start": "09:00", "end": "10:00"}]
        });
        let err = Agenda::from_value(&value, DATE).unwrap_err();
        assert_eq!(err.field, "blocks[0].task");
    }

    #[test]
    fn normalizes_block_times_and_drops_unparseable_ones() {
        let value = json!({
            "date": DATE,
            "focus": "x",
            "blocks": [
                {"start": "9:5", "end": "11:30", "task": "kept"},
                {"start": "whenever", "end": "10:00", "task": "dropped"}
            ]
        });
        let agenda = Agenda::from_value(&value, DATE).expect("valid");
        assert_eq!(agenda.blocks.len(), 1);
        assert_eq!(agenda.blocks[0].start, "09:05");
        assert_eq!(agenda.blocks[0].task, "kept");
    }

    #[test]
    fn caps_focus_length() {
        let mut value = minimal();
        value["focus"] = json!("长".repeat(400));
        let agenda = Agenda::from_value(&value, DATE).expect("valid");
        assert_eq!(agenda.focus.chars().count(), 200);
    }

    #[test]
    fn rejects_non_string_list_items() {
        let mut value = minimal();
        value["reminders"] = json!(["ok", 3]);
        let err = Agenda::from_value(&value, DATE).unwrap_err();
        assert_eq!(err.field, "reminders[1]");
    }
}

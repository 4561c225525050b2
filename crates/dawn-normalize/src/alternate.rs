//! Reshaping of the nested, localized schema the model sometimes emits
//! instead of the canonical one.
//!
//! The shape carries a highlights list, three period buckets and a single
//! reminder under localized keys, optionally nested under one wrapper key:
//!
//! ```json
//! {"今日行程": {"重点": ["A", "B"],
//!              "上午": [{"时间": "9:30-11:30", "活动": "Foo"}],
//!              "温馨提醒": "Drink water"}}
//! ```

use serde_json::{json, Map, Value};

use dawn_schema::{pad_wall_clock, SchemaError, FOCUS_MAX_CHARS};

const HIGHLIGHT_KEYS: &[&str] = &["重点", "highlights"];
const REMINDER_KEYS: &[&str] = &["温馨提醒", "reminder"];
const TIME_KEYS: &[&str] = &["时间", "time"];
const TASK_KEYS: &[&str] = &["活动", "task", "activity"];

/// Period buckets in the fixed order they are collected, regardless of key
/// order in the payload.
const BUCKETS: &[&[&str]] = &[
    &["上午", "morning"],
    &["下午", "afternoon"],
    &["晚上", "evening"],
];

/// Reshapes an alternate-schema payload into a canonical-shaped object.
///
/// `date` always comes from the caller; the payload carries no usable date.
/// Fails when the object holds none of the recognized keys, so unrelated
/// JSON cannot masquerade as an empty agenda.
pub fn reshape(value: &Value, target_date: &str) -> Result<Value, SchemaError> {
    let object = value
        .as_object()
        .ok_or_else(|| SchemaError::new("$", "expected a JSON object"))?;
    let inner = unwrap_single_wrapper(object);

    if !has_recognized_key(inner) {
        return Err(SchemaError::new("$", "no recognizable agenda fields"));
    }

    let focus = collect_focus(inner);
    let blocks = collect_blocks(inner);
    let reminders = collect_reminder(inner);

    Ok(json!({
        "date": target_date,
        "focus": focus,
        "blocks": blocks,
        "reminders": reminders,
        "risks": [],
    }))
}

/// Descends through a single wrapper key when the payload is wrapped and no
/// recognized key sits at the top level.
fn unwrap_single_wrapper(object: &Map<String, Value>) -> &Map<String, Value> {
    if !has_recognized_key(object) && object.len() == 1 {
        if let Some(inner) = object.values().next().and_then(Value::as_object) {
            return inner;
        }
    }
    object
}

fn has_recognized_key(object: &Map<String, Value>) -> bool {
    let mut keys = HIGHLIGHT_KEYS
        .iter()
        .chain(REMINDER_KEYS)
        .chain(BUCKETS.iter().flat_map(|aliases| aliases.iter()));
    keys.any(|key| object.contains_key(*key))
}

fn get_alias<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| object.get(*key))
}

/// Joins highlight strings with a full-width semicolon, capped at the focus
/// length limit.
fn collect_focus(object: &Map<String, Value>) -> String {
    let highlights = get_alias(object, HIGHLIGHT_KEYS)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("；")
        })
        .unwrap_or_default();
    highlights.chars().take(FOCUS_MAX_CHARS).collect()
}

fn collect_blocks(object: &Map<String, Value>) -> Vec<Value> {
    let mut blocks = Vec::new();
    for aliases in BUCKETS {
        let Some(bucket) = get_alias(object, aliases) else {
            continue;
        };
        match bucket {
            Value::Array(items) => {
                for item in items {
                    if let Some(block) = reshape_item(item) {
                        blocks.push(block);
                    }
                }
            }
            Value::Object(_) => {
                if let Some(block) = reshape_item(bucket) {
                    blocks.push(block);
                }
            }
            _ => {}
        }
    }
    blocks
}

/// One bucket item: a time range split on its first hyphen plus a task.
/// Items without a hyphen (or with unparseable components) are dropped, not
/// defaulted. No priority information exists in this schema, so every
/// recovered block gets the middle value.
fn reshape_item(item: &Value) -> Option<Value> {
    let object = item.as_object()?;
    let time = get_alias(object, TIME_KEYS)?.as_str()?;
    let (start_raw, end_raw) = time.split_once('-')?;
    let start = pad_wall_clock(start_raw)?;
    let end = pad_wall_clock(end_raw)?;
    let task = get_alias(object, TASK_KEYS)
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(json!({
        "start": start,
        "end": end,
        "task": task,
        "priority": "S",
    }))
}

fn collect_reminder(object: &Map<String, Value>) -> Vec<String> {
    get_alias(object, REMINDER_KEYS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| vec![text.to_string()])
        .unwrap_or_default()
}

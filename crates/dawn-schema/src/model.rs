use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Closed three-value block priority, encoded as single letters.
pub enum Priority {
    #[serde(rename = "M")]
    Must,
    #[default]
    #[serde(rename = "S")]
    Should,
    #[serde(rename = "C")]
    Could,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Must => "M",
            Priority::Should => "S",
            Priority::Could => "C",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "M" => Some(Priority::Must),
            "S" => Some(Priority::Should),
            "C" => Some(Priority::Could),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One scheduled interval: wall-clock `HH:MM` bounds, a task, a priority,
/// and optional checklist sub-items.
pub struct Block {
    pub start: String,
    pub end: String,
    pub task: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Canonical per-user, per-day schedule record.
///
/// `blocks` keeps the order the generator produced; nothing downstream
/// re-sorts it.
pub struct Agenda {
    pub date: String,
    pub focus: String,
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<String>,
}

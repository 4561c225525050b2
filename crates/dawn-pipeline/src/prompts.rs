//! Prompt templates for the two generation modes. `{today}`, `{prefs}` and
//! `{content}` are substituted by plain string replacement.

/// Structured-path prompt: asks for the canonical agenda object and nothing
/// else.
pub const JSON_PROMPT_TEMPLATE: &str = r#"You are a personal daily planner. Today is {today}.

User preferences: {prefs}

Below is the user's plan document. Produce today's agenda as a single JSON
object with exactly these fields and no surrounding text:

{
  "date": "{today}",
  "focus": "one short line naming the day's main theme",
  "blocks": [
    {"start": "HH:MM", "end": "HH:MM", "task": "...", "priority": "M|S|C",
     "checklist": ["optional sub-items"]}
  ],
  "reminders": ["optional short reminders"],
  "risks": ["optional risks worth flagging"]
}

Times are 24-hour wall-clock values. Keep blocks in chronological order.
Priority letters: M = must, S = should, C = could.

Plan document:
{content}
"#;

/// Freeform fallback prompt: plain readable text, used when the structured
/// path fails.
pub const TEXT_PROMPT_TEMPLATE: &str = r#"You are a personal daily planner. Today is {today}.

User preferences: {prefs}

Below is the user's plan document. Write today's agenda as a short, friendly
plain-text message: a one-line theme, a time-blocked schedule, and any
reminders worth repeating. No markdown, no JSON.

Plan document:
{content}
"#;

/// Fills a prompt template.
pub fn render_prompt(template: &str, today: &str, prefs: &str, content: &str) -> String {
    template
        .replace("{today}", today)
        .replace("{prefs}", prefs)
        .replace("{content}", content)
}

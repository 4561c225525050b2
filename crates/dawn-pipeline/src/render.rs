use dawn_schema::{Agenda, Block};

/// Renders a canonical agenda as the outgoing message text.
///
/// Formatting is deterministic and order-preserving: header with date and
/// focus, one line per block (with indented unchecked checklist lines),
/// then reminders and risks sections only when non-empty.
pub fn render_text(agenda: &Agenda) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(format!("📅 {}｜主题：{}", agenda.date, agenda.focus));
    parts.push(String::new());
    for block in &agenda.blocks {
        parts.push(format_block(block));
    }
    if !agenda.reminders.is_empty() {
        parts.push(String::new());
        parts.push("⏰ 提醒：".to_string());
        for reminder in &agenda.reminders {
            parts.push(format!("- {reminder}"));
        }
    }
    if !agenda.risks.is_empty() {
        parts.push(String::new());
        parts.push("⚠️ 风险：".to_string());
        for risk in &agenda.risks {
            parts.push(format!("- {risk}"));
        }
    }
    parts.join("\n").trim().to_string()
}

fn format_block(block: &Block) -> String {
    let mut lines = vec![format!(
        "• {}-{}  {}  [{}]",
        block.start,
        block.end,
        block.task,
        block.priority.as_str()
    )];
    for item in &block.checklist {
        lines.push(format!("   - [ ] {item}"));
    }
    lines.join("\n")
}

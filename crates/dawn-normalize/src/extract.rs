//! Text-level recovery stages that run before any JSON parsing.

use std::sync::OnceLock;

use regex::Regex;

/// Drops a surrounding triple-backtick fence and a bare `json` tag line.
///
/// The opening fence line is removed wholesale (taking any language tag on
/// it along), the trailing fence is removed when present, and a remaining
/// bare `json` marker line is stripped. Runs before all parsing stages.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if text.starts_with("```") {
        text = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        if let Some(stripped) = text.trim_end().strip_suffix("```") {
            text = stripped;
        }
        text = text.trim();
    }

    let bytes = text.as_bytes();
    if bytes.len() >= 5 && bytes[..4].eq_ignore_ascii_case(b"json") && bytes[4] == b'\n' {
        text = &text[5..];
    }
    text.trim()
}

/// Strips one outer pair of matching straight quotes wrapping the whole text.
pub fn unwrap_outer_quotes(text: &str) -> &str {
    let text = text.trim();
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Extracts the minimal balanced object starting at the first `{`.
///
/// Nesting is tracked by brace counting alone. When no `{` exists the whole
/// text is wrapped in braces as a last resort (intentionally lossy, and
/// likely to fail the strict parse downstream); when the braces never
/// balance, everything from the first `{` onward is returned.
pub fn extract_balanced_object(text: &str) -> String {
    let Some(start) = text.find('{') else {
        return format!("{{{text}}}");
    };

    let mut depth: usize = 0;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return text[start..start + offset + 1].to_string();
                }
            }
            _ => {}
        }
    }
    text[start..].to_string()
}

/// Removes commas that directly precede a closing `}` or `]`.
///
/// Targets the one malformed shape the upstream model is known to emit;
/// this is not general JSON repair.
pub fn remove_trailing_commas(text: &str) -> String {
    static TRAILING_COMMA: OnceLock<Regex> = OnceLock::new();
    let pattern = TRAILING_COMMA.get_or_init(|| {
        Regex::new(r",(\s*[}\]])").expect("static trailing-comma pattern compiles")
    });
    pattern.replace_all(text, "$1").into_owned()
}

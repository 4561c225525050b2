/// Normalizes a wall-clock component to zero-padded `HH:MM`.
///
/// Accepts one or two digits per part (`9:5` becomes `09:05`); anything
/// that is not an hour/minute pair of digits inside the valid range yields
/// `None`, and the caller drops the surrounding block rather than keeping a
/// sentinel value.
pub fn pad_wall_clock(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let (hour_part, minute_part) = raw.split_once(':')?;

    let hour = parse_two_digit(hour_part)?;
    let minute = parse_two_digit(minute_part)?;
    if hour > 23 || minute > 59 {
        return None;
    }

    Some(format!("{hour:02}:{minute:02}"))
}

fn parse_two_digit(part: &str) -> Option<u32> {
    let part = part.trim();
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Largest unread count shown verbatim on the notification badge.
pub const BADGE_MAX_COUNT: u64 = 99;

/// Text shown on the notification badge (e.g. 7 -> "7", 150 -> "99+").
pub fn badge_text(count: u64) -> String {
    if count > BADGE_MAX_COUNT {
        format!("{}+", BADGE_MAX_COUNT)
    } else {
        count.to_string()
    }
}

/// Pick the Russian plural form for `count` (1 тикет, 2 тикета, 5 тикетов).
pub fn russian_plural<'a>(count: u64, one: &'a str, few: &'a str, many: &'a str) -> &'a str {
    let last_two = count % 100;
    if (11..=14).contains(&last_two) {
        return many;
    }

    match count % 10 {
        1 => one,
        2..=4 => few,
        _ => many,
    }
}

/// Counter label for the operator ticket table.
pub fn format_ticket_count(count: u64) -> String {
    format!(
        "{} {}",
        count,
        russian_plural(count, "тикет", "тикета", "тикетов")
    )
}

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Format a speed with one decimal place (e.g. 25.5 -> "25.5 Mbps").
pub fn format_speed_mbps(value: f64) -> String {
    format!("{:.1} Mbps", value)
}

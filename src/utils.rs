// Text helpers for the shelter's field blocks

/// Value of a "label\nvalue" block: the second line, trimmed.
pub fn second_line(text: &str) -> Option<String> {
    text.split('\n').nth(1).map(|line| line.trim().to_string())
}

/// Value of a "No. 12345" style label: whatever follows the first period, trimmed.
pub fn after_first_period(text: &str) -> Option<String> {
    text.trim().split('.').nth(1).map(|part| part.trim().to_string())
}

/// Collapses runs of whitespace, used for log-friendly one-liners.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

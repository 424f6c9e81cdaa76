/// Truncates text to `max_chars` characters with an ellipsis.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else if max_chars <= 3 {
        "...".to_string()
    } else {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

pub fn strip_backticks(text: &str) -> String {
    text.replace('`', "")
}

/// Standard CSV escaping: wrap in quotes, double any embedded quotes.
pub fn csv_escape(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Drop markdown formatting characters so the text pastes cleanly into a
/// video description box.
pub fn strip_markdown(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '_' | '~' | '`' | '|'))
        .collect()
}

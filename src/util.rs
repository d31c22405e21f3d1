/// Truncates a string to at most `max_chars` characters.
///
/// Counts characters rather than bytes so a cut never lands inside a UTF-8 codepoint.
///
/// # Arguments
/// * `string` - The string to truncate
/// * `max_chars` - The maximum amount of characters kept
pub fn truncate_string(string: &impl ToString, max_chars: usize) -> String {
    let string = string.to_string();
    match string.char_indices().nth(max_chars) {
        Some((cut, _)) => string[..cut].to_string(),
        None => string,
    }
}

/// Whether we're running inside a GitHub Actions job
#[must_use]
pub fn running_in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

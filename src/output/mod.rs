// Output formatting — terminal display for the operator CLI.

pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, so names with emoji or accents
/// never cause a panic.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

//! Text helpers shared by the bot handlers

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into chunks of at most `max_len` characters.
///
/// Splitting prefers line boundaries so aggregated reports stay readable;
/// a single line longer than `max_len` falls back to grapheme-boundary
/// chunks.
#[must_use]
pub fn split_long_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if line_len > max_len {
            if !current.is_empty() {
                parts.push(current.trim_end().to_string());
                current.clear();
                current_len = 0;
            }
            split_graphemes(line, max_len, &mut parts);
            continue;
        }

        // +1 accounts for the newline separator
        if !current.is_empty() && current_len + line_len + 1 > max_len {
            parts.push(current.trim_end().to_string());
            current.clear();
            current_len = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.trim().is_empty() {
        parts.push(current.trim_end().to_string());
    }

    parts.retain(|part| !part.is_empty());
    parts
}

fn split_graphemes(line: &str, max_len: usize, parts: &mut Vec<String>) {
    let mut chunk = String::new();
    let mut chunk_len = 0usize;

    for grapheme in line.graphemes(true) {
        let grapheme_len = grapheme.chars().count();
        if !chunk.is_empty() && chunk_len + grapheme_len > max_len {
            parts.push(std::mem::take(&mut chunk));
            chunk_len = 0;
        }
        chunk.push_str(grapheme);
        chunk_len += grapheme_len;
    }

    if !chunk.is_empty() {
        parts.push(chunk);
    }
}

/// Truncates a string to at most `max_chars` characters on a char boundary
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    s.char_indices()
        .nth(max_chars)
        .map_or(s, |(idx, _)| &s[..idx])
}

/// Extracts check targets from newline-delimited input, one per line.
///
/// Lines are trimmed and blank lines dropped; ordering is preserved.
#[must_use]
pub fn parse_target_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_stays_whole() {
        let parts = split_long_message("hello\nworld", 100);
        assert_eq!(parts, vec!["hello\nworld".to_string()]);
    }

    #[test]
    fn test_split_prefers_line_boundaries() {
        let text = "first line\nsecond line\nthird line";
        let parts = split_long_message(text, 24);

        assert!(parts.len() >= 2);
        for part in &parts {
            assert!(part.chars().count() <= 24);
            assert!(!part.starts_with('\n'));
        }
        assert_eq!(parts.join("\n"), text);
    }

    #[test]
    fn test_oversized_line_falls_back_to_graphemes() {
        let text = "x".repeat(25);
        let parts = split_long_message(&text, 10);

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].chars().count(), 10);
        assert_eq!(parts[2].chars().count(), 5);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_multibyte_split_keeps_valid_utf8() {
        let text = "é".repeat(12);
        for part in split_long_message(&text, 5) {
            assert!(part.chars().count() <= 5);
            assert!(part.chars().all(|c| c == 'é'));
        }
    }

    #[test]
    fn test_truncate_str_respects_char_boundaries() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 3), "hel");
        assert_eq!(truncate_str("héllo", 2), "hé");
        assert_eq!(truncate_str("", 4), "");
    }

    #[test]
    fn test_parse_target_lines_strips_blanks() {
        let input = "https://one.test\n\n   \n  1.2.3.4:8080  \nsk-abc\n";
        let targets = parse_target_lines(input);

        assert_eq!(
            targets,
            vec![
                "https://one.test".to_string(),
                "1.2.3.4:8080".to_string(),
                "sk-abc".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_target_lines_empty_input() {
        assert!(parse_target_lines("").is_empty());
        assert!(parse_target_lines("\n \n\t\n").is_empty());
    }
}

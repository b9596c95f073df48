use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within `max_width` terminal columns.
///
/// Width is measured with `unicode-width`, so CJK characters and emoji count
/// as two columns. When text is cut, "..." is appended and counted against
/// the budget. Widths of three or fewer columns get no ellipsis.
///
/// # Examples
///
/// ```
/// use gazette::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Markets rally on rate cut", 12), "Markets r...");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width > ELLIPSIS_WIDTH {
        max_width - ELLIPSIS_WIDTH
    } else {
        max_width
    };

    let mut used = 0;
    let mut out = String::with_capacity(s.len().min(max_width * 4));
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }

    if max_width > ELLIPSIS_WIDTH {
        out.push_str(ELLIPSIS);
    }
    Cow::Owned(out)
}

/// Removes control characters (except newline and tab) from provider text.
///
/// Borrowed when nothing needed removing.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_unwanted = |c: char| c.is_control() && c != '\n' && c != '\t';
    if !s.chars().any(is_unwanted) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| !is_unwanted(*c)).collect())
}

/// Drops markup tags, keeping the text between them.
pub fn strip_html_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Trimmed value, or `None` when absent or blank.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// First `max_words` whitespace-separated words, with "..." when more remain.
pub fn truncate_words(s: &str, max_words: usize) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    if words.len() <= max_words {
        return s.trim().to_string();
    }
    format!("{}{}", words[..max_words].join(" "), ELLIPSIS)
}

/// Uppercases the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // truncate_to_width
    // ========================================================================

    #[test]
    fn test_truncate_fits_is_borrowed() {
        assert!(matches!(truncate_to_width("hello", 5), Cow::Borrowed("hello")));
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK char is two columns; 7 columns leave room for two chars + "..."
        assert_eq!(truncate_to_width("日本語のニュース", 7), "日本...");
    }

    #[test]
    fn test_truncate_narrow_widths_skip_ellipsis() {
        assert_eq!(truncate_to_width("hello", 0), "");
        assert_eq!(truncate_to_width("hello", 2), "he");
        assert_eq!(truncate_to_width("hello", 3), "hel");
    }

    // ========================================================================
    // strip_control_chars / strip_html_tags
    // ========================================================================

    #[test]
    fn test_strip_control_chars() {
        assert!(matches!(strip_control_chars("plain"), Cow::Borrowed(_)));
        assert_eq!(strip_control_chars("a\u{1b}[31mb\u{7}"), "a[31mb");
        assert_eq!(strip_control_chars("line\nnext\ttab"), "line\nnext\ttab");
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(
            strip_html_tags("<strong>Breaking:</strong> rates <em>held</em>"),
            "Breaking: rates held"
        );
        assert_eq!(strip_html_tags("no tags"), "no tags");
        assert_eq!(strip_html_tags("a > b"), "a > b");
    }

    // ========================================================================
    // word helpers
    // ========================================================================

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(Some("y".to_string())), Some("y".to_string()));
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(
            truncate_words("The journey of a thousand miles begins with one step.", 8),
            "The journey of a thousand miles begins with..."
        );
        assert_eq!(
            truncate_words("In the middle of difficulty lies opportunity.", 8),
            "In the middle of difficulty lies opportunity."
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("gratitude"), "Gratitude");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("é"), "É");
    }
}

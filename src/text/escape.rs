//! Markdown escaping and code delimiter sizing.

/// Escape characters that would otherwise start Markdown syntax.
///
/// Emphasis, link, code, table and HTML delimiters are always escaped.
/// Heading, list and rule markers only matter at the start of a line and are
/// escaped only there; `!` is escaped only when it would open an image.
///
/// # Examples
///
/// ```
/// use sitetext::text::escape_markdown;
///
/// assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
/// assert_eq!(escape_markdown("[link]"), "\\[link\\]");
/// assert_eq!(escape_markdown("C# and F#"), "C# and F#");
/// assert_eq!(escape_markdown("2024. A good year"), "2024\\. A good year");
/// ```
pub fn escape_markdown(text: &str) -> String {
    escape_markdown_from(text, true)
}

/// [`escape_markdown`] for text that continues a line when `line_start` is
/// false; line-start markers are then left alone until the next newline.
///
/// ```
/// use sitetext::text::escape_markdown_from;
///
/// assert_eq!(escape_markdown_from("1. step", true), "1\\. step");
/// assert_eq!(escape_markdown_from("1. step", false), "1. step");
/// ```
pub fn escape_markdown_from(text: &str, line_start: bool) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push('\n');
        }
        escape_line(line, line_start || i > 0, &mut result);
    }
    result
}

fn escape_line(line: &str, line_start: bool, out: &mut String) {
    let chars: Vec<char> = line.chars().collect();
    let (lead, rule, marker) = if line_start {
        let lead = chars.iter().take_while(|&&c| c == ' ').count();
        let marker = ordered_marker(&chars[lead..]).map(|i| lead + i);
        (lead, is_rule_line(line), marker)
    } else {
        (usize::MAX, false, None)
    };

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        let escape = match c {
            '\\' | '*' | '_' | '[' | ']' | '`' | '|' | '<' | '>' | '~' => true,
            '#' => i == lead,
            '-' | '+' => i == lead && (rule || next.is_none_or(|n| n == ' ')),
            '=' => i == lead && rule,
            '.' | ')' => marker == Some(i),
            '!' => next == Some('['),
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
    }
}

/// A line made only of `-`, `=` or `+` (spaces allowed), which would read
/// as a thematic break, a setext underline or an empty list item.
fn is_rule_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| matches!(c, '-' | '=' | '+' | ' '))
}

/// Index of the `.` or `)` closing an ordered list marker (`12. `, `3)`).
fn ordered_marker(chars: &[char]) -> Option<usize> {
    let digits = chars.iter().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let delimiter = *chars.get(digits)?;
    let followed_by_space = chars.get(digits + 1).is_none_or(|&c| c == ' ');
    (matches!(delimiter, '.' | ')') && followed_by_space).then_some(digits)
}

/// Make a URL safe inside an angle-bracketed link destination.
pub fn escape_link_destination(href: &str) -> String {
    href.replace('<', "%3C").replace('>', "%3E").replace('\n', "")
}

/// Length of the longest run of `ch` in `content`.
fn longest_run(content: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Fence length for a code block: at least 3, and longer than any run of
/// the fence character inside the block.
///
/// ```
/// use sitetext::text::calculate_fence_length;
///
/// assert_eq!(calculate_fence_length("let x = 1;", '`'), 3);
/// assert_eq!(calculate_fence_length("```rust\ncode\n```", '`'), 4);
/// ```
pub fn calculate_fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

/// Number of backticks needed to delimit inline code.
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_backslash() {
        assert_eq!(escape_markdown("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_escape_emphasis() {
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("_italic_"), "\\_italic\\_");
        assert_eq!(escape_markdown("~~gone~~"), "\\~\\~gone\\~\\~");
    }

    #[test]
    fn test_escape_heading_at_line_start() {
        assert_eq!(escape_markdown("# heading"), "\\# heading");
        assert_eq!(escape_markdown("not # heading"), "not # heading");
        assert_eq!(escape_markdown("line\n# heading"), "line\n\\# heading");
    }

    #[test]
    fn test_escape_list_marker_at_line_start() {
        assert_eq!(escape_markdown("- item"), "\\- item");
        assert_eq!(escape_markdown("a - b"), "a - b");
        assert_eq!(escape_markdown("-1"), "-1");
    }

    #[test]
    fn test_escape_ordered_marker_at_line_start() {
        assert_eq!(escape_markdown("2024. A good year"), "2024\\. A good year");
        assert_eq!(escape_markdown("1) item"), "1\\) item");
        assert_eq!(escape_markdown("line\n3. next"), "line\n3\\. next");
        assert_eq!(escape_markdown("7."), "7\\.");
        assert_eq!(escape_markdown("Version 1.2 and 3. x"), "Version 1.2 and 3. x");
        assert_eq!(escape_markdown("3.14 is pi"), "3.14 is pi");
    }

    #[test]
    fn test_continued_line_keeps_markers() {
        assert_eq!(escape_markdown_from("+", false), "+");
        assert_eq!(escape_markdown_from("- b", false), "- b");
        assert_eq!(escape_markdown_from("---", false), "---");
        assert_eq!(escape_markdown_from("a\n- b", false), "a\n\\- b");
        assert_eq!(escape_markdown_from("*x*", false), "\\*x\\*");
    }

    #[test]
    fn test_escape_rule_lines() {
        assert_eq!(escape_markdown("---"), "\\---");
        assert_eq!(escape_markdown("- - -"), "\\- - -");
        assert_eq!(escape_markdown("title\n==="), "title\n\\===");
        assert_eq!(escape_markdown("-"), "\\-");
        assert_eq!(escape_markdown("a = b"), "a = b");
        assert_eq!(escape_markdown("--flag"), "--flag");
    }

    #[test]
    fn test_escape_table_pipe_and_html() {
        assert_eq!(escape_markdown("a | b"), "a \\| b");
        assert_eq!(escape_markdown("<tag>"), "\\<tag\\>");
    }

    #[test]
    fn test_escape_image_start() {
        assert_eq!(escape_markdown("![alt]"), "\\!\\[alt\\]");
        assert_eq!(escape_markdown("! not image"), "! not image");
    }

    #[test]
    fn test_unicode_untouched() {
        assert_eq!(escape_markdown("This is a тест"), "This is a тест");
    }

    #[test]
    fn test_link_destination() {
        assert_eq!(escape_link_destination("http://a/<b>"), "http://a/%3Cb%3E");
    }

    #[test]
    fn test_fence_length() {
        assert_eq!(calculate_fence_length("``", '`'), 3);
        assert_eq!(calculate_fence_length("````", '`'), 5);
        assert_eq!(calculate_fence_length("`` and ```", '`'), 4);
    }

    #[test]
    fn test_inline_code_ticks() {
        assert_eq!(calculate_inline_code_ticks("code"), 1);
        assert_eq!(calculate_inline_code_ticks("code with ` backtick"), 2);
        assert_eq!(calculate_inline_code_ticks("``"), 3);
    }
}

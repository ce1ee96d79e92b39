//! Text sanitation for free-text payload fields.

/// Strip HTML tags from a string and normalize whitespace.
pub(crate) fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a free-text field: strip markup, drop control characters, and
/// collapse whitespace.
///
/// Strings that look like bare URLs are passed through untouched so that
/// link fields survive cleaning intact.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("www.")
    {
        return trimmed.to_string();
    }
    let stripped = strip_html(trimmed);
    let without_control: String = stripped.chars().filter(|c| !c.is_control()).collect();
    without_control
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_removes_tags() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn strip_html_normalizes_whitespace() {
        assert_eq!(strip_html("a\n\n  b\tc"), "a b c");
    }

    #[test]
    fn clean_text_removes_control_characters() {
        assert_eq!(clean_text("head\u{0}li\u{7}ne"), "headline");
    }

    #[test]
    fn clean_text_preserves_urls() {
        let url = "https://Example.com/Story?id=1";
        assert_eq!(clean_text(url), url);
    }

    #[test]
    fn clean_text_handles_markup_and_entities_together() {
        assert_eq!(
            clean_text("  <div>Markets <i>rally</i>\r\nagain</div> "),
            "Markets rally again"
        );
    }

    #[test]
    fn clean_text_empty_input_is_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   "), "");
    }
}

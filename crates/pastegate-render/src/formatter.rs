//! Formatting pipeline collaborator.
//!
//! The real pipeline (syntax highlighters, markdown renderers, external
//! commands) lives outside pastegate. All the core needs is something that
//! turns a body and a language into markup, or fails.

use async_trait::async_trait;

use crate::language::Language;

/// Turns raw paste content into rendered markup.
///
/// Implementations must be deterministic for a given body and language; the
/// render cache relies on that to serve memoized output.
#[async_trait]
pub trait Formatter: Send + Sync {
    /// Render `body` as `language`.
    async fn format(&self, body: &str, language: &Language) -> anyhow::Result<String>;
}

/// Renders everything as HTML-escaped plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormatter;

#[async_trait]
impl Formatter for PlainTextFormatter {
    async fn format(&self, body: &str, _language: &Language) -> anyhow::Result<String> {
        Ok(escape_html(body))
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[tokio::test]
    async fn test_plain_text_formatter() {
        let out = PlainTextFormatter
            .format("<b>", &Language::unknown())
            .await
            .unwrap();
        assert_eq!(out, "&lt;b&gt;");
    }
}

//! Regex-based implementation of the HTML utility contract.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use crate::contract::{HtmlUtility, RichTextConverter};
use crate::error::BoxError;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn script_or_style() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
}

fn comment() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?s)<!--.*?-->")
}

fn line_break() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?i)<br\s*/?>")
}

fn block_end() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?i)</(p|div|li|tr|h[1-6])\s*>")
}

fn any_tag() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?s)<[^>]*>")
}

fn empty_paragraph() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?i)<(p|div)\b[^>]*>(\s|&nbsp;|<br\s*/?>)*</(p|div)\s*>")
}

fn edge_breaks() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?i)^(\s|<br\s*/?>)+|(\s|<br\s*/?>)+$")
}

fn numeric_entity() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"&#(x[0-9a-fA-F]+|[0-9]+);")
}

fn blank_lines() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"\n{3,}")
}

fn spaces() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"\s+")
}

pub fn decode_entities(text: &str) -> String {
    let decoded = numeric_entity().replace_all(text, |caps: &regex::Captures<'_>| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_owned())
    });
    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexHtml;

impl RegexHtml {
    pub fn new() -> Self {
        RegexHtml
    }
}

impl HtmlUtility for RegexHtml {
    fn clean_html(&self, html: &str, trim: bool) -> String {
        let cleaned = script_or_style().replace_all(html, "");
        let cleaned = comment().replace_all(&cleaned, "");
        let cleaned = empty_paragraph().replace_all(&cleaned, "");
        if trim {
            edge_breaks().replace_all(&cleaned, "").into_owned()
        } else {
            cleaned.into_owned()
        }
    }

    fn html_to_plain_text(&self, html: &str, preserve_line_breaks: bool) -> String {
        let text = script_or_style().replace_all(html, "");
        let text = comment().replace_all(&text, "");
        let separator = if preserve_line_breaks { "\n" } else { " " };
        let text = line_break().replace_all(&text, separator);
        let text = block_end().replace_all(&text, separator);
        let text = any_tag().replace_all(&text, "");
        let text = decode_entities(&text);

        if !preserve_line_breaks {
            return spaces().replace_all(&text, " ").trim().to_owned();
        }
        let normalized = text.replace("\r\n", "\n");
        let lines: Vec<&str> = normalized.lines().map(str::trim_end).collect();
        let joined = lines.join("\n");
        blank_lines().replace_all(&joined, "\n\n").trim().to_owned()
    }
}

#[async_trait]
impl RichTextConverter for RegexHtml {
    async fn convert(&self, html: &str) -> Result<String, BoxError> {
        Ok(self.clean_html(html, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_keeps_line_breaks() {
        let html = "<div>First&nbsp;line</div><div>Second<br/>Third</div><p>&lt;ok&gt; &amp; done</p>";
        let text = RegexHtml.html_to_plain_text(html, true);
        assert_eq!(text, "First line\nSecond\nThird\n<ok> & done");
    }

    #[test]
    fn plain_text_without_breaks_collapses_whitespace() {
        let text = RegexHtml.html_to_plain_text("<p>a</p>\n<p>b  c</p>", false);
        assert_eq!(text, "a b c");
    }

    #[test]
    fn drops_scripts_and_decodes_numeric_entities() {
        let text = RegexHtml.html_to_plain_text("<script>alert(1)</script>caf&#233; &#x41;", true);
        assert_eq!(text, "café A");
    }

    #[test]
    fn clean_html_trims_edge_breaks_and_empty_paragraphs() {
        let html = "<br><p>&nbsp;</p><b>Keep</b><!-- note --><br/>";
        assert_eq!(RegexHtml.clean_html(html, true), "<b>Keep</b>");
        assert_eq!(RegexHtml.clean_html(html, false), "<br><b>Keep</b><br/>");
    }
}

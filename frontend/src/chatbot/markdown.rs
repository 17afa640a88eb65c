//! A deliberately tiny markdown subset for chat bubbles: inline code, bold,
//! italics, http(s) links and line breaks. Raw HTML is always escaped first.

use once_cell::sync::Lazy;
use regex::Regex;

static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("code pattern compiles"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold pattern compiles"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("italic pattern compiles"));
static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^\s)]+)\)").expect("link pattern compiles")
});

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_markdown(text: &str) -> String {
    let html = escape_html(text);
    let html = CODE.replace_all(&html, "<code>$1</code>");
    let html = BOLD.replace_all(&html, "<strong>$1</strong>");
    let html = ITALIC.replace_all(&html, "<em>$1</em>");
    let html = LINK.replace_all(&html, r#"<a href="$2" target="_blank" rel="noopener">$1</a>"#);
    html.replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_styles() {
        assert_eq!(
            render_markdown("Use **PPF** and *ELSS* via `80C`"),
            "Use <strong>PPF</strong> and <em>ELSS</em> via <code>80C</code>"
        );
    }

    #[test]
    fn links_and_breaks() {
        assert_eq!(
            render_markdown("See [SEBI](https://www.sebi.gov.in)\nthen decide"),
            r#"See <a href="https://www.sebi.gov.in" target="_blank" rel="noopener">SEBI</a><br>then decide"#
        );
    }

    #[test]
    fn non_http_links_stay_text() {
        assert_eq!(render_markdown("[x](javascript:alert(1))"), "[x](javascript:alert(1))");
    }

    #[test]
    fn raw_html_is_escaped() {
        assert_eq!(
            render_markdown("<script>alert('x')</script> & \"q\""),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; &quot;q&quot;"
        );
    }

    #[test]
    fn quotes_cannot_break_out_of_href() {
        let html = render_markdown(r#"[a](https://x.io/"onmouseover="y)"#);
        assert!(!html.contains(r#"""onmouseover"#));
        assert!(html.contains("&quot;onmouseover=&quot;"));
    }

    #[test]
    fn unmatched_markers_are_left_alone() {
        assert_eq!(render_markdown("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(render_markdown("**open"), "**open");
    }
}

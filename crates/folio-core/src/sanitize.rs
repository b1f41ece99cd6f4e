// Rich-text hygiene for server-supplied markup.

use std::collections::HashSet;

/// Strip scripts, handlers, and unknown tags, keeping safe formatting.
pub fn sanitize_html(raw: &str) -> String {
    ammonia::clean(raw)
}

/// Tag-free text with whitespace collapsed.
pub fn plain_text(raw: &str) -> String {
    let dropped: HashSet<&str> = ["script", "style"].into_iter().collect();
    let stripped = ammonia::Builder::empty()
        .clean_content_tags(dropped)
        .clean(raw)
        .to_string();
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// At most `max_chars` characters of plain text, cut at a word boundary.
pub fn excerpt(raw: &str, max_chars: usize) -> String {
    let text = plain_text(raw);
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end())
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

//! Text preparation applied before block content reaches the renderer.
//!
//! - cloze and macro delimiter escaping for child outlines
//! - property line stripping (`key:: value`, org `:PROPERTIES:` drawers)
//! - removal of card-marking tags (`#card`, `#[[card]]`)
//! - HTML escaping for metadata embedded in card bodies

use regex::Regex;
use std::sync::LazyLock;

/// Inserted between repeated delimiter characters
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Matches a Logseq property line: `key:: value`
static PROPERTY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z0-9_][A-Za-z0-9_.\-/]*::(\s|$)").unwrap());

fn is_delimiter(ch: char) -> bool {
    matches!(ch, '{' | '}' | ':')
}

/// Break up `{{`, `}}` and `::` runs so nested content cannot open a cloze
/// (`{{c1::...}}`) or a macro (`{{embed ...}}`) in the generated card.
///
/// Applying it twice yields the same result as applying it once.
///
/// ```
/// use blockcards_render::escape_cloze_delimiters;
///
/// let escaped = escape_cloze_delimiters("{{c1::answer}}");
/// assert!(!escaped.contains("{{"));
/// assert!(!escaped.contains("::"));
/// assert_eq!(escape_cloze_delimiters(&escaped), escaped);
/// ```
pub fn escape_cloze_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev: Option<char> = None;
    for ch in input.chars() {
        if prev == Some(ch) && is_delimiter(ch) {
            out.push(ZERO_WIDTH_SPACE);
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

/// Remove property lines and org property drawers from block content.
pub fn strip_properties(content: &str) -> String {
    let mut kept = Vec::new();
    let mut in_drawer = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if in_drawer {
            if trimmed.eq_ignore_ascii_case(":END:") {
                in_drawer = false;
            }
            continue;
        }
        if trimmed.eq_ignore_ascii_case(":PROPERTIES:") {
            in_drawer = true;
            continue;
        }
        if PROPERTY_LINE.is_match(line) {
            continue;
        }
        kept.push(line);
    }

    kept.join("\n").trim_end().to_string()
}

fn is_tag_token(token: &str, names: &[String]) -> bool {
    let Some(rest) = token.strip_prefix('#') else {
        return false;
    };
    let name = rest
        .strip_prefix("[[")
        .and_then(|r| r.strip_suffix("]]"))
        .unwrap_or(rest);
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// Remove `#name` and `#[[name]]` tokens for the given tag names.
///
/// Other whitespace is preserved, so indentation inside code survives.
pub fn strip_tags(content: &str, names: &[String]) -> String {
    if names.is_empty() || !content.contains('#') {
        return content.to_string();
    }

    content
        .lines()
        .map(|line| {
            let tokens: Vec<&str> = line.split(' ').collect();
            let kept: Vec<&str> = tokens
                .iter()
                .copied()
                .filter(|tok| !is_tag_token(tok, names))
                .collect();
            if kept.len() == tokens.len() {
                line.to_string()
            } else {
                kept.join(" ").trim_end().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
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

//! The stages of the vote content pipeline.
//!
//! raw -> trimmed -> display -> comparable. Every stage is total.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::agnostic::collapse_whitespace;

/// Tags that are understood as markup, in their canonical (lowercase) form.
const MARKUP_TAGS: [&str; 12] = [
    "b", "i", "u", "s", "color", "url", "size", "quote", "spoiler", "img", "sup", "sub",
];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(/?)([A-Za-z]+)(=[^\]]*)?\]").unwrap());
static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)(b|i|u|s|strong|em)\s*>").unwrap());
static STRIP_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[/?(b|i|u|s|color|url|size|quote|spoiler|img|sup|sub)(=[^\]]*)?\]").unwrap()
});
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bhttps?://\S+").unwrap());

const MIN_BASE_LEN: usize = 3;
const MIN_EXTENDED_LEN: usize = 30;

/// Returns true if the bracketed token (without the brackets) is a markup tag.
pub fn is_markup_tag(token: &str) -> bool {
    let t = token.trim().trim_start_matches('/');
    let name = t.split('=').next().unwrap_or("");
    MARKUP_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

/// Cuts an extended description after the first top-level `:` or dash separator.
///
/// Only applies when the retained part has a few characters and the
/// description is long. Plan names are never trimmed.
pub fn trim_extended_text(content: &str) -> String {
    let chars: Vec<(usize, char)> = content.char_indices().collect();
    let mut depth: i32 = 0;
    for (pos, &(idx, c)) in chars.iter().enumerate() {
        let sep_len = match c {
            '(' | '[' => {
                depth += 1;
                continue;
            }
            ')' | ']' => {
                depth -= 1;
                continue;
            }
            _ if depth > 0 => continue,
            ':' if !content[idx..].starts_with("://") => c.len_utf8(),
            '-' | '\u{2013}' | '\u{2014}'
                if pos > 0
                    && chars[pos - 1].1 == ' '
                    && chars.get(pos + 1).map(|p| p.1) == Some(' ') =>
            {
                c.len_utf8()
            }
            _ => continue,
        };
        let base = content[..idx].trim_end();
        let extended = content[idx + sep_len..].trim_start();
        let lower_base = base.to_lowercase();
        if lower_base == "plan" || lower_base == "base plan" {
            return content.to_string();
        }
        if base.chars().count() >= MIN_BASE_LEN && extended.chars().count() >= MIN_EXTENDED_LEN {
            return base.to_string();
        }
        return content.to_string();
    }
    content.to_string()
}

/// Rewrites markup into canonical BBCode.
///
/// HTML emphasis becomes BBCode, tag names are lowercased, closers without an
/// opener are dropped, openers without a closer are closed at the end, and
/// empty pairs disappear.
pub fn normalize_markup(content: &str) -> String {
    let bbcode = HTML_TAG_RE.replace_all(content, |caps: &regex::Captures| {
        let name = match caps[2].to_lowercase().as_str() {
            "strong" => "b".to_string(),
            "em" => "i".to_string(),
            other => other.to_string(),
        };
        format!("[{}{}]", &caps[1], name)
    });

    struct Open {
        name: String,
        start: usize,
        end: usize,
    }

    let mut out = String::with_capacity(bbcode.len());
    let mut stack: Vec<Open> = Vec::new();
    let mut last = 0;
    for caps in TAG_RE.captures_iter(&bbcode) {
        let m = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        out.push_str(&bbcode[last..m.start()]);
        last = m.end();
        let name = caps[2].to_lowercase();
        if !MARKUP_TAGS.contains(&name.as_str()) {
            out.push_str(m.as_str());
            continue;
        }
        if caps[1].is_empty() {
            let start = out.len();
            out.push('[');
            out.push_str(&name);
            if let Some(value) = caps.get(3) {
                out.push_str(value.as_str());
            }
            out.push(']');
            stack.push(Open {
                name,
                start,
                end: out.len(),
            });
        } else if stack.iter().any(|o| o.name == name) {
            while let Some(open) = stack.pop() {
                close_tag(&mut out, &open.name, open.start, open.end);
                if open.name == name {
                    break;
                }
            }
        }
    }
    out.push_str(&bbcode[last..]);
    while let Some(open) = stack.pop() {
        close_tag(&mut out, &open.name, open.start, open.end);
    }
    collapse_whitespace(&out)
}

fn close_tag(out: &mut String, name: &str, start: usize, end: usize) {
    if out[end..].trim().is_empty() {
        out.truncate(start);
    } else {
        out.push_str("[/");
        out.push_str(name);
        out.push(']');
    }
}

/// Removes markup and links, keeping the visible text.
pub fn strip_markup(content: &str) -> String {
    let no_tags = STRIP_TAG_RE.replace_all(content, "");
    let no_urls = URL_RE.replace_all(&no_tags, "");
    collapse_whitespace(&no_urls)
}

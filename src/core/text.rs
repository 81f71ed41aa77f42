use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<.*?>").expect("valid tag regex"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#?[[:alnum:]]+);").expect("valid entity regex"));

/// Removes every `<...>` tag, matching non-greedily.
pub fn clean_html(raw_html: &str) -> Cow<'_, str> {
    TAG.replace_all(raw_html, "")
}

/// HTML entities beyond the XML ones that show up in post bodies.
fn html_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some(" "),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "hellip" => Some("\u{2026}"),
        "lsquo" | "rsquo" => Some("'"),
        "ldquo" | "rdquo" => Some("\""),
        _ => None,
    }
}

/// Decodes each entity left in post text on its own (`&amp;`, `&quot;`,
/// `&#39;`, `&nbsp;`...). Entities that are not recognised stay as written.
fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    ENTITY.replace_all(text, |caps: &Captures| {
        let entity = &caps[0];
        match quick_xml::escape::unescape(entity) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => html_entity(&caps[1]).unwrap_or(entity).to_string(),
        }
    })
}

/// Tags stripped, entities decoded, newlines turned into spaces, lower-cased.
pub fn normalize_post(raw_html: &str) -> String {
    let stripped = clean_html(raw_html);
    let decoded = decode_entities(&stripped);
    decoded.replace(['\r', '\n'], " ").to_lowercase()
}

/// Whitespace-separated words with leading and trailing punctuation trimmed.
/// Inner punctuation stays, so `don't` and `c++` survive as single words.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#'))
        .map(|token| token.trim_start_matches(['+', '#']))
        .filter(|token| token.chars().any(char::is_alphanumeric))
}

//! Name normalization for layer names and event handler lookup.
//!
//! Both functions are total over `&str`. The meaningful charset is ASCII
//! letters, ASCII digits and `-`; `-` separates words and every other
//! character is treated as a separator as well, so `"my layer"` and
//! `"my-layer"` normalize identically.
//!
//! Edge cases:
//! - empty input (or input made only of separators) yields an empty string;
//! - leading, trailing and repeated separators produce no empty words;
//! - only the first character of each word changes case, the remainder is
//!   kept as written (`"ITEM-added"` becomes `"iTEMAdded"`).

fn words(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| !(c.is_ascii_alphanumeric()))
        .filter(|word| !word.is_empty())
}

fn capitalize(word: &str, out: &mut String) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.push(first.to_ascii_uppercase());
        out.push_str(chars.as_str());
    }
}

/// Convert a hyphenated name into camelCase (`post-body` -> `postBody`), or
/// PascalCase when `capitalize_first` is set (`post-body` -> `PostBody`).
pub fn to_camel_case(input: &str, capitalize_first: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for word in words(input) {
        capitalize(word, &mut out);
    }
    // words only ever contain ASCII, so the first byte is a whole char
    if !capitalize_first && let Some(head) = out.get_mut(..1) {
        head.make_ascii_lowercase();
    }
    out
}

/// Canonical stack-uniqueness key for a configured layer name.
pub fn layer_key(name: &str) -> String {
    to_camel_case(name, false)
}

/// Settings handler name for an event (`post-body` -> `onPostBody`).
pub fn handler_name(event: &str) -> String {
    format!("on{}", to_camel_case(event, true))
}

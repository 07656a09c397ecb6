//! Placeholder substitution in topic filters.
//!
//! # Design Decisions
//! - Placeholders are `${{key}}`, keys match case-insensitively
//! - Known keys: `clientid`, `username`; unknown keys resolve to an empty string
//! - `§${{key}}` keeps the placeholder literally (the escape char is dropped)
//! - Replacement values are inserted verbatim and never re-scanned

const PREFIX: &str = "${{";
const SUFFIX: &str = "}}";
const ESCAPE: char = '§';

/// Replace `${{clientid}}` and `${{username}}` in `topic`.
pub fn substitute(topic: &str, client_id: &str, user_name: &str) -> String {
    let mut out = String::with_capacity(topic.len() + client_id.len() + user_name.len());
    let mut rest = topic;

    while let Some(start) = rest.find(PREFIX) {
        let (before, from_prefix) = rest.split_at(start);

        if let Some(literal) = before.strip_suffix(ESCAPE) {
            out.push_str(literal);
            out.push_str(PREFIX);
            rest = &from_prefix[PREFIX.len()..];
            continue;
        }
        out.push_str(before);

        let after_prefix = &from_prefix[PREFIX.len()..];
        let Some(end) = after_prefix.find(SUFFIX) else {
            // unterminated, keep as is
            out.push_str(from_prefix);
            return out;
        };

        let key = &after_prefix[..end];
        out.push_str(resolve(key, client_id, user_name));
        rest = &after_prefix[end + SUFFIX.len()..];
    }

    out.push_str(rest);
    out
}

fn resolve<'a>(key: &str, client_id: &'a str, user_name: &'a str) -> &'a str {
    match key.to_lowercase().as_str() {
        "clientid" => client_id,
        "username" => user_name,
        _ => "",
    }
}

//! Message templates: `{key}` placeholders filled from a rule's context.
//! `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;

use crate::rules::RuleFault;

pub fn render(template: &str, context: &BTreeMap<String, String>) -> Result<String, RuleFault> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    key.push(c);
                }
                if !closed {
                    return Err(RuleFault::UnknownPlaceholder(format!("{{{}", key)));
                }
                let key = key.trim();
                match context.get(key) {
                    Some(value) => out.push_str(value),
                    None => return Err(RuleFault::UnknownPlaceholder(key.to_string())),
                }
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

/// Placeholder keys referenced by a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        if let Some(stripped) = after.strip_prefix('{') {
            rest = stripped;
            continue;
        }
        match after.find('}') {
            Some(end) => {
                keys.push(after[..end].trim().to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    keys
}

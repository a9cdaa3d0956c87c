use serde_json::Value;

use crate::models::ElementMap;

/// First balanced `{...}` span of `text`. Braces inside JSON string literals are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Turns an analysis reply into an element map. The flag is set when `subjects`
/// had to be replaced by the raw prompt.
pub fn elements_from_reply(reply: &str, prompt: &str) -> (ElementMap, bool) {
    let parsed = extract_json_object(reply).and_then(|span| serde_json::from_str::<Value>(span).ok());
    let Some(Value::Object(mut fields)) = parsed else {
        return (ElementMap::fallback(prompt), true);
    };

    let subjects = fields.remove("subjects").and_then(subjects_from);
    let fallback = subjects.is_none();

    let mut elements = ElementMap {
        subjects: subjects.unwrap_or_else(|| vec![prompt.to_string()]),
        categories: fields,
    };
    elements.fill_core_categories();
    (elements, fallback)
}

fn subjects_from(value: Value) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        return None;
    };
    let subjects: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect();

    if subjects.is_empty() {
        None
    } else {
        Some(subjects)
    }
}

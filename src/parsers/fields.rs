use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::FieldValue;

static MULTI_VALUE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*[;,|/]\s*")
        .expect("Invalid separator regex")
});

/// Split a multi-valued cell on `; , | /`, trimming pieces and dropping empty ones.
pub fn split_multi(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };

    MULTI_VALUE_SEPARATOR
        .split(value)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand a field into its ordered list of values. Text cells are split, lists are kept as-is.
pub fn field_values(value: Option<&FieldValue>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(FieldValue::Text(text)) => split_multi(Some(text)),
        Some(FieldValue::List(items)) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Parse an age cell; anything that isn't a plain non-negative integer is `None`.
pub fn parse_age(value: Option<&str>) -> Option<u32> {
    value?.trim().parse::<u32>().ok()
}

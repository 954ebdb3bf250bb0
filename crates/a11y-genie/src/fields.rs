/// Tolerant accessors over loosely-typed JSON objects from upstream services.
use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

/// Non-empty string under `key`.
pub fn string_field(map: &Object, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First non-empty string among `keys`, in order.
pub fn first_string(map: &Object, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| string_field(map, key))
}

/// String elements of an array under `key`; non-strings are skipped.
pub fn string_list(map: &Object, key: &str) -> Vec<String> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Score under the first present key among `keys`. Fractions round, negatives clamp to 0.
pub fn score_field(map: &Object, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|key| {
        let n = map.get(*key)?.as_f64()?;
        Some(n.round().clamp(0.0, u32::MAX as f64) as u32)
    })
}

pub fn bool_field(map: &Object, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| map.get(*key)?.as_bool())
}

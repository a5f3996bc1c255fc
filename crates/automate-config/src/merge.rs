//! Deep-merge of JSON values: object keys merge recursively, everything
//! else (arrays, scalars) is replaced wholesale by the overriding value.

use serde_json::Value;

/// Merge `overlay` onto `base` in place. `overlay` wins on conflicts.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value;
        }
    }
}

/// Deep merge of JSON definition layers.
///
/// Objects merge key by key; everything else, lists included, is replaced
/// wholesale by the overlay so an override can swap out a whole hint pool.

use serde_json::{Map, Value};

/// Merge `source` into `target` in place. A non-object `source` is a no-op.
pub fn merge(target: &mut Value, source: &Value) {
    let Value::Object(source) = source else {
        return;
    };

    let target = ensure_object(target);
    for (key, value) in source {
        match value {
            Value::Object(_) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                merge(slot, value);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Pure variant: a copy of `base` with `overlay` merged over it.
pub fn merged(base: &Value, overlay: &Value) -> Value {
    let mut out = base.clone();
    merge(&mut out, overlay);
    out
}

/// Borrow `value` as an object, replacing it with an empty one first if
/// it holds anything else.
pub(crate) fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

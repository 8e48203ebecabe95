use serde_json::{json, Value};

pub(crate) const IGNORED_KEY_MSG: &str = "Ignored key without a value.";
pub(crate) const INVALID_KEYS_MSG: &str = "Ignored key-value pairs with non-string keys.";

/// Result of splitting a flat key/value sequence into fields
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Sweetened {
    pub(crate) fields: Vec<(String, Value)>,
    /// Trailing key that had no value
    pub(crate) ignored: Option<Value>,
    /// Pairs dropped because the key was not a string
    pub(crate) invalid: Vec<Value>,
}

impl Sweetened {
    /// Diagnostics to log at error level, as (message, field) pairs.
    pub(crate) fn diagnostics(&self) -> Vec<(&'static str, (String, Value))> {
        let mut out = Vec::new();
        if !self.invalid.is_empty() {
            out.push((
                INVALID_KEYS_MSG,
                ("invalid".to_string(), Value::Array(self.invalid.clone())),
            ));
        }
        if let Some(ignored) = &self.ignored {
            out.push((IGNORED_KEY_MSG, ("ignored".to_string(), ignored.clone())));
        }
        out
    }
}

pub(crate) fn sweeten(keys_and_values: &[Value]) -> Sweetened {
    let mut sweetened = Sweetened::default();
    for (index, pair) in keys_and_values.chunks(2).enumerate() {
        match pair {
            [Value::String(key), value] => sweetened.fields.push((key.clone(), value.clone())),
            [key, value] => sweetened.invalid.push(json!({
                "position": index * 2,
                "key": key,
                "value": value,
            })),
            [dangling] => sweetened.ignored = Some(dangling.clone()),
            _ => {}
        }
    }
    sweetened
}

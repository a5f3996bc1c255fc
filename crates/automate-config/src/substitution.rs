//! Recursive `${VAR}` / `${VAR:default}` substitution over every string
//! leaf in a parsed config document.

use std::env;

use regex::Regex;
use serde_json::Value;

fn pattern() -> Regex {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:([^}]*))?\}").expect("static regex is valid")
}

fn substitute_str(re: &Regex, input: &str) -> String {
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        match env::var(var) {
            Ok(value) => value,
            Err(_) => caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
        }
    })
    .into_owned()
}

/// Walk `value` in place, substituting env vars into every string.
pub fn substitute(value: &mut Value) {
    let re = pattern();
    substitute_inner(&re, value);
}

fn substitute_inner(re: &Regex, value: &mut Value) {
    match value {
        Value::String(s) => *s = substitute_str(re, s),
        Value::Array(items) => {
            for item in items {
                substitute_inner(re, item);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                substitute_inner(re, v);
            }
        }
        _ => {}
    }
}

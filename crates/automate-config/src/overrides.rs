//! Fixed set of `AUTOMATE_*` environment overrides applied onto specific
//! schema paths, after file load and `${VAR}` substitution, before
//! validation.

use std::env;

use serde_json::Value;

enum Kind {
    Str,
    Int,
}

struct OverrideRule {
    env_var: &'static str,
    path: &'static [&'static str],
    kind: Kind,
}

const RULES: &[OverrideRule] = &[
    OverrideRule { env_var: "AUTOMATE_MODEL", path: &["agent", "model"], kind: Kind::Str },
    OverrideRule { env_var: "AUTOMATE_API_KEY", path: &["agent", "apiKey"], kind: Kind::Str },
    OverrideRule { env_var: "AUTOMATE_API_BASE", path: &["agent", "apiBase"], kind: Kind::Str },
    OverrideRule { env_var: "AUTOMATE_PORT", path: &["gateway", "port"], kind: Kind::Int },
    OverrideRule { env_var: "AUTOMATE_HOST", path: &["gateway", "host"], kind: Kind::Str },
    OverrideRule { env_var: "AUTOMATE_AUTH_TOKEN", path: &["gateway", "authToken"], kind: Kind::Str },
    OverrideRule { env_var: "AUTOMATE_DISCORD_TOKEN", path: &["channels", "discord", "token"], kind: Kind::Str },
    OverrideRule {
        env_var: "AUTOMATE_EMBEDDING_API_KEY",
        path: &["memory", "embedding", "apiKey"],
        kind: Kind::Str,
    },
];

fn set_path(root: &mut Value, path: &[&str], value: Value) {
    let mut current = root;
    for (i, segment) in path.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().expect("just coerced to object");
        if i == path.len() - 1 {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map.entry(segment.to_string()).or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

/// Apply every recognized `AUTOMATE_*` override found in the environment.
pub fn apply(root: &mut Value) {
    for rule in RULES {
        let Ok(raw) = env::var(rule.env_var) else { continue };
        let value = match rule.kind {
            Kind::Str => Value::String(raw),
            Kind::Int => match raw.parse::<i64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => {
                    tracing::warn!(env_var = rule.env_var, value = %raw, "ignoring non-integer override");
                    continue;
                }
            },
        };
        set_path(root, rule.path, value);
    }
}

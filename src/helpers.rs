use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

const ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";

/// Hours elapsed since `created`, as a decimal string for direct JSON use.
/// Missing or unparseable timestamps yield an empty string.
pub fn age_hours(created: Option<&str>, now: DateTime<Utc>) -> String {
    let ts = match created {
        Some(s) if !s.is_empty() => s,
        _ => return String::new(),
    };

    // K8s timestamps are RFC 3339
    match DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => {
            let elapsed = now - dt.to_utc();
            let hours = elapsed.num_milliseconds() as f64 / 3_600_000.0;
            format!("{}", hours)
        }
        Err(_) => String::new(),
    }
}

/// Comma-joined node roles taken from `node-role.kubernetes.io/<role>` labels.
pub fn node_roles(labels: &BTreeMap<String, String>) -> String {
    let roles: Vec<&str> = labels
        .keys()
        .filter_map(|k| k.strip_prefix(ROLE_LABEL_PREFIX))
        .filter(|r| !r.is_empty())
        .collect();

    if roles.is_empty() {
        "<none>".to_string()
    } else {
        roles.join(",")
    }
}

use std::collections::{BTreeMap, HashMap};

/// Merges environment layers into a flat list of `NAME=VALUE` entries.
///
/// The base layer (typically the OS environment) is kept in order, except
/// for names that the session or stage define. Those are appended after the
/// base layer, sorted by name, with stage values taking precedence over
/// session values.
pub fn merge_environment<I, K, V>(
    base: I,
    session: &HashMap<String, String>,
    stage: &HashMap<String, String>,
) -> Vec<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    // Session values fill in any name the stage leaves undefined.
    let mut overrides: BTreeMap<&str, &str> = session
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    overrides.extend(stage.iter().map(|(key, value)| (key.as_str(), value.as_str())));

    let mut environ = Vec::with_capacity(overrides.len());
    for (key, value) in base {
        let key = key.as_ref();
        if overrides.contains_key(key) {
            continue;
        }
        environ.push(format!("{}={}", key, value.as_ref()));
    }

    environ.extend(
        overrides
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value)),
    );
    environ
}

/// Splits a `NAME=VALUE` entry at its first `=`.
pub fn split_entry(entry: &str) -> (&str, &str) {
    entry.split_once('=').unwrap_or((entry, ""))
}

/// Returns a snapshot of the current process' environment.
///
/// Variables that are not valid unicode are left out.
pub fn os_environment() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

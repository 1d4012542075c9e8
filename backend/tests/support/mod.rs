use std::collections::HashSet;
use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Every variable the gateway configuration reads.
pub const GATEWAY_VARS: &[&str] = &[
    "GATEWAY_CONFIG",
    "REPOSITORY_TYPE",
    "INFLUX_URL",
    "INFLUX_TOKEN",
    "INFLUX_ORG",
    "INFLUX_BUCKET",
    "INFLUX_TAG_KEY",
    "INFLUX_TIMEOUT_SECS",
    "MONGO_URI",
    "MONGO_DATABASE",
    "HOST",
    "PORT",
    "BODY_LIMIT_BYTES",
];

/// Runs `f` with environment variables temporarily modified.
///
/// Every gateway variable not named in `changes` is cleared for the duration,
/// so the developer's own shell settings cannot leak into a test. Access is
/// serialized because the environment is process-global, and the previous
/// values are restored even if `f` panics.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let mut all: Vec<(&str, Option<&str>)> = GATEWAY_VARS
        .iter()
        .filter(|var| !changes.iter().any(|(k, _)| k == *var))
        .map(|var| (*var, None))
        .collect();
    all.extend_from_slice(changes);

    let _guard = ScopedEnv::new(&all);
    f()
}

/// Write `contents` to a temporary `.toml` file that lives as long as the handle.
pub fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

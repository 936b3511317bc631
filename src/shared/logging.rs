use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn build_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/build.log")
}

/// Appends one JSON line to the build log. Logging is best-effort: any I/O
/// failure is swallowed so it can never change a build outcome.
pub fn append_build_log(state_root: &Path, level: &str, event: &str, message: &str) {
    let payload = serde_json::json!({
        "timestamp": chrono::Utc::now().timestamp(),
        "level": level,
        "event": event,
        "message": message,
    });

    let Ok(line) = serde_json::to_string(&payload) else {
        return;
    };

    let path = build_log_path(state_root);
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = writeln!(file, "{line}");
}

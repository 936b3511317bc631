use crate::build::{BuildResponse, RejectionKind};
use crate::config::{load_settings, load_settings_from, Settings};
use std::io::Read;
use std::path::Path;

/// Text to print plus the process exit code to finish with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CliOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit_code: 0,
        }
    }
}

pub fn load_cli_settings(config_override: Option<&Path>) -> Result<Settings, String> {
    match config_override {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    }
    .map_err(|err| err.to_string())
}

/// Reads a request body from a file, or from stdin when `source` is `-`.
pub fn read_request_body(source: &str) -> Result<String, String> {
    if source == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .map_err(|err| format!("failed to read request from stdin: {err}"))?;
        return Ok(body);
    }
    std::fs::read_to_string(source)
        .map_err(|err| format!("failed to read request file {source}: {err}"))
}

/// Completed builds exit 0 whether or not they compiled; only transport-level
/// rejections change the code.
pub fn response_exit_code(response: &BuildResponse) -> i32 {
    match response {
        BuildResponse::Completed(_) => 0,
        BuildResponse::Rejected(rejection) => match rejection.kind {
            RejectionKind::BadRequest => 2,
            RejectionKind::Forbidden => 3,
        },
    }
}

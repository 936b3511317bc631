use crate::build::types::{BuildStep, Diagnostic};
use crate::toolchain::diagnostics::{base_file_name, parse_u32};
use crate::toolchain::{InvocationError, InvocationSpec, LineStrategy, ToolAdapter, ToolKind};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const KICKASS_OUTPUT: &str = "output.prg";
pub const KICKASS_LISTING: &str = "output.lst";

const KICKASS_STRATEGIES: &[LineStrategy] = &[located_error, generic_error];

/// Kick Assembler, run as `java -jar KickAss.jar`. Symbol files are named
/// after the entry file and land in the working directory.
#[derive(Debug, Clone)]
pub struct KickAssAdapter {
    java: String,
    jar: PathBuf,
}

impl KickAssAdapter {
    pub fn new(java: impl Into<String>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
        }
    }

    pub fn jar(&self) -> &Path {
        &self.jar
    }
}

impl ToolAdapter for KickAssAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::KickAss
    }

    fn executable(&self) -> &str {
        &self.java
    }

    fn artifact_name(&self) -> &str {
        KICKASS_OUTPUT
    }

    fn build_command(&self, step: &BuildStep) -> Result<InvocationSpec, InvocationError> {
        if !self.jar.is_file() {
            return Err(InvocationError::ToolUnavailable {
                tool: ToolKind::KickAss,
                detail: format!("KickAss.jar not found at {}", self.jar.display()),
            });
        }
        let args = vec![
            "-jar".to_string(),
            self.jar.display().to_string(),
            "-o".to_string(),
            KICKASS_OUTPUT.to_string(),
            "-vicesymbols".to_string(),
            "-symbolfile".to_string(),
            "-bytedumpfile".to_string(),
            KICKASS_LISTING.to_string(),
            step.path.clone(),
        ];
        Ok(InvocationSpec {
            binary: self.java.clone(),
            args,
        })
    }

    fn diagnostic_strategies(&self) -> &'static [LineStrategy] {
        KICKASS_STRATEGIES
    }

    fn symbol_files(&self, step: &BuildStep) -> Vec<String> {
        let stem = entry_stem(&step.path);
        vec![format!("{stem}.sym"), format!("{stem}.vs")]
    }

    fn listing_files(&self, _step: &BuildStep) -> Vec<String> {
        vec![KICKASS_LISTING.to_string()]
    }
}

fn entry_stem(entry: &str) -> String {
    Path::new(entry)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(entry)
        .to_string()
}

// Error: File main.asm, line 5, column 10: Unknown instruction 'invalid'
fn located_error(line: &str) -> Option<Diagnostic> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)Error:\s*File\s+([^,]+),\s*line\s+(\d+)(?:,\s*column\s+(\d+))?:\s*(.+)")
            .expect("valid regex")
    });
    let caps = re.captures(line)?;
    Some(Diagnostic::located(
        base_file_name(caps.get(1)?.as_str()),
        parse_u32(caps.get(2))?,
        parse_u32(caps.get(3)),
        caps.get(4)?.as_str().trim(),
    ))
}

fn generic_error(line: &str) -> Option<Diagnostic> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)Error:\s*(.+)").expect("valid regex"));
    let caps = re.captures(line)?;
    Some(Diagnostic::unlocated(caps.get(1)?.as_str().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn step(entry: &str) -> BuildStep {
        BuildStep {
            path: entry.to_string(),
            files: vec![entry.to_string()],
            platform: "c64".to_string(),
            tool: "kickass".to_string(),
        }
    }

    #[test]
    fn located_errors_keep_only_the_base_file_name() {
        let adapter = KickAssAdapter::new("java", "KickAss.jar");
        let parsed = adapter.parse_diagnostics(
            "Parsing...\nError: File /tmp/kickass-x/main.asm, line 5, column 10: Unknown instruction 'invalid'\n",
        );
        assert_eq!(
            parsed,
            vec![Diagnostic::located(
                "main.asm",
                5,
                Some(10),
                "Unknown instruction 'invalid'"
            )]
        );
    }

    #[test]
    fn column_is_optional() {
        let adapter = KickAssAdapter::new("java", "KickAss.jar");
        let parsed = adapter.parse_diagnostics("error: file lib.asm, line 12: Unknown symbol 'x'");
        assert_eq!(
            parsed,
            vec![Diagnostic::located("lib.asm", 12, None, "Unknown symbol 'x'")]
        );
    }

    #[test]
    fn generic_error_has_no_location() {
        let adapter = KickAssAdapter::new("java", "KickAss.jar");
        let parsed = adapter.parse_diagnostics("Error: Can't open file\nDone.");
        assert_eq!(parsed, vec![Diagnostic::unlocated("Can't open file")]);
    }

    #[test]
    fn symbol_candidates_follow_the_entry_name() {
        let adapter = KickAssAdapter::new("java", "KickAss.jar");
        assert_eq!(
            adapter.symbol_files(&step("game.asm")),
            vec!["game.sym".to_string(), "game.vs".to_string()]
        );
        assert_eq!(
            adapter.derived_files(&step("game.asm")),
            vec!["output.prg", "game.sym", "game.vs", "output.lst"]
        );
    }

    #[test]
    fn missing_jar_is_reported_before_launch() {
        let dir = tempdir().expect("tempdir");
        let adapter = KickAssAdapter::new("java", dir.path().join("KickAss.jar"));
        let err = adapter
            .build_command(&step("main.asm"))
            .expect_err("jar missing");
        assert!(err.to_string().contains("KickAss.jar not found"));
    }

    #[test]
    fn command_uses_workspace_relative_names() {
        let dir = tempdir().expect("tempdir");
        let jar = dir.path().join("KickAss.jar");
        fs::write(&jar, b"jar").expect("write jar");
        let adapter = KickAssAdapter::new("java", &jar);

        let spec = adapter.build_command(&step("main.asm")).expect("command");
        assert_eq!(spec.binary, "java");
        assert_eq!(&spec.args[..2], &["-jar".to_string(), jar.display().to_string()]);
        assert_eq!(spec.args.last().map(String::as_str), Some("main.asm"));
        assert!(spec.args.windows(2).any(|w| w == ["-o", "output.prg"]));
    }
}

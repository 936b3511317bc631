use crate::build::types::{BuildStep, Diagnostic};
use crate::toolchain::diagnostics::{base_file_name, parse_u32};
use crate::toolchain::{InvocationError, InvocationSpec, LineStrategy, ToolAdapter, ToolKind};
use regex::Regex;
use std::sync::OnceLock;

pub const Z88DK_OUTPUT_BASE: &str = "output";
pub const Z88DK_OUTPUT: &str = "output.tap";

const ZCC_STRATEGIES: &[LineStrategy] = &[line_and_column, line_only, severity_keyword];

/// z88dk's `zcc` front end producing a tape image.
#[derive(Debug, Clone)]
pub struct Z88dkAdapter {
    zcc: String,
}

impl Z88dkAdapter {
    pub fn new(zcc: impl Into<String>) -> Self {
        Self { zcc: zcc.into() }
    }
}

fn target_for_platform(platform: &str) -> Option<&'static str> {
    match platform.trim().to_ascii_lowercase().as_str() {
        "zx" | "zxspectrum" => Some("+zx"),
        _ => None,
    }
}

impl ToolAdapter for Z88dkAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Z88dk
    }

    fn executable(&self) -> &str {
        &self.zcc
    }

    fn artifact_name(&self) -> &str {
        Z88DK_OUTPUT
    }

    fn build_command(&self, step: &BuildStep) -> Result<InvocationSpec, InvocationError> {
        let target = target_for_platform(&step.platform).ok_or_else(|| {
            InvocationError::UnsupportedPlatform {
                tool: ToolKind::Z88dk,
                platform: step.platform.clone(),
            }
        })?;
        let args = vec![
            target.to_string(),
            "-startup=1".to_string(),
            "-clib=sdcc_iy".to_string(),
            "-O3".to_string(),
            "-create-app".to_string(),
            "-o".to_string(),
            Z88DK_OUTPUT_BASE.to_string(),
            step.path.clone(),
        ];
        Ok(InvocationSpec {
            binary: self.zcc.clone(),
            args,
        })
    }

    fn diagnostic_strategies(&self) -> &'static [LineStrategy] {
        ZCC_STRATEGIES
    }
}

// main.c:5:2: error: syntax error
fn line_and_column(line: &str) -> Option<Diagnostic> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^([^:]+):(\d+):(\d+)?:\s*(.+)$").expect("valid regex"));
    let caps = re.captures(line.trim())?;
    Some(Diagnostic::located(
        base_file_name(caps.get(1)?.as_str()),
        parse_u32(caps.get(2))?,
        parse_u32(caps.get(3)),
        caps.get(4)?.as_str().trim(),
    ))
}

// main.c:5: warning: unused variable
fn line_only(line: &str) -> Option<Diagnostic> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^([^:]+):(\d+):\s*(.+)$").expect("valid regex"));
    let caps = re.captures(line.trim())?;
    Some(Diagnostic::located(
        base_file_name(caps.get(1)?.as_str()),
        parse_u32(caps.get(2))?,
        None,
        caps.get(3)?.as_str().trim(),
    ))
}

fn severity_keyword(line: &str) -> Option<Diagnostic> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)error|warning|fatal").expect("valid regex"));
    let trimmed = line.trim();
    if trimmed.is_empty() || !re.is_match(trimmed) {
        return None;
    }
    Some(Diagnostic::unlocated(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(platform: &str) -> BuildStep {
        BuildStep {
            path: "main.c".to_string(),
            files: vec!["main.c".to_string()],
            platform: platform.to_string(),
            tool: "z88dk".to_string(),
        }
    }

    #[test]
    fn platform_selects_the_zcc_target() {
        let adapter = Z88dkAdapter::new("zcc");
        let spec = adapter.build_command(&step("zxspectrum")).expect("command");
        assert_eq!(spec.args[0], "+zx");
        assert_eq!(spec.args.last().map(String::as_str), Some("main.c"));
        assert_eq!(
            adapter.build_command(&step("ZX")).expect("command").args[0],
            "+zx"
        );
        assert!(adapter.build_command(&step("msx")).is_err());
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let adapter = Z88dkAdapter::new("zcc");
        let err = adapter.build_command(&step("c64")).expect_err("unsupported");
        assert_eq!(err.to_string(), "platform `c64` is not supported by z88dk");
    }

    #[test]
    fn sdcc_style_lines_are_located() {
        let adapter = Z88dkAdapter::new("zcc");
        let parsed = adapter.parse_diagnostics(
            "/tmp/s/main.c:5:2: error: syntax error\nmain.c:9: warning 112: function 'f' implicit\n",
        );
        assert_eq!(
            parsed,
            vec![
                Diagnostic::located("main.c", 5, Some(2), "error: syntax error"),
                Diagnostic::located("main.c", 9, None, "warning 112: function 'f' implicit"),
            ]
        );
    }

    #[test]
    fn severity_lines_without_location_are_kept() {
        let adapter = Z88dkAdapter::new("zcc");
        let parsed = adapter.parse_diagnostics("sccz80 starting\nFatal error: cannot open crt0\n");
        assert_eq!(
            parsed,
            vec![Diagnostic::unlocated("Fatal error: cannot open crt0")]
        );
    }

    #[test]
    fn produces_no_symbol_tables() {
        let adapter = Z88dkAdapter::new("zcc");
        assert!(adapter.symbol_files(&step("zx")).is_empty());
        assert_eq!(adapter.derived_files(&step("zx")), vec!["output.tap"]);
    }
}

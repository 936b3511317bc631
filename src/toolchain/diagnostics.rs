use crate::build::types::Diagnostic;

/// One way of reading a single output line. Strategies are tried in order
/// and the first `Some` wins for that line.
pub type LineStrategy = fn(&str) -> Option<Diagnostic>;

/// Runs the strategies over every line. When nothing matched but the output
/// carried text, the whole trimmed output becomes a single diagnostic, so a
/// failure is never reported without an explanation.
pub fn parse_with_strategies(strategies: &[LineStrategy], output: &str) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = output
        .lines()
        .filter_map(|line| strategies.iter().find_map(|strategy| strategy(line)))
        .collect();

    let trimmed = output.trim();
    if diagnostics.is_empty() && !trimmed.is_empty() {
        diagnostics.push(Diagnostic::unlocated(trimmed));
    }
    diagnostics
}

/// Strips directory components, accepting either separator style.
pub fn base_file_name(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .rsplit(|ch: char| ch == '/' || ch == '\\')
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

pub(crate) fn parse_u32(raw: Option<regex::Match<'_>>) -> Option<u32> {
    raw.and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shouting(line: &str) -> Option<Diagnostic> {
        line.strip_prefix("!!").map(|msg| Diagnostic::unlocated(msg.trim()))
    }

    fn never(_line: &str) -> Option<Diagnostic> {
        None
    }

    #[test]
    fn unmatched_lines_are_ignored() {
        let parsed = parse_with_strategies(&[never, shouting], "info\n!! bad\nmore info\n");
        assert_eq!(parsed, vec![Diagnostic::unlocated("bad")]);
    }

    #[test]
    fn no_match_falls_back_to_whole_output() {
        let parsed = parse_with_strategies(&[shouting], "\n  java.lang.OutOfMemoryError\n\tat x\n");
        assert_eq!(
            parsed,
            vec![Diagnostic::unlocated("java.lang.OutOfMemoryError\n\tat x")]
        );
    }

    #[test]
    fn blank_output_yields_nothing() {
        assert!(parse_with_strategies(&[shouting], " \n\t").is_empty());
    }

    #[test]
    fn base_file_name_handles_both_separators() {
        assert_eq!(base_file_name("/tmp/s/main.asm"), "main.asm");
        assert_eq!(base_file_name("C:\\work\\main.asm "), "main.asm");
        assert_eq!(base_file_name("main.asm"), "main.asm");
    }
}

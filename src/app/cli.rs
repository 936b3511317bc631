#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Compile,
    Batch,
    Cleanup,
    Tools,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "compile" => CliVerb::Compile,
        "batch" => CliVerb::Batch,
        "cleanup" => CliVerb::Cleanup,
        "tools" => CliVerb::Tools,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: retrobuild [--config <path>] <command> [args]".to_string(),
        String::new(),
        "Commands:".to_string(),
        "  compile <request.json|->             Run one build request and print the response"
            .to_string(),
        "  batch <request.json>...              Run several build requests concurrently"
            .to_string(),
        "  cleanup <sessionID>                  Remove a session workspace".to_string(),
        "  tools                                List configured tool adapters".to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    cli_help_lines().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_parse() {
        assert_eq!(parse_cli_verb("compile"), CliVerb::Compile);
        assert_eq!(parse_cli_verb("--help"), CliVerb::Help);
        assert_eq!(parse_cli_verb("build"), CliVerb::Unknown);
    }
}

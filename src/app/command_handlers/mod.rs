use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::app::command_support::{load_cli_settings, CliOutput};
use crate::build::BuildService;
use std::path::PathBuf;

pub mod build;
pub mod cleanup;
pub mod tools;

pub fn run_cli(args: Vec<String>) -> Result<CliOutput, String> {
    let (config_override, args) = split_config_flag(args)?;
    if args.is_empty() {
        return Ok(CliOutput::ok(help_text()));
    }

    let verb = parse_cli_verb(args[0].as_str());
    match verb {
        CliVerb::Help => return Ok(CliOutput::ok(help_text())),
        CliVerb::Unknown => return Err(format!("unknown command `{}`", args[0])),
        _ => {}
    }

    let settings = load_cli_settings(config_override.as_deref())?;
    let service = BuildService::new(&settings);
    match verb {
        CliVerb::Compile => build::cmd_compile(&service, &args[1..]),
        CliVerb::Batch => build::cmd_batch(&service, &args[1..]),
        CliVerb::Cleanup => cleanup::cmd_cleanup(&service, &args[1..]),
        CliVerb::Tools => tools::cmd_tools(&service),
        CliVerb::Help | CliVerb::Unknown => Ok(CliOutput::ok(help_text())),
    }
}

fn split_config_flag(args: Vec<String>) -> Result<(Option<PathBuf>, Vec<String>), String> {
    if args.first().map(String::as_str) != Some("--config") {
        return Ok((None, args));
    }
    let mut rest = args.into_iter().skip(1);
    let path = rest
        .next()
        .ok_or_else(|| "usage: retrobuild --config <path> <command>".to_string())?;
    Ok((Some(PathBuf::from(path)), rest.collect()))
}

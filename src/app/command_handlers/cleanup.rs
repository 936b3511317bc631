use crate::app::command_support::CliOutput;
use crate::build::BuildService;
use crate::workspace::validate_session_id;

pub fn cmd_cleanup(service: &BuildService, args: &[String]) -> Result<CliOutput, String> {
    let [session] = args else {
        return Err("usage: cleanup <sessionID>".to_string());
    };
    let session = validate_session_id(session)?;
    let removed = service.cleanup(&session).map_err(|err| err.to_string())?;
    Ok(CliOutput::ok(format!(
        "cleanup\nsession={session}\nremoved={removed}"
    )))
}

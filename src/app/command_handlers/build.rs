use crate::app::command_support::{read_request_body, response_exit_code, CliOutput};
use crate::build::BuildService;

pub fn cmd_compile(service: &BuildService, args: &[String]) -> Result<CliOutput, String> {
    let [source] = args else {
        return Err("usage: compile <request.json|->".to_string());
    };
    let body = read_request_body(source)?;
    let response = service.handle_json(&body);
    Ok(CliOutput {
        text: response.to_json().to_string(),
        exit_code: response_exit_code(&response),
    })
}

/// One response per line, in the order the files were given.
pub fn cmd_batch(service: &BuildService, args: &[String]) -> Result<CliOutput, String> {
    if args.is_empty() {
        return Err("usage: batch <request.json>...".to_string());
    }
    let bodies = args
        .iter()
        .map(|source| read_request_body(source))
        .collect::<Result<Vec<_>, _>>()?;

    let responses = service.handle_batch(&bodies);
    let exit_code = responses.iter().map(response_exit_code).max().unwrap_or(0);
    let text = responses
        .iter()
        .map(|response| response.to_json().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(CliOutput { text, exit_code })
}

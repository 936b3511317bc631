use crate::app::command_support::CliOutput;
use crate::build::BuildService;

pub fn cmd_tools(service: &BuildService) -> Result<CliOutput, String> {
    let lines: Vec<String> = service
        .registry()
        .adapters()
        .map(|adapter| {
            format!(
                "{} executable={} artifact={}",
                adapter.kind(),
                adapter.executable(),
                adapter.artifact_name()
            )
        })
        .collect();
    Ok(CliOutput::ok(lines.join("\n")))
}

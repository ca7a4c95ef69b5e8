use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    printdesk_cli::run()
}

use std::process::ExitCode;

fn main() -> ExitCode {
    approval_chain_cli::run()
}

use std::process::ExitCode;

fn main() -> ExitCode {
    slotwatch_cli::run()
}

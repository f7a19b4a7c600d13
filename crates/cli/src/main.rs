use std::process::ExitCode;

fn main() -> ExitCode {
    penny_cli::run()
}

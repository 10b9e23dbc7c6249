use std::process::ExitCode;

fn main() -> ExitCode {
    trainwise_cli::run()
}

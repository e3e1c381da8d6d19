use std::process::ExitCode;

fn main() -> ExitCode {
    wardend::run(std::env::args_os())
}

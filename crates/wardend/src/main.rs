use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    wardend::run(&mut io::stderr().lock())
}

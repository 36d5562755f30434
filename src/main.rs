//! subnav - keyboard navigation through parent/subtask trees

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = subnav::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

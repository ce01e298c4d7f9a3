//! Binary entrypoint that serves the shortcut search API.

use std::process::ExitCode;

use shortcut_search::start;

/// Start the server with configuration taken from the environment.
fn main() -> ExitCode {
    start::run()
}

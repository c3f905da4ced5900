//! Entry point for the headless control server.

use std::io;
use std::process::ExitCode;

use mccli_config::Config;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => error.exit(),
    };
    mccli_server::host::run(&config, &mut io::stderr().lock())
}

use std::ffi::OsString;

use quarry::{App, cli::wants_verbose, exit_codes};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();

    // RUST_LOG wins over -v
    let default_level = if wants_verbose(&args) { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match App::new().and_then(|app| app.run(args)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::FAIL
        }
    };
    std::process::exit(code);
}

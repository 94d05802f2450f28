mod classpath;
mod compose;
mod error;
mod flags;
mod launch;
mod options;
mod parser;
mod profile;
mod properties;
mod vm;

use error::HashdotError;
use log::{error, LevelFilter};
use std::{env, process::ExitCode};

/// `HASHDOT_DEBUG` drives verbosity instead of a `-v` flag count: argv
/// itself is consumed by the launch driver's own flag-skipping logic (see
/// `flags.rs`), not a general-purpose argument parser.
fn init_logging() {
    let level = match env::var("HASHDOT_DEBUG") {
        Err(_) => LevelFilter::Warn,
        Ok(value) if value.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        Ok(_) => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .filter_level(level)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let argv: Vec<String> = env::args().collect();
    match launch::run(argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error:#}");
            let code = error
                .downcast_ref::<HashdotError>()
                .map(HashdotError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

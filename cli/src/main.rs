mod commands;
mod terminal;

use std::process::ExitCode;

use interlace_common::error;
use interlace_common::error::ValidationError;
use interlace_core::{PoolError, PoolState};

use commands::CommandLine;
use terminal::logging;

const EXIT_VALIDATION: u8 = 1;
const EXIT_POOL_FATAL: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.silent, commands.no_color);

    let cfg = match commands.into_config_from_stdin() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(EXIT_VALIDATION);
        }
    };

    match commands::run::run(&cfg).await {
        Ok(summary) if summary.state == PoolState::Cancelled => ExitCode::from(EXIT_CANCELLED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            if e.downcast_ref::<ValidationError>().is_some() {
                ExitCode::from(EXIT_VALIDATION)
            } else if e.downcast_ref::<PoolError>().is_some() {
                ExitCode::from(EXIT_POOL_FATAL)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

use avd_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("avd error: {:#}", err);
        std::process::exit(1);
    }
}

mod auth;
mod cli;
mod commit;
mod config;
mod diagnostics;
mod duration;
mod error;
mod executor;
mod forge;
mod git;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting ci-status");

    let code = match cli.execute().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", output::red_bold("Error:"));
            1
        }
    };

    std::process::exit(code);
}

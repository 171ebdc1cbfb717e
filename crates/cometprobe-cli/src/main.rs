//! Cometprobe CLI: GreenComet acceptance scenarios
//!
//! ## Usage
//!
//! ```bash
//! cometprobe run --url http://localhost:8080      # Run against Chromium
//! cometprobe run --simulate --report run.json     # Run against the simulated app
//! cometprobe run --device mobile --step "Control"  # One step, phone viewport
//! cometprobe list                                 # List steps
//! cometprobe tree --section controls              # Show resolved selectors
//! ```

use clap::Parser;
use cometprobe_cli::{handlers, logging, Cli, CliResult, ColorChoice, Commands};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();
    logging::init(verbosity, cli.log_format());
    let color = ColorChoice::from(cli.color.clone());

    match cli.command {
        Commands::Run(args) => {
            let _ = handlers::run_scenario(&args, verbosity, color).await?;
            Ok(())
        }
        Commands::List(args) => {
            for line in handlers::list_steps(&args) {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Tree(args) => {
            print!("{}", handlers::render_tree(&args)?);
            Ok(())
        }
    }
}

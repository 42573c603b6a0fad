//! Checks whether a TwinCAT PLC answers ADS requests.

use std::io::stdout;
use std::process::exit;

use clap::Parser;
use env_logger::Env;

use ads_conncheck::cli::Args;
use ads_conncheck::{AdsTcpLibrary, Config, ConnectionChecker, Outcome, Reporter};

fn main() {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let mut reporter = Reporter::new(stdout());
    let outcome = match args.to_config() {
        Ok(config) => ConnectionChecker::new(AdsTcpLibrary, config).run(&mut reporter),
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            let outcome = Outcome { result: Err(e.into()), remote: None };
            reporter.banner();
            reporter.report(&Config::default(), &outcome);
            outcome
        }
    };
    // The connection is closed at this point; `exit` skips destructors.
    exit(outcome.exit_code());
}

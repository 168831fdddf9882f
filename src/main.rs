use clap::Parser;
use pest_classifier_lib::config::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = pest_classifier_lib::logging::setup_logging(cli.verbose) {
        eprintln!("{}", e);
    }

    match pest_classifier_lib::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

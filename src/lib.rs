pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

use commands::session::{Session, HELP};
use config::Cli;
use error::AppError;
use futures::stream::{self, Stream, StreamExt};
use services::classifier::client::HttpPredictionClient;
use std::io::{IsTerminal, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

pub fn run(cli: Cli) -> Result<(), AppError> {
    let client = HttpPredictionClient::new(cli.client_config())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError {
            message: format!("Failed to start runtime: {}", e),
        })?;

    let result = runtime.block_on(async move {
        info!(endpoint = client.endpoint(), "classification session started");

        let stdout = std::io::stdout();
        if std::io::stdin().is_terminal() {
            writeln!(stdout.lock(), "Plant Pest Classifier\n{}", HELP)?;
        }

        let opening = stream::iter(
            cli.image
                .map(|path| Ok(format!("open {}", path.display()))),
        );

        let mut session = Session::new(stdout.lock());
        session.run(&client, opening.chain(stdin_lines())).await
    });

    // A pending stdin read would otherwise hold up runtime shutdown after `quit`.
    runtime.shutdown_background();
    result
}

fn stdin_lines() -> impl Stream<Item = std::io::Result<String>> + Unpin {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    Box::pin(stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), lines)),
            Ok(None) => None,
            Err(e) => Some((Err(e), lines)),
        }
    }))
}

use noughts::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Outcome reporting
// ---------------------------------------------------------------------------

/// Writes every finished game to the log.
struct LogSink;

impl OutcomeSink for LogSink {
    async fn record(&self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win {
                room,
                winner,
                loser,
            } => {
                let loser = loser.as_ref().map(Handle::as_str).unwrap_or("-");
                tracing::info!(room_id = %room, %winner, loser, "game won");
            }
            GameOutcome::Draw { room } => {
                tracing::info!(room_id = %room, "game drawn");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let server = NoughtsServerBuilder::new()
        .config(config)
        .build(LogSink)
        .await?;
    tracing::info!(addr = %server.local_addr()?, "starting noughts server");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

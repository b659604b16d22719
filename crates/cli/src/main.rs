use anyhow::Context;
use clap::{Parser, Subcommand};
use library_kernel::settings::Settings;

/// Command-line entrypoint for the library API
#[derive(Debug, Parser)]
#[command(name = "library-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
        /// Load the sample authors and books
        #[arg(long)]
        seed: bool,
    },
    /// Print the effective settings as JSON
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load library settings")?;

    match cli.command {
        Command::Serve { port, seed } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            settings.repository.seed |= seed;

            library_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "library-cli serving");
            library_api::serve(settings).await
        }
        Command::Settings => {
            let rendered = serde_json::to_string_pretty(&settings)
                .with_context(|| "failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

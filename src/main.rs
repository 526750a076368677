mod api;
mod fetch;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use wagate_core::config;
use wagate_core::session::SessionEvent;
use wagate_core::traits::Session;
use wagate_whatsapp::{generate_qr_terminal, WhatsAppSession};

#[derive(Parser)]
#[command(
    name = "wagate",
    version,
    about = "wagate — HTTP gateway for sending WhatsApp messages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway: connect the session and serve the HTTP API.
    Start,
    /// Show configuration and pairing state.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            let session = Arc::new(WhatsAppSession::new(cfg.whatsapp.clone()));
            let mut events = session.start().await?;

            // Single coordinating task for all session lifecycle events.
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    match event {
                        SessionEvent::QrChallenge(code) => {
                            info!("QR received — scan with the WhatsApp app to pair");
                            match generate_qr_terminal(&code) {
                                Ok(qr) => println!("{qr}"),
                                Err(e) => warn!("failed to render QR code: {e}"),
                            }
                        }
                        SessionEvent::Ready => {
                            info!("WhatsApp client is ready");
                        }
                        SessionEvent::AuthFailure(reason) => {
                            error!("WhatsApp authentication failure: {reason}");
                        }
                        SessionEvent::MessageReceived { sender, body } => {
                            info!("Message from {sender}: {body}");
                        }
                    }
                }
            });

            let state = api::ApiState::new(session);
            api::serve(&cfg.server, state).await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("wagate — Status\n");
            println!("Config: {}", cli.config);
            println!("Server: {}:{}", cfg.server.host, cfg.server.port);

            let db_path = format!(
                "{}/whatsapp_session/whatsapp.db",
                config::shellexpand(&cfg.whatsapp.data_dir)
            );
            println!(
                "  whatsapp: {}",
                if std::path::Path::new(&db_path).exists() {
                    "paired (session store present)"
                } else {
                    "not paired (run `wagate start` and scan the QR code)"
                }
            );
        }
    }

    Ok(())
}

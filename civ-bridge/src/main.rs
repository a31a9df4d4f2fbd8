//! CI-V Bridge
//!
//! Exposes a CI-V radio on a local serial port as a UDP text service, and
//! provides the matching command-line client.
//!
//! Usage:
//!   civ-bridge serve
//!   civ-bridge --simulate serve --port 6435
//!   civ-bridge client
//!   civ-bridge send MODE USB

mod client;
mod server;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use civ_link::{Dispatcher, SerialTransport};
use civ_protocol::Transport;
use civ_sim::{VirtualRadio, VirtualRadioConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use client::BridgeClient;
use server::BridgeServer;
use settings::{BridgeSettings, ClientSettings};

/// CI-V bridge: serve a radio over UDP, or talk to one that is served.
#[derive(Parser)]
#[command(name = "civ-bridge", version, about)]
struct Cli {
    /// Settings file (JSON). Defaults to the civ-bridge config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serve a simulated radio instead of opening the serial port.
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the bridge server.
    Serve {
        /// Override the bind address.
        #[arg(long)]
        host: Option<String>,

        /// Override the UDP port.
        #[arg(long)]
        port: Option<u16>,

        /// Override the serial port (e.g. /dev/ttyUSB0, COM4).
        #[arg(long)]
        serial_port: Option<String>,
    },

    /// Interactive prompt; `exit` quits.
    Client,

    /// Send a single request and print the reply.
    Send {
        /// Request words, e.g. `FREQUENCY 14074000`.
        #[arg(required = true, num_args = 1..)]
        line: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "civ_bridge=info,civ_protocol=info,civ_link=info,civ_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            host,
            port,
            serial_port,
        } => {
            let mut settings = BridgeSettings::load(cli.config.as_deref())?;
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(serial_port) = serial_port {
                settings.serial.serial_port = serial_port;
            }
            serve(settings, cli.simulate).await
        }
        Command::Client => {
            let settings = ClientSettings::load(cli.config.as_deref())?;
            BridgeClient::connect(&settings)
                .await?
                .run_interactive()
                .await
        }
        Command::Send { line } => {
            let settings = ClientSettings::load(cli.config.as_deref())?;
            let client = BridgeClient::connect(&settings).await?;
            let reply = client.send(&line.join(" ")).await?;
            println!("{}", reply.as_deref().unwrap_or("Timeout"));
            Ok(())
        }
    }
}

async fn serve(settings: BridgeSettings, simulate: bool) -> Result<()> {
    tracing::info!("Starting CI-V bridge");

    let transport: Box<dyn Transport> = if simulate {
        let radio = VirtualRadio::from_config(VirtualRadioConfig {
            civ_address: settings.link.radio_address,
            power_encoding: settings.link.power_encoding,
            ..Default::default()
        });
        tracing::info!("Using simulated radio {}", radio.id());
        Box::new(radio)
    } else {
        let serial = SerialTransport::open(&settings.serial)
            .with_context(|| format!("Failed to open {}", settings.serial.serial_port))?;
        Box::new(serial)
    };

    let dispatcher = Dispatcher::new(transport, settings.link.clone());
    let server = BridgeServer::bind(&settings.bind_address(), dispatcher)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_address()))?;

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

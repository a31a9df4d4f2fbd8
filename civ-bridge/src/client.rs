//! UDP bridge client

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::settings::ClientSettings;

/// Sends request lines to a bridge server
pub struct BridgeClient {
    socket: UdpSocket,
    timeout: Duration,
}

impl BridgeClient {
    /// Connect a local socket to the configured server
    pub async fn connect(settings: &ClientSettings) -> Result<Self> {
        let server = settings.server_address();
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .context("Failed to bind client socket")?;
        socket
            .connect(&server)
            .await
            .with_context(|| format!("Failed to resolve {}", server))?;
        debug!("Client using server {}", server);

        Ok(Self {
            socket,
            timeout: Duration::from_millis(settings.timeout_ms),
        })
    }

    /// Send one request line and wait for the reply
    ///
    /// Returns `None` if nothing came back within the timeout.
    pub async fn send(&self, line: &str) -> Result<Option<String>> {
        self.socket
            .send(line.as_bytes())
            .await
            .context("Failed to send request")?;

        let mut buf = vec![0u8; 4096];
        match tokio::time::timeout(self.timeout, self.socket.recv(&mut buf)).await {
            Ok(result) => {
                let n = result.context("Failed to receive reply")?;
                Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned()))
            }
            Err(_) => Ok(None),
        }
    }

    /// Prompt for lines on stdin until `exit` or end of input
    pub async fn run_interactive(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.eq_ignore_ascii_case("exit") {
                break;
            }

            println!("{}", self.send(line).await?.as_deref().unwrap_or("Timeout"));
        }

        Ok(())
    }
}

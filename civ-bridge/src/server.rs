//! UDP bridge server
//!
//! Each datagram carries one text request (`FREQUENCY`, `MODE USB`, ...).
//! The reply text goes back to the sender. Requests are executed one at a
//! time on the blocking pool since the dispatcher talks to a serial port.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use civ_link::{reply_text, Dispatcher};
use civ_protocol::Transport;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Largest datagram accepted
const MAX_DATAGRAM: usize = 4096;

/// Idle period after which the receive loop logs and keeps waiting
const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// UDP front end for a dispatcher
pub struct BridgeServer<T: Transport + 'static> {
    socket: UdpSocket,
    dispatcher: Arc<Dispatcher<T>>,
}

impl<T: Transport + 'static> BridgeServer<T> {
    /// Bind to `addr` (`host:port`)
    pub async fn bind(addr: &str, dispatcher: Dispatcher<T>) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Bridge listening on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            dispatcher: Arc::new(dispatcher),
        })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve requests until `shutdown` completes
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        tokio::pin!(shutdown);
        let mut buffer = vec![0u8; MAX_DATAGRAM];

        loop {
            let received = tokio::select! {
                _ = &mut shutdown => {
                    info!("Bridge shutting down");
                    break;
                }
                result = tokio::time::timeout(IDLE_TIMEOUT, self.socket.recv_from(&mut buffer)) => result,
            };

            match received {
                Err(_) => debug!("No instruction."),
                // Windows reports ICMP port-unreachable from an earlier send here
                Ok(Err(e)) => warn!("Receive failed: {}", e),
                Ok(Ok((n, peer))) => {
                    let line = String::from_utf8_lossy(&buffer[..n]).into_owned();
                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("Bridge shutting down; abandoning request from {}", peer);
                            break;
                        }
                        _ = self.handle(line, peer) => {}
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle(&self, line: String, peer: SocketAddr) {
        debug!("{} -> {:?}", peer, line.trim());

        let dispatcher = Arc::clone(&self.dispatcher);
        let reply = tokio::task::spawn_blocking(move || reply_text(&dispatcher.execute_line(&line)))
            .await
            .unwrap_or_else(|e| {
                warn!("Request task failed: {}", e);
                "Error".to_string()
            });

        debug!("{} <- {}", peer, reply);
        if let Err(e) = self.socket.send_to(reply.as_bytes(), peer).await {
            warn!("Failed to reply to {}: {}", peer, e);
        }
    }
}

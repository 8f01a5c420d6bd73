//! Message transports and the serving loop.
//!
//! A transport only knows how to obtain the next message text and deliver a
//! response text. Dispatch lives in [`DemographicsServer`] and is shared by
//! every transport.

pub mod stdio;
pub mod websocket;

pub use stdio::LineTransport;
pub use websocket::WebSocketTransport;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;
use unhcr_core::DemographicsSource;

use crate::errors::TransportResult;
use crate::servers::DemographicsServer;

/// What a transport produced on one read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A message to dispatch
    Message(String),
    /// Blank or unreadable input; skip it and keep reading
    Skip,
    /// The peer went away
    Closed,
}

#[async_trait]
pub trait Transport: Send {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    async fn receive(&mut self) -> TransportResult<Inbound>;

    async fn send(&mut self, text: &str) -> TransportResult<()>;

    async fn close(&mut self) -> TransportResult<()> {
        Ok(())
    }
}

/// Why the serving loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    /// The shutdown token was cancelled
    Interrupted,
    /// The transport reported end of input or a closed connection
    Closed,
}

/// Serve messages one at a time until shutdown or transport closure.
///
/// Each message is read, dispatched and answered before the next read. A
/// cancelled token stops the loop at once, abandoning any request in flight.
pub async fn serve<T, S>(
    transport: &mut T,
    server: &DemographicsServer<S>,
    shutdown: CancellationToken,
) -> TransportResult<ServeOutcome>
where
    T: Transport + ?Sized,
    S: DemographicsSource,
{
    loop {
        let inbound = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break Ok(ServeOutcome::Interrupted),
            inbound = transport.receive() => inbound?,
        };

        let text = match inbound {
            Inbound::Message(text) => text,
            Inbound::Skip => {
                debug!("No input received");
                continue;
            }
            Inbound::Closed => {
                info!("{} transport closed", transport.name());
                if let Err(e) = transport.close().await {
                    warn!("Failed to close {} transport: {}", transport.name(), e);
                }
                break Ok(ServeOutcome::Closed);
            }
        };

        debug!("Received request: {}", text);
        let response = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break Ok(ServeOutcome::Interrupted),
            response = server.handle_message(&text) => response,
        };

        let line = serde_json::to_string(&response)?;
        debug!("Sending response: {}", line);
        transport.send(&line).await?;
    }
}

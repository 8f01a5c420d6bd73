use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::{Inbound, Transport};
use crate::errors::TransportResult;

/// JSON text frames over a persistent WebSocket connection
pub struct WebSocketTransport<S> {
    stream: WebSocketStream<S>,
}

impl WebSocketTransport<MaybeTlsStream<TcpStream>> {
    /// Open the upstream connection.
    ///
    /// Returns `None` if `shutdown` fires before the handshake completes.
    pub async fn connect(url: &str, shutdown: &CancellationToken) -> TransportResult<Option<Self>> {
        info!("Connecting to {}", url);
        let (stream, response) = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("Connect to {} abandoned", url);
                return Ok(None);
            }
            connected = connect_async(url) => connected?,
        };
        debug!("WebSocket handshake status: {}", response.status());
        Ok(Some(Self { stream }))
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "websocket"
    }

    async fn receive(&mut self) -> TransportResult<Inbound> {
        loop {
            let message = match self.stream.next().await {
                None => return Ok(Inbound::Closed),
                Some(message) => message?,
            };

            return match message {
                Message::Text(text) if text.trim().is_empty() => Ok(Inbound::Skip),
                Message::Text(text) => Ok(Inbound::Message(text.trim().to_string())),
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) if !text.trim().is_empty() => Ok(Inbound::Message(text.trim().to_string())),
                    Ok(_) => Ok(Inbound::Skip),
                    Err(e) => {
                        warn!("Skipping non UTF-8 binary frame: {}", e);
                        Ok(Inbound::Skip)
                    }
                },
                Message::Close(frame) => {
                    debug!("Peer closed connection: {:?}", frame);
                    Ok(Inbound::Closed)
                }
                // Pings are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };
        }
    }

    async fn send(&mut self, text: &str) -> TransportResult<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        match self.stream.close(None).await {
            Ok(())
            | Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed)
            | Err(tokio_tungstenite::tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

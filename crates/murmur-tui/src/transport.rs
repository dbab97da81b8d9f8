//! WebSocket transport.
//!
//! Provides [`WsConnection`] which carries text frames to and from the
//! server over a background task. Protocol logic stays in the sans-IO
//! [`murmur_client::Client`]; this layer only moves text and reports how the
//! socket closed.

use futures::{SinkExt, StreamExt};
use murmur_app::Inbound;
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc, task::AbortHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const CHANNEL_CAPACITY: usize = 64;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// An HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("{reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error text from the response body, or the status reason.
        reason: String,
    },
}

/// Handle to an open WebSocket.
///
/// Frames are sent and received through the channels; an internal task does
/// the socket I/O. The final item on `from_server` is always
/// [`Inbound::Closed`].
pub struct WsConnection {
    /// Send text frames to the server.
    pub to_server: mpsc::Sender<String>,
    /// Receive inbound traffic.
    pub from_server: mpsc::Receiver<Inbound>,
    abort_handle: AbortHandle,
}

impl WsConnection {
    /// Queue a text frame for the server.
    ///
    /// Returns `false` if the connection task has already ended. The frame is
    /// dropped and the close that ended it is still waiting on `from_server`.
    pub async fn send(&self, text: String) -> bool {
        if self.to_server.send(text).await.is_ok() {
            return true;
        }
        tracing::warn!("connection closed, dropping outbound frame");
        false
    }

    /// Stop the connection task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Open a WebSocket to `url`.
pub async fn connect(url: &str) -> Result<WsConnection, TransportError> {
    let (stream, _response) =
        connect_async(url).await.map_err(|e| TransportError::Connection(e.to_string()))?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<Inbound>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_connection(stream, to_server_rx, from_server_tx));

    Ok(WsConnection {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Bridge between the channels and the socket until it closes.
async fn run_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut to_server: mpsc::Receiver<String>,
    from_server: mpsc::Sender<Inbound>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            outgoing = to_server.recv() => {
                let Some(text) = outgoing else {
                    // Driver dropped its sender: end the session cleanly
                    if let Err(e) = sink.send(Message::Close(None)).await {
                        tracing::debug!(error = %e, "close handshake failed");
                    }
                    break;
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, "send failed");
                }
            },

            incoming = source.next() => {
                let inbound = match incoming {
                    Some(Ok(Message::Text(text))) => Inbound::Text(text),
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "server closed the connection");
                        Inbound::Closed { clean: true }
                    },
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "connection lost");
                        Inbound::Closed { clean: false }
                    },
                    None => {
                        tracing::warn!("connection ended without a close frame");
                        Inbound::Closed { clean: false }
                    },
                };

                let closed = matches!(inbound, Inbound::Closed { .. });
                if from_server.send(inbound).await.is_err() || closed {
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A connection whose socket task has already ended after reporting an
    /// unclean close.
    async fn ended_connection() -> WsConnection {
        let (to_server, to_server_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (from_server_tx, from_server) = mpsc::channel::<Inbound>(CHANNEL_CAPACITY);

        let handle = tokio::spawn(async move {
            let _ = from_server_tx.send(Inbound::Closed { clean: false }).await;
            drop(to_server_rx);
        });
        let abort_handle = handle.abort_handle();
        let _ = handle.await;

        WsConnection { to_server, from_server, abort_handle }
    }

    #[tokio::test]
    async fn send_after_close_is_dropped_and_close_still_delivered() {
        let mut connection = ended_connection().await;

        assert!(!connection.send("late".to_string()).await);
        assert_eq!(connection.from_server.try_recv().ok(), Some(Inbound::Closed { clean: false }));
    }
}

use futures::{stream::SplitSink, SinkExt};
use log::{error, trace, warn};
use relay_common::protocol::RelayMessage;
use tokio::{
    net::TcpStream,
    select,
    sync::{broadcast, mpsc},
};
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::Result;

pub struct Writer {
    conn_id: u64,
    sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    /// messages of this connection's subscriptions
    client_rx: mpsc::UnboundedReceiver<RelayMessage>,
    /// messages for every connection
    broadcast_rx: broadcast::Receiver<RelayMessage>,
    token: CancellationToken,
}

impl Writer {
    pub fn new(
        conn_id: u64,
        sink: SplitSink<WebSocketStream<TcpStream>, Message>,
        client_rx: mpsc::UnboundedReceiver<RelayMessage>,
        broadcast_rx: broadcast::Receiver<RelayMessage>,
        token: CancellationToken,
    ) -> Self {
        Self {
            conn_id,
            sink,
            client_rx,
            broadcast_rx,
            token,
        }
    }

    pub async fn run(mut self) {
        loop {
            let message = select! {
                res = self.client_rx.recv() => {
                    let Some(message) = res else {
                        break
                    };
                    message
                }
                res = self.broadcast_rx.recv() => {
                    match res {
                        Ok(message) => message,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("client::writer: connection {} lagged, {skipped} broadcast messages dropped", self.conn_id);
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = self.token.cancelled() => {
                    trace!("client::writer: send close frame to connection {}", self.conn_id);
                    // fails when the peer closed first
                    self.sink.send(Message::Close(None)).await.ok();
                    break
                }
            };
            if let Err(e) = self.send(message).await {
                error!("send message to connection {} error: {e}", self.conn_id);
                break;
            }
        }
        self.token.cancel();
    }

    async fn send(&mut self, message: RelayMessage) -> Result<()> {
        trace!(
            "client::writer: send {} message to connection {}",
            message.message_type(),
            self.conn_id
        );
        let text = message.encode()?;
        self.sink.send(Message::Text(text)).await?;
        Ok(())
    }
}

use futures::{stream::SplitStream, StreamExt};
use log::{error, trace, warn};
use relay_common::protocol::{ClientMessage, RelayMessage};
use tokio::{net::TcpStream, select, sync::mpsc};
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::{Error, Result};
use crate::provider::FakeEventProvider;

pub struct Reader {
    conn_id: u64,
    stream: SplitStream<WebSocketStream<TcpStream>>,
    provider: FakeEventProvider,
    /// record every decoded message for the test
    inbox_tx: mpsc::UnboundedSender<ClientMessage>,
    /// handed to the provider, consumed by the writer
    client_tx: mpsc::UnboundedSender<RelayMessage>,
    token: CancellationToken,
}

impl Reader {
    pub fn new(
        conn_id: u64,
        stream: SplitStream<WebSocketStream<TcpStream>>,
        provider: FakeEventProvider,
        inbox_tx: mpsc::UnboundedSender<ClientMessage>,
        client_tx: mpsc::UnboundedSender<RelayMessage>,
        token: CancellationToken,
    ) -> Self {
        Self {
            conn_id,
            stream,
            provider,
            inbox_tx,
            client_tx,
            token,
        }
    }

    pub async fn run(mut self) {
        loop {
            select! {
                frame = self.stream.next() => {
                    match frame {
                        Some(Ok(Message::Close(_))) | None => {
                            trace!("client::reader: connection {} closed by peer", self.conn_id);
                            break;
                        }
                        Some(Ok(message)) => {
                            if let Err(e) = self.process_message(message) {
                                warn!("client::reader: drop message from connection {}: {e}", self.conn_id);
                            }
                        }
                        Some(Err(e)) => {
                            error!("read from connection {} error: {e}", self.conn_id);
                            break;
                        }
                    }
                }
                _ = self.token.cancelled() => {
                    break
                }
            }
        }
        self.token.cancel();
    }

    fn process_message(&self, message: Message) -> Result<()> {
        let text = match message {
            Message::Text(text) => text,
            Message::Binary(_) => return Err(Error::UnexpectedMessageType("binary")),
            // answered by tungstenite
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) | Message::Close(_) => {
                return Ok(())
            }
        };
        let message = ClientMessage::decode(&text)?;
        trace!(
            "client::reader: receive {} message on connection {}",
            message.message_type(),
            self.conn_id
        );
        // the relay handle may already be dropped
        self.inbox_tx.send(message.clone()).ok();
        match message {
            ClientMessage::Req(req) => {
                self.provider
                    .start(self.conn_id, &req.sub_id, &req.filters, &self.client_tx);
            }
            ClientMessage::Close(close) => {
                self.provider.stop(self.conn_id, Some(&close.sub_id));
            }
            ClientMessage::Publish(_) => {}
        }
        Ok(())
    }
}

mod reader;
mod writer;

use futures::{future, StreamExt};
use log::trace;
use relay_common::{helper::wait, protocol};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{tungstenite, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::{provider::FakeEventProvider, server::Hub};

use self::{reader::Reader, writer::Writer};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected message type: {0}")]
    UnexpectedMessageType(&'static str),
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// One accepted connection
pub struct Client {
    id: u64,
    ws: WebSocketStream<TcpStream>,
    provider: FakeEventProvider,
    hub: Hub,
    token: CancellationToken,
}

impl Client {
    pub fn new(
        id: u64,
        ws: WebSocketStream<TcpStream>,
        provider: FakeEventProvider,
        hub: Hub,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            ws,
            provider,
            hub,
            token,
        }
    }

    /// Runs until either side closes. All subscriptions of the connection are
    /// stopped before the connection count drops.
    pub async fn start(self) {
        let (sink, stream) = self.ws.split();
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let broadcast_rx = self.hub.broadcast_tx.subscribe();
        self.hub.connections.send_modify(|n| *n += 1);

        trace!("client::start: start read task");
        let read_runner = tokio::spawn(
            Reader::new(
                self.id,
                stream,
                self.provider.clone(),
                self.hub.inbox_tx.clone(),
                client_tx,
                self.token.clone(),
            )
            .run(),
        );

        trace!("client::start: start write task");
        let write_runner = tokio::spawn(
            Writer::new(self.id, sink, client_rx, broadcast_rx, self.token.clone()).run(),
        );

        future::join(
            wait(read_runner, "client read runner"),
            wait(write_runner, "client write runner"),
        )
        .await;

        self.provider.stop(self.id, None);
        self.hub.connections.send_modify(|n| *n -= 1);
        trace!("client::start: connection {} exit", self.id);
    }
}

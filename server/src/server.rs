use std::{io, net::SocketAddr, sync::Arc};

use log::{error, trace};
use relay_common::protocol::{ClientMessage, RelayMessage};
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    sync::{broadcast, mpsc, watch},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;

use crate::{client::Client, provider::FakeEventProvider};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channels shared between every connection and the `MockRelay` handle
#[derive(Clone)]
pub struct Hub {
    /// every decoded client message, in arrival order
    pub inbox_tx: mpsc::UnboundedSender<ClientMessage>,
    /// relay-wide messages pushed by the test
    pub broadcast_tx: broadcast::Sender<RelayMessage>,
    /// number of live connections
    pub connections: Arc<watch::Sender<usize>>,
}

pub struct Server {
    listener: TcpListener,
    provider: FakeEventProvider,
    hub: Hub,
    token: CancellationToken,
}

impl Server {
    pub async fn bind(
        addr: SocketAddr,
        provider: FakeEventProvider,
        hub: Hub,
        token: CancellationToken,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            provider,
            hub,
            token,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) {
        let mut conn_id_gen = 0;
        let mut tasks = JoinSet::new();
        loop {
            select! {
                res = self.listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("accept connection error: {e}");
                            continue;
                        }
                    };
                    trace!("server::run: accept a new connection from {peer}");
                    let conn_id = conn_id_gen;
                    conn_id_gen += 1;
                    tasks.spawn(Self::handle_conn(
                        conn_id,
                        stream,
                        peer,
                        self.provider.clone(),
                        self.hub.clone(),
                        self.token.child_token(),
                    ));
                }
                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = res {
                        error!("connection task panic: {e}");
                    }
                }
                _ = self.token.cancelled() => {
                    break
                }
            }
        }
        trace!("server::run: waiting for {} connections to close", tasks.len());
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                error!("connection task panic: {e}");
            }
        }
    }

    async fn handle_conn(
        conn_id: u64,
        stream: TcpStream,
        peer: SocketAddr,
        provider: FakeEventProvider,
        hub: Hub,
        token: CancellationToken,
    ) {
        trace!("server::handle_conn: waiting for websocket handshake");
        let ws = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                error!("websocket handshake with {peer} error: {e}");
                return;
            }
        };
        Client::new(conn_id, ws, provider, hub, token).start().await;
        trace!("server::handle_conn: connection {conn_id} from {peer} closed");
    }
}

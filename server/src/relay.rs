use std::{net::SocketAddr, sync::Arc, time::Duration};

use log::info;
use relay_common::{
    helper::wait,
    protocol::{ClientMessage, RelayMessage},
};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    provider::FakeEventProvider,
    server::{self, Hub, Server},
};

const BROADCAST_CAPACITY: usize = 64;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Server error: {0}")]
    Server(#[from] server::Error),
    #[error("Time out error")]
    Timeout,
    #[error("Mock relay closed")]
    Closed,
    #[error("No client connected")]
    NoConnection,
}

/// A relay that answers every REQ with canned events, for driving client tests.
///
/// Dropping the handle shuts the relay down without waiting; use
/// [`MockRelay::close`] to wait for connections and timers to finish.
pub struct MockRelay {
    addr: SocketAddr,
    config: Config,
    provider: FakeEventProvider,
    inbox_rx: mpsc::UnboundedReceiver<ClientMessage>,
    broadcast_tx: broadcast::Sender<RelayMessage>,
    connections: watch::Receiver<usize>,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl MockRelay {
    pub async fn start(config: Config) -> Result<Self> {
        let token = CancellationToken::new();
        let provider = FakeEventProvider::new(config.event_interval, token.child_token());
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (connections_tx, connections) = watch::channel(0);
        let hub = Hub {
            inbox_tx,
            broadcast_tx: broadcast_tx.clone(),
            connections: Arc::new(connections_tx),
        };

        let server = Server::bind(config.addr, provider.clone(), hub, token.child_token()).await?;
        let addr = server.local_addr()?;
        info!("mock relay listening on {addr}");
        let handle = tokio::spawn(server.run());

        Ok(Self {
            addr,
            config,
            provider,
            inbox_rx,
            broadcast_tx,
            connections,
            token,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &FakeEventProvider {
        &self.provider
    }

    pub fn connections(&self) -> usize {
        *self.connections.borrow()
    }

    /// wait until at least one client is connected
    pub async fn connected(&mut self) -> Result<()> {
        self.wait_connections(|n| n > 0).await
    }

    /// wait until every client has disconnected and its subscriptions are gone
    pub async fn disconnected(&mut self) -> Result<()> {
        self.wait_connections(|n| n == 0).await
    }

    async fn wait_connections(&mut self, f: impl Fn(usize) -> bool) -> Result<()> {
        let wait = self.config.expect_timeout;
        timeout(wait, self.connections.wait_for(|n| f(*n)))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|_| Error::Closed)?;
        Ok(())
    }

    /// next message received from any client
    pub async fn next_message(&mut self, wait: Duration) -> Result<ClientMessage> {
        timeout(wait, self.inbox_rx.recv())
            .await
            .map_err(|_| Error::Timeout)?
            .ok_or(Error::Closed)
    }

    /// Send `message` to every connected client. Returns the number of clients reached.
    pub fn send(&self, message: RelayMessage) -> Result<usize> {
        self.broadcast_tx
            .send(message)
            .map_err(|_| Error::NoConnection)
    }

    /// Stop accepting, close every connection and cancel all pending timers.
    pub async fn close(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            wait(handle, "mock relay server").await;
        }
    }
}

impl Drop for MockRelay {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};
    use relay_common::protocol::{Event, Filter, Publish};
    use tokio::{net::TcpStream, time::sleep};
    use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

    use super::*;
    use crate::{
        expect::expect_receive_message,
        fake::generate_fake_event,
    };

    type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

    fn init_logger() {
        flexi_logger::Logger::try_with_str("trace, tungstenite=off")
            .and_then(|logger| logger.start())
            .ok();
    }

    async fn relay_with_interval(interval: Duration) -> anyhow::Result<MockRelay> {
        init_logger();
        let config = Config {
            event_interval: interval,
            ..Default::default()
        };
        Ok(MockRelay::start(config).await?)
    }

    async fn connect(relay: &mut MockRelay) -> anyhow::Result<Ws> {
        let (ws, _) = connect_async(relay.url()).await?;
        relay.connected().await?;
        Ok(ws)
    }

    async fn send(ws: &mut Ws, message: &ClientMessage) -> anyhow::Result<()> {
        ws.send(Message::Text(message.encode()?)).await?;
        Ok(())
    }

    async fn recv(ws: &mut Ws) -> anyhow::Result<RelayMessage> {
        loop {
            let frame = timeout(Duration::from_secs(2), ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("stream closed"))??;
            if let Message::Text(text) = frame {
                return Ok(RelayMessage::decode(&text)?);
            }
        }
    }

    fn limit(n: u64) -> Filter {
        Filter {
            limit: Some(n),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn req_gets_stored_events_eose_and_live_event() -> anyhow::Result<()> {
        let mut relay = relay_with_interval(Duration::from_millis(100)).await?;
        let mut ws = connect(&mut relay).await?;

        let req = ClientMessage::req("sub", vec![limit(2)]);
        send(&mut ws, &req).await?;
        expect_receive_message(&mut relay, &req).await;

        assert_eq!(recv(&mut ws).await?, generate_fake_event("sub"));
        assert_eq!(recv(&mut ws).await?, generate_fake_event("sub"));
        assert_eq!(recv(&mut ws).await?, RelayMessage::eose("sub"));
        assert_eq!(recv(&mut ws).await?, generate_fake_event("sub"));

        relay.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn close_cancels_live_event() -> anyhow::Result<()> {
        let mut relay = relay_with_interval(Duration::from_millis(300)).await?;
        let mut ws = connect(&mut relay).await?;

        let req = ClientMessage::req("sub", vec![]);
        let close = ClientMessage::close("sub");
        send(&mut ws, &req).await?;
        send(&mut ws, &close).await?;
        expect_receive_message(&mut relay, &req).await;
        expect_receive_message(&mut relay, &close).await;
        assert_eq!(recv(&mut ws).await?, RelayMessage::eose("sub"));

        assert!(timeout(Duration::from_millis(600), ws.next()).await.is_err());
        assert!(relay.provider().is_empty());
        relay.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn disconnect_stops_subscriptions() -> anyhow::Result<()> {
        let mut relay = relay_with_interval(Duration::from_secs(5)).await?;
        let mut ws = connect(&mut relay).await?;

        send(&mut ws, &ClientMessage::req("a", vec![])).await?;
        send(&mut ws, &ClientMessage::req("b", vec![])).await?;
        assert_eq!(recv(&mut ws).await?, RelayMessage::eose("a"));
        assert_eq!(recv(&mut ws).await?, RelayMessage::eose("b"));
        assert_eq!(relay.provider().len(), 2);

        ws.close(None).await?;
        relay.disconnected().await?;
        assert!(relay.provider().is_empty());
        relay.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn publish_is_recorded_and_garbage_ignored() -> anyhow::Result<()> {
        let mut relay = relay_with_interval(Duration::from_millis(100)).await?;
        let mut ws = connect(&mut relay).await?;

        ws.send(Message::Binary(vec![1, 2, 3])).await?;
        ws.send(Message::Text("not json".to_string())).await?;
        let publish = ClientMessage::Publish(Publish {
            event: Event {
                id: "id".to_string(),
                pubkey: "pk".to_string(),
                created_at: 0,
                kind: 1,
                tags: vec![],
                content: "hi".to_string(),
                sig: "sig".to_string(),
            },
        });
        send(&mut ws, &publish).await?;
        expect_receive_message(&mut relay, &publish).await;
        assert_eq!(relay.connections(), 1);
        relay.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn send_reaches_every_client() -> anyhow::Result<()> {
        let mut relay = relay_with_interval(Duration::from_millis(100)).await?;
        let mut first = connect(&mut relay).await?;
        let (mut second, _) = connect_async(relay.url()).await?;
        while relay.connections() < 2 {
            sleep(Duration::from_millis(10)).await;
        }

        let notice = RelayMessage::notice("hello");
        assert_eq!(relay.send(notice.clone())?, 2);
        assert_eq!(recv(&mut first).await?, notice);
        assert_eq!(recv(&mut second).await?, notice);
        relay.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn send_without_clients_fails() -> anyhow::Result<()> {
        let relay = relay_with_interval(Duration::from_millis(100)).await?;
        assert!(matches!(
            relay.send(RelayMessage::notice("nobody")),
            Err(Error::NoConnection)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn next_message_times_out() -> anyhow::Result<()> {
        let mut relay = relay_with_interval(Duration::from_millis(100)).await?;
        assert!(matches!(
            relay.next_message(Duration::from_millis(50)).await,
            Err(Error::Timeout)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn close_disconnects_clients() -> anyhow::Result<()> {
        let mut relay = relay_with_interval(Duration::from_millis(100)).await?;
        let mut ws = connect(&mut relay).await?;
        relay.close().await;

        let closed = timeout(Duration::from_secs(2), async {
            loop {
                match ws.next().await {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok());
        Ok(())
    }
}
